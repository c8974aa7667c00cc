pub mod auth;

pub use auth::{auth_middleware, master_password, Claims, MASTER_PASSWORD_HEADER};
