use axum::{
    http::{HeaderName, Method},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod costs;
pub mod error;
pub mod layouts;
pub mod middleware;
pub mod orders;
pub mod passengers;
pub mod reports;
pub mod security;
pub mod state;
pub mod travels;

pub use state::{AppState, AuthConfig};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
            HeaderName::from_static(middleware::MASTER_PASSWORD_HEADER),
        ]);

    Router::new()
        .merge(travels::routes())
        .merge(layouts::routes())
        .merge(passengers::routes())
        .merge(orders::routes())
        .merge(costs::routes())
        .merge(reports::routes())
        .merge(security::routes())
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::auth_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
