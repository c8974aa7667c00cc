pub mod repository;
pub mod paths;
pub mod memory;
pub mod identity;
pub mod payment;
pub mod password;
pub mod master_password;

pub use identity::{Session, UserId};
pub use memory::MemoryDocumentStore;
pub use repository::{DocumentStore, Documents, StoreResult};

/// Error taxonomy shared by every booking operation.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Seat {0} is not available")]
    SeatUnavailable(u32),
    #[error("Seat {0} does not exist in the seat layout")]
    InvalidSeat(u32),
    #[error("Document already registered to another passenger: {0}")]
    DuplicateDocument(String),
    #[error("Master password required")]
    MasterPasswordRequired,
    #[error("Master password incorrect")]
    MasterPasswordIncorrect,
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound { entity, id: id.to_string() }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::ValidationFailed(msg.into())
    }

    /// Stable machine-readable name, used by the HTTP layer.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Unauthenticated => "UNAUTHENTICATED",
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::SeatUnavailable(_) => "SEAT_UNAVAILABLE",
            CoreError::InvalidSeat(_) => "INVALID_SEAT",
            CoreError::DuplicateDocument(_) => "DUPLICATE_DOCUMENT",
            CoreError::MasterPasswordRequired => "MASTER_PASSWORD_REQUIRED",
            CoreError::MasterPasswordIncorrect => "MASTER_PASSWORD_INCORRECT",
            CoreError::ValidationFailed(_) => "VALIDATION_FAILED",
            CoreError::Unexpected(_) => "UNEXPECTED_ERROR",
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Unexpected(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Unexpected(format!("Malformed document: {}", err))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
