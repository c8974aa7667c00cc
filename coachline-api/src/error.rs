use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coachline_core::CoreError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Core(err) => match err {
                CoreError::Unauthenticated => StatusCode::UNAUTHORIZED,
                CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                CoreError::SeatUnavailable(_) | CoreError::DuplicateDocument(_) => StatusCode::CONFLICT,
                CoreError::InvalidSeat(_) | CoreError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CoreError::MasterPasswordRequired | CoreError::MasterPasswordIncorrect => StatusCode::FORBIDDEN,
                CoreError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Core(err) => err.kind(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal Server Error: {}", self);
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": message,
            "kind": self.kind(),
        }));

        (status, body).into_response()
    }
}
