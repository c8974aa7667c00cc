use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Extension, Json, Router,
};
use coachline_core::master_password::MasterPasswordStatus;
use coachline_core::UserId;
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::master_password;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetMasterPasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub active: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/security/master-password", get(status).put(set_password))
        .route("/v1/security/master-password/active", post(set_active))
}

/// GET /v1/security/master-password
pub async fn status(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
) -> Result<Json<MasterPasswordStatus>, AppError> {
    Ok(Json(state.gate.status(&uid).await?))
}

/// PUT /v1/security/master-password
/// Replacing an existing password needs the current one in the header
pub async fn set_password(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    headers: HeaderMap,
    Json(req): Json<SetMasterPasswordRequest>,
) -> Result<StatusCode, AppError> {
    state.gate.set(&uid, &req.new_password, master_password(&headers)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/security/master-password/active
pub async fn set_active(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    headers: HeaderMap,
    Json(req): Json<ActivateRequest>,
) -> Result<Json<MasterPasswordStatus>, AppError> {
    Ok(Json(state.gate.set_active(&uid, req.active, master_password(&headers)).await?))
}
