use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use coachline_core::{CoreError, UserId};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the master password for gated operations
pub const MASTER_PASSWORD_HEADER: &str = "x-master-password";

// ============================================================================
// JWT Claims
// ============================================================================

/// Issued by the identity provider; `sub` is the tenant user id.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

// ============================================================================
// Authentication Middleware
// ============================================================================

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(CoreError::Unauthenticated)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        CoreError::Unauthenticated
    })?;

    if token_data.claims.sub.trim().is_empty() {
        return Err(CoreError::Unauthenticated.into());
    }

    req.extensions_mut().insert(UserId::new(token_data.claims.sub));
    Ok(next.run(req).await)
}

/// Candidate master password sent with a gated request, if any.
pub fn master_password(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(MASTER_PASSWORD_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.is_empty())
}
