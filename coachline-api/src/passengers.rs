use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use coachline_catalog::{Passenger, PassengerInput};
use coachline_core::UserId;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::master_password;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PassengerResponse {
    #[serde(flatten)]
    pub passenger: Passenger,
    pub is_minor: bool,
    pub is_foreign: bool,
}

impl PassengerResponse {
    fn new(passenger: Passenger, adult_age: u32) -> Self {
        Self {
            is_minor: passenger.is_minor_on(Utc::now().date_naive(), adult_age),
            is_foreign: passenger.is_foreign(),
            passenger,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/passengers", get(list_passengers).post(create_passenger))
        .route("/v1/passengers/{id}", get(get_passenger).put(update_passenger).delete(delete_passenger))
}

/// GET /v1/passengers
/// Active passengers only
pub async fn list_passengers(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
) -> Result<Json<Vec<PassengerResponse>>, AppError> {
    let adult_age = state.catalog.rules().adult_age;
    let passengers = state.catalog.list_passengers(&uid).await?;
    Ok(Json(passengers.into_iter().map(|p| PassengerResponse::new(p, adult_age)).collect()))
}

/// POST /v1/passengers
/// A minor must reference an existing guardian or carry a new one inline
pub async fn create_passenger(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Json(input): Json<PassengerInput>,
) -> Result<(StatusCode, Json<PassengerResponse>), AppError> {
    let passenger = state.catalog.create_passenger(&uid, input).await?;
    tracing::info!("Passenger {} registered", passenger.id);
    Ok((StatusCode::CREATED, Json(PassengerResponse::new(passenger, state.catalog.rules().adult_age))))
}

/// GET /v1/passengers/{id}
pub async fn get_passenger(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(passenger_id): Path<Uuid>,
) -> Result<Json<PassengerResponse>, AppError> {
    let passenger = state.catalog.get_passenger(&uid, passenger_id).await?;
    Ok(Json(PassengerResponse::new(passenger, state.catalog.rules().adult_age)))
}

/// PUT /v1/passengers/{id}
pub async fn update_passenger(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(passenger_id): Path<Uuid>,
    Json(input): Json<PassengerInput>,
) -> Result<Json<PassengerResponse>, AppError> {
    let passenger = state.catalog.update_passenger(&uid, passenger_id, input).await?;
    Ok(Json(PassengerResponse::new(passenger, state.catalog.rules().adult_age)))
}

/// DELETE /v1/passengers/{id}
pub async fn delete_passenger(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(passenger_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_passenger(&uid, passenger_id, master_password(&headers)).await?;
    Ok(StatusCode::NO_CONTENT)
}
