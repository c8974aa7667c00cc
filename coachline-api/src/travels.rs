use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use coachline_catalog::{SeatMap, Travel, TravelDisplayStatus, TravelInput};
use coachline_core::UserId;
use coachline_order::TravelSummary;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::master_password;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListTravelsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Serialize)]
pub struct TravelResponse {
    #[serde(flatten)]
    pub travel: Travel,
    pub display_status: TravelDisplayStatus,
}

impl From<Travel> for TravelResponse {
    fn from(travel: Travel) -> Self {
        let display_status = travel.display_status(Utc::now().naive_utc());
        Self { travel, display_status }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/travels", get(list_travels).post(create_travel))
        .route("/v1/travels/{travel_id}", get(get_travel).put(update_travel).delete(delete_travel))
        .route("/v1/travels/{travel_id}/cancel", post(cancel_travel))
        .route("/v1/travels/{travel_id}/seats", get(seat_map))
        .route("/v1/travels/{travel_id}/summary", get(travel_summary))
        .route("/v1/travels/{travel_id}/stream", get(stream_events))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/travels
pub async fn list_travels(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Query(query): Query<ListTravelsQuery>,
) -> Result<Json<Vec<TravelResponse>>, AppError> {
    let travels = state.catalog.list_travels(&uid, query.include_inactive).await?;
    Ok(Json(travels.into_iter().map(TravelResponse::from).collect()))
}

/// POST /v1/travels
pub async fn create_travel(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Json(input): Json<TravelInput>,
) -> Result<(StatusCode, Json<TravelResponse>), AppError> {
    let travel = state.catalog.create_travel(&uid, input).await?;
    Ok((StatusCode::CREATED, Json(travel.into())))
}

/// GET /v1/travels/{travel_id}
pub async fn get_travel(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(travel_id): Path<Uuid>,
) -> Result<Json<TravelResponse>, AppError> {
    let travel = state.catalog.get_travel(&uid, travel_id).await?;
    Ok(Json(travel.into()))
}

/// PUT /v1/travels/{travel_id}
pub async fn update_travel(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(travel_id): Path<Uuid>,
    Json(input): Json<TravelInput>,
) -> Result<Json<TravelResponse>, AppError> {
    let travel = state.engine.update_travel(&uid, travel_id, input).await?;
    Ok(Json(travel.into()))
}

/// POST /v1/travels/{travel_id}/cancel
/// Soft delete, gated by the master password
pub async fn cancel_travel(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(travel_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<TravelResponse>, AppError> {
    let travel = state.catalog.cancel_travel(&uid, travel_id, master_password(&headers)).await?;
    Ok(Json(travel.into()))
}

/// DELETE /v1/travels/{travel_id}
/// Permanent delete with orders, reservations and costs
pub async fn delete_travel(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(travel_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    state.engine.delete_travel_permanently(&uid, travel_id, master_password(&headers)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/travels/{travel_id}/seats
pub async fn seat_map(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(travel_id): Path<Uuid>,
) -> Result<Json<SeatMap>, AppError> {
    Ok(Json(state.engine.seat_map(&uid, travel_id).await?))
}

/// GET /v1/travels/{travel_id}/summary
pub async fn travel_summary(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(travel_id): Path<Uuid>,
) -> Result<Json<TravelSummary>, AppError> {
    Ok(Json(state.engine.travel_summary(&uid, travel_id).await?))
}

/// GET /v1/travels/{travel_id}/stream
/// Server-sent booking events of one travel
pub async fn stream_events(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(travel_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    state.catalog.get_travel(&uid, travel_id).await?;
    let rx = state.sse_tx.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(event) if event.travel_id() == travel_id => {
                Event::default().event(event.name()).json_data(&event).ok().map(Ok)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("SSE subscriber lagged: {}", e);
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
