use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use coachline_core::UserId;
use coachline_order::{OrderView, Receivables};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReceivablesQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/reports/receivables", get(receivables))
        .route("/v1/travels/{travel_id}/reservations", get(grouped_reservations))
}

/// GET /v1/reports/receivables?month=&year=
pub async fn receivables(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Query(query): Query<ReceivablesQuery>,
) -> Result<Json<Receivables>, AppError> {
    Ok(Json(state.engine.receivables(&uid, query.month, query.year).await?))
}

/// GET /v1/travels/{travel_id}/reservations
/// Reservations grouped by order, in booking order
pub async fn grouped_reservations(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(travel_id): Path<Uuid>,
) -> Result<Json<Vec<OrderView>>, AppError> {
    Ok(Json(state.engine.grouped_reservations(&uid, travel_id).await?))
}
