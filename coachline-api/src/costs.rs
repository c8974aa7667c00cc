use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use coachline_catalog::{Cost, CostInput};
use coachline_core::UserId;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/travels/{travel_id}/costs", get(list_costs).post(add_cost))
        .route(
            "/v1/travels/{travel_id}/costs/{cost_id}",
            get(get_cost).put(update_cost).delete(delete_cost),
        )
}

/// GET /v1/travels/{travel_id}/costs
pub async fn list_costs(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(travel_id): Path<Uuid>,
) -> Result<Json<Vec<Cost>>, AppError> {
    Ok(Json(state.catalog.list_costs(&uid, travel_id).await?))
}

/// POST /v1/travels/{travel_id}/costs
pub async fn add_cost(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(travel_id): Path<Uuid>,
    Json(input): Json<CostInput>,
) -> Result<(StatusCode, Json<Cost>), AppError> {
    let cost = state.catalog.add_cost(&uid, travel_id, input).await?;
    Ok((StatusCode::CREATED, Json(cost)))
}

/// GET /v1/travels/{travel_id}/costs/{cost_id}
pub async fn get_cost(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path((travel_id, cost_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Cost>, AppError> {
    Ok(Json(state.catalog.get_cost(&uid, travel_id, cost_id).await?))
}

/// PUT /v1/travels/{travel_id}/costs/{cost_id}
pub async fn update_cost(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path((travel_id, cost_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<CostInput>,
) -> Result<Json<Cost>, AppError> {
    Ok(Json(state.catalog.update_cost(&uid, travel_id, cost_id, input).await?))
}

/// DELETE /v1/travels/{travel_id}/costs/{cost_id}
pub async fn delete_cost(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path((travel_id, cost_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_cost(&uid, travel_id, cost_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
