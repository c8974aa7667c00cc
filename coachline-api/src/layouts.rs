use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use coachline_catalog::{GridEdit, SeatLayout, SeatLayoutInput};
use coachline_core::UserId;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/seat-layouts", get(list_layouts).post(create_layout))
        .route("/v1/seat-layouts/{id}", get(get_layout).put(update_layout).delete(delete_layout))
        .route("/v1/seat-layouts/{id}/grid", post(edit_layout_grid))
}

/// GET /v1/seat-layouts
pub async fn list_layouts(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
) -> Result<Json<Vec<SeatLayout>>, AppError> {
    Ok(Json(state.catalog.list_layouts(&uid).await?))
}

/// POST /v1/seat-layouts
pub async fn create_layout(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Json(input): Json<SeatLayoutInput>,
) -> Result<(StatusCode, Json<SeatLayout>), AppError> {
    let layout = state.catalog.create_layout(&uid, input).await?;
    Ok((StatusCode::CREATED, Json(layout)))
}

/// GET /v1/seat-layouts/{id}
pub async fn get_layout(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(layout_id): Path<Uuid>,
) -> Result<Json<SeatLayout>, AppError> {
    Ok(Json(state.catalog.get_layout(&uid, layout_id).await?))
}

/// PUT /v1/seat-layouts/{id}
pub async fn update_layout(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(layout_id): Path<Uuid>,
    Json(input): Json<SeatLayoutInput>,
) -> Result<Json<SeatLayout>, AppError> {
    Ok(Json(state.engine.update_layout(&uid, layout_id, input).await?))
}

/// POST /v1/seat-layouts/{id}/grid
/// Applies grid edits in order; nothing is saved if any step fails
pub async fn edit_layout_grid(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(layout_id): Path<Uuid>,
    Json(edits): Json<Vec<GridEdit>>,
) -> Result<Json<SeatLayout>, AppError> {
    Ok(Json(state.engine.edit_layout_grid(&uid, layout_id, &edits).await?))
}

/// DELETE /v1/seat-layouts/{id}
/// Rejected while an active travel still uses the layout
pub async fn delete_layout(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(layout_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_layout(&uid, layout_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
