use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{NaiveDate, Utc};
use coachline_core::payment::PaymentRecord;
use coachline_core::UserId;
use coachline_order::{NewOrder, Order, OrderEdit, Payer, Reservation, ReservationEdit, SeatAllocation};
use coachline_shared::BookingEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::master_password;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub payer: Payer,
    pub total_cents: i64,
    #[serde(default)]
    pub paid_cents: i64,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    pub seats: Vec<SeatAllocation>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditReservationRequest {
    #[serde(default)]
    pub seat_number: Option<u32>,
    #[serde(default)]
    pub passenger_id: Option<Uuid>,
}

/// Order document plus its reservation sub-collection
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub reservations: Vec<Reservation>,
}

impl From<Order> for OrderResponse {
    fn from(mut order: Order) -> Self {
        let reservations = std::mem::take(&mut order.reservations);
        Self { order, reservations }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/travels/{travel_id}/orders", get(list_orders).post(create_order))
        .route("/v1/travels/{travel_id}/orders/{order_id}", get(get_order).put(edit_order))
        .route("/v1/travels/{travel_id}/orders/{order_id}/payments", post(record_payment))
        .route("/v1/travels/{travel_id}/orders/{order_id}/cancel", post(cancel_order))
        .route(
            "/v1/travels/{travel_id}/orders/{order_id}/reservations/{reservation_id}",
            put(edit_reservation),
        )
        .route(
            "/v1/travels/{travel_id}/orders/{order_id}/reservations/{reservation_id}/cancel",
            post(cancel_reservation),
        )
}

fn seats_of(order: &Order) -> Vec<u32> {
    order.active_seats().collect()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/travels/{travel_id}/orders
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(travel_id): Path<Uuid>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let orders = state.engine.list_orders(&uid, travel_id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// POST /v1/travels/{travel_id}/orders
/// Books one or more seats under a single payer
pub async fn create_order(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path(travel_id): Path<Uuid>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let new_order = NewOrder {
        travel_id,
        payer: req.payer,
        total_cents: req.total_cents,
        paid_cents: req.paid_cents,
        payment_date: req.payment_date,
        seats: req.seats,
        notes: req.notes,
    };
    let order = state.engine.create_order(&uid, new_order).await?;

    state.publish(BookingEvent::OrderCreated {
        travel_id,
        order_id: order.id,
        seats: seats_of(&order),
        timestamp: Utc::now().timestamp(),
    });
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /v1/travels/{travel_id}/orders/{order_id}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path((travel_id, order_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<OrderResponse>, AppError> {
    Ok(Json(state.engine.get_order(&uid, travel_id, order_id).await?.into()))
}

/// PUT /v1/travels/{travel_id}/orders/{order_id}
/// Payer, total, notes and per-reservation seat/passenger changes in one write
pub async fn edit_order(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path((travel_id, order_id)): Path<(Uuid, Uuid)>,
    Json(edit): Json<OrderEdit>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state.engine.edit_order(&uid, travel_id, order_id, edit).await?;

    state.publish(BookingEvent::OrderEdited {
        travel_id,
        order_id,
        seats: seats_of(&order),
        timestamp: Utc::now().timestamp(),
    });
    Ok(Json(order.into()))
}

/// POST /v1/travels/{travel_id}/orders/{order_id}/payments
pub async fn record_payment(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path((travel_id, order_id)): Path<(Uuid, Uuid)>,
    Json(payment): Json<PaymentRecord>,
) -> Result<Json<OrderResponse>, AppError> {
    let amount_cents = payment.amount_cents;
    let order = state.engine.record_payment(&uid, travel_id, order_id, payment).await?;

    state.publish(BookingEvent::PaymentRecorded {
        travel_id,
        order_id,
        amount_cents,
        remaining_cents: order.payment.remaining_cents,
        timestamp: Utc::now().timestamp(),
    });
    Ok(Json(order.into()))
}

/// POST /v1/travels/{travel_id}/orders/{order_id}/cancel
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path((travel_id, order_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
) -> Result<Json<OrderResponse>, AppError> {
    let before: Vec<u32> = seats_of(&state.engine.get_order(&uid, travel_id, order_id).await?);
    let order = state.engine.cancel_order(&uid, travel_id, order_id, master_password(&headers)).await?;

    state.publish(BookingEvent::OrderCancelled {
        travel_id,
        order_id,
        released_seats: before,
        timestamp: Utc::now().timestamp(),
    });
    Ok(Json(order.into()))
}

/// PUT /v1/travels/{travel_id}/orders/{order_id}/reservations/{reservation_id}
pub async fn edit_reservation(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path((travel_id, order_id, reservation_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(req): Json<EditReservationRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let edit = ReservationEdit {
        reservation_id,
        seat_number: req.seat_number,
        passenger_id: req.passenger_id,
    };
    let order = state.engine.edit_reservation(&uid, travel_id, order_id, edit).await?;

    state.publish(BookingEvent::OrderEdited {
        travel_id,
        order_id,
        seats: seats_of(&order),
        timestamp: Utc::now().timestamp(),
    });
    Ok(Json(order.into()))
}

/// POST /v1/travels/{travel_id}/orders/{order_id}/reservations/{reservation_id}/cancel
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Path((travel_id, order_id, reservation_id)): Path<(Uuid, Uuid, Uuid)>,
    headers: HeaderMap,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .engine
        .cancel_reservation(&uid, travel_id, order_id, reservation_id, master_password(&headers))
        .await?;

    if let Some(reservation) = order.reservations.iter().find(|r| r.id == reservation_id) {
        state.publish(BookingEvent::ReservationCancelled {
            travel_id,
            order_id,
            reservation_id,
            seat_number: reservation.seat_number,
            timestamp: Utc::now().timestamp(),
        });
    }
    Ok(Json(order.into()))
}
