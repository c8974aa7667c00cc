//! Read-side view of a flat reservation stream grouped by order.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{BookingStatus, Order, Payer, PaymentDetails, Reservation};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order_id: Uuid,
    pub travel_id: Uuid,
    /// Absent when the order header was not loaded alongside its reservations
    pub payer: Option<Payer>,
    #[serde(rename = "detalhesPagamento")]
    pub payment: Option<PaymentDetails>,
    pub status: BookingStatus,
    pub reservations: Vec<Reservation>,
}

/// Groups reservations by `order_id`, keeping groups in order of first
/// occurrence and reservations in input order within each group.
///
/// Groups with a matching header in `orders` take its payer, payment and
/// status. The rest get a status derived from their reservations alone.
pub fn group_reservations(reservations: &[Reservation], orders: &[Order]) -> Vec<OrderView> {
    let headers: HashMap<Uuid, &Order> = orders.iter().map(|o| (o.id, o)).collect();
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut views: Vec<OrderView> = Vec::new();

    for reservation in reservations {
        let slot = *index.entry(reservation.order_id).or_insert_with(|| {
            let header = headers.get(&reservation.order_id);
            views.push(OrderView {
                order_id: reservation.order_id,
                travel_id: reservation.travel_id,
                payer: header.map(|o| o.payer.clone()),
                payment: header.map(|o| o.payment.clone()),
                status: header.map(|o| o.status).unwrap_or(reservation.status),
                reservations: Vec::new(),
            });
            views.len() - 1
        });
        views[slot].reservations.push(reservation.clone());
    }

    for view in views.iter_mut().filter(|v| v.payment.is_none()) {
        view.status = synthetic_status(&view.reservations);
    }
    views
}

/// Cancelled only when every reservation is; pending wins over paid.
fn synthetic_status(reservations: &[Reservation]) -> BookingStatus {
    let mut active = reservations.iter().filter(|r| r.is_active()).peekable();
    if active.peek().is_none() {
        return BookingStatus::Cancelled;
    }
    if active.any(|r| r.status == BookingStatus::PendingPayment) {
        BookingStatus::PendingPayment
    } else {
        BookingStatus::Paid
    }
}
