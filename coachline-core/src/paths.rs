//! Document paths. Every user-owned document lives under `users/{uid}`.

use uuid::Uuid;

use crate::UserId;

pub fn user(uid: &UserId) -> String {
    format!("users/{}", uid)
}

pub fn travels(uid: &UserId) -> String {
    format!("{}/travels", user(uid))
}

pub fn travel(uid: &UserId, travel_id: Uuid) -> String {
    format!("{}/{}", travels(uid), travel_id)
}

pub fn orders(uid: &UserId, travel_id: Uuid) -> String {
    format!("{}/orders", travel(uid, travel_id))
}

pub fn order(uid: &UserId, travel_id: Uuid, order_id: Uuid) -> String {
    format!("{}/{}", orders(uid, travel_id), order_id)
}

pub fn reservations(uid: &UserId, travel_id: Uuid, order_id: Uuid) -> String {
    format!("{}/reservations", order(uid, travel_id, order_id))
}

pub fn reservation(uid: &UserId, travel_id: Uuid, order_id: Uuid, reservation_id: Uuid) -> String {
    format!("{}/{}", reservations(uid, travel_id, order_id), reservation_id)
}

pub fn costs(uid: &UserId, travel_id: Uuid) -> String {
    format!("{}/costs", travel(uid, travel_id))
}

pub fn cost(uid: &UserId, travel_id: Uuid, cost_id: Uuid) -> String {
    format!("{}/{}", costs(uid, travel_id), cost_id)
}

pub fn passengers(uid: &UserId) -> String {
    format!("{}/passengers", user(uid))
}

pub fn passenger(uid: &UserId, passenger_id: Uuid) -> String {
    format!("{}/{}", passengers(uid), passenger_id)
}

pub fn seat_layouts(uid: &UserId) -> String {
    format!("{}/seatLayouts", user(uid))
}

pub fn seat_layout(uid: &UserId, layout_id: Uuid) -> String {
    format!("{}/{}", seat_layouts(uid), layout_id)
}

pub fn master_password(uid: &UserId) -> String {
    format!("{}/settings/masterPassword", user(uid))
}

/// Claim key held by the reservation currently occupying a seat.
pub fn seat_claim(uid: &UserId, travel_id: Uuid, seat_number: u32) -> String {
    format!("claims/{}/seats/{}", travel(uid, travel_id), seat_number)
}
