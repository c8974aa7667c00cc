use std::collections::{BTreeSet, HashMap};

use coachline_catalog::SeatLayout;
use coachline_core::CoreError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Order, Payer};

/// Changes to an existing order. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderEdit {
    #[serde(default)]
    pub payer: Option<Payer>,
    #[serde(default)]
    pub total_cents: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub reservations: Vec<ReservationEdit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationEdit {
    pub reservation_id: Uuid,
    #[serde(default)]
    pub seat_number: Option<u32>,
    #[serde(default)]
    pub passenger_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatMove {
    pub reservation_id: Uuid,
    pub from: u32,
    pub to: u32,
}

/// Validates and applies order edits in memory
pub struct ChangeHandler;

impl ChangeHandler {
    pub fn validate_payer(payer: &Payer) -> Result<(), ChangeError> {
        if payer.name.trim().is_empty() {
            return Err(ChangeError::ValidationFailed("Payer name is required".to_string()));
        }
        if payer.document.expose().trim().is_empty() {
            return Err(ChangeError::ValidationFailed("Payer document is required".to_string()));
        }
        Ok(())
    }

    /// Applies `edit` to `order` after checking it in full; nothing changes on error.
    /// `taken_elsewhere` holds seats of active reservations in other orders of
    /// the same travel. Returns the seat moves the caller has to claim.
    pub fn apply(
        order: &mut Order,
        edit: &OrderEdit,
        layout: &SeatLayout,
        taken_elsewhere: &BTreeSet<u32>,
    ) -> Result<Vec<SeatMove>, ChangeError> {
        if order.is_cancelled() {
            return Err(ChangeError::OrderNotModifiable(order.id));
        }

        let mut seats: HashMap<Uuid, u32> = order
            .reservations
            .iter()
            .filter(|r| r.is_active())
            .map(|r| (r.id, r.seat_number))
            .collect();

        let mut moves = Vec::new();
        let mut listed = BTreeSet::new();
        for change in &edit.reservations {
            if !listed.insert(change.reservation_id) {
                return Err(ChangeError::DuplicateReservation(change.reservation_id));
            }
            let reservation = order
                .reservations
                .iter()
                .find(|r| r.id == change.reservation_id)
                .ok_or(ChangeError::ReservationNotFound(change.reservation_id))?;
            if !reservation.is_active() {
                return Err(ChangeError::ReservationNotActive(reservation.id));
            }

            if let Some(seat) = change.seat_number.filter(|s| *s != reservation.seat_number) {
                if !layout.has_seat(seat) {
                    return Err(ChangeError::InvalidSeat(seat));
                }
                if taken_elsewhere.contains(&seat) {
                    return Err(ChangeError::SeatUnavailable(seat));
                }
                seats.insert(reservation.id, seat);
                moves.push(SeatMove { reservation_id: reservation.id, from: reservation.seat_number, to: seat });
            }
        }

        let mut seen = BTreeSet::new();
        for seat in seats.values() {
            if !seen.insert(*seat) {
                return Err(ChangeError::SeatUnavailable(*seat));
            }
        }

        if let Some(total) = edit.total_cents {
            if total < 0 {
                return Err(ChangeError::ValidationFailed("Total cannot be negative".to_string()));
            }
            if total < order.payment.paid_cents {
                return Err(ChangeError::ValidationFailed(format!(
                    "Total cannot be below the {} already paid",
                    order.payment.paid_cents
                )));
            }
        }
        if let Some(payer) = &edit.payer {
            Self::validate_payer(payer)?;
        }

        // Everything checked; mutate
        if let Some(payer) = &edit.payer {
            order.payer = Payer { name: payer.name.trim().to_string(), ..payer.clone() };
        }
        if let Some(total) = edit.total_cents {
            order.payment.total_cents = total;
        }
        if let Some(notes) = &edit.notes {
            order.notes = Some(notes.trim().to_string()).filter(|n| !n.is_empty());
        }
        for change in &edit.reservations {
            if let Some(reservation) = order.reservation_mut(change.reservation_id) {
                if let Some(seat) = seats.get(&reservation.id) {
                    reservation.seat_number = *seat;
                }
                if let Some(passenger_id) = change.passenger_id {
                    reservation.passenger_id = passenger_id;
                }
                reservation.updated_at = chrono::Utc::now();
            }
        }
        order.refresh_status();

        Ok(moves)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChangeError {
    #[error("Reservation {0} is listed more than once")]
    DuplicateReservation(Uuid),

    #[error("Order not modifiable: {0}")]
    OrderNotModifiable(Uuid),

    #[error("Reservation not found: {0}")]
    ReservationNotFound(Uuid),

    #[error("Reservation is cancelled: {0}")]
    ReservationNotActive(Uuid),

    #[error("Seat {0} is not available")]
    SeatUnavailable(u32),

    #[error("Seat {0} does not exist in the seat layout")]
    InvalidSeat(u32),

    #[error("Change validation failed: {0}")]
    ValidationFailed(String),
}

impl From<ChangeError> for CoreError {
    fn from(err: ChangeError) -> Self {
        match err {
            ChangeError::ReservationNotFound(id) => CoreError::not_found("Reservation", id),
            ChangeError::SeatUnavailable(seat) => CoreError::SeatUnavailable(seat),
            ChangeError::InvalidSeat(seat) => CoreError::InvalidSeat(seat),
            other => CoreError::ValidationFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, PaymentDetails, SeatAllocation};
    use coachline_catalog::{Cell, Floor, SeatLayoutInput};
    use coachline_core::payment::{PaymentMethod, PaymentRecord};
    use coachline_shared::Masked;

    fn layout() -> SeatLayout {
        SeatLayout::new(SeatLayoutInput {
            name: "Bus".to_string(),
            floors: vec![Floor::new(vec![(1..=6).map(Cell::seat).collect()])],
        })
        .unwrap()
    }

    fn order() -> Order {
        let payer = Payer {
            name: "Paula".to_string(),
            document: Masked::from("52998224725"),
            method: PaymentMethod::Cash,
        };
        let paid = PaymentRecord::new(chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 40, PaymentMethod::Cash);
        let mut order = Order::new(Uuid::new_v4(), payer, PaymentDetails::new(100, vec![paid]), None);
        order.add_reservation(&SeatAllocation { seat_number: 1, passenger_id: Uuid::new_v4() });
        order.add_reservation(&SeatAllocation { seat_number: 2, passenger_id: Uuid::new_v4() });
        order
    }

    fn move_to(order: &Order, index: usize, seat: u32) -> ReservationEdit {
        ReservationEdit { reservation_id: order.reservations[index].id, seat_number: Some(seat), passenger_id: None }
    }

    #[test]
    fn test_move_seat() {
        let mut order = order();
        let edit = OrderEdit { reservations: vec![move_to(&order, 0, 5)], ..Default::default() };

        let moves = ChangeHandler::apply(&mut order, &edit, &layout(), &BTreeSet::new()).unwrap();
        assert_eq!(moves.len(), 1);
        assert_eq!((moves[0].from, moves[0].to), (1, 5));
        assert_eq!(order.reservations[0].seat_number, 5);
    }

    #[test]
    fn test_keeping_own_seat_is_not_a_conflict() {
        let mut order = order();
        let edit = OrderEdit { reservations: vec![move_to(&order, 0, 1)], ..Default::default() };
        let taken: BTreeSet<u32> = [3].into_iter().collect();

        let moves = ChangeHandler::apply(&mut order, &edit, &layout(), &taken).unwrap();
        assert!(moves.is_empty());
    }

    #[test]
    fn test_swap_within_order() {
        let mut order = order();
        let edit = OrderEdit { reservations: vec![move_to(&order, 0, 2), move_to(&order, 1, 1)], ..Default::default() };

        let moves = ChangeHandler::apply(&mut order, &edit, &layout(), &BTreeSet::new()).unwrap();
        assert_eq!(moves.len(), 2);
        assert_eq!(order.reservations[0].seat_number, 2);
        assert_eq!(order.reservations[1].seat_number, 1);
    }

    #[test]
    fn test_conflicts_leave_order_untouched() {
        let mut order = order();
        let before = order.reservations.clone();
        let taken: BTreeSet<u32> = [4].into_iter().collect();

        let edit = OrderEdit { reservations: vec![move_to(&order, 0, 4)], total_cents: Some(500), ..Default::default() };
        assert_eq!(ChangeHandler::apply(&mut order, &edit, &layout(), &taken), Err(ChangeError::SeatUnavailable(4)));

        let edit = OrderEdit { reservations: vec![move_to(&order, 0, 2)], ..Default::default() };
        assert_eq!(ChangeHandler::apply(&mut order, &edit, &layout(), &taken), Err(ChangeError::SeatUnavailable(2)));

        let edit = OrderEdit { reservations: vec![move_to(&order, 0, 99)], ..Default::default() };
        assert_eq!(ChangeHandler::apply(&mut order, &edit, &layout(), &taken), Err(ChangeError::InvalidSeat(99)));

        assert_eq!(order.reservations, before);
        assert_eq!(order.payment.total_cents, 100);
    }

    #[test]
    fn test_reservation_listed_twice_rejected() {
        let mut order = order();
        let before = order.reservations.clone();
        let id = order.reservations[0].id;
        let edit = OrderEdit { reservations: vec![move_to(&order, 0, 3), move_to(&order, 0, 4)], ..Default::default() };

        assert_eq!(
            ChangeHandler::apply(&mut order, &edit, &layout(), &BTreeSet::new()),
            Err(ChangeError::DuplicateReservation(id))
        );
        assert_eq!(order.reservations, before);
        assert_eq!(
            CoreError::from(ChangeError::DuplicateReservation(id)).kind(),
            "VALIDATION_FAILED"
        );
    }

    #[test]
    fn test_total_cannot_drop_below_paid() {
        let mut order = order();
        let edit = OrderEdit { total_cents: Some(30), ..Default::default() };
        assert!(matches!(
            ChangeHandler::apply(&mut order, &edit, &layout(), &BTreeSet::new()),
            Err(ChangeError::ValidationFailed(_))
        ));

        let edit = OrderEdit { total_cents: Some(40), ..Default::default() };
        ChangeHandler::apply(&mut order, &edit, &layout(), &BTreeSet::new()).unwrap();
        assert_eq!(order.status, BookingStatus::Paid);
    }

    #[test]
    fn test_cancelled_reservation_cannot_move() {
        let mut order = order();
        order.reservations[0].cancel();
        order.refresh_status();

        let edit = OrderEdit { reservations: vec![move_to(&order, 0, 3)], ..Default::default() };
        let id = order.reservations[0].id;
        assert_eq!(
            ChangeHandler::apply(&mut order, &edit, &layout(), &BTreeSet::new()),
            Err(ChangeError::ReservationNotActive(id))
        );
    }

    #[test]
    fn test_cancelled_order_not_modifiable() {
        let mut order = order();
        for r in order.reservations.iter_mut() {
            r.cancel();
        }
        order.refresh_status();

        let edit = OrderEdit { notes: Some("late".to_string()), ..Default::default() };
        assert_eq!(
            ChangeHandler::apply(&mut order, &edit, &layout(), &BTreeSet::new()),
            Err(ChangeError::OrderNotModifiable(order.id))
        );
    }
}
