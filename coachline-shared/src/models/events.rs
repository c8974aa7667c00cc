use uuid::Uuid;

/// Published after every successful booking mutation on a travel.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingEvent {
    OrderCreated {
        travel_id: Uuid,
        order_id: Uuid,
        seats: Vec<u32>,
        timestamp: i64,
    },
    OrderEdited {
        travel_id: Uuid,
        order_id: Uuid,
        seats: Vec<u32>,
        timestamp: i64,
    },
    PaymentRecorded {
        travel_id: Uuid,
        order_id: Uuid,
        amount_cents: i64,
        remaining_cents: i64,
        timestamp: i64,
    },
    ReservationCancelled {
        travel_id: Uuid,
        order_id: Uuid,
        reservation_id: Uuid,
        seat_number: u32,
        timestamp: i64,
    },
    OrderCancelled {
        travel_id: Uuid,
        order_id: Uuid,
        released_seats: Vec<u32>,
        timestamp: i64,
    },
}

impl BookingEvent {
    pub fn travel_id(&self) -> Uuid {
        match self {
            BookingEvent::OrderCreated { travel_id, .. }
            | BookingEvent::OrderEdited { travel_id, .. }
            | BookingEvent::PaymentRecorded { travel_id, .. }
            | BookingEvent::ReservationCancelled { travel_id, .. }
            | BookingEvent::OrderCancelled { travel_id, .. } => *travel_id,
        }
    }

    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            BookingEvent::OrderCreated { .. } => "order_created",
            BookingEvent::OrderEdited { .. } => "order_edited",
            BookingEvent::PaymentRecorded { .. } => "payment_recorded",
            BookingEvent::ReservationCancelled { .. } => "reservation_cancelled",
            BookingEvent::OrderCancelled { .. } => "order_cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_tagged_by_type() {
        let travel_id = Uuid::new_v4();
        let event = BookingEvent::OrderCancelled {
            travel_id,
            order_id: Uuid::new_v4(),
            released_seats: vec![1, 2],
            timestamp: 0,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ORDER_CANCELLED");
        assert_eq!(event.travel_id(), travel_id);
        assert_eq!(event.name(), "order_cancelled");
    }
}
