use chrono::{DateTime, NaiveDate, Utc};
use coachline_core::payment::{PaymentMethod, PaymentRecord};
use coachline_shared::Masked;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status shared by orders and reservations.
/// `PendingPayment <-> Paid` follows the remaining balance; `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Paid,
    PendingPayment,
    Cancelled,
}

/// Who pays for an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Payer {
    pub name: String,
    pub document: Masked<String>,
    pub method: PaymentMethod,
}

/// Payment block of an order. `paid` is always the sum of `payments` and
/// `remaining` is `total - paid`, never below zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentDetails {
    #[serde(rename = "valorTotal")]
    pub total_cents: i64,
    #[serde(rename = "valorPago")]
    pub paid_cents: i64,
    #[serde(rename = "valorRestante")]
    pub remaining_cents: i64,
    #[serde(rename = "pagamentos", default)]
    pub payments: Vec<PaymentRecord>,
}

impl PaymentDetails {
    pub fn new(total_cents: i64, payments: Vec<PaymentRecord>) -> Self {
        let mut details = Self {
            total_cents,
            paid_cents: 0,
            remaining_cents: 0,
            payments,
        };
        details.recompute();
        details
    }

    pub fn recompute(&mut self) {
        self.paid_cents = self.payments.iter().map(|p| p.amount_cents).sum();
        self.remaining_cents = (self.total_cents - self.paid_cents).max(0);
    }

    pub fn record(&mut self, payment: PaymentRecord) {
        self.payments.push(payment);
        self.recompute();
    }

    /// Status implied by the balance alone
    pub fn balance_status(&self) -> BookingStatus {
        if self.remaining_cents > 0 {
            BookingStatus::PendingPayment
        } else {
            BookingStatus::Paid
        }
    }
}

/// One seat on a travel held for one passenger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: Uuid,
    pub order_id: Uuid,
    pub travel_id: Uuid,
    pub seat_number: u32,
    pub passenger_id: Uuid,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn new(order_id: Uuid, travel_id: Uuid, allocation: &SeatAllocation, status: BookingStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id,
            travel_id,
            seat_number: allocation.seat_number,
            passenger_id: allocation.passenger_id,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }

    /// Cancelled is terminal; returns false when nothing changed.
    pub fn cancel(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.status = BookingStatus::Cancelled;
        self.updated_at = Utc::now();
        true
    }
}

/// The financial unit: one payer, one travel, one or more reservations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub travel_id: Uuid,
    pub payer: Payer,
    #[serde(rename = "detalhesPagamento")]
    pub payment: PaymentDetails,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Stored as a sub-collection, never inline
    #[serde(skip)]
    pub reservations: Vec<Reservation>,
}

impl Order {
    pub fn new(travel_id: Uuid, payer: Payer, payment: PaymentDetails, notes: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            travel_id,
            payer,
            status: payment.balance_status(),
            payment,
            notes,
            created_at: now,
            updated_at: now,
            reservations: Vec::new(),
        }
    }

    /// Add a reservation that inherits the order's current status
    pub fn add_reservation(&mut self, allocation: &SeatAllocation) -> Uuid {
        let reservation = Reservation::new(self.id, self.travel_id, allocation, self.payment.balance_status());
        let id = reservation.id;
        self.reservations.push(reservation);
        self.refresh_status();
        id
    }

    /// Re-derives payment totals, the order status and every active
    /// reservation's status. The only place statuses are computed.
    pub fn refresh_status(&mut self) {
        self.payment.recompute();
        self.status = derive_order_status(&self.reservations, &self.payment);

        let balance = self.payment.balance_status();
        for reservation in self.reservations.iter_mut().filter(|r| r.is_active()) {
            if reservation.status != balance {
                reservation.status = balance;
                reservation.updated_at = Utc::now();
            }
        }
        self.updated_at = Utc::now();
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    pub fn active_seats(&self) -> impl Iterator<Item = u32> + '_ {
        self.reservations.iter().filter(|r| r.is_active()).map(|r| r.seat_number)
    }

    pub fn reservation_mut(&mut self, reservation_id: Uuid) -> Option<&mut Reservation> {
        self.reservations.iter_mut().find(|r| r.id == reservation_id)
    }
}

/// Cancelled iff every reservation is cancelled; otherwise the balance decides.
pub fn derive_order_status(reservations: &[Reservation], payment: &PaymentDetails) -> BookingStatus {
    if reservations.iter().all(|r| r.status == BookingStatus::Cancelled) {
        BookingStatus::Cancelled
    } else {
        payment.balance_status()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatAllocation {
    pub seat_number: u32,
    pub passenger_id: Uuid,
}

/// Input of CreateOrder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub travel_id: Uuid,
    pub payer: Payer,
    pub total_cents: i64,
    /// Paid up front; becomes the first payment record
    #[serde(default)]
    pub paid_cents: i64,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    pub seats: Vec<SeatAllocation>,
    #[serde(default)]
    pub notes: Option<String>,
}
