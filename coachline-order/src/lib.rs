pub mod models;
pub mod manager;
pub mod changes;
pub mod finance;
pub mod projection;

pub use models::{BookingStatus, Order, Payer, PaymentDetails, Reservation, SeatAllocation, NewOrder};
pub use manager::BookingEngine;
pub use changes::{ChangeError, ChangeHandler, OrderEdit, ReservationEdit};
pub use finance::{compute_receivables, summarize_travel, Receivables, TravelSummary};
pub use projection::{group_reservations, OrderView};
