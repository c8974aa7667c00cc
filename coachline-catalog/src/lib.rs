pub mod travel;
pub mod layout;
pub mod seatmap;
pub mod passenger;
pub mod cost;
pub mod service;

pub use travel::{Travel, TravelDisplayStatus, TravelInput};
pub use layout::{Cell, CellKind, Floor, GridEdit, LayoutError, SeatLayout, SeatLayoutInput};
pub use seatmap::SeatMap;
pub use passenger::{GuardianRef, IdentityDocuments, Passenger, PassengerInput};
pub use cost::{Cost, CostInput, CostKind};
pub use service::{CatalogRules, CatalogService};
