use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::layout::{CellKind, SeatLayout};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatState {
    Available,
    Taken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatMapCell {
    pub kind: CellKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<SeatState>,
}

/// A travel's layout annotated with which seats are held by active reservations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatMap {
    pub travel_id: Uuid,
    pub layout_id: Uuid,
    pub floors: Vec<Vec<Vec<SeatMapCell>>>,
    pub total_seats: usize,
    pub taken_seats: usize,
}

impl SeatMap {
    pub fn build(travel_id: Uuid, layout: &SeatLayout, taken: &BTreeSet<u32>) -> Self {
        let floors: Vec<Vec<Vec<SeatMapCell>>> = layout
            .floors
            .iter()
            .map(|floor| {
                floor
                    .rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|cell| SeatMapCell {
                                kind: cell.kind,
                                number: cell.number,
                                state: match (cell.kind, cell.number) {
                                    (CellKind::Seat, Some(n)) if taken.contains(&n) => Some(SeatState::Taken),
                                    (CellKind::Seat, _) => Some(SeatState::Available),
                                    _ => None,
                                },
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect();

        let seats = layout.seat_numbers();
        let taken_seats = seats.iter().filter(|n| taken.contains(n)).count();

        Self {
            travel_id,
            layout_id: layout.id,
            floors,
            total_seats: seats.len(),
            taken_seats,
        }
    }

    pub fn available_seats(&self) -> usize {
        self.total_seats - self.taken_seats
    }

    /// Share of seats taken, 0.0 to 1.0
    pub fn occupancy(&self) -> f64 {
        if self.total_seats == 0 {
            0.0
        } else {
            self.taken_seats as f64 / self.total_seats as f64
        }
    }
}
