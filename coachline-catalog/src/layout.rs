use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use coachline_core::CoreError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What occupies one grid position
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellKind {
    Seat,
    Bathroom,
    Aisle,
    Empty,
    Fridge,
    Stairs,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cell {
    pub kind: CellKind,
    /// Only seat cells carry a number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
}

impl Cell {
    pub fn seat(number: u32) -> Self {
        Self { kind: CellKind::Seat, number: Some(number) }
    }

    pub fn of(kind: CellKind) -> Self {
        Self { kind, number: None }
    }

    pub fn empty() -> Self {
        Self::of(CellKind::Empty)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Floor {
    pub rows: Vec<Vec<Cell>>,
}

impl Floor {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn blank(rows: usize, columns: usize) -> Self {
        Self { rows: vec![vec![Cell::empty(); columns]; rows] }
    }

    fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flatten()
    }
}

/// Vehicle seat/amenity grid, reused by any number of travels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatLayout {
    pub id: Uuid,
    pub name: String,
    pub floors: Vec<Floor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatLayoutInput {
    pub name: String,
    pub floors: Vec<Floor>,
}

/// One grid editing step on a stored layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GridEdit {
    AddRow { floor: usize, columns: usize },
    RemoveRow { floor: usize },
    SetCell { floor: usize, row: usize, column: usize, cell: Cell },
    AddSecondFloor { rows: usize, columns: usize },
    RemoveSecondFloor,
}

impl SeatLayout {
    pub fn new(input: SeatLayoutInput) -> Result<Self, LayoutError> {
        let now = Utc::now();
        let layout = Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            floors: input.floors,
            created_at: now,
            updated_at: now,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Checks every persistence invariant of the grid.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.name.trim().is_empty() {
            return Err(LayoutError::MissingName);
        }
        if self.floors.is_empty() || self.floors.len() > 2 {
            return Err(LayoutError::FloorCount(self.floors.len()));
        }

        let mut seen = BTreeSet::new();
        for (index, floor) in self.floors.iter().enumerate() {
            if floor.rows.is_empty() {
                return Err(LayoutError::NoRows(index));
            }
            if floor.rows.iter().any(|row| row.is_empty()) {
                return Err(LayoutError::EmptyRow(index));
            }
            for cell in floor.cells() {
                match (cell.kind, cell.number) {
                    (CellKind::Seat, None) | (CellKind::Seat, Some(0)) => return Err(LayoutError::UnnumberedSeat),
                    (CellKind::Seat, Some(n)) => {
                        if !seen.insert(n) {
                            return Err(LayoutError::DuplicateSeat(n));
                        }
                    }
                    (kind, Some(_)) => return Err(LayoutError::NumberedNonSeat(kind)),
                    (_, None) => {}
                }
            }
        }

        if seen.is_empty() {
            return Err(LayoutError::NoSeats);
        }
        Ok(())
    }

    pub fn seat_numbers(&self) -> BTreeSet<u32> {
        self.floors
            .iter()
            .flat_map(|f| f.cells())
            .filter(|c| c.kind == CellKind::Seat)
            .filter_map(|c| c.number)
            .collect()
    }

    pub fn has_seat(&self, number: u32) -> bool {
        self.floors
            .iter()
            .flat_map(|f| f.cells())
            .any(|c| c.kind == CellKind::Seat && c.number == Some(number))
    }

    pub fn seat_count(&self) -> usize {
        self.seat_numbers().len()
    }

    pub fn add_row(&mut self, floor: usize, columns: usize) -> Result<(), LayoutError> {
        let floor = self.floor_mut(floor)?;
        let width = floor.rows.last().map(|r| r.len()).unwrap_or(columns).max(1);
        floor.rows.push(vec![Cell::empty(); width]);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Drops the last row; a floor always keeps at least one.
    pub fn remove_row(&mut self, floor: usize) -> Result<Vec<Cell>, LayoutError> {
        let index = floor;
        let floor = self.floor_mut(floor)?;
        if floor.rows.len() <= 1 {
            return Err(LayoutError::NoRows(index));
        }
        let removed = floor.rows.pop().unwrap_or_default();
        self.updated_at = Utc::now();
        Ok(removed)
    }

    pub fn set_cell(&mut self, floor: usize, row: usize, column: usize, cell: Cell) -> Result<(), LayoutError> {
        let target = self
            .floor_mut(floor)?
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(column))
            .ok_or(LayoutError::OutOfBounds { floor, row, column })?;
        *target = cell;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn add_second_floor(&mut self, rows: usize, columns: usize) -> Result<(), LayoutError> {
        if self.floors.len() >= 2 {
            return Err(LayoutError::FloorCount(3));
        }
        self.floors.push(Floor::blank(rows.max(1), columns.max(1)));
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn remove_second_floor(&mut self) -> Result<(), LayoutError> {
        if self.floors.len() < 2 {
            return Err(LayoutError::FloorCount(0));
        }
        self.floors.truncate(1);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn apply_edit(&mut self, edit: &GridEdit) -> Result<(), LayoutError> {
        match edit {
            GridEdit::AddRow { floor, columns } => self.add_row(*floor, *columns),
            GridEdit::RemoveRow { floor } => self.remove_row(*floor).map(|_| ()),
            GridEdit::SetCell { floor, row, column, cell } => self.set_cell(*floor, *row, *column, cell.clone()),
            GridEdit::AddSecondFloor { rows, columns } => self.add_second_floor(*rows, *columns),
            GridEdit::RemoveSecondFloor => self.remove_second_floor(),
        }
    }

    /// Fails when a seat held by an active reservation is missing from the grid.
    pub fn ensure_holds(&self, held: &BTreeSet<u32>) -> Result<(), LayoutError> {
        let present = self.seat_numbers();
        let missing: Vec<u32> = held.difference(&present).copied().collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(LayoutError::HeldSeatsRemoved(missing))
        }
    }

    fn floor_mut(&mut self, floor: usize) -> Result<&mut Floor, LayoutError> {
        self.floors.get_mut(floor).ok_or(LayoutError::UnknownFloor(floor))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Seat layout needs a name")]
    MissingName,

    #[error("Seat layout must have one or two floors, got {0}")]
    FloorCount(usize),

    #[error("Floor {0} does not exist")]
    UnknownFloor(usize),

    #[error("Floor {0} must keep at least one row")]
    NoRows(usize),

    #[error("Floor {0} has an empty row")]
    EmptyRow(usize),

    #[error("Every seat cell needs a positive number")]
    UnnumberedSeat,

    #[error("Only seat cells can be numbered, found a numbered {0:?}")]
    NumberedNonSeat(CellKind),

    #[error("Seat number {0} appears more than once")]
    DuplicateSeat(u32),

    #[error("Seat layout has no seats")]
    NoSeats,

    #[error("Seats {0:?} are held by active reservations")]
    HeldSeatsRemoved(Vec<u32>),

    #[error("No cell at floor {floor}, row {row}, column {column}")]
    OutOfBounds {
        floor: usize,
        row: usize,
        column: usize,
    },
}

impl From<LayoutError> for CoreError {
    fn from(err: LayoutError) -> Self {
        CoreError::ValidationFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn three_seats() -> SeatLayoutInput {
        SeatLayoutInput {
            name: "Mini".to_string(),
            floors: vec![Floor::new(vec![
                vec![Cell::seat(1), Cell::of(CellKind::Aisle), Cell::seat(2)],
                vec![Cell::seat(3), Cell::of(CellKind::Aisle), Cell::of(CellKind::Bathroom)],
            ])],
        }
    }

    #[test]
    fn test_valid_layout() {
        let layout = SeatLayout::new(three_seats()).unwrap();
        assert_eq!(layout.seat_count(), 3);
        assert!(layout.has_seat(2));
        assert!(!layout.has_seat(4));
    }

    #[test]
    fn test_duplicate_seat_numbers_rejected() {
        let mut input = three_seats();
        input.floors[0].rows[1][0] = Cell::seat(1);
        assert_eq!(SeatLayout::new(input).unwrap_err(), LayoutError::DuplicateSeat(1));
    }

    #[test]
    fn test_duplicate_across_floors_rejected() {
        let mut input = three_seats();
        input.floors.push(Floor::new(vec![vec![Cell::seat(3)]]));
        assert_eq!(SeatLayout::new(input).unwrap_err(), LayoutError::DuplicateSeat(3));
    }

    #[test]
    fn test_layout_without_seats_rejected() {
        let input = SeatLayoutInput {
            name: "Empty".to_string(),
            floors: vec![Floor::blank(2, 3)],
        };
        assert_eq!(SeatLayout::new(input).unwrap_err(), LayoutError::NoSeats);
    }

    #[test]
    fn test_numbered_amenity_rejected() {
        let mut input = three_seats();
        input.floors[0].rows[0][1] = Cell { kind: CellKind::Fridge, number: Some(9) };
        assert_eq!(SeatLayout::new(input).unwrap_err(), LayoutError::NumberedNonSeat(CellKind::Fridge));
    }

    #[test]
    fn test_rows_cannot_reach_zero() {
        let mut layout = SeatLayout::new(SeatLayoutInput {
            name: "One".to_string(),
            floors: vec![Floor::new(vec![vec![Cell::seat(1)]])],
        })
        .unwrap();

        assert_eq!(layout.remove_row(0).unwrap_err(), LayoutError::NoRows(0));

        layout.add_row(0, 1).unwrap();
        assert_eq!(layout.floors[0].rows.len(), 2);
        layout.remove_row(0).unwrap();
        assert_eq!(layout.floors[0].rows.len(), 1);
    }

    #[test]
    fn test_grid_edits_and_held_seats() {
        let mut layout = SeatLayout::new(three_seats()).unwrap();
        let held: BTreeSet<u32> = [2, 3].into_iter().collect();

        layout
            .apply_edit(&GridEdit::SetCell { floor: 0, row: 0, column: 0, cell: Cell::of(CellKind::Fridge) })
            .unwrap();
        assert!(layout.ensure_holds(&held).is_ok());

        layout.apply_edit(&GridEdit::RemoveRow { floor: 0 }).unwrap();
        assert_eq!(layout.ensure_holds(&held), Err(LayoutError::HeldSeatsRemoved(vec![3])));
    }

    #[test]
    fn test_grid_edit_wire_format() {
        let edit: GridEdit = serde_json::from_value(serde_json::json!({
            "op": "SET_CELL", "floor": 0, "row": 1, "column": 2, "cell": { "kind": "SEAT", "number": 7 }
        }))
        .unwrap();
        assert_eq!(edit, GridEdit::SetCell { floor: 0, row: 1, column: 2, cell: Cell::seat(7) });
    }

    #[test]
    fn test_second_floor_editing() {
        let mut layout = SeatLayout::new(three_seats()).unwrap();
        layout.add_second_floor(2, 2).unwrap();
        assert!(layout.add_second_floor(1, 1).is_err());

        layout.set_cell(1, 0, 0, Cell::seat(10)).unwrap();
        layout.validate().unwrap();
        assert!(layout.has_seat(10));

        assert!(layout.set_cell(1, 5, 0, Cell::seat(11)).is_err());
        layout.remove_second_floor().unwrap();
        assert!(!layout.has_seat(10));
    }
}
