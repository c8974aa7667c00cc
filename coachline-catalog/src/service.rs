use std::collections::BTreeSet;

use chrono::Utc;
use coachline_core::master_password::MasterPasswordGate;
use coachline_core::{paths, CoreError, CoreResult, Documents, UserId};
use serde::Deserialize;
use uuid::Uuid;

use crate::cost::{Cost, CostInput};
use crate::layout::{GridEdit, SeatLayout, SeatLayoutInput};
use crate::passenger::{GuardianRef, Passenger, PassengerInput};
use crate::travel::{generate_code, Travel, TravelInput};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CatalogRules {
    /// Age at which a passenger no longer needs a guardian
    #[serde(default = "default_adult_age")]
    pub adult_age: u32,
}

fn default_adult_age() -> u32 { 18 }

impl Default for CatalogRules {
    fn default() -> Self {
        Self { adult_age: default_adult_age() }
    }
}

/// CRUD over travels, seat layouts, passengers and travel costs.
#[derive(Clone)]
pub struct CatalogService {
    docs: Documents,
    gate: MasterPasswordGate,
    rules: CatalogRules,
}

impl CatalogService {
    pub fn new(docs: Documents, gate: MasterPasswordGate, rules: CatalogRules) -> Self {
        Self { docs, gate, rules }
    }

    pub fn rules(&self) -> CatalogRules {
        self.rules
    }

    // ------------------------------------------------------------------
    // Travels
    // ------------------------------------------------------------------

    pub async fn create_travel(&self, uid: &UserId, input: TravelInput) -> CoreResult<Travel> {
        if let Some(layout_id) = input.seat_layout_id {
            self.get_layout(uid, layout_id).await?;
        }

        let existing: Vec<Travel> = self.docs.list(&paths::travels(uid)).await?;
        let mut code = generate_code();
        for _ in 0..5 {
            if !existing.iter().any(|t| t.code == code) {
                break;
            }
            code = generate_code();
        }

        let travel = Travel::new(code, input)?;
        self.docs.put(&paths::travel(uid, travel.id), &travel).await?;
        tracing::info!("Travel {} ({}) created: {} -> {}", travel.code, travel.id, travel.origin, travel.destination);
        Ok(travel)
    }

    /// `held_seats` are the seats of the travel's active reservations; the
    /// resulting layout must still contain all of them.
    pub async fn update_travel(
        &self,
        uid: &UserId,
        travel_id: Uuid,
        input: TravelInput,
        held_seats: &BTreeSet<u32>,
    ) -> CoreResult<Travel> {
        let mut travel = self.get_travel(uid, travel_id).await?;
        match input.seat_layout_id {
            Some(layout_id) => self.get_layout(uid, layout_id).await?.ensure_holds(held_seats)?,
            None if !held_seats.is_empty() => {
                return Err(CoreError::validation("A travel with active reservations needs a seat layout"));
            }
            None => {}
        }
        travel.apply(input)?;
        self.docs.put(&paths::travel(uid, travel.id), &travel).await?;
        tracing::info!("Travel {} updated", travel.id);
        Ok(travel)
    }

    /// Any stored travel, including cancelled or soft-deleted ones.
    pub async fn find_travel(&self, uid: &UserId, travel_id: Uuid) -> CoreResult<Option<Travel>> {
        self.docs.get(&paths::travel(uid, travel_id)).await
    }

    /// Active travel or `NotFound`.
    pub async fn get_travel(&self, uid: &UserId, travel_id: Uuid) -> CoreResult<Travel> {
        self.find_travel(uid, travel_id)
            .await?
            .filter(|t| t.active)
            .ok_or_else(|| CoreError::not_found("Travel", travel_id))
    }

    pub async fn list_travels(&self, uid: &UserId, include_inactive: bool) -> CoreResult<Vec<Travel>> {
        let mut travels: Vec<Travel> = self
            .docs
            .list::<Travel>(&paths::travels(uid))
            .await?
            .into_iter()
            .filter(|t| include_inactive || t.active)
            .collect();
        travels.sort_by(|a, b| a.departure.cmp(&b.departure).then(a.created_at.cmp(&b.created_at)));
        Ok(travels)
    }

    pub async fn cancel_travel(&self, uid: &UserId, travel_id: Uuid, master_password: Option<&str>) -> CoreResult<Travel> {
        self.gate.validate(uid, master_password).await?;
        let mut travel = self.get_travel(uid, travel_id).await?;
        travel.cancel();
        self.docs.put(&paths::travel(uid, travel.id), &travel).await?;
        tracing::info!("Travel {} cancelled", travel.id);
        Ok(travel)
    }

    // ------------------------------------------------------------------
    // Seat layouts
    // ------------------------------------------------------------------

    pub async fn create_layout(&self, uid: &UserId, input: SeatLayoutInput) -> CoreResult<SeatLayout> {
        let layout = SeatLayout::new(input)?;
        self.docs.put(&paths::seat_layout(uid, layout.id), &layout).await?;
        tracing::info!("Seat layout '{}' created with {} seats", layout.name, layout.seat_count());
        Ok(layout)
    }

    /// `held_seats` are the seats of active reservations on every active
    /// travel using this layout.
    pub async fn update_layout(
        &self,
        uid: &UserId,
        layout_id: Uuid,
        input: SeatLayoutInput,
        held_seats: &BTreeSet<u32>,
    ) -> CoreResult<SeatLayout> {
        let mut layout = self.get_layout(uid, layout_id).await?;
        layout.name = input.name.trim().to_string();
        layout.floors = input.floors;
        self.save_layout(uid, layout, held_seats).await
    }

    /// Applies grid edits in order; the layout is saved only if the end result is valid.
    pub async fn edit_layout_grid(
        &self,
        uid: &UserId,
        layout_id: Uuid,
        edits: &[GridEdit],
        held_seats: &BTreeSet<u32>,
    ) -> CoreResult<SeatLayout> {
        let mut layout = self.get_layout(uid, layout_id).await?;
        for edit in edits {
            layout.apply_edit(edit)?;
        }
        self.save_layout(uid, layout, held_seats).await
    }

    async fn save_layout(&self, uid: &UserId, mut layout: SeatLayout, held_seats: &BTreeSet<u32>) -> CoreResult<SeatLayout> {
        layout.validate()?;
        if let Err(e) = layout.ensure_holds(held_seats) {
            tracing::warn!("Seat layout {} change rejected: {}", layout.id, e);
            return Err(e.into());
        }
        layout.updated_at = Utc::now();
        self.docs.put(&paths::seat_layout(uid, layout.id), &layout).await?;
        tracing::info!("Seat layout {} updated", layout.id);
        Ok(layout)
    }

    /// Active travels that use the layout.
    pub async fn travels_using_layout(&self, uid: &UserId, layout_id: Uuid) -> CoreResult<Vec<Travel>> {
        Ok(self
            .list_travels(uid, false)
            .await?
            .into_iter()
            .filter(|t| t.seat_layout_id == Some(layout_id))
            .collect())
    }

    pub async fn get_layout(&self, uid: &UserId, layout_id: Uuid) -> CoreResult<SeatLayout> {
        self.docs
            .get(&paths::seat_layout(uid, layout_id))
            .await?
            .ok_or_else(|| CoreError::not_found("SeatLayout", layout_id))
    }

    pub async fn list_layouts(&self, uid: &UserId) -> CoreResult<Vec<SeatLayout>> {
        let mut layouts: Vec<SeatLayout> = self.docs.list(&paths::seat_layouts(uid)).await?;
        layouts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(layouts)
    }

    /// Layouts still used by an active travel cannot be deleted.
    pub async fn delete_layout(&self, uid: &UserId, layout_id: Uuid) -> CoreResult<()> {
        self.get_layout(uid, layout_id).await?;
        if !self.travels_using_layout(uid, layout_id).await?.is_empty() {
            return Err(CoreError::validation("Seat layout is used by an active travel"));
        }
        self.docs.remove(&paths::seat_layout(uid, layout_id)).await?;
        tracing::info!("Seat layout {} deleted", layout_id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Passengers
    // ------------------------------------------------------------------

    pub async fn create_passenger(&self, uid: &UserId, input: PassengerInput) -> CoreResult<Passenger> {
        let mut passenger = Passenger::new(&input, None)?;
        self.ensure_unique_documents(uid, &passenger, None).await?;

        passenger.guardian_id = self
            .resolve_guardian(uid, &passenger, input.guardian.as_ref(), None)
            .await?;

        self.docs.put(&paths::passenger(uid, passenger.id), &passenger).await?;
        tracing::info!("Passenger {} registered", passenger.id);
        Ok(passenger)
    }

    pub async fn update_passenger(&self, uid: &UserId, passenger_id: Uuid, input: PassengerInput) -> CoreResult<Passenger> {
        let mut passenger = self.get_passenger(uid, passenger_id).await?;
        let current_guardian = passenger.guardian_id;
        passenger.apply(&input, current_guardian)?;
        self.ensure_unique_documents(uid, &passenger, Some(passenger.id)).await?;

        passenger.guardian_id = self
            .resolve_guardian(uid, &passenger, input.guardian.as_ref(), current_guardian)
            .await?;

        self.docs.put(&paths::passenger(uid, passenger.id), &passenger).await?;
        tracing::info!("Passenger {} updated", passenger.id);
        Ok(passenger)
    }

    pub async fn get_passenger(&self, uid: &UserId, passenger_id: Uuid) -> CoreResult<Passenger> {
        self.docs
            .get::<Passenger>(&paths::passenger(uid, passenger_id))
            .await?
            .filter(|p| p.active)
            .ok_or_else(|| CoreError::not_found("Passenger", passenger_id))
    }

    pub async fn list_passengers(&self, uid: &UserId) -> CoreResult<Vec<Passenger>> {
        let mut passengers: Vec<Passenger> = self
            .docs
            .list::<Passenger>(&paths::passengers(uid))
            .await?
            .into_iter()
            .filter(|p| p.active)
            .collect();
        passengers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(passengers)
    }

    /// Soft delete, so past reservations keep resolving their passenger.
    pub async fn delete_passenger(&self, uid: &UserId, passenger_id: Uuid, master_password: Option<&str>) -> CoreResult<()> {
        self.gate.validate(uid, master_password).await?;
        let mut passenger = self.get_passenger(uid, passenger_id).await?;
        passenger.active = false;
        passenger.updated_at = Utc::now();
        self.docs.put(&paths::passenger(uid, passenger.id), &passenger).await?;
        tracing::info!("Passenger {} deactivated", passenger.id);
        Ok(())
    }

    async fn ensure_unique_documents(&self, uid: &UserId, candidate: &Passenger, exclude: Option<Uuid>) -> CoreResult<()> {
        let passengers = self.list_passengers(uid).await?;
        for other in passengers.iter().filter(|p| Some(p.id) != exclude) {
            if let Some(label) = candidate.shared_document(other) {
                tracing::warn!("Duplicate {} rejected for passenger {}", label, candidate.id);
                return Err(CoreError::DuplicateDocument(label.to_string()));
            }
        }
        Ok(())
    }

    /// Adults never keep a guardian. Minors need one: the requested guardian,
    /// else the one already linked.
    async fn resolve_guardian(
        &self,
        uid: &UserId,
        subject: &Passenger,
        requested: Option<&GuardianRef>,
        current: Option<Uuid>,
    ) -> CoreResult<Option<Uuid>> {
        let today = Utc::now().date_naive();
        if !subject.is_minor_on(today, self.rules.adult_age) {
            return Ok(None);
        }

        match requested {
            Some(GuardianRef::Existing { id }) => {
                if *id == subject.id {
                    return Err(CoreError::validation("A passenger cannot be their own guardian"));
                }
                let guardian = self.get_passenger(uid, *id).await?;
                if guardian.is_minor_on(today, self.rules.adult_age) {
                    return Err(CoreError::validation("Guardian must be an adult"));
                }
                Ok(Some(guardian.id))
            }
            Some(GuardianRef::New(guardian_input)) => {
                let guardian = Passenger::new(guardian_input, None)?;
                if guardian.is_minor_on(today, self.rules.adult_age) {
                    return Err(CoreError::validation("Guardian must be an adult"));
                }
                if let Some(label) = guardian.shared_document(subject) {
                    return Err(CoreError::DuplicateDocument(label.to_string()));
                }
                self.ensure_unique_documents(uid, &guardian, None).await?;
                self.docs.put(&paths::passenger(uid, guardian.id), &guardian).await?;
                tracing::info!("Guardian {} registered for passenger {}", guardian.id, subject.id);
                Ok(Some(guardian.id))
            }
            None => match current {
                Some(id) => Ok(Some(self.get_passenger(uid, id).await?.id)),
                None => Err(CoreError::validation("A minor passenger needs a guardian")),
            },
        }
    }

    // ------------------------------------------------------------------
    // Travel costs
    // ------------------------------------------------------------------

    pub async fn add_cost(&self, uid: &UserId, travel_id: Uuid, input: CostInput) -> CoreResult<Cost> {
        self.find_travel(uid, travel_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Travel", travel_id))?;
        let cost = Cost::new(travel_id, input)?;
        self.docs.put(&paths::cost(uid, travel_id, cost.id), &cost).await?;
        tracing::info!("{:?} of {} recorded on travel {}", cost.kind, cost.amount_cents, travel_id);
        Ok(cost)
    }

    pub async fn update_cost(&self, uid: &UserId, travel_id: Uuid, cost_id: Uuid, input: CostInput) -> CoreResult<Cost> {
        let mut cost = self.get_cost(uid, travel_id, cost_id).await?;
        cost.apply(input)?;
        self.docs.put(&paths::cost(uid, travel_id, cost.id), &cost).await?;
        Ok(cost)
    }

    pub async fn get_cost(&self, uid: &UserId, travel_id: Uuid, cost_id: Uuid) -> CoreResult<Cost> {
        self.docs
            .get(&paths::cost(uid, travel_id, cost_id))
            .await?
            .ok_or_else(|| CoreError::not_found("Cost", cost_id))
    }

    pub async fn delete_cost(&self, uid: &UserId, travel_id: Uuid, cost_id: Uuid) -> CoreResult<()> {
        self.get_cost(uid, travel_id, cost_id).await?;
        self.docs.remove(&paths::cost(uid, travel_id, cost_id)).await
    }

    pub async fn list_costs(&self, uid: &UserId, travel_id: Uuid) -> CoreResult<Vec<Cost>> {
        let mut costs: Vec<Cost> = self.docs.list(&paths::costs(uid, travel_id)).await?;
        costs.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(costs)
    }
}
