use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use coachline_catalog::{CatalogService, GridEdit, SeatLayout, SeatLayoutInput, SeatMap, Travel, TravelInput};
use coachline_core::master_password::MasterPasswordGate;
use coachline_core::payment::PaymentRecord;
use coachline_core::{paths, CoreError, CoreResult, Documents, UserId};
use uuid::Uuid;

use crate::changes::{ChangeHandler, OrderEdit, ReservationEdit, SeatMove};
use crate::finance::{compute_receivables, summarize_travel, Receivables, TravelSummary};
use crate::models::{NewOrder, Order, PaymentDetails, Reservation};
use crate::projection::{group_reservations, OrderView};

/// Order and reservation lifecycle over the document store.
///
/// Seat uniqueness is enforced twice: against the stored active reservations
/// and through a per-seat claim in the store, which settles races between
/// concurrent sessions.
#[derive(Clone)]
pub struct BookingEngine {
    docs: Documents,
    catalog: CatalogService,
    gate: MasterPasswordGate,
}

impl BookingEngine {
    pub fn new(docs: Documents, catalog: CatalogService, gate: MasterPasswordGate) -> Self {
        Self { docs, catalog, gate }
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Order with its reservations, ordered by seat number
    pub async fn get_order(&self, uid: &UserId, travel_id: Uuid, order_id: Uuid) -> CoreResult<Order> {
        let mut order: Order = self
            .docs
            .get(&paths::order(uid, travel_id, order_id))
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;
        order.reservations = self.load_reservations(uid, travel_id, order_id).await?;
        Ok(order)
    }

    pub async fn list_orders(&self, uid: &UserId, travel_id: Uuid) -> CoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self.docs.list(&paths::orders(uid, travel_id)).await?;
        for order in orders.iter_mut() {
            order.reservations = self.load_reservations(uid, travel_id, order.id).await?;
        }
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(orders)
    }

    /// Flat reservation stream of a travel, across all orders
    pub async fn list_reservations(&self, uid: &UserId, travel_id: Uuid) -> CoreResult<Vec<Reservation>> {
        Ok(self
            .list_orders(uid, travel_id)
            .await?
            .into_iter()
            .flat_map(|o| o.reservations)
            .collect())
    }

    /// Seats held by non-cancelled reservations on a travel
    pub async fn taken_seats(&self, uid: &UserId, travel_id: Uuid) -> CoreResult<BTreeSet<u32>> {
        Ok(self
            .list_orders(uid, travel_id)
            .await?
            .iter()
            .flat_map(|o| o.active_seats().collect::<Vec<_>>())
            .collect())
    }

    pub async fn seat_map(&self, uid: &UserId, travel_id: Uuid) -> CoreResult<SeatMap> {
        let travel = self.catalog.get_travel(uid, travel_id).await?;
        let layout = self.layout_for(uid, &travel).await?;
        let taken = self.taken_seats(uid, travel_id).await?;
        Ok(SeatMap::build(travel_id, &layout, &taken))
    }

    /// Reservations of a travel grouped by order, in order of first appearance
    pub async fn grouped_reservations(&self, uid: &UserId, travel_id: Uuid) -> CoreResult<Vec<OrderView>> {
        let orders = self.list_orders(uid, travel_id).await?;
        let reservations: Vec<Reservation> = orders.iter().flat_map(|o| o.reservations.clone()).collect();
        Ok(group_reservations(&reservations, &orders))
    }

    /// Received/receivable totals over active travels, optionally restricted
    /// to travels departing in a given month and/or year.
    pub async fn receivables(&self, uid: &UserId, month: Option<u32>, year: Option<i32>) -> CoreResult<Receivables> {
        if let Some(m) = month {
            if !(1..=12).contains(&m) {
                return Err(CoreError::validation("Month must be between 1 and 12"));
            }
        }

        let travels: HashMap<Uuid, Travel> = self
            .catalog
            .list_travels(uid, false)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let mut orders = Vec::new();
        for travel_id in travels.keys() {
            orders.extend(self.list_orders(uid, *travel_id).await?);
        }
        Ok(compute_receivables(&orders, &travels, month, year))
    }

    pub async fn travel_summary(&self, uid: &UserId, travel_id: Uuid) -> CoreResult<TravelSummary> {
        let travel = self
            .catalog
            .find_travel(uid, travel_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Travel", travel_id))?;
        let orders = self.list_orders(uid, travel_id).await?;
        let costs = self.catalog.list_costs(uid, travel_id).await?;
        Ok(summarize_travel(&travel, &orders, &costs))
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    pub async fn create_order(&self, uid: &UserId, new_order: NewOrder) -> CoreResult<Order> {
        validate_amounts(&new_order)?;
        ChangeHandler::validate_payer(&new_order.payer)?;

        let travel = self.catalog.get_travel(uid, new_order.travel_id).await?;
        if !travel.is_bookable() {
            return Err(CoreError::validation("Travel is not open for booking"));
        }
        let layout = self.layout_for(uid, &travel).await?;
        let taken = self.taken_seats(uid, travel.id).await?;
        if let Err(e) = check_seats(&new_order, &layout, &taken) {
            tracing::warn!("Booking rejected on travel {}: {}", travel.id, e);
            return Err(e);
        }

        for allocation in &new_order.seats {
            self.catalog.get_passenger(uid, allocation.passenger_id).await?;
        }

        let payments = if new_order.paid_cents > 0 {
            vec![PaymentRecord::new(
                new_order.payment_date.unwrap_or_else(|| Utc::now().date_naive()),
                new_order.paid_cents,
                new_order.payer.method,
            )]
        } else {
            Vec::new()
        };

        let notes = new_order.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let mut order = Order::new(
            travel.id,
            new_order.payer,
            PaymentDetails::new(new_order.total_cents, payments),
            notes,
        );
        for allocation in &new_order.seats {
            order.add_reservation(allocation);
        }

        let claims: Vec<(u32, Uuid)> = order.reservations.iter().map(|r| (r.seat_number, r.id)).collect();
        self.claim_seats(uid, travel.id, &claims).await?;

        if let Err(e) = self.save_order(uid, &order).await {
            self.release_seats(uid, travel.id, &claims).await;
            return Err(e);
        }

        tracing::info!(
            "Order {} created on travel {} for seats {:?} ({:?})",
            order.id,
            travel.id,
            order.active_seats().collect::<Vec<_>>(),
            order.status
        );
        Ok(order)
    }

    /// Cancels one reservation and frees its seat. Payment totals are kept.
    pub async fn cancel_reservation(
        &self,
        uid: &UserId,
        travel_id: Uuid,
        order_id: Uuid,
        reservation_id: Uuid,
        master_password: Option<&str>,
    ) -> CoreResult<Order> {
        self.gate.validate(uid, master_password).await?;
        let mut order = self.get_order(uid, travel_id, order_id).await?;

        let reservation = order
            .reservation_mut(reservation_id)
            .ok_or_else(|| CoreError::not_found("Reservation", reservation_id))?;
        let seat = reservation.seat_number;
        if !reservation.cancel() {
            return Ok(order);
        }
        order.refresh_status();

        self.save_order(uid, &order).await?;
        self.release_seats(uid, travel_id, &[(seat, reservation_id)]).await;

        tracing::info!("Reservation {} (seat {}) cancelled, order {} is {:?}", reservation_id, seat, order.id, order.status);
        Ok(order)
    }

    /// Cancels every reservation of the order in one write pass.
    pub async fn cancel_order(
        &self,
        uid: &UserId,
        travel_id: Uuid,
        order_id: Uuid,
        master_password: Option<&str>,
    ) -> CoreResult<Order> {
        self.gate.validate(uid, master_password).await?;
        let mut order = self.get_order(uid, travel_id, order_id).await?;

        let mut released = Vec::new();
        for reservation in order.reservations.iter_mut() {
            let seat = reservation.seat_number;
            if reservation.cancel() {
                released.push((seat, reservation.id));
            }
        }
        order.refresh_status();

        self.save_order(uid, &order).await?;
        self.release_seats(uid, travel_id, &released).await;

        tracing::info!("Order {} cancelled, released seats {:?}", order.id, released.iter().map(|(s, _)| s).collect::<Vec<_>>());
        Ok(order)
    }

    pub async fn record_payment(
        &self,
        uid: &UserId,
        travel_id: Uuid,
        order_id: Uuid,
        payment: PaymentRecord,
    ) -> CoreResult<Order> {
        if payment.amount_cents <= 0 {
            return Err(CoreError::validation("Payment amount must be positive"));
        }
        let mut order = self.get_order(uid, travel_id, order_id).await?;
        if order.is_cancelled() {
            return Err(CoreError::validation("Cannot record a payment on a cancelled order"));
        }

        order.payment.record(payment);
        order.refresh_status();
        self.save_order(uid, &order).await?;

        tracing::info!(
            "Payment recorded on order {}: paid {} remaining {} ({:?})",
            order.id,
            order.payment.paid_cents,
            order.payment.remaining_cents,
            order.status
        );
        Ok(order)
    }

    pub async fn edit_order(&self, uid: &UserId, travel_id: Uuid, order_id: Uuid, edit: OrderEdit) -> CoreResult<Order> {
        let travel = self.catalog.get_travel(uid, travel_id).await?;
        let layout = self.layout_for(uid, &travel).await?;
        let mut order = self.get_order(uid, travel_id, order_id).await?;

        for change in &edit.reservations {
            if let Some(passenger_id) = change.passenger_id {
                self.catalog.get_passenger(uid, passenger_id).await?;
            }
        }

        let own: BTreeSet<u32> = order.active_seats().collect();
        let taken_elsewhere: BTreeSet<u32> = self
            .taken_seats(uid, travel_id)
            .await?
            .into_iter()
            .filter(|s| !own.contains(s))
            .collect();

        let moves = ChangeHandler::apply(&mut order, &edit, &layout, &taken_elsewhere)?;
        self.move_claims(uid, travel_id, &moves).await?;

        if let Err(e) = self.save_order(uid, &order).await {
            self.undo_moves(uid, travel_id, &moves).await;
            return Err(e);
        }

        tracing::info!("Order {} edited, {} seat move(s)", order.id, moves.len());
        Ok(order)
    }

    pub async fn edit_reservation(
        &self,
        uid: &UserId,
        travel_id: Uuid,
        order_id: Uuid,
        edit: ReservationEdit,
    ) -> CoreResult<Order> {
        let edit = OrderEdit { reservations: vec![edit], ..Default::default() };
        self.edit_order(uid, travel_id, order_id, edit).await
    }

    /// Travel update that refuses to drop seats held by active reservations.
    pub async fn update_travel(&self, uid: &UserId, travel_id: Uuid, input: TravelInput) -> CoreResult<Travel> {
        let held = self.taken_seats(uid, travel_id).await?;
        self.catalog.update_travel(uid, travel_id, input, &held).await
    }

    pub async fn update_layout(&self, uid: &UserId, layout_id: Uuid, input: SeatLayoutInput) -> CoreResult<SeatLayout> {
        let held = self.seats_held_on_layout(uid, layout_id).await?;
        self.catalog.update_layout(uid, layout_id, input, &held).await
    }

    pub async fn edit_layout_grid(&self, uid: &UserId, layout_id: Uuid, edits: &[GridEdit]) -> CoreResult<SeatLayout> {
        let held = self.seats_held_on_layout(uid, layout_id).await?;
        self.catalog.edit_layout_grid(uid, layout_id, edits, &held).await
    }

    /// Hard delete of a travel with its orders, reservations, costs and seat claims.
    pub async fn delete_travel_permanently(
        &self,
        uid: &UserId,
        travel_id: Uuid,
        master_password: Option<&str>,
    ) -> CoreResult<()> {
        self.gate.validate(uid, master_password).await?;
        self.catalog
            .find_travel(uid, travel_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Travel", travel_id))?;

        for order in self.list_orders(uid, travel_id).await? {
            for reservation in &order.reservations {
                if reservation.is_active() {
                    self.release_seats(uid, travel_id, &[(reservation.seat_number, reservation.id)]).await;
                }
                self.docs.remove(&paths::reservation(uid, travel_id, order.id, reservation.id)).await?;
            }
            self.docs.remove(&paths::order(uid, travel_id, order.id)).await?;
        }
        for cost in self.catalog.list_costs(uid, travel_id).await? {
            self.docs.remove(&paths::cost(uid, travel_id, cost.id)).await?;
        }
        self.docs.remove(&paths::travel(uid, travel_id)).await?;

        tracing::info!("Travel {} permanently deleted", travel_id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn load_reservations(&self, uid: &UserId, travel_id: Uuid, order_id: Uuid) -> CoreResult<Vec<Reservation>> {
        let mut reservations: Vec<Reservation> = self.docs.list(&paths::reservations(uid, travel_id, order_id)).await?;
        reservations.sort_by_key(|r| r.seat_number);
        Ok(reservations)
    }

    async fn seats_held_on_layout(&self, uid: &UserId, layout_id: Uuid) -> CoreResult<BTreeSet<u32>> {
        let mut held = BTreeSet::new();
        for travel in self.catalog.travels_using_layout(uid, layout_id).await? {
            held.extend(self.taken_seats(uid, travel.id).await?);
        }
        Ok(held)
    }

    async fn layout_for(&self, uid: &UserId, travel: &Travel) -> CoreResult<SeatLayout> {
        let layout_id = travel
            .seat_layout_id
            .ok_or_else(|| CoreError::validation("Travel has no seat layout"))?;
        self.catalog.get_layout(uid, layout_id).await
    }

    async fn save_order(&self, uid: &UserId, order: &Order) -> CoreResult<()> {
        self.docs.put(&paths::order(uid, order.travel_id, order.id), order).await?;
        for reservation in &order.reservations {
            self.docs
                .put(&paths::reservation(uid, order.travel_id, order.id, reservation.id), reservation)
                .await?;
        }
        Ok(())
    }

    /// Claims every seat or none of them.
    async fn claim_seats(&self, uid: &UserId, travel_id: Uuid, seats: &[(u32, Uuid)]) -> CoreResult<()> {
        let mut claimed = Vec::new();
        for (seat, owner) in seats {
            let key = paths::seat_claim(uid, travel_id, *seat);
            if self.docs.claim(&key, &owner.to_string()).await? {
                claimed.push((*seat, *owner));
            } else {
                tracing::warn!("Seat {} on travel {} lost to a concurrent booking", seat, travel_id);
                self.release_seats(uid, travel_id, &claimed).await;
                return Err(CoreError::SeatUnavailable(*seat));
            }
        }
        Ok(())
    }

    /// Best effort; a claim left behind only blocks its own seat.
    async fn release_seats(&self, uid: &UserId, travel_id: Uuid, seats: &[(u32, Uuid)]) {
        for (seat, owner) in seats {
            let key = paths::seat_claim(uid, travel_id, *seat);
            if let Err(e) = self.docs.release(&key, &owner.to_string()).await {
                tracing::error!("Failed to release claim {}: {}", key, e);
            }
        }
    }

    /// Frees the old seats first so swaps inside one order can succeed.
    async fn move_claims(&self, uid: &UserId, travel_id: Uuid, moves: &[SeatMove]) -> CoreResult<()> {
        let old: Vec<(u32, Uuid)> = moves.iter().map(|m| (m.from, m.reservation_id)).collect();
        let new: Vec<(u32, Uuid)> = moves.iter().map(|m| (m.to, m.reservation_id)).collect();

        self.release_seats(uid, travel_id, &old).await;
        if let Err(e) = self.claim_seats(uid, travel_id, &new).await {
            if self.claim_seats(uid, travel_id, &old).await.is_err() {
                tracing::error!("Could not restore seat claims on travel {}", travel_id);
            }
            return Err(e);
        }
        Ok(())
    }

    async fn undo_moves(&self, uid: &UserId, travel_id: Uuid, moves: &[SeatMove]) {
        let old: Vec<(u32, Uuid)> = moves.iter().map(|m| (m.from, m.reservation_id)).collect();
        let new: Vec<(u32, Uuid)> = moves.iter().map(|m| (m.to, m.reservation_id)).collect();
        self.release_seats(uid, travel_id, &new).await;
        if self.claim_seats(uid, travel_id, &old).await.is_err() {
            tracing::error!("Could not restore seat claims on travel {}", travel_id);
        }
    }
}

fn validate_amounts(new_order: &NewOrder) -> CoreResult<()> {
    if new_order.seats.is_empty() {
        return Err(CoreError::validation("An order needs at least one seat"));
    }
    if new_order.total_cents < 0 {
        return Err(CoreError::validation("Total cannot be negative"));
    }
    if new_order.paid_cents < 0 {
        return Err(CoreError::validation("Paid amount cannot be negative"));
    }
    if new_order.paid_cents > new_order.total_cents {
        return Err(CoreError::validation("Paid amount cannot exceed the total"));
    }
    Ok(())
}

/// Seat preconditions of CreateOrder, checked in request order.
fn check_seats(new_order: &NewOrder, layout: &SeatLayout, taken: &BTreeSet<u32>) -> CoreResult<()> {
    let mut requested = BTreeSet::new();
    for allocation in &new_order.seats {
        let seat = allocation.seat_number;
        if !layout.has_seat(seat) {
            return Err(CoreError::InvalidSeat(seat));
        }
        if taken.contains(&seat) || !requested.insert(seat) {
            return Err(CoreError::SeatUnavailable(seat));
        }
    }
    Ok(())
}
