use std::collections::HashMap;

use chrono::Datelike;
use coachline_catalog::{Cost, CostKind, Travel};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{BookingStatus, Order};

/// Month-level cash position across travels.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Receivables {
    pub total_received_cents: i64,
    pub total_receivable_cents: i64,
    pub order_count: usize,
}

/// Sums paid and outstanding amounts over non-cancelled orders whose travel
/// is in `travels` and departs within the requested month/year.
///
/// With a filter set, orders of travels without a departure are left out.
pub fn compute_receivables(
    orders: &[Order],
    travels: &HashMap<Uuid, Travel>,
    month: Option<u32>,
    year: Option<i32>,
) -> Receivables {
    let mut totals = Receivables::default();

    for order in orders {
        if order.status == BookingStatus::Cancelled {
            continue;
        }
        let Some(travel) = travels.get(&order.travel_id) else {
            continue;
        };
        if !departs_within(travel, month, year) {
            continue;
        }
        totals.total_received_cents += order.payment.paid_cents;
        totals.total_receivable_cents += order.payment.remaining_cents;
        totals.order_count += 1;
    }

    totals
}

fn departs_within(travel: &Travel, month: Option<u32>, year: Option<i32>) -> bool {
    if month.is_none() && year.is_none() {
        return true;
    }
    let Some(departure) = travel.departure else {
        return false;
    };
    month.map_or(true, |m| departure.month() == m) && year.map_or(true, |y| departure.year() == y)
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TravelSummary {
    pub travel_id: Uuid,
    pub received_cents: i64,
    pub receivable_cents: i64,
    pub extra_receipts_cents: i64,
    pub costs_cents: i64,
    /// received + extra receipts - costs
    pub balance_cents: i64,
    pub seats_sold: usize,
    pub cancelled_orders: usize,
}

pub fn summarize_travel(travel: &Travel, orders: &[Order], costs: &[Cost]) -> TravelSummary {
    let mut summary = TravelSummary { travel_id: travel.id, ..Default::default() };

    for order in orders.iter().filter(|o| o.travel_id == travel.id) {
        if order.is_cancelled() {
            summary.cancelled_orders += 1;
            continue;
        }
        summary.received_cents += order.payment.paid_cents;
        summary.receivable_cents += order.payment.remaining_cents;
        summary.seats_sold += order.active_seats().count();
    }

    for cost in costs.iter().filter(|c| c.travel_id == travel.id) {
        match cost.kind {
            CostKind::Cost => summary.costs_cents += cost.amount_cents,
            CostKind::Receipt => summary.extra_receipts_cents += cost.amount_cents,
        }
    }

    summary.balance_cents = summary.received_cents + summary.extra_receipts_cents - summary.costs_cents;
    summary
}
