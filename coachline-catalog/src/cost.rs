use chrono::{DateTime, NaiveDate, Utc};
use coachline_core::payment::PaymentMethod;
use coachline_core::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostKind {
    Cost,
    Receipt,
}

/// Travel-scoped ledger entry outside of orders (fuel, tolls, extra receipts).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    pub id: Uuid,
    pub travel_id: Uuid,
    pub description: String,
    pub amount_cents: i64,
    pub date: NaiveDate,
    pub kind: CostKind,
    pub method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostInput {
    pub description: String,
    pub amount_cents: i64,
    pub date: NaiveDate,
    pub kind: CostKind,
    pub method: PaymentMethod,
}

impl Cost {
    pub fn new(travel_id: Uuid, input: CostInput) -> CoreResult<Self> {
        let now = Utc::now();
        let mut cost = Self {
            id: Uuid::new_v4(),
            travel_id,
            description: String::new(),
            amount_cents: 0,
            date: input.date,
            kind: input.kind,
            method: input.method,
            created_at: now,
            updated_at: now,
        };
        cost.apply(input)?;
        Ok(cost)
    }

    pub fn apply(&mut self, input: CostInput) -> CoreResult<()> {
        let description = input.description.trim();
        if description.is_empty() {
            return Err(CoreError::validation("Cost description is required"));
        }
        if input.amount_cents <= 0 {
            return Err(CoreError::validation("Cost amount must be positive"));
        }
        self.description = description.to_string();
        self.amount_cents = input.amount_cents;
        self.date = input.date;
        self.kind = input.kind;
        self.method = input.method;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Positive for receipts, negative for costs.
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            CostKind::Cost => -self.amount_cents,
            CostKind::Receipt => self.amount_cents,
        }
    }
}
