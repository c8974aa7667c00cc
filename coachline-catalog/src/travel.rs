use chrono::{DateTime, NaiveDateTime, Utc};
use coachline_core::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display status derived from dates and the cancelled flag
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelDisplayStatus {
    Created,
    Upcoming,
    InProgress,
    Ended,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Travel {
    pub id: Uuid,
    /// Short code shown to operators and passengers
    pub code: String,
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub departure: Option<NaiveDateTime>,
    #[serde(default)]
    pub return_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub one_way: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub seat_layout_id: Option<Uuid>,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(rename = "estaAtivo", alias = "active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelInput {
    pub origin: String,
    pub destination: String,
    pub departure: Option<NaiveDateTime>,
    #[serde(default)]
    pub return_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub one_way: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub seat_layout_id: Option<Uuid>,
}

impl TravelInput {
    /// Trims text fields, drops the return leg of one-way travels and checks
    /// that a return comes strictly after departure.
    pub fn normalized(mut self) -> CoreResult<Self> {
        self.origin = self.origin.trim().to_string();
        self.destination = self.destination.trim().to_string();
        self.notes = self.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

        if self.origin.is_empty() {
            return Err(CoreError::validation("Origin is required"));
        }
        if self.destination.is_empty() {
            return Err(CoreError::validation("Destination is required"));
        }
        let departure = self
            .departure
            .ok_or_else(|| CoreError::validation("Departure date and time are required"))?;

        if self.one_way {
            self.return_at = None;
        }
        if let Some(return_at) = self.return_at {
            if return_at <= departure {
                return Err(CoreError::validation("Return must be after departure"));
            }
        }
        Ok(self)
    }
}

impl Travel {
    pub fn new(code: String, input: TravelInput) -> CoreResult<Self> {
        let input = input.normalized()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            code,
            origin: input.origin,
            destination: input.destination,
            departure: input.departure,
            return_at: input.return_at,
            one_way: input.one_way,
            notes: input.notes,
            seat_layout_id: input.seat_layout_id,
            cancelled: false,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, input: TravelInput) -> CoreResult<()> {
        let input = input.normalized()?;
        self.origin = input.origin;
        self.destination = input.destination;
        self.departure = input.departure;
        self.return_at = input.return_at;
        self.one_way = input.one_way;
        self.notes = input.notes;
        self.seat_layout_id = input.seat_layout_id;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Soft delete: cancelled travels leave the active listing.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.active = false;
        self.updated_at = Utc::now();
    }

    pub fn is_bookable(&self) -> bool {
        self.active && !self.cancelled
    }

    pub fn display_status(&self, now: NaiveDateTime) -> TravelDisplayStatus {
        derive_display_status(self, now)
    }
}

pub fn derive_display_status(travel: &Travel, now: NaiveDateTime) -> TravelDisplayStatus {
    if travel.cancelled {
        return TravelDisplayStatus::Cancelled;
    }
    let Some(departure) = travel.departure else {
        return TravelDisplayStatus::Created;
    };
    let end = travel.return_at.unwrap_or(departure);

    if now >= departure && now <= end {
        TravelDisplayStatus::InProgress
    } else if departure > now {
        TravelDisplayStatus::Upcoming
    } else {
        TravelDisplayStatus::Ended
    }
}

/// Six-character uppercase code taken from a fresh id.
pub fn generate_code() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_uppercase()
}
