use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const DEFAULT_VISIT_MINUTES: i32 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub id: String,
    pub organization_id: String,
    pub client_id: Option<String>,
    pub service_name: String,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: i32,
    pub price: Option<String>,
    pub status: VisitStatus,
    pub notes: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Visit {
    pub fn ends_at(&self) -> NaiveDateTime {
        self.scheduled_at + chrono::Duration::minutes(self.duration_minutes as i64)
    }

    /// Half-open interval intersection with `[start, end)`.
    pub fn overlaps(&self, start: &NaiveDateTime, end: &NaiveDateTime) -> bool {
        self.scheduled_at < *end && self.ends_at() > *start
    }
}

/// A visit that has not been written yet.
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub organization_id: String,
    pub client_id: Option<String>,
    pub service_name: String,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: i32,
    pub price: Option<String>,
    pub notes: String,
}

impl NewVisit {
    pub fn ends_at(&self) -> NaiveDateTime {
        self.scheduled_at + chrono::Duration::minutes(self.duration_minutes as i64)
    }
}

/// Outcome of an atomic check-and-insert.
#[derive(Debug)]
pub enum Reservation {
    Created(Visit),
    Conflict(Vec<Visit>),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl VisitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStatus::Scheduled => "scheduled",
            VisitStatus::Completed => "completed",
            VisitStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(VisitStatus::Scheduled),
            "completed" => Some(VisitStatus::Completed),
            "cancelled" => Some(VisitStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether a visit in this status still occupies its time slot.
    pub fn occupies_slot(&self) -> bool {
        matches!(self, VisitStatus::Scheduled | VisitStatus::Completed)
    }

    pub fn can_transition_to(&self, next: VisitStatus) -> bool {
        matches!(
            (self, next),
            (VisitStatus::Scheduled, VisitStatus::Completed)
                | (VisitStatus::Scheduled, VisitStatus::Cancelled)
        )
    }
}
