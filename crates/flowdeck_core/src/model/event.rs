//! Event domain model.
//!
//! # Responsibility
//! - Define the calendar event record.
//! - Pin down the derived completion rule shared by classifier and scoring.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another event.
//! - `end_at` should not be earlier than `start_at`; this layer stores what
//!   it is given and does not reject inverted ranges.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for an event.
pub type EventId = Uuid;

/// Event category used by summary tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Work,
    Personal,
    Social,
    Health,
    Other,
}

impl EventCategory {
    /// Human-readable label used in summary text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Personal => "personal",
            Self::Social => "social",
            Self::Health => "health",
            Self::Other => "other",
        }
    }
}

/// Canonical calendar event record.
///
/// Events carry no stored completion flag; an event counts as completed once
/// its end time has passed. That single rule feeds both the kanban classifier
/// and the flow-score completion component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub uuid: EventId,
    pub title: String,
    pub location: Option<String>,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub category: EventCategory,
    pub notes: Option<String>,
    /// Reminder lead time; delivery happens outside this core.
    pub reminder_minutes: Option<i64>,
    /// RRULE text stored pass-through; expansion happens outside this core.
    pub recurrence_rule: Option<String>,
    pub recurrence_end: Option<chrono::NaiveDate>,
    pub owner_id: String,
}

impl Event {
    /// Creates a new event with a generated stable ID.
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        start_at: NaiveDateTime,
        end_at: NaiveDateTime,
        category: EventCategory,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            title: title.into(),
            location: None,
            start_at,
            end_at,
            category,
            notes: None,
            reminder_minutes: None,
            recurrence_rule: None,
            recurrence_end: None,
            owner_id: owner_id.into(),
        }
    }

    /// Whether this event counts as completed at `now`.
    pub fn is_finished(&self, now: NaiveDateTime) -> bool {
        self.end_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::{Event, EventCategory};
    use chrono::NaiveDate;

    #[test]
    fn finished_exactly_at_end_time() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let event = Event::new("owner", "standup", start, end, EventCategory::Work);

        assert!(!event.is_finished(start));
        assert!(event.is_finished(end));
    }
}
