//! Event domain model.
//!
//! # Responsibility
//! - Define the canonical scheduled-event record.
//! - Validate authoring rules before persistence.
//!
//! # Invariants
//! - `id == 0` means the event has not been persisted yet.
//! - `time` is always an absolute UTC instant.
//! - `duration_hours` is positive, a multiple of 0.5 and at most 24.
//! - Expanded series instances carry no link to their siblings.

use crate::model::color::EventColor;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned event identifier.
pub type EventId = i64;

/// Upper bound for a single event duration.
pub const MAX_DURATION_HOURS: f64 = 24.0;

/// Canonical scheduled event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// `0` until the store assigns an id.
    pub id: EventId,
    pub name: String,
    pub description: String,
    pub location: String,
    /// Start instant, persisted in UTC.
    pub time: DateTime<Utc>,
    pub duration_hours: f64,
    /// Spacing between series instances; `0` means non-recurring.
    pub frequency_days: u32,
    /// Number of instances generated at authoring time.
    pub occurrence_count: u32,
    /// Explicit color; `None` derives one from `name`.
    pub color: Option<EventColor>,
}

impl Event {
    /// Creates a single, non-recurring event with unset color.
    pub fn new(name: impl Into<String>, time: DateTime<Utc>, duration_hours: f64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: String::new(),
            location: String::new(),
            time,
            duration_hours,
            frequency_days: 0,
            occurrence_count: 1,
            color: None,
        }
    }

    /// Returns the display color, deriving it from `name` when unset.
    pub fn color(&self) -> EventColor {
        self.color
            .unwrap_or_else(|| EventColor::from_name(self.name.as_str()))
    }

    /// End instant (`time + duration_hours`).
    pub fn end_time(&self) -> DateTime<Utc> {
        self.time + Duration::minutes((self.duration_hours * 60.0).round() as i64)
    }

    /// Whether this event was authored with repetition.
    pub fn is_recurring(&self) -> bool {
        self.frequency_days > 0 && self.occurrence_count > 1
    }

    /// Validates authoring invariants.
    ///
    /// # Errors
    /// - `EmptyName` when `name` is blank after trim.
    /// - `InvalidDuration` when the duration is not a positive half-hour
    ///   multiple up to 24 hours.
    /// - `ZeroOccurrences` when `occurrence_count == 0`.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.name.trim().is_empty() {
            return Err(EventValidationError::EmptyName);
        }
        if !is_valid_duration(self.duration_hours) {
            return Err(EventValidationError::InvalidDuration(self.duration_hours));
        }
        if self.occurrence_count == 0 {
            return Err(EventValidationError::ZeroOccurrences);
        }
        Ok(())
    }
}

/// Authoring rule violations.
#[derive(Debug, Clone, PartialEq)]
pub enum EventValidationError {
    EmptyName,
    InvalidDuration(f64),
    ZeroOccurrences,
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "event name must not be blank"),
            Self::InvalidDuration(hours) => write!(
                f,
                "invalid duration {hours}h; expected a positive multiple of 0.5 up to {MAX_DURATION_HOURS}"
            ),
            Self::ZeroOccurrences => write!(f, "occurrence count must be at least 1"),
        }
    }
}

impl Error for EventValidationError {}

fn is_valid_duration(hours: f64) -> bool {
    if !hours.is_finite() || hours <= 0.0 || hours > MAX_DURATION_HOURS {
        return false;
    }
    (hours * 2.0).fract() == 0.0
}
