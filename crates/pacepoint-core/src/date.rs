//! Calendar-day keys and day-to-day transitions.
//!
//! All streak logic runs on whole calendar days in the user's local timezone.
//! A `DateKey` wraps a `chrono::NaiveDate` so day arithmetic goes through the
//! calendar instead of millisecond subtraction, which keeps DST transitions
//! and month/year boundaries correct by construction.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// A calendar day in the user's local timezone, serialized as `YYYY-MM-DD`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        DateKey(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let date = NaiveDate::parse_from_str(raw, DATE_KEY_FORMAT).map_err(|_| {
            ValidationError::InvalidDateKey {
                raw: raw.to_string(),
            }
        })?;
        // Reject inputs chrono would accept loosely, e.g. "2024-1-5".
        if date.format(DATE_KEY_FORMAT).to_string() != raw {
            return Err(ValidationError::InvalidDateKey {
                raw: raw.to_string(),
            });
        }
        Ok(DateKey(date))
    }
}

/// Relationship between a streak's last credited day and the day being credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStep {
    /// No previous day recorded
    First,
    /// Same calendar day as the last credit
    Same,
    /// Exactly the next calendar day
    Next,
    /// Two or more days later
    Gap,
    /// Earlier than the last credited day
    Backdated,
}

/// Classifies the step from `prev` to `next` in whole calendar days.
pub fn day_step(prev: Option<DateKey>, next: DateKey) -> DayStep {
    let prev = match prev {
        Some(p) => p,
        None => return DayStep::First,
    };
    match next.date().signed_duration_since(prev.date()).num_days() {
        0 => DayStep::Same,
        1 => DayStep::Next,
        d if d > 1 => DayStep::Gap,
        _ => DayStep::Backdated,
    }
}
