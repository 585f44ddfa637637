pub mod config;
pub mod rewards;
pub mod steps;
pub mod water;
pub mod workout;

use pacepoint_core::DateKey;

/// Parses a `--date` argument, falling back to today in local time.
pub fn parse_or_today(raw: Option<&str>) -> Result<DateKey, Box<dyn std::error::Error>> {
    match raw {
        Some(s) => Ok(s.parse()?),
        None => Ok(DateKey::new(chrono::Local::now().date_naive())),
    }
}
