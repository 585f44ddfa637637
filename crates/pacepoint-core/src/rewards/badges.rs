//! Badge definitions and qualification rules.
//!
//! Badges are one-shot: once granted they are never revoked, even if the
//! streak that earned them later resets. Qualification reads best-ever streak
//! lengths and the lifetime points total, so evaluation order never matters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rewards::streaks::{StreakState, Track};

/// All badges a user can earn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Badge {
    /// Best water streak reached 3 days
    #[serde(rename = "hydration_3")]
    Hydration3,
    /// Best water streak reached 7 days
    #[serde(rename = "hydration_7")]
    Hydration7,
    /// Best steps-goal streak reached 7 days
    #[serde(rename = "walker_7")]
    Walker7,
    /// Finished at least one workout
    #[serde(rename = "first_run")]
    FirstRun,
    /// Lifetime points reached 500
    #[serde(rename = "points_500")]
    Points500,
    /// Lifetime points reached 1000
    #[serde(rename = "points_1000")]
    Points1000,
}

impl Badge {
    pub const ALL: [Badge; 6] = [
        Badge::Hydration3,
        Badge::Hydration7,
        Badge::Walker7,
        Badge::FirstRun,
        Badge::Points500,
        Badge::Points1000,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Badge::Hydration3 => "hydration_3",
            Badge::Hydration7 => "hydration_7",
            Badge::Walker7 => "walker_7",
            Badge::FirstRun => "first_run",
            Badge::Points500 => "points_500",
            Badge::Points1000 => "points_1000",
        }
    }

    /// Whether the user's record qualifies for this badge.
    pub fn qualifies(&self, streaks: &StreakState, points_total: u64) -> bool {
        match self {
            Badge::Hydration3 => streaks.track(Track::Water).best >= 3,
            Badge::Hydration7 => streaks.track(Track::Water).best >= 7,
            Badge::Walker7 => streaks.track(Track::StepsGoal).best >= 7,
            Badge::FirstRun => streaks.track(Track::Workout).best >= 1,
            Badge::Points500 => points_total >= 500,
            Badge::Points1000 => points_total >= 1000,
        }
    }
}

/// A badge held by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeGrant {
    pub uid: String,
    pub badge: Badge,
    pub earned_at: DateTime<Utc>,
}
