//! Scoring rules for each activity kind.
//!
//! Pure functions over `RewardsConfig`; no storage access here. The engine
//! in `rewards::mod` records the outcomes these rules compute.

use serde::{Deserialize, Serialize};

use crate::date::DateKey;
use crate::rewards::streaks::BackdatedPolicy;

/// Tunable scoring parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardsConfig {
    /// Milliliters of water per point
    #[serde(default = "default_water_ml_per_point")]
    pub water_ml_per_point: u64,
    /// Maximum water points per recording
    #[serde(default = "default_water_daily_cap")]
    pub water_daily_cap: u32,
    /// Daily total at which the hydration streak is credited
    #[serde(default = "default_hydration_threshold_ml")]
    pub hydration_threshold_ml: u64,
    /// Points for reaching the daily step goal
    #[serde(default = "default_steps_goal_points")]
    pub steps_goal_points: u32,
    /// Base points for finishing a workout
    #[serde(default = "default_workout_base_points")]
    pub workout_base_points: u32,
    /// Treatment of credits for days earlier than the last credited day
    #[serde(default)]
    pub backdated: BackdatedPolicy,
}

fn default_water_ml_per_point() -> u64 {
    250
}

fn default_water_daily_cap() -> u32 {
    16
}

fn default_hydration_threshold_ml() -> u64 {
    2000
}

fn default_steps_goal_points() -> u32 {
    50
}

fn default_workout_base_points() -> u32 {
    20
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            water_ml_per_point: default_water_ml_per_point(),
            water_daily_cap: default_water_daily_cap(),
            hydration_threshold_ml: default_hydration_threshold_ml(),
            steps_goal_points: default_steps_goal_points(),
            workout_base_points: default_workout_base_points(),
            backdated: BackdatedPolicy::default(),
        }
    }
}

/// What a water recording is worth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaterAssessment {
    /// Points for the increase, capped per recording
    pub points: u32,
    /// Increase over the previous daily total, zero if the total shrank
    pub delta_ml: u64,
    /// Ledger deduplication key for this recording
    pub key: String,
    /// True when the new daily total reaches the hydration threshold
    pub hydrated: bool,
}

/// Scores a change of a day's water total from `old_ml` to `new_ml`.
///
/// Points are paid for full `water_ml_per_point` units of the increase only;
/// decreases and partial units earn nothing. The key embeds the new total so
/// each distinct total can be awarded at most once per day.
pub fn assess_water(
    config: &RewardsConfig,
    date_key: DateKey,
    old_ml: u64,
    new_ml: u64,
) -> WaterAssessment {
    let delta_ml = new_ml.saturating_sub(old_ml);
    let units = if config.water_ml_per_point == 0 {
        0
    } else {
        delta_ml / config.water_ml_per_point
    };
    let points = (units.min(config.water_daily_cap as u64)) as u32;
    WaterAssessment {
        points,
        delta_ml,
        key: format!("{date_key}:{new_ml}"),
        hydrated: new_ml >= config.hydration_threshold_ml,
    }
}

/// Points for a finished workout: a flat base plus one per full kilometer.
pub fn workout_points(config: &RewardsConfig, distance_km: f64) -> u32 {
    let km = if distance_km.is_finite() && distance_km > 0.0 {
        distance_km.floor() as u32
    } else {
        0
    };
    config.workout_base_points.saturating_add(km)
}
