//! Activity tracking services: water, steps, and workouts.
//!
//! Each tracker persists the activity data first and then feeds the reward
//! engine. Award failures are reported and swallowed so a scoring hiccup can
//! never lose a recorded total or a finished workout.

mod steps;
mod water;
mod workouts;

pub use steps::{StepsDay, StepsTracker, StepsUpdate};
pub use water::{WaterDay, WaterTracker, WaterUpdate};
pub use workouts::{
    RoutePoint, Workout, WorkoutFinish, WorkoutLog, WorkoutMetrics, WorkoutStatus,
};

use crate::error::StoreError;
use crate::rewards::AwardOutcome;

/// Unwraps an award result, logging failures instead of propagating them.
pub(crate) fn award_or_log(
    uid: &str,
    what: &str,
    result: Result<AwardOutcome, StoreError>,
) -> AwardOutcome {
    match result {
        Ok(award) => award,
        Err(e) => {
            eprintln!("Warning: {what} award failed for {uid}: {e}");
            AwardOutcome::none()
        }
    }
}

/// Clamps a reported magnitude to a non-negative finite value.
pub(crate) fn clamp_non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}
