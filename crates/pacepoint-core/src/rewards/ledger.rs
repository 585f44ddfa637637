//! Reward event types.
//!
//! Every points award is an append-only `RewardEvent`. The triple
//! `(uid, kind, key)` is unique per user; a second attempt with the same
//! triple is a duplicate and awards nothing. The total score is derived by
//! summing event points, never stored as a separate counter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of a reward event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Water,
    StepsGoal,
    WorkoutFinish,
}

impl RewardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardKind::Water => "water",
            RewardKind::StepsGoal => "steps_goal",
            RewardKind::WorkoutFinish => "workout_finish",
        }
    }
}

/// One immutable entry in a user's reward ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardEvent {
    pub uid: String,
    pub kind: RewardKind,
    /// Deduplication key, unique per `(uid, kind)`.
    pub key: String,
    pub points: u32,
    /// Free-form context, e.g. `{"delta_ml": 500}`.
    #[serde(default)]
    pub meta: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Result of attempting to record a reward event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    /// True when a new event was written. False for duplicates and
    /// zero-point attempts.
    pub awarded: bool,
    /// Points actually credited by this call. Zero unless `awarded`.
    pub points: u32,
}
