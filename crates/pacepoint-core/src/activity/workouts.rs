//! Workout session lifecycle: start, append, finish.
//!
//! A user has at most one active session at a time. Route points arrive in
//! batches while the session runs; metrics merge by max so late or repeated
//! reports never shrink what was already recorded. Finishing flips the
//! status, derives the average speed, and hands the session to the reward
//! engine keyed by its id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activity::{award_or_log, clamp_non_negative};
use crate::date::DateKey;
use crate::error::{CoreError, ValidationError};
use crate::rewards::{AwardOutcome, RewardEngine};
use crate::storage::{Config, Database};

/// Route points accepted per append call.
const MAX_ROUTE_BATCH: usize = 100;
/// Hard cap on workout listing size.
const MAX_WORKOUT_LIST: usize = 50;

/// A GPS trace sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    /// Milliseconds since the Unix epoch
    pub t: i64,
    pub lat: f64,
    pub lng: f64,
}

/// Lifecycle state of a workout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutStatus {
    Active,
    Finished,
    Aborted,
}

impl WorkoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutStatus::Active => "active",
            WorkoutStatus::Finished => "finished",
            WorkoutStatus::Aborted => "aborted",
        }
    }
}

/// One workout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub uid: String,
    pub kind: String,
    pub status: WorkoutStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_sec: u64,
    pub distance_km: f64,
    pub avg_speed_kmh: f64,
    pub steps: u64,
    pub calories_kcal: f64,
    pub route: Vec<RoutePoint>,
}

/// Metrics reported by the client during or at the end of a session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WorkoutMetrics {
    #[serde(default)]
    pub duration_sec: u64,
    #[serde(default)]
    pub distance_km: f64,
    #[serde(default)]
    pub steps: u64,
    #[serde(default)]
    pub calories_kcal: f64,
}

/// A finished session together with its award.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutFinish {
    pub workout: Workout,
    pub award: AwardOutcome,
}

/// Manages workout sessions and their awards.
pub struct WorkoutLog<'a> {
    db: &'a Database,
    engine: RewardEngine<'a, Database>,
}

impl<'a> WorkoutLog<'a> {
    pub fn new(db: &'a Database, config: &Config) -> Self {
        Self {
            db,
            engine: RewardEngine::with_config(db, config.rewards.clone()),
        }
    }

    /// Starts a session. Fails while another session is still active.
    pub fn start(&self, uid: &str, kind: &str) -> Result<Workout, CoreError> {
        if let Some(active) = self.db.active_workout(uid)? {
            return Err(ValidationError::WorkoutAlreadyActive { id: active.id }.into());
        }
        let workout = Workout {
            id: Uuid::new_v4().to_string(),
            uid: uid.to_string(),
            kind: kind.to_string(),
            status: WorkoutStatus::Active,
            started_at: Utc::now(),
            ended_at: None,
            duration_sec: 0,
            distance_km: 0.0,
            avg_speed_kmh: 0.0,
            steps: 0,
            calories_kcal: 0.0,
            route: Vec::new(),
        };
        self.db.insert_workout(&workout)?;
        Ok(workout)
    }

    /// Appends route points and merges metrics into the user's active
    /// session. Batches are truncated to 100 points.
    pub fn append(
        &self,
        uid: &str,
        id: &str,
        points: &[RoutePoint],
        metrics: WorkoutMetrics,
    ) -> Result<Workout, CoreError> {
        let mut workout = self.active_owned(uid, id)?;
        workout
            .route
            .extend(points.iter().take(MAX_ROUTE_BATCH).copied());
        merge_metrics(&mut workout, metrics);
        self.db.update_workout(&workout)?;
        Ok(workout)
    }

    /// Finishes the session: final metric merge, average speed, status flip,
    /// then the award keyed by the session id.
    pub fn finish(
        &self,
        uid: &str,
        id: &str,
        date_key: DateKey,
        metrics: WorkoutMetrics,
    ) -> Result<WorkoutFinish, CoreError> {
        let mut workout = self.active_owned(uid, id)?;
        merge_metrics(&mut workout, metrics);
        workout.ended_at = Some(Utc::now());
        workout.status = WorkoutStatus::Finished;
        workout.avg_speed_kmh = if workout.duration_sec > 0 {
            workout.distance_km / (workout.duration_sec as f64 / 3600.0)
        } else {
            0.0
        };
        self.db.update_workout(&workout)?;

        let award = award_or_log(
            uid,
            "workout",
            self.engine
                .award_workout_finish(uid, &workout.id, date_key, workout.distance_km),
        );
        Ok(WorkoutFinish { workout, award })
    }

    pub fn get(&self, uid: &str, id: &str) -> Result<Option<Workout>, CoreError> {
        Ok(self.db.workout(uid, id)?)
    }

    pub fn active(&self, uid: &str) -> Result<Option<Workout>, CoreError> {
        Ok(self.db.active_workout(uid)?)
    }

    /// Newest sessions first, `limit` clamped to 50.
    pub fn recent(&self, uid: &str, limit: usize) -> Result<Vec<Workout>, CoreError> {
        Ok(self.db.recent_workouts(uid, limit.min(MAX_WORKOUT_LIST))?)
    }

    fn active_owned(&self, uid: &str, id: &str) -> Result<Workout, CoreError> {
        match self.db.workout(uid, id)? {
            Some(workout) if workout.status == WorkoutStatus::Active => Ok(workout),
            _ => Err(ValidationError::WorkoutNotActive { id: id.to_string() }.into()),
        }
    }
}

fn merge_metrics(workout: &mut Workout, metrics: WorkoutMetrics) {
    workout.duration_sec = workout.duration_sec.max(metrics.duration_sec);
    workout.distance_km = workout.distance_km.max(clamp_non_negative(metrics.distance_km));
    workout.steps = workout.steps.max(metrics.steps);
    workout.calories_kcal = workout
        .calories_kcal
        .max(clamp_non_negative(metrics.calories_kcal));
}
