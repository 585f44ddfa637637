//! Reward engine: ledger, streaks, and badges.
//!
//! `RewardEngine` ties the pure scoring rules to a `RewardStore`. All award
//! paths share the same shape: compute points, record an event exactly once,
//! and only then apply side effects (streak credit, badge evaluation). The
//! store's conditional inserts carry the dedupe guarantee, so concurrent
//! duplicate awards resolve to a single winner without any read-then-write
//! race. Streak credits go through the store as one atomic call for the
//! same reason.

mod badges;
mod ledger;
mod rules;
mod streaks;

pub use badges::{Badge, BadgeGrant};
pub use ledger::{RecordOutcome, RewardEvent, RewardKind};
pub use rules::{assess_water, workout_points, RewardsConfig, WaterAssessment};
pub use streaks::{BackdatedPolicy, StreakState, Track, TrackState};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::date::DateKey;
use crate::error::StoreError;
use crate::storage::{InsertOutcome, RewardStore};

/// Hard cap on ledger page size.
pub const MAX_HISTORY_LIMIT: usize = 100;

/// Badges shown in the summary view.
const RECENT_BADGE_COUNT: usize = 3;

/// Result of one activity award attempt, including its side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardOutcome {
    pub awarded: bool,
    pub points: u32,
    /// Badges newly granted by this award, empty on duplicates.
    pub new_badges: Vec<Badge>,
}

impl AwardOutcome {
    pub(crate) fn none() -> Self {
        AwardOutcome {
            awarded: false,
            points: 0,
            new_badges: Vec::new(),
        }
    }
}

/// Aggregate view of a user's rewards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardSummary {
    pub points_total: u64,
    pub streaks: StreakState,
    pub recent_badges: Vec<BadgeGrant>,
}

/// Applies scoring rules against a store.
pub struct RewardEngine<'s, S: RewardStore> {
    store: &'s S,
    config: RewardsConfig,
}

impl<'s, S: RewardStore> RewardEngine<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self::with_config(store, RewardsConfig::default())
    }

    pub fn with_config(store: &'s S, config: RewardsConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RewardsConfig {
        &self.config
    }

    /// Records a reward event exactly once per `(uid, kind, key)`.
    ///
    /// Zero-point attempts never touch the store and never count as awarded.
    pub fn record(
        &self,
        uid: &str,
        kind: RewardKind,
        key: &str,
        points: u32,
        meta: serde_json::Value,
    ) -> Result<RecordOutcome, StoreError> {
        if points == 0 {
            return Ok(RecordOutcome {
                awarded: false,
                points: 0,
            });
        }
        let event = RewardEvent {
            uid: uid.to_string(),
            kind,
            key: key.to_string(),
            points,
            meta,
            created_at: Utc::now(),
        };
        match self.store.insert_event_if_absent(&event)? {
            InsertOutcome::Inserted => Ok(RecordOutcome {
                awarded: true,
                points,
            }),
            InsertOutcome::Existed => Ok(RecordOutcome {
                awarded: false,
                points: 0,
            }),
        }
    }

    /// Credits `date_key` on the user's streak for `track`.
    ///
    /// The store applies the whole day transition atomically, so touches
    /// for different tracks never overwrite each other. Re-touching the
    /// same day is a no-op.
    pub fn touch(
        &self,
        uid: &str,
        track: Track,
        date_key: DateKey,
    ) -> Result<StreakState, StoreError> {
        self.store
            .credit_streak(uid, track, date_key, self.config.backdated)
    }

    /// Grants every badge the user newly qualifies for and returns them.
    ///
    /// Qualification only ever widens (best streaks and the points total are
    /// monotone), so a run that was skipped or failed earlier is caught up by
    /// the next call.
    pub fn evaluate_badges(&self, uid: &str) -> Result<Vec<Badge>, StoreError> {
        let streaks = self.store.streaks(uid)?.unwrap_or_default();
        let points_total = self.store.points_total(uid)?;
        let mut granted = Vec::new();
        for badge in Badge::ALL {
            if !badge.qualifies(&streaks, points_total) {
                continue;
            }
            if self.store.insert_badge_if_absent(uid, badge, Utc::now())?
                == InsertOutcome::Inserted
            {
                granted.push(badge);
            }
        }
        Ok(granted)
    }

    /// Scores a water total change for `date_key` and applies side effects.
    ///
    /// The hydration streak is touched whenever the new total reaches the
    /// threshold, even when the change itself earns nothing. All other side
    /// effects require a fresh award.
    pub fn award_water(
        &self,
        uid: &str,
        date_key: DateKey,
        old_ml: u64,
        new_ml: u64,
    ) -> Result<AwardOutcome, StoreError> {
        let assessment = assess_water(&self.config, date_key, old_ml, new_ml);
        if assessment.hydrated {
            self.touch(uid, Track::Water, date_key)?;
        }
        let meta = serde_json::json!({ "delta_ml": assessment.delta_ml });
        let outcome = self.record(uid, RewardKind::Water, &assessment.key, assessment.points, meta)?;
        if !outcome.awarded {
            return Ok(AwardOutcome::none());
        }
        Ok(AwardOutcome {
            awarded: true,
            points: outcome.points,
            new_badges: self.badges_after_award(uid),
        })
    }

    /// Awards the daily step-goal bonus, at most once per calendar day.
    pub fn award_steps_goal(
        &self,
        uid: &str,
        date_key: DateKey,
    ) -> Result<AwardOutcome, StoreError> {
        let key = date_key.to_string();
        let outcome = self.record(
            uid,
            RewardKind::StepsGoal,
            &key,
            self.config.steps_goal_points,
            serde_json::json!({}),
        )?;
        if !outcome.awarded {
            return Ok(AwardOutcome::none());
        }
        self.touch(uid, Track::StepsGoal, date_key)?;
        Ok(AwardOutcome {
            awarded: true,
            points: outcome.points,
            new_badges: self.badges_after_award(uid),
        })
    }

    /// Awards points for a finished workout, at most once per workout id.
    pub fn award_workout_finish(
        &self,
        uid: &str,
        workout_id: &str,
        date_key: DateKey,
        distance_km: f64,
    ) -> Result<AwardOutcome, StoreError> {
        let points = workout_points(&self.config, distance_km);
        let meta = serde_json::json!({ "distance_km": distance_km });
        let outcome = self.record(uid, RewardKind::WorkoutFinish, workout_id, points, meta)?;
        if !outcome.awarded {
            return Ok(AwardOutcome::none());
        }
        self.touch(uid, Track::Workout, date_key)?;
        Ok(AwardOutcome {
            awarded: true,
            points: outcome.points,
            new_badges: self.badges_after_award(uid),
        })
    }

    /// Lifetime points, derived from the ledger.
    pub fn points_total(&self, uid: &str) -> Result<u64, StoreError> {
        self.store.points_total(uid)
    }

    pub fn summary(&self, uid: &str) -> Result<RewardSummary, StoreError> {
        let points_total = self.store.points_total(uid)?;
        let streaks = self.store.streaks(uid)?.unwrap_or_default();
        let mut recent_badges = self.store.badges(uid)?;
        recent_badges.truncate(RECENT_BADGE_COUNT);
        Ok(RewardSummary {
            points_total,
            streaks,
            recent_badges,
        })
    }

    /// Ledger page, newest first.
    pub fn history(&self, uid: &str, limit: usize) -> Result<Vec<RewardEvent>, StoreError> {
        self.store.events(uid, limit.min(MAX_HISTORY_LIMIT))
    }

    pub fn badges(&self, uid: &str) -> Result<Vec<BadgeGrant>, StoreError> {
        self.store.badges(uid)
    }

    /// Badge evaluation after a successful award must not sink the award
    /// itself; failures are reported and left for the next evaluation.
    fn badges_after_award(&self, uid: &str) -> Vec<Badge> {
        match self.evaluate_badges(uid) {
            Ok(badges) => badges,
            Err(e) => {
                eprintln!("Warning: badge evaluation failed for {uid}: {e}");
                Vec::new()
            }
        }
    }
}
