//! Daily water intake tracking.
//!
//! A day's total is written monotonically: clients report "my total is now
//! X ml" and the store keeps the maximum, so replays and out-of-order
//! reports can never shrink a day. The reward engine scores the increase
//! between the previous and the stored total.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::award_or_log;
use crate::date::DateKey;
use crate::error::{CoreError, ValidationError};
use crate::rewards::{AwardOutcome, RewardEngine};
use crate::storage::{Config, Database};

/// One day's water total for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterDay {
    pub uid: String,
    pub date_key: DateKey,
    pub ml: u64,
    pub updated_at: DateTime<Utc>,
}

/// Result of recording a water total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterUpdate {
    pub date_key: DateKey,
    /// Stored daily total after the merge
    pub ml: u64,
    pub award: AwardOutcome,
}

/// Records water totals and feeds them to the reward engine.
pub struct WaterTracker<'a> {
    db: &'a Database,
    engine: RewardEngine<'a, Database>,
}

impl<'a> WaterTracker<'a> {
    pub fn new(db: &'a Database, config: &Config) -> Self {
        Self {
            db,
            engine: RewardEngine::with_config(db, config.rewards.clone()),
        }
    }

    /// Records that the user's total for `date_key` is now `ml`.
    ///
    /// The stored total only ever grows. The award runs best-effort after
    /// the write; its failure never rolls the total back.
    pub fn update(&self, uid: &str, date_key: DateKey, ml: u64) -> Result<WaterUpdate, CoreError> {
        let before = self.db.water_day(uid, date_key)?.map(|d| d.ml).unwrap_or(0);
        let stored = self.db.upsert_water_max(uid, date_key, ml)?;
        let award = award_or_log(
            uid,
            "water",
            self.engine.award_water(uid, date_key, before, stored.ml),
        );
        Ok(WaterUpdate {
            date_key,
            ml: stored.ml,
            award,
        })
    }

    pub fn day(&self, uid: &str, date_key: DateKey) -> Result<Option<WaterDay>, CoreError> {
        Ok(self.db.water_day(uid, date_key)?)
    }

    /// Day rows in `[from, to]`, ordered by date.
    pub fn range(
        &self,
        uid: &str,
        from: DateKey,
        to: DateKey,
    ) -> Result<Vec<WaterDay>, CoreError> {
        if from > to {
            return Err(ValidationError::InvalidDateRange { from, to }.into());
        }
        Ok(self.db.water_range(uid, from, to)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::Badge;
    use crate::storage::RewardStore;

    fn day(raw: &str) -> DateKey {
        raw.parse().unwrap()
    }

    fn setup() -> (Database, Config) {
        (Database::open_memory().unwrap(), Config::default())
    }

    #[test]
    fn test_update_stores_total_and_awards() {
        let (db, config) = setup();
        let tracker = WaterTracker::new(&db, &config);

        let update = tracker.update("u1", day("2024-01-01"), 500).unwrap();
        assert_eq!(update.ml, 500);
        assert!(update.award.awarded);
        assert_eq!(update.award.points, 2);

        // Replaying the same total stores nothing new and awards nothing.
        let replay = tracker.update("u1", day("2024-01-01"), 500).unwrap();
        assert_eq!(replay.ml, 500);
        assert!(!replay.award.awarded);
        assert_eq!(db.points_total("u1").unwrap(), 2);
    }

    #[test]
    fn test_stale_lower_report_keeps_total() {
        let (db, config) = setup();
        let tracker = WaterTracker::new(&db, &config);
        tracker.update("u1", day("2024-01-01"), 1000).unwrap();

        let stale = tracker.update("u1", day("2024-01-01"), 600).unwrap();
        assert_eq!(stale.ml, 1000);
        assert!(!stale.award.awarded);
        assert_eq!(db.points_total("u1").unwrap(), 4);
    }

    #[test]
    fn test_incremental_totals_score_each_delta() {
        let (db, config) = setup();
        let tracker = WaterTracker::new(&db, &config);
        let d = day("2024-01-01");
        assert_eq!(tracker.update("u1", d, 250).unwrap().award.points, 1);
        assert_eq!(tracker.update("u1", d, 750).unwrap().award.points, 2);
        assert_eq!(tracker.update("u1", d, 800).unwrap().award.points, 0);
        assert_eq!(db.points_total("u1").unwrap(), 3);
    }

    #[test]
    fn test_hydration_streak_and_badge() {
        let (db, config) = setup();
        let tracker = WaterTracker::new(&db, &config);
        let mut badges = Vec::new();
        for d in ["2024-01-01", "2024-01-02", "2024-01-03"] {
            let update = tracker.update("u1", day(d), 2200).unwrap();
            badges.extend(update.award.new_badges);
        }
        assert_eq!(badges, vec![Badge::Hydration3]);
        let streaks = db.streaks("u1").unwrap().unwrap();
        assert_eq!(streaks.water.current, 3);
        assert_eq!(streaks.water.best, 3);
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        let (db, config) = setup();
        let tracker = WaterTracker::new(&db, &config);
        let result = tracker.range("u1", day("2024-01-05"), day("2024-01-01"));
        assert!(matches!(
            result,
            Err(CoreError::Validation(
                ValidationError::InvalidDateRange { .. }
            ))
        ));
    }

    #[test]
    fn test_range_returns_recorded_days() {
        let (db, config) = setup();
        let tracker = WaterTracker::new(&db, &config);
        tracker.update("u1", day("2024-01-01"), 500).unwrap();
        tracker.update("u1", day("2024-01-03"), 800).unwrap();
        tracker.update("u1", day("2024-02-01"), 900).unwrap();

        let days = tracker
            .range("u1", day("2024-01-01"), day("2024-01-31"))
            .unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date_key, day("2024-01-01"));
        assert_eq!(days[0].ml, 500);
        assert_eq!(days[1].date_key, day("2024-01-03"));
    }
}
