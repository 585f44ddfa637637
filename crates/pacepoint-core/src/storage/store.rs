//! Storage trait for the reward engine.
//!
//! The engine is generic over this trait so the same logic runs against
//! SQLite in production and the in-memory store in tests. Deduplication is
//! the store's job: `insert_event_if_absent` and `insert_badge_if_absent`
//! must be atomic under concurrent callers, so racing writers agree on a
//! single winner. Streak credits follow the same rule: `credit_streak`
//! applies the whole day transition inside the store, under its lock or
//! transaction.

use chrono::{DateTime, Utc};

use crate::date::DateKey;
use crate::error::StoreError;
use crate::rewards::{BackdatedPolicy, Badge, BadgeGrant, RewardEvent, StreakState, Track};

/// Whether a conditional insert wrote a new row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Existed,
}

/// Persistence operations the reward engine needs.
pub trait RewardStore {
    /// Appends `event` unless an event with the same `(uid, kind, key)`
    /// already exists.
    fn insert_event_if_absent(&self, event: &RewardEvent) -> Result<InsertOutcome, StoreError>;

    /// Returns the user's events, newest first, at most `limit`.
    fn events(&self, uid: &str, limit: usize) -> Result<Vec<RewardEvent>, StoreError>;

    /// Sum of all event points for the user.
    fn points_total(&self, uid: &str) -> Result<u64, StoreError>;

    /// Streak state for the user, `None` if nothing was ever credited.
    fn streaks(&self, uid: &str) -> Result<Option<StreakState>, StoreError>;

    /// Credits `date_key` on `track` and returns the state after the credit.
    ///
    /// The read-modify-write must run as one atomic step: concurrent
    /// credits for the same user, including ones on different tracks, may
    /// not lose each other's updates.
    fn credit_streak(
        &self,
        uid: &str,
        track: Track,
        date_key: DateKey,
        backdated: BackdatedPolicy,
    ) -> Result<StreakState, StoreError>;

    /// Grants `badge` unless the user already holds it.
    fn insert_badge_if_absent(
        &self,
        uid: &str,
        badge: Badge,
        earned_at: DateTime<Utc>,
    ) -> Result<InsertOutcome, StoreError>;

    /// Returns the user's badges, newest first.
    fn badges(&self, uid: &str) -> Result<Vec<BadgeGrant>, StoreError>;
}
