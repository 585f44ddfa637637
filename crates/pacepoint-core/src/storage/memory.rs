//! In-memory `RewardStore` for tests and ephemeral use.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::date::DateKey;
use crate::error::StoreError;
use crate::rewards::{BackdatedPolicy, Badge, BadgeGrant, RewardEvent, StreakState, Track};
use crate::storage::store::{InsertOutcome, RewardStore};

#[derive(Debug, Default)]
struct MemoryInner {
    events: Vec<RewardEvent>,
    streaks: HashMap<String, StreakState>,
    badges: Vec<BadgeGrant>,
}

/// Mutex-backed store with the same dedupe semantics as the SQLite store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        // A poisoned lock only means another test thread panicked; the data
        // is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RewardStore for MemoryStore {
    fn insert_event_if_absent(&self, event: &RewardEvent) -> Result<InsertOutcome, StoreError> {
        let mut inner = self.lock();
        let exists = inner
            .events
            .iter()
            .any(|e| e.uid == event.uid && e.kind == event.kind && e.key == event.key);
        if exists {
            return Ok(InsertOutcome::Existed);
        }
        inner.events.push(event.clone());
        Ok(InsertOutcome::Inserted)
    }

    fn events(&self, uid: &str, limit: usize) -> Result<Vec<RewardEvent>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .events
            .iter()
            .rev()
            .filter(|e| e.uid == uid)
            .take(limit)
            .cloned()
            .collect())
    }

    fn points_total(&self, uid: &str) -> Result<u64, StoreError> {
        let inner = self.lock();
        Ok(inner
            .events
            .iter()
            .filter(|e| e.uid == uid)
            .map(|e| e.points as u64)
            .sum())
    }

    fn streaks(&self, uid: &str) -> Result<Option<StreakState>, StoreError> {
        let inner = self.lock();
        Ok(inner.streaks.get(uid).cloned())
    }

    fn credit_streak(
        &self,
        uid: &str,
        track: Track,
        date_key: DateKey,
        backdated: BackdatedPolicy,
    ) -> Result<StreakState, StoreError> {
        // Read, transition, and write-back all happen under the one lock.
        let mut inner = self.lock();
        let state = inner.streaks.entry(uid.to_string()).or_default();
        state.track_mut(track).credit(date_key, backdated);
        Ok(state.clone())
    }

    fn insert_badge_if_absent(
        &self,
        uid: &str,
        badge: Badge,
        earned_at: DateTime<Utc>,
    ) -> Result<InsertOutcome, StoreError> {
        let mut inner = self.lock();
        let exists = inner
            .badges
            .iter()
            .any(|b| b.uid == uid && b.badge == badge);
        if exists {
            return Ok(InsertOutcome::Existed);
        }
        inner.badges.push(BadgeGrant {
            uid: uid.to_string(),
            badge,
            earned_at,
        });
        Ok(InsertOutcome::Inserted)
    }

    fn badges(&self, uid: &str) -> Result<Vec<BadgeGrant>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .badges
            .iter()
            .rev()
            .filter(|b| b.uid == uid)
            .cloned()
            .collect())
    }
}
