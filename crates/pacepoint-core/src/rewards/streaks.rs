//! Per-track streak state and the day-credit transition.
//!
//! Each user carries one `TrackState` per activity track. Crediting a day
//! walks the calendar transition from `last_date_key` to the new day:
//! consecutive days grow the streak, a gap resets it to 1, and crediting the
//! same day twice changes nothing. `best` never decreases.

use serde::{Deserialize, Serialize};

use crate::date::{day_step, DateKey, DayStep};

/// Activity tracks that carry a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    Water,
    StepsGoal,
    Workout,
}

impl Track {
    pub const ALL: [Track; 3] = [Track::Water, Track::StepsGoal, Track::Workout];

    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Water => "water",
            Track::StepsGoal => "steps_goal",
            Track::Workout => "workout",
        }
    }
}

/// How to treat a credit for a day earlier than the last credited day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackdatedPolicy {
    /// Leave the streak untouched
    #[default]
    Ignore,
    /// Restart the streak at 1 on the backdated day
    Reset,
}

/// Streak counters for a single track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackState {
    /// Length of the run ending on `last_date_key`
    pub current: u32,
    /// Longest run ever observed
    pub best: u32,
    pub last_date_key: Option<DateKey>,
}

impl TrackState {
    /// Credits `date_key` against this track. Returns true when the state
    /// changed.
    pub fn credit(&mut self, date_key: DateKey, backdated: BackdatedPolicy) -> bool {
        match day_step(self.last_date_key, date_key) {
            DayStep::Same => return false,
            DayStep::Backdated if backdated == BackdatedPolicy::Ignore => return false,
            DayStep::Next => self.current += 1,
            DayStep::First | DayStep::Gap | DayStep::Backdated => self.current = 1,
        }
        self.best = self.best.max(self.current);
        self.last_date_key = Some(date_key);
        true
    }
}

/// All streak tracks for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub water: TrackState,
    pub steps_goal: TrackState,
    pub workout: TrackState,
}

impl StreakState {
    pub fn track(&self, track: Track) -> &TrackState {
        match track {
            Track::Water => &self.water,
            Track::StepsGoal => &self.steps_goal,
            Track::Workout => &self.workout,
        }
    }

    pub fn track_mut(&mut self, track: Track) -> &mut TrackState {
        match track {
            Track::Water => &mut self.water,
            Track::StepsGoal => &mut self.steps_goal,
            Track::Workout => &mut self.workout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(raw: &str) -> DateKey {
        raw.parse().unwrap()
    }

    #[test]
    fn test_first_credit_starts_at_one() {
        let mut state = TrackState::default();
        assert!(state.credit(key("2024-01-01"), BackdatedPolicy::Ignore));
        assert_eq!(state.current, 1);
        assert_eq!(state.best, 1);
        assert_eq!(state.last_date_key, Some(key("2024-01-01")));
    }

    #[test]
    fn test_consecutive_days_grow_streak() {
        let mut state = TrackState::default();
        state.credit(key("2024-01-01"), BackdatedPolicy::Ignore);
        state.credit(key("2024-01-02"), BackdatedPolicy::Ignore);
        state.credit(key("2024-01-03"), BackdatedPolicy::Ignore);
        assert_eq!(state.current, 3);
        assert_eq!(state.best, 3);
    }

    #[test]
    fn test_same_day_is_a_no_op() {
        let mut state = TrackState::default();
        state.credit(key("2024-01-01"), BackdatedPolicy::Ignore);
        state.credit(key("2024-01-02"), BackdatedPolicy::Ignore);
        let before = state.clone();
        assert!(!state.credit(key("2024-01-02"), BackdatedPolicy::Ignore));
        assert!(!state.credit(key("2024-01-02"), BackdatedPolicy::Ignore));
        assert_eq!(state, before);
    }

    #[test]
    fn test_gap_resets_current_but_keeps_best() {
        let mut state = TrackState::default();
        for day in ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"] {
            state.credit(key(day), BackdatedPolicy::Ignore);
        }
        assert_eq!(state.current, 5);
        state.credit(key("2024-01-08"), BackdatedPolicy::Ignore);
        assert_eq!(state.current, 1);
        assert_eq!(state.best, 5);
        state.credit(key("2024-01-09"), BackdatedPolicy::Ignore);
        assert_eq!(state.current, 2);
        assert_eq!(state.best, 5);
    }

    #[test]
    fn test_backdated_ignored_by_default() {
        let mut state = TrackState::default();
        state.credit(key("2024-01-05"), BackdatedPolicy::Ignore);
        state.credit(key("2024-01-06"), BackdatedPolicy::Ignore);
        let before = state.clone();
        assert!(!state.credit(key("2024-01-03"), BackdatedPolicy::Ignore));
        assert_eq!(state, before);
    }

    #[test]
    fn test_backdated_reset_policy_restarts_at_one() {
        let mut state = TrackState::default();
        state.credit(key("2024-01-05"), BackdatedPolicy::Reset);
        state.credit(key("2024-01-06"), BackdatedPolicy::Reset);
        assert!(state.credit(key("2024-01-03"), BackdatedPolicy::Reset));
        assert_eq!(state.current, 1);
        assert_eq!(state.best, 2);
        assert_eq!(state.last_date_key, Some(key("2024-01-03")));
    }

    #[test]
    fn test_tracks_are_independent() {
        let mut state = StreakState::default();
        state.track_mut(Track::Water).credit(key("2024-01-01"), BackdatedPolicy::Ignore);
        state.track_mut(Track::Water).credit(key("2024-01-02"), BackdatedPolicy::Ignore);
        state
            .track_mut(Track::Workout)
            .credit(key("2024-01-02"), BackdatedPolicy::Ignore);
        assert_eq!(state.water.current, 2);
        assert_eq!(state.workout.current, 1);
        assert_eq!(state.steps_goal.current, 0);
        assert_eq!(state.steps_goal.last_date_key, None);
    }

    #[test]
    fn test_track_serde_names() {
        assert_eq!(
            serde_json::to_string(&Track::StepsGoal).unwrap(),
            "\"steps_goal\""
        );
        for track in Track::ALL {
            let json = serde_json::to_string(&track).unwrap();
            assert_eq!(json, format!("\"{}\"", track.as_str()));
        }
    }

    fn day_from_offset(off: u64) -> DateKey {
        let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        DateKey::new(base + chrono::Days::new(off))
    }

    proptest! {
        /// Walks an arbitrary sequence of day offsets through `credit` and
        /// checks the structural invariants hold at every step.
        #[test]
        fn prop_best_never_below_current(offsets in prop::collection::vec(0u64..40, 1..60)) {
            let mut state = TrackState::default();
            for off in offsets {
                state.credit(day_from_offset(off), BackdatedPolicy::Ignore);
                prop_assert!(state.best >= state.current);
                prop_assert!(state.current >= 1);
                prop_assert!(state.last_date_key.is_some());
            }
        }

        /// Under the Ignore policy `last_date_key` never moves backwards.
        #[test]
        fn prop_last_date_monotone_under_ignore(offsets in prop::collection::vec(0u64..40, 1..60)) {
            let mut state = TrackState::default();
            let mut high_water: Option<DateKey> = None;
            for off in offsets {
                state.credit(day_from_offset(off), BackdatedPolicy::Ignore);
                if let (Some(prev), Some(now)) = (high_water, state.last_date_key) {
                    prop_assert!(now >= prev);
                }
                high_water = state.last_date_key;
            }
        }

        /// `current` only ever changes by growing one or resetting to one.
        #[test]
        fn prop_current_grows_by_one_or_resets(offsets in prop::collection::vec(0u64..40, 1..60)) {
            let mut state = TrackState::default();
            for off in offsets {
                let before = state.current;
                if state.credit(day_from_offset(off), BackdatedPolicy::Ignore) {
                    prop_assert!(state.current == before + 1 || state.current == 1);
                } else {
                    prop_assert_eq!(state.current, before);
                }
            }
        }
    }
}
