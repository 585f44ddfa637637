//! SQLite-backed storage for rewards and activity tracking.
//!
//! Provides persistent storage for:
//! - The reward ledger, streak states, and badge grants (`RewardStore` impl)
//! - Daily water and step totals
//! - Workout sessions with their route traces

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::activity::{StepsDay, WaterDay, Workout, WorkoutStatus};
use crate::date::DateKey;
use crate::error::{CoreError, StoreError};
use crate::rewards::{
    BackdatedPolicy, Badge, BadgeGrant, RewardEvent, RewardKind, StreakState, Track, TrackState,
};
use crate::storage::migrations;
use crate::storage::store::{InsertOutcome, RewardStore};

use super::data_dir;

/// Parse reward kind from database string
fn parse_reward_kind(kind_str: &str) -> RewardKind {
    match kind_str {
        "steps_goal" => RewardKind::StepsGoal,
        "workout_finish" => RewardKind::WorkoutFinish,
        _ => RewardKind::Water,
    }
}

/// Parse badge id from database string
fn parse_badge(badge_str: &str) -> Option<Badge> {
    Badge::ALL.iter().copied().find(|b| b.id() == badge_str)
}

/// Parse workout status from database string
fn parse_workout_status(status_str: &str) -> WorkoutStatus {
    match status_str {
        "active" => WorkoutStatus::Active,
        "aborted" => WorkoutStatus::Aborted,
        _ => WorkoutStatus::Finished,
    }
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Build a RewardEvent from a database row
fn row_to_reward_event(row: &rusqlite::Row) -> Result<RewardEvent, rusqlite::Error> {
    let kind_str: String = row.get(1)?;
    let meta_str: String = row.get(4)?;
    let created_at_str: String = row.get(5)?;
    Ok(RewardEvent {
        uid: row.get(0)?,
        kind: parse_reward_kind(&kind_str),
        key: row.get(2)?,
        points: row.get(3)?,
        meta: serde_json::from_str(&meta_str).unwrap_or(serde_json::Value::Null),
        created_at: parse_datetime_fallback(&created_at_str),
    })
}

/// Read one track's columns starting at `base`
fn read_track(row: &rusqlite::Row, base: usize) -> Result<TrackState, rusqlite::Error> {
    let last_date: Option<String> = row.get(base + 2)?;
    Ok(TrackState {
        current: row.get(base)?,
        best: row.get(base + 1)?,
        last_date_key: last_date.and_then(|s| s.parse().ok()),
    })
}

/// Build a StreakState from a database row
fn row_to_streak_state(row: &rusqlite::Row) -> Result<StreakState, rusqlite::Error> {
    Ok(StreakState {
        water: read_track(row, 0)?,
        steps_goal: read_track(row, 3)?,
        workout: read_track(row, 6)?,
    })
}

/// Build a Workout from a database row
fn row_to_workout(row: &rusqlite::Row) -> Result<Workout, rusqlite::Error> {
    let status_str: String = row.get(3)?;
    let started_at_str: String = row.get(4)?;
    let ended_at_str: Option<String> = row.get(5)?;
    let route_str: String = row.get(11)?;
    Ok(Workout {
        id: row.get(0)?,
        uid: row.get(1)?,
        kind: row.get(2)?,
        status: parse_workout_status(&status_str),
        started_at: parse_datetime_fallback(&started_at_str),
        ended_at: ended_at_str.map(|s| parse_datetime_fallback(&s)),
        duration_sec: row.get(6)?,
        distance_km: row.get(7)?,
        avg_speed_kmh: row.get(8)?,
        steps: row.get(9)?,
        calories_kcal: row.get(10)?,
        route: serde_json::from_str(&route_str).unwrap_or_default(),
    })
}

/// SQLite database for reward and activity storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at the default data directory.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("pacepoint.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open the database at `path`, creating the schema if needed.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        migrations::migrate(&self.conn).map_err(|e| StoreError::MigrationFailed(e.to_string()))
    }

    // --- water ---

    pub fn water_day(&self, uid: &str, date_key: DateKey) -> Result<Option<WaterDay>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT ml, updated_at FROM water_daily WHERE uid = ?1 AND date_key = ?2")?;
        let row = stmt
            .query_row(params![uid, date_key.to_string()], |row| {
                Ok((row.get::<_, u64>(0)?, row.get::<_, String>(1)?))
            })
            .optional()?;
        Ok(row.map(|(ml, updated_at)| WaterDay {
            uid: uid.to_string(),
            date_key,
            ml,
            updated_at: parse_datetime_fallback(&updated_at),
        }))
    }

    /// Raise the day's water total to `ml` if higher and return the stored row.
    ///
    /// Totals never shrink; a lower value leaves the row unchanged.
    pub fn upsert_water_max(
        &self,
        uid: &str,
        date_key: DateKey,
        ml: u64,
    ) -> Result<WaterDay, StoreError> {
        self.conn.execute(
            "INSERT INTO water_daily (uid, date_key, ml, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(uid, date_key) DO UPDATE SET
                 ml = MAX(ml, excluded.ml),
                 updated_at = excluded.updated_at",
            params![uid, date_key.to_string(), ml, Utc::now().to_rfc3339()],
        )?;
        self.water_day(uid, date_key)?
            .ok_or_else(|| StoreError::QueryFailed("water_daily row missing after upsert".into()))
    }

    pub fn water_range(
        &self,
        uid: &str,
        from: DateKey,
        to: DateKey,
    ) -> Result<Vec<WaterDay>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT date_key, ml, updated_at FROM water_daily
             WHERE uid = ?1 AND date_key BETWEEN ?2 AND ?3
             ORDER BY date_key ASC",
        )?;
        let rows = stmt.query_map(params![uid, from.to_string(), to.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut days = Vec::new();
        for row in rows {
            let (date_key_str, ml, updated_at) = row?;
            if let Ok(date_key) = date_key_str.parse::<DateKey>() {
                days.push(WaterDay {
                    uid: uid.to_string(),
                    date_key,
                    ml,
                    updated_at: parse_datetime_fallback(&updated_at),
                });
            }
        }
        Ok(days)
    }

    // --- steps ---

    pub fn steps_day(&self, uid: &str, date_key: DateKey) -> Result<Option<StepsDay>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT steps, distance_m, calories_kcal, updated_at
             FROM steps_daily WHERE uid = ?1 AND date_key = ?2",
        )?;
        let row = stmt
            .query_row(params![uid, date_key.to_string()], |row| {
                Ok((
                    row.get::<_, u64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .optional()?;
        Ok(row.map(|(steps, distance_m, calories_kcal, updated_at)| StepsDay {
            uid: uid.to_string(),
            date_key,
            steps,
            distance_m,
            calories_kcal,
            updated_at: parse_datetime_fallback(&updated_at),
        }))
    }

    /// Merge a day's step counters upward and return the stored row.
    ///
    /// Each field is raised independently, so a report that is behind on one
    /// counter cannot drag another one down.
    pub fn upsert_steps_max(
        &self,
        uid: &str,
        date_key: DateKey,
        steps: u64,
        distance_m: f64,
        calories_kcal: f64,
    ) -> Result<StepsDay, StoreError> {
        self.conn.execute(
            "INSERT INTO steps_daily (uid, date_key, steps, distance_m, calories_kcal, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(uid, date_key) DO UPDATE SET
                 steps = MAX(steps, excluded.steps),
                 distance_m = MAX(distance_m, excluded.distance_m),
                 calories_kcal = MAX(calories_kcal, excluded.calories_kcal),
                 updated_at = excluded.updated_at",
            params![
                uid,
                date_key.to_string(),
                steps,
                distance_m,
                calories_kcal,
                Utc::now().to_rfc3339(),
            ],
        )?;
        self.steps_day(uid, date_key)?
            .ok_or_else(|| StoreError::QueryFailed("steps_daily row missing after upsert".into()))
    }

    pub fn steps_range(
        &self,
        uid: &str,
        from: DateKey,
        to: DateKey,
    ) -> Result<Vec<StepsDay>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT date_key, steps, distance_m, calories_kcal, updated_at FROM steps_daily
             WHERE uid = ?1 AND date_key BETWEEN ?2 AND ?3
             ORDER BY date_key ASC",
        )?;
        let rows = stmt.query_map(params![uid, from.to_string(), to.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;
        let mut days = Vec::new();
        for row in rows {
            let (date_key_str, steps, distance_m, calories_kcal, updated_at) = row?;
            if let Ok(date_key) = date_key_str.parse::<DateKey>() {
                days.push(StepsDay {
                    uid: uid.to_string(),
                    date_key,
                    steps,
                    distance_m,
                    calories_kcal,
                    updated_at: parse_datetime_fallback(&updated_at),
                });
            }
        }
        Ok(days)
    }

    pub fn step_goal(&self, uid: &str) -> Result<Option<u64>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT goal FROM step_goals WHERE uid = ?1")?;
        Ok(stmt
            .query_row(params![uid], |row| row.get::<_, u64>(0))
            .optional()?)
    }

    pub fn set_step_goal(&self, uid: &str, goal: u64) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO step_goals (uid, goal) VALUES (?1, ?2)",
            params![uid, goal],
        )?;
        Ok(())
    }

    // --- workouts ---

    pub fn insert_workout(&self, workout: &Workout) -> Result<(), StoreError> {
        let route = serde_json::to_string(&workout.route)
            .map_err(|e| StoreError::QueryFailed(format!("serialize route: {e}")))?;
        self.conn.execute(
            "INSERT INTO workouts (id, uid, kind, status, started_at, ended_at, duration_sec,
                                   distance_km, avg_speed_kmh, steps, calories_kcal, route)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                workout.id,
                workout.uid,
                workout.kind,
                workout.status.as_str(),
                workout.started_at.to_rfc3339(),
                workout.ended_at.map(|t| t.to_rfc3339()),
                workout.duration_sec,
                workout.distance_km,
                workout.avg_speed_kmh,
                workout.steps,
                workout.calories_kcal,
                route,
            ],
        )?;
        Ok(())
    }

    pub fn workout(&self, uid: &str, id: &str) -> Result<Option<Workout>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uid, kind, status, started_at, ended_at, duration_sec,
                    distance_km, avg_speed_kmh, steps, calories_kcal, route
             FROM workouts WHERE uid = ?1 AND id = ?2",
        )?;
        Ok(stmt.query_row(params![uid, id], row_to_workout).optional()?)
    }

    pub fn active_workout(&self, uid: &str) -> Result<Option<Workout>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uid, kind, status, started_at, ended_at, duration_sec,
                    distance_km, avg_speed_kmh, steps, calories_kcal, route
             FROM workouts WHERE uid = ?1 AND status = 'active'
             ORDER BY started_at DESC LIMIT 1",
        )?;
        Ok(stmt.query_row(params![uid], row_to_workout).optional()?)
    }

    pub fn update_workout(&self, workout: &Workout) -> Result<(), StoreError> {
        let route = serde_json::to_string(&workout.route)
            .map_err(|e| StoreError::QueryFailed(format!("serialize route: {e}")))?;
        self.conn.execute(
            "UPDATE workouts SET status = ?3, ended_at = ?4, duration_sec = ?5,
                    distance_km = ?6, avg_speed_kmh = ?7, steps = ?8,
                    calories_kcal = ?9, route = ?10
             WHERE uid = ?1 AND id = ?2",
            params![
                workout.uid,
                workout.id,
                workout.status.as_str(),
                workout.ended_at.map(|t| t.to_rfc3339()),
                workout.duration_sec,
                workout.distance_km,
                workout.avg_speed_kmh,
                workout.steps,
                workout.calories_kcal,
                route,
            ],
        )?;
        Ok(())
    }

    pub fn recent_workouts(&self, uid: &str, limit: usize) -> Result<Vec<Workout>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uid, kind, status, started_at, ended_at, duration_sec,
                    distance_km, avg_speed_kmh, steps, calories_kcal, route
             FROM workouts WHERE uid = ?1
             ORDER BY started_at DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![uid, limit as i64], row_to_workout)?;
        let mut workouts = Vec::new();
        for row in rows {
            workouts.push(row?);
        }
        Ok(workouts)
    }

    // --- streaks ---

    fn write_streaks(&self, uid: &str, state: &StreakState) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO streak_states
                 (uid, water_current, water_best, water_last_date,
                  steps_goal_current, steps_goal_best, steps_goal_last_date,
                  workout_current, workout_best, workout_last_date, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                uid,
                state.water.current,
                state.water.best,
                state.water.last_date_key.map(|d| d.to_string()),
                state.steps_goal.current,
                state.steps_goal.best,
                state.steps_goal.last_date_key.map(|d| d.to_string()),
                state.workout.current,
                state.workout.best,
                state.workout.last_date_key.map(|d| d.to_string()),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

impl RewardStore for Database {
    fn insert_event_if_absent(&self, event: &RewardEvent) -> Result<InsertOutcome, StoreError> {
        let meta = serde_json::to_string(&event.meta)
            .map_err(|e| StoreError::QueryFailed(format!("serialize meta: {e}")))?;
        // The unique index on (uid, kind, key) decides; no read beforehand.
        let changed = self.conn.execute(
            "INSERT INTO reward_events (uid, kind, key, points, meta, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(uid, kind, key) DO NOTHING",
            params![
                event.uid,
                event.kind.as_str(),
                event.key,
                event.points,
                meta,
                event.created_at.to_rfc3339(),
            ],
        )?;
        if changed == 0 {
            Ok(InsertOutcome::Existed)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    fn events(&self, uid: &str, limit: usize) -> Result<Vec<RewardEvent>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT uid, kind, key, points, meta, created_at
             FROM reward_events WHERE uid = ?1
             ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![uid, limit as i64], row_to_reward_event)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    fn points_total(&self, uid: &str) -> Result<u64, StoreError> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(points), 0) FROM reward_events WHERE uid = ?1",
            params![uid],
            |row| row.get::<_, u64>(0),
        )?;
        Ok(total)
    }

    fn streaks(&self, uid: &str) -> Result<Option<StreakState>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT water_current, water_best, water_last_date,
                    steps_goal_current, steps_goal_best, steps_goal_last_date,
                    workout_current, workout_best, workout_last_date
             FROM streak_states WHERE uid = ?1",
        )?;
        Ok(stmt.query_row(params![uid], row_to_streak_state).optional()?)
    }

    fn credit_streak(
        &self,
        uid: &str,
        track: Track,
        date_key: DateKey,
        backdated: BackdatedPolicy,
    ) -> Result<StreakState, StoreError> {
        // The transaction spans the read and the write-back, so a credit
        // racing in from another connection cannot overwrite this track.
        let tx = self.conn.unchecked_transaction()?;
        let mut state = self.streaks(uid)?.unwrap_or_default();
        if state.track_mut(track).credit(date_key, backdated) {
            self.write_streaks(uid, &state)?;
        }
        tx.commit()?;
        Ok(state)
    }

    fn insert_badge_if_absent(
        &self,
        uid: &str,
        badge: Badge,
        earned_at: DateTime<Utc>,
    ) -> Result<InsertOutcome, StoreError> {
        let changed = self.conn.execute(
            "INSERT INTO badge_grants (uid, badge, earned_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(uid, badge) DO NOTHING",
            params![uid, badge.id(), earned_at.to_rfc3339()],
        )?;
        if changed == 0 {
            Ok(InsertOutcome::Existed)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    fn badges(&self, uid: &str) -> Result<Vec<BadgeGrant>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT badge, earned_at FROM badge_grants WHERE uid = ?1
             ORDER BY earned_at DESC",
        )?;
        let rows = stmt.query_map(params![uid], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut grants = Vec::new();
        for row in rows {
            let (badge_str, earned_at) = row?;
            // Skip badge ids this build doesn't know.
            if let Some(badge) = parse_badge(&badge_str) {
                grants.push(BadgeGrant {
                    uid: uid.to_string(),
                    badge,
                    earned_at: parse_datetime_fallback(&earned_at),
                });
            }
        }
        Ok(grants)
    }
}
