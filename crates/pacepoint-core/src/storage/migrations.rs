//! Database schema migrations for pacepoint.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    // Ensure schema_version table exists
    create_schema_version_table(conn)?;

    // Get current version
    let current_version = get_schema_version(conn);

    // Apply migrations sequentially
    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Create the schema_version table if it doesn't exist.
fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT version FROM schema_version",
        [],
        |row| row.get::<_, i32>(0),
    )
    .unwrap_or_else(|e| {
        // If table doesn't exist or query fails, return 0
        if matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            0
        } else {
            eprintln!("Warning: failed to read schema_version: {}", e);
            0
        }
    })
}

/// Migration v1: reward ledger tables.
///
/// Creates:
/// - reward_events: append-only points ledger; the unique index on
///   (uid, kind, key) is what makes awards exactly-once
/// - streak_states: one row per user with flat per-track columns
/// - badge_grants: one row per (uid, badge)
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS reward_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uid TEXT NOT NULL,
            kind TEXT NOT NULL,
            key TEXT NOT NULL,
            points INTEGER NOT NULL,
            meta TEXT NOT NULL DEFAULT 'null',
            created_at TEXT NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_reward_events_dedupe
            ON reward_events (uid, kind, key);
        CREATE INDEX IF NOT EXISTS idx_reward_events_uid
            ON reward_events (uid, id);
        CREATE TABLE IF NOT EXISTS streak_states (
            uid TEXT PRIMARY KEY,
            water_current INTEGER NOT NULL DEFAULT 0,
            water_best INTEGER NOT NULL DEFAULT 0,
            water_last_date TEXT,
            steps_goal_current INTEGER NOT NULL DEFAULT 0,
            steps_goal_best INTEGER NOT NULL DEFAULT 0,
            steps_goal_last_date TEXT,
            workout_current INTEGER NOT NULL DEFAULT 0,
            workout_best INTEGER NOT NULL DEFAULT 0,
            workout_last_date TEXT,
            updated_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS badge_grants (
            uid TEXT NOT NULL,
            badge TEXT NOT NULL,
            earned_at TEXT NOT NULL,
            PRIMARY KEY (uid, badge)
        );",
    )?;

    // Mark as v1
    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    tx.commit()?;
    Ok(())
}

/// Migration v2: activity tracking tables.
///
/// Creates:
/// - water_daily / steps_daily: per-day totals keyed by (uid, date_key)
/// - step_goals: per-user daily step target override
/// - workouts: sessions with merged metrics and a JSON route column
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS water_daily (
            uid TEXT NOT NULL,
            date_key TEXT NOT NULL,
            ml INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (uid, date_key)
        );
        CREATE TABLE IF NOT EXISTS steps_daily (
            uid TEXT NOT NULL,
            date_key TEXT NOT NULL,
            steps INTEGER NOT NULL DEFAULT 0,
            distance_m REAL NOT NULL DEFAULT 0,
            calories_kcal REAL NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (uid, date_key)
        );
        CREATE TABLE IF NOT EXISTS step_goals (
            uid TEXT PRIMARY KEY,
            goal INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS workouts (
            id TEXT PRIMARY KEY,
            uid TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'run',
            status TEXT NOT NULL DEFAULT 'active',
            started_at TEXT NOT NULL,
            ended_at TEXT,
            duration_sec INTEGER NOT NULL DEFAULT 0,
            distance_km REAL NOT NULL DEFAULT 0,
            avg_speed_kmh REAL NOT NULL DEFAULT 0,
            steps INTEGER NOT NULL DEFAULT 0,
            calories_kcal REAL NOT NULL DEFAULT 0,
            route TEXT NOT NULL DEFAULT '[]'
        );
        CREATE INDEX IF NOT EXISTS idx_workouts_uid
            ON workouts (uid, started_at);",
    )?;

    // Mark as v2
    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [2],
    )?;

    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test migration from scratch (v0 -> v2)
    #[test]
    fn test_migrate_from_scratch() {
        let conn = Connection::open_in_memory().unwrap();

        migrate(&conn).unwrap();

        let version = get_schema_version(&conn);
        assert_eq!(version, 2);

        // All tables should exist and accept rows
        conn.execute(
            "INSERT INTO reward_events (uid, kind, key, points, meta, created_at)
             VALUES ('u1', 'water', '2024-01-01:500', 2, 'null', '2024-01-01T12:00:00Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO water_daily (uid, date_key, ml, updated_at)
             VALUES ('u1', '2024-01-01', 500, '2024-01-01T12:00:00Z')",
            [],
        )
        .unwrap();
    }

    /// The dedupe index rejects a second event with the same triple.
    #[test]
    fn test_dedupe_index_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        conn.execute(
            "INSERT INTO reward_events (uid, kind, key, points, meta, created_at)
             VALUES ('u1', 'steps_goal', '2024-01-01', 50, 'null', '2024-01-01T12:00:00Z')",
            [],
        )
        .unwrap();

        let dup = conn.execute(
            "INSERT INTO reward_events (uid, kind, key, points, meta, created_at)
             VALUES ('u1', 'steps_goal', '2024-01-01', 50, 'null', '2024-01-01T13:00:00Z')",
            [],
        );
        assert!(dup.is_err());

        // Same key under another kind or uid is fine.
        conn.execute(
            "INSERT INTO reward_events (uid, kind, key, points, meta, created_at)
             VALUES ('u2', 'steps_goal', '2024-01-01', 50, 'null', '2024-01-01T13:00:00Z')",
            [],
        )
        .unwrap();
    }

    /// Test that migrations are idempotent
    #[test]
    fn test_migrate_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        // Run migrations twice
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();

        let version = get_schema_version(&conn);
        assert_eq!(version, 2);
    }

    /// Test incremental migration (v1 -> v2)
    #[test]
    fn test_incremental_migration() {
        let conn = Connection::open_in_memory().unwrap();

        // Bring the database to v1 only
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 1);

        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 2);

        // Activity tables should now exist
        let stmt = conn
            .prepare("SELECT uid, date_key, ml FROM water_daily")
            .unwrap();
        drop(stmt);
        let stmt = conn.prepare("SELECT id, status, route FROM workouts").unwrap();
        drop(stmt);
    }
}
