//! # Pacepoint Core Library
//!
//! This library provides the core business logic for the Pacepoint fitness
//! tracker. It implements a CLI-first philosophy where all operations are
//! available via a standalone CLI binary over the same core library.
//!
//! ## Architecture
//!
//! - **Reward Engine**: An exactly-once points ledger, per-track day streaks,
//!   and threshold badges, driven by activity updates
//! - **Activity Tracking**: Daily water and step totals (monotone merges) and
//!   workout sessions with route traces
//! - **Storage**: SQLite-based persistence and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`RewardEngine`]: Award, streak, and badge logic over a [`RewardStore`]
//! - [`WaterTracker`] / [`StepsTracker`] / [`WorkoutLog`]: Activity services
//! - [`Database`]: SQLite persistence for the ledger and activity data
//! - [`Config`]: Application configuration management

pub mod activity;
pub mod date;
pub mod error;
pub mod rewards;
pub mod storage;

pub use activity::{
    RoutePoint, StepsDay, StepsTracker, StepsUpdate, WaterDay, WaterTracker, WaterUpdate,
    Workout, WorkoutFinish, WorkoutLog, WorkoutMetrics, WorkoutStatus,
};
pub use date::{day_step, DateKey, DayStep};
pub use error::{ConfigError, CoreError, Result, StoreError, ValidationError};
pub use rewards::{
    AwardOutcome, BackdatedPolicy, Badge, BadgeGrant, RewardEngine, RewardEvent, RewardKind,
    RewardSummary, StreakState, Track, TrackState,
};
pub use storage::{Config, Database, InsertOutcome, MemoryStore, RewardStore};
