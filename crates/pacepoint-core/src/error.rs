//! Core error types for pacepoint-core.
//!
//! This module defines the error hierarchy used across the library. Storage,
//! configuration, and validation failures each get their own enum so callers
//! can match on the layer that failed; `CoreError` is the umbrella type the
//! public API returns.

use std::path::PathBuf;
use thiserror::Error;

use crate::date::DateKey;

/// Core error type for pacepoint-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Store-related errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration directory could not be resolved or created
    #[error("Configuration directory unavailable: {0}")]
    DirUnavailable(#[source] std::io::Error),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Malformed calendar-day key
    #[error("Invalid date key '{raw}': expected YYYY-MM-DD")]
    InvalidDateKey { raw: String },

    /// Inverted date range
    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange { from: DateKey, to: DateKey },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// A workout session is already running for this user
    #[error("Workout {id} is already active")]
    WorkoutAlreadyActive { id: String },

    /// The referenced workout does not exist or is no longer active
    #[error("Workout {id} not found or not active")]
    WorkoutNotActive { id: String },
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
