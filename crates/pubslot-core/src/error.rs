//! Core error types for pubslot-core.
//!
//! Hard failures only. Conditions the engine handles locally (under-filled
//! days, rejected instants, fallback dates) are recorded as
//! [`ScheduleIssue`](crate::report::ScheduleIssue) in the run report instead.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pubslot-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Trigger boundary errors (locking, deadlines)
    #[error("Trigger error: {0}")]
    Trigger(#[from] TriggerError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
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

    /// Row referenced by id does not exist
    #[error("No item with id '{0}'")]
    NotFound(String),

    /// Row left the expected status before it could be updated
    #[error("Item '{id}' is no longer '{expected}'")]
    StatusChanged { id: String, expected: String },

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

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
///
/// Raised before any scheduling attempt when the collaborator supplies a
/// configuration the engine cannot work with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end_of_day ({end}) must be later than start_of_day ({start})")]
    InvalidTimeRange {
        start: chrono::NaiveTime,
        end: chrono::NaiveTime,
    },

    /// Numeric setting outside its accepted range
    #[error("'{field}' must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: String,
        min: u32,
        max: u32,
        value: u32,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised at the trigger-to-engine boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
    /// Another run holds the lock for this scope
    #[error("a scheduling run is already in progress for '{scope}'")]
    RunInProgress { scope: String },

    /// The run did not finish within its deadline
    #[error("scheduling run exceeded its deadline of {timeout_secs} seconds")]
    DeadlineExceeded { timeout_secs: u64 },

    /// The lock file could not be created or inspected
    #[error("cannot take run lock at {path}: {message}")]
    LockUnavailable { path: PathBuf, message: String },

    /// The blocking worker panicked or was cancelled
    #[error("scheduling worker failed: {0}")]
    WorkerFailed(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked
                    || inner.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl From<tokio::task::JoinError> for TriggerError {
    fn from(err: tokio::task::JoinError) -> Self {
        TriggerError::WorkerFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
