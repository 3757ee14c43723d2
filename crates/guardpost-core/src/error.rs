//! Core error types for guardpost-core.
//!
//! This module defines the error hierarchy using thiserror. Validation and
//! conflict errors are detected before any mutation; persistence errors are
//! propagated verbatim to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for guardpost-core.
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

    /// Assignment conflict errors
    #[error("Conflict error: {0}")]
    Conflict(#[from] ConflictError),

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

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Record not found
    #[error("No {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

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

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
///
/// All of these are raised before any record is written.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Time-of-day string is not HH:MM
    #[error("Invalid time of day '{value}': expected HH:MM")]
    InvalidTime { value: String },

    /// Frequency outside the supported set
    #[error("Unsupported checkpoint frequency: {minutes} minutes")]
    InvalidFrequency { minutes: u32 },

    /// Shift window longer than the 12-hour maximum
    #[error("Shift window of {minutes} minutes exceeds the 12-hour maximum")]
    WindowTooLong { minutes: u32 },

    /// Post id does not resolve to a site
    #[error("Unknown post: {post_id}")]
    UnknownPost { post_id: String },

    /// Status that only automatic evaluation may set
    #[error("Status {status} cannot be set manually")]
    StatusNotManual { status: String },
}

/// Assignment conflict errors. Always blocking, never advisory.
#[derive(Error, Debug)]
pub enum ConflictError {
    /// Agent already holds an assignment on that calendar date
    #[error("Agent {agent_id} already holds an assignment on {date}")]
    DailyConflict {
        agent_id: String,
        date: chrono::NaiveDate,
    },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
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
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
