//! Core error types for pilgrim-core.
//!
//! None of these conditions is fatal: every failure degrades to "continue
//! with the current in-memory state". Callers decide what to surface.

use std::path::PathBuf;
use thiserror::Error;

use crate::progression::Category;

/// Core error type for pilgrim-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An operation was requested in a state that does not allow it.
    #[error("Invalid transition for '{operation}': {reason}")]
    InvalidTransition {
        operation: &'static str,
        reason: String,
    },

    /// Attempted to select an environment or avatar that is still locked.
    #[error("{category} '{id}' is not unlocked")]
    NotUnlocked { category: Category, id: String },

    /// Journaling attempted outside a reflection prompt window.
    #[error("No completed focus phase is waiting for a reflection")]
    NoPendingReflection,

    /// Snapshot load/save failed; in-memory state stays authoritative.
    #[error("Persistence unavailable during {operation}: {message}")]
    PersistenceUnavailable {
        operation: &'static str,
        message: String,
    },

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn invalid_transition(operation: &'static str, reason: impl Into<String>) -> Self {
        CoreError::InvalidTransition {
            operation,
            reason: reason.into(),
        }
    }

    pub(crate) fn persistence(operation: &'static str, err: impl std::fmt::Display) -> Self {
        CoreError::PersistenceUnavailable {
            operation,
            message: err.to_string(),
        }
    }

    /// Every core error leaves the in-memory state usable.
    pub fn is_recoverable(&self) -> bool {
        true
    }
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// The same id appears twice in a catalog
    #[error("Duplicate unlock id: {0}")]
    DuplicateId(String),

    /// Thresholds must be non-decreasing within a category
    #[error("Threshold for '{id}' ({threshold}) is lower than the previous {category} threshold ({previous})")]
    ThresholdOrder {
        category: Category,
        id: String,
        threshold: u64,
        previous: u64,
    },

    /// Each category needs a threshold-0 entry to start from
    #[error("Catalog has no default (threshold 0) {0}")]
    MissingDefault(Category),
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
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
