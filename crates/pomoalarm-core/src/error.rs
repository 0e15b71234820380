//! Core error types for pomoalarm-core.
//!
//! Every fallible operation in the library returns [`CoreError`]. The store,
//! configuration, validation and auth layers each have their own enum which
//! converts into it with `?`.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomoalarm-core.
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

    /// Identity errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    /// A unique index already holds the value
    #[error("Constraint violation on {table}.{index}")]
    ConstraintViolation { table: String, index: String },

    /// No record with the given id
    #[error("{table} record {id} not found")]
    NotFound { table: String, id: i64 },

    /// The table does not declare the requested index
    #[error("Table {table} has no index named '{index}'")]
    UnknownIndex { table: String, index: String },

    /// A stored document could not be decoded
    #[error("Corrupt record in {table}: {message}")]
    Corrupt { table: String, message: String },
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

    /// The data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Numeric field outside its allowed range
    #[error("'{field}' must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },

    /// String field too short
    #[error("'{field}' must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Identity errors raised by owner-scoped operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    /// No user is logged in
    #[error("Not logged in")]
    NotAuthenticated,

    /// The record belongs to another user
    #[error("{resource} {id} does not belong to the current user")]
    Forbidden { resource: &'static str, id: i64 },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg) => match code.code {
                rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy => {
                    DatabaseError::Locked
                }
                _ => DatabaseError::QueryFailed(err.to_string()),
            },
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl CoreError {
    /// True when the error means "the record does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::Database(DatabaseError::NotFound { .. }))
    }

    /// True when the error is a unique-index violation.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            CoreError::Database(DatabaseError::ConstraintViolation { .. })
        )
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
