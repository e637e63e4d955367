//! Core error types for timebank-core.
//!
//! Unknown limit ids are deliberately *not* represented here: toggle,
//! remove and stop treat them as silent no-ops. Likewise an unlock the
//! wallet cannot afford is a boolean outcome, not an error.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for timebank-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Shared-store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Monitoring registration errors
    #[error("Scheduling error: {0}")]
    Scheduling(#[from] SchedulingError),

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

/// Shared key-value store errors.
///
/// Decode failures never escape the load paths -- a corrupted record is
/// read back as absent data. `Decode` exists so the store itself can
/// log what it dropped.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the store
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Compare-and-swap version mismatch
    #[error("Version conflict writing '{key}': expected version {expected}")]
    Conflict { key: String, expected: i64 },

    /// Persisted record could not be decoded
    #[error("Failed to decode record '{key}': {message}")]
    Decode { key: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors, rejected before any mutation.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Amount must be strictly positive
    #[error("Invalid amount {amount}: must be greater than zero")]
    NonPositiveAmount { amount: f64 },

    /// Threshold must be strictly positive
    #[error("Invalid threshold {minutes} minutes: must be greater than zero")]
    NonPositiveThreshold { minutes: i64 },

    /// A limit needs at least one application, category or web domain
    #[error("Target set is empty")]
    EmptyTargetSet,

    /// Allocation percentages must sum to 100
    #[error("Allocation percentages sum to {sum}, expected 100")]
    BadAllocationTotal { sum: f64 },
}

/// Usage-accounting registration failure.
///
/// One attempt is made per registration; the outcome is logged and the
/// limit stays active with degraded enforcement. There is no retry.
#[derive(Error, Debug)]
pub enum SchedulingError {
    /// The accounting service rejected the registration
    #[error("Monitoring registration rejected for '{activity_id}': {message}")]
    RegistrationRejected { activity_id: String, message: String },

    /// The accounting service is unavailable
    #[error("Usage accounting service unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::QueryFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
