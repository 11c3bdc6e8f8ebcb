//! Core error types for geoattend-core.
//!
//! Every fallible collaborator (store, location provider, notifier, background
//! facility) has its own error enum. None of these ever escape a cycle: the
//! engine turns them into a [`CycleOutcome`](crate::events::CycleOutcome).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Error from operations that span more than one collaborator, such as
/// stopping the background task and clearing geofence state on logout.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistent store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Background scheduling errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked by another writer
    #[error("Store is locked")]
    Locked,

    /// A stored value could not be decoded
    #[error("Corrupt value for key '{key}': {message}")]
    Corrupt { key: String, message: String },
}

/// Location probe failures. All of them abort the cycle with state untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("no fix within {0:?}")]
    Timeout(Duration),

    #[error("location permission revoked")]
    PermissionDenied,

    #[error("location provider unavailable: {0}")]
    Unavailable(String),

    #[error("invalid fix ({latitude}, {longitude})")]
    InvalidFix { latitude: f64, longitude: f64 },
}

/// Notification side-effect failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotifyError {
    #[error("failed to create channel '{channel}': {message}")]
    ChannelFailed { channel: String, message: String },

    #[error("failed to display notification: {0}")]
    DisplayFailed(String),
}

/// Background facility errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("background task registration failed: {0}")]
    RegistrationFailed(String),

    #[error("background task stop failed: {0}")]
    StopFailed(String),
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

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg) => {
                if code.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}
