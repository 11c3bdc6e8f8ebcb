//! Durable key-value state shared with the rest of the app.
//!
//! The engine reads the session token and today's attendance record, and
//! owns exactly one key of its own: the last observed inside/outside flag.

mod memory;
pub mod records;
mod sqlite;

pub use memory::MemoryStore;
pub use records::{AttendanceDayRecord, TransitionState};
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use crate::error::StoreError;

/// Key holding the session token (written by the login flow).
pub const SESSION_TOKEN_KEY: &str = "auth_token";
/// Key holding today's attendance record (written by the attendance flow).
pub const ATTENDANCE_KEY: &str = "attendance_today";
/// Key holding the last observed geofence state (written by the engine).
pub const LAST_INSIDE_KEY: &str = "geofence_last_inside";

/// A synchronous string key-value store.
///
/// Each `set` or `remove` must be atomic for its key; nothing more is
/// assumed about concurrent cycles.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Returns `~/.config/geoattend[-dev]/` based on GEOATTEND_ENV.
///
/// Set GEOATTEND_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("GEOATTEND_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("geoattend-dev")
    } else {
        base_dir.join("geoattend")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
