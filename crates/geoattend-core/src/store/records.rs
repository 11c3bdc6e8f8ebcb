//! Typed views over the raw store keys.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

use super::{KeyValueStore, ATTENDANCE_KEY, LAST_INSIDE_KEY, SESSION_TOKEN_KEY};

/// Persisted geofence memory. `last_inside == None` means never evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransitionState {
    pub last_inside: Option<bool>,
}

impl TransitionState {
    pub fn load(store: &impl KeyValueStore) -> Result<Self, StoreError> {
        let last_inside = match store.get(LAST_INSIDE_KEY)?.as_deref() {
            None => None,
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(other) => {
                return Err(StoreError::Corrupt {
                    key: LAST_INSIDE_KEY.to_string(),
                    message: format!("expected true/false, got '{other}'"),
                })
            }
        };
        Ok(Self { last_inside })
    }

    /// Record the last observed physical state.
    pub fn store_inside(store: &impl KeyValueStore, inside: bool) -> Result<(), StoreError> {
        store.set(LAST_INSIDE_KEY, if inside { "true" } else { "false" })
    }

    /// Forget the geofence memory so the next cycle reseeds.
    pub fn clear(store: &impl KeyValueStore) -> Result<(), StoreError> {
        store.remove(LAST_INSIDE_KEY)
    }
}

/// Today's attendance progress, owned by the attendance flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceDayRecord {
    /// Day the record describes. Writers that omit it are taken to mean today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub check_in_done: bool,
    #[serde(default)]
    pub check_out_done: bool,
    #[serde(default)]
    pub is_completed: bool,
}

impl AttendanceDayRecord {
    pub fn for_day(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    /// Read the record for `today`.
    ///
    /// A missing record, or one stamped with another day, reads as a fresh
    /// record for `today`.
    pub fn load_for(store: &impl KeyValueStore, today: NaiveDate) -> Result<Self, StoreError> {
        let Some(raw) = store.get(ATTENDANCE_KEY)? else {
            return Ok(Self::for_day(today));
        };
        let record: Self = serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            key: ATTENDANCE_KEY.to_string(),
            message: e.to_string(),
        })?;
        match record.date {
            Some(date) if date != today => {
                tracing::debug!(%date, %today, "attendance record is from another day");
                Ok(Self::for_day(today))
            }
            _ => Ok(record),
        }
    }

    /// Write the record. Only the attendance flow (and hosts simulating it)
    /// call this; the engine never does.
    pub fn save(&self, store: &impl KeyValueStore) -> Result<(), StoreError> {
        let json = serde_json::to_string(self).map_err(|e| StoreError::Corrupt {
            key: ATTENDANCE_KEY.to_string(),
            message: e.to_string(),
        })?;
        store.set(ATTENDANCE_KEY, &json)
    }
}

/// Whether a session token is present. The token value is never used.
pub fn has_session(store: &impl KeyValueStore) -> Result<bool, StoreError> {
    Ok(store
        .get(SESSION_TOKEN_KEY)?
        .is_some_and(|token| !token.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn transition_state_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(TransitionState::load(&store).unwrap().last_inside, None);
        TransitionState::store_inside(&store, false).unwrap();
        assert_eq!(TransitionState::load(&store).unwrap().last_inside, Some(false));
        TransitionState::clear(&store).unwrap();
        assert_eq!(TransitionState::load(&store).unwrap().last_inside, None);
    }

    #[test]
    fn transition_state_rejects_garbage() {
        let store = MemoryStore::new();
        store.set(LAST_INSIDE_KEY, "maybe").unwrap();
        assert!(matches!(
            TransitionState::load(&store),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn attendance_missing_reads_as_fresh_day() {
        let store = MemoryStore::new();
        let record = AttendanceDayRecord::load_for(&store, day(4)).unwrap();
        assert_eq!(record, AttendanceDayRecord::for_day(day(4)));
    }

    #[test]
    fn attendance_from_previous_day_is_ignored() {
        let store = MemoryStore::new();
        let yesterday = AttendanceDayRecord {
            date: Some(day(3)),
            check_in_done: true,
            check_out_done: true,
            is_completed: true,
        };
        yesterday.save(&store).unwrap();

        let record = AttendanceDayRecord::load_for(&store, day(4)).unwrap();
        assert!(!record.check_in_done);
        assert!(!record.is_completed);
    }

    #[test]
    fn undated_attendance_is_taken_as_today() {
        let store = MemoryStore::new();
        store
            .set(ATTENDANCE_KEY, r#"{"checkInDone":true,"checkOutDone":false,"isCompleted":false}"#)
            .unwrap();
        let record = AttendanceDayRecord::load_for(&store, day(4)).unwrap();
        assert!(record.check_in_done);
        assert!(!record.check_out_done);
        assert_eq!(record.date, None);
    }

    #[test]
    fn session_presence() {
        let store = MemoryStore::new();
        assert!(!has_session(&store).unwrap());
        store.set(SESSION_TOKEN_KEY, "  ").unwrap();
        assert!(!has_session(&store).unwrap());
        store.set(SESSION_TOKEN_KEY, "abc").unwrap();
        assert!(has_session(&store).unwrap());
    }
}
