//! Edge-detecting transition state machine.
//!
//! ## States
//!
//! ```text
//! Unseeded --(any)--> Inside | Outside
//! Outside --(inside)--> Inside     Enter, unless already checked in
//! Inside --(outside)--> Outside    Exit, only if checked in and not out
//! ```
//!
//! The stored flag always tracks the last observed physical state. Whether a
//! notification fires is decided separately from the attendance record, so a
//! manual check-in in the app never desynchronizes geofence tracking.

use serde::{Deserialize, Serialize};

use crate::store::AttendanceDayRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// First observation; only seeds the stored flag.
    Seed,
    Enter,
    Exit,
    NoOp,
}

/// Where the machine is, derived from the stored flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeofenceState {
    Unseeded,
    Outside,
    Inside,
}

impl From<Option<bool>> for GeofenceState {
    fn from(last_inside: Option<bool>) -> Self {
        match last_inside {
            None => GeofenceState::Unseeded,
            Some(false) => GeofenceState::Outside,
            Some(true) => GeofenceState::Inside,
        }
    }
}

/// Classification plus the flag value to persist afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub classification: Classification,
    pub persist_inside: bool,
}

/// Classify one evaluation against the stored flag and today's attendance.
pub fn classify(
    last_inside: Option<bool>,
    inside: bool,
    attendance: &AttendanceDayRecord,
) -> Transition {
    let classification = match last_inside {
        None => Classification::Seed,
        Some(false) if inside && !attendance.check_in_done => Classification::Enter,
        Some(true) if !inside && attendance.check_in_done && !attendance.check_out_done => {
            Classification::Exit
        }
        Some(_) => Classification::NoOp,
    };
    Transition {
        classification,
        persist_inside: inside,
    }
}

/// True once nothing more can happen today. Either the attendance flow
/// marked the day completed or both submissions are in.
pub fn day_is_terminal(attendance: &AttendanceDayRecord) -> bool {
    attendance.is_completed || (attendance.check_in_done && attendance.check_out_done)
}
