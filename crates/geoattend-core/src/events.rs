use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notify::DispatchReport;
use crate::permission::DenyReason;
use crate::transition::{Classification, GeofenceState};

/// Result of one pipeline cycle. Every exit path of the engine produces
/// exactly one of these; none of them is an error to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CycleOutcome {
    /// A precondition or permission check said no. Nothing was touched.
    Skipped {
        reason: DenyReason,
        at: DateTime<Utc>,
    },
    /// No usable fix. Stored state is unchanged.
    LocationFailed {
        error: String,
        at: DateTime<Utc>,
    },
    /// The stored geofence state could not be read or written.
    StoreFailed {
        error: String,
        at: DateTime<Utc>,
    },
    Evaluated {
        previous: GeofenceState,
        inside: bool,
        distance_m: f64,
        classification: Classification,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notification: Option<DispatchReport>,
        at: DateTime<Utc>,
    },
}

impl CycleOutcome {
    pub fn classification(&self) -> Option<Classification> {
        match self {
            CycleOutcome::Evaluated { classification, .. } => Some(*classification),
            _ => None,
        }
    }

    /// Whether a notification was actually shown this cycle.
    pub fn notified(&self) -> bool {
        matches!(
            self,
            CycleOutcome::Evaluated {
                notification: Some(DispatchReport { displayed: true, .. }),
                ..
            }
        )
    }
}
