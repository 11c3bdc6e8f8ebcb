//! Permission gate for a background cycle.
//!
//! A background invocation cannot prompt the user, so every "no" here is an
//! ordinary outcome rather than an error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::platform::PlatformProfile;
use crate::store::{records, AttendanceDayRecord, KeyValueStore};
use crate::transition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// The user has not been asked yet.
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == PermissionStatus::Granted
    }
}

/// Platform permission subsystem.
#[allow(async_fn_in_trait)]
pub trait PermissionSource {
    async fn background_location(&self) -> PermissionStatus;
    async fn post_notifications(&self) -> PermissionStatus;
}

impl<T: PermissionSource + ?Sized> PermissionSource for &T {
    async fn background_location(&self) -> PermissionStatus {
        (**self).background_location().await
    }

    async fn post_notifications(&self) -> PermissionStatus {
        (**self).post_notifications().await
    }
}

/// Why a cycle was not allowed to proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    PlatformExcluded,
    NoSession,
    AttendanceCompleted,
    BackgroundLocationDenied,
    NotificationsDenied,
    /// The store could not answer a precondition question.
    StoreUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Carries the attendance record read while checking preconditions.
    Allowed(AttendanceDayRecord),
    Denied(DenyReason),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed(_))
    }
}

pub struct PermissionGate<P> {
    source: P,
    platform: PlatformProfile,
}

impl<P: PermissionSource> PermissionGate<P> {
    pub fn new(source: P, platform: PlatformProfile) -> Self {
        Self { source, platform }
    }

    pub fn platform(&self) -> &PlatformProfile {
        &self.platform
    }

    /// Reduce preconditions and platform grants to a single decision.
    ///
    /// Cheap checks run first and return without querying the platform.
    pub async fn check(&self, store: &impl KeyValueStore, today: NaiveDate) -> GateDecision {
        if !self.platform.geofence_supported {
            return GateDecision::Denied(DenyReason::PlatformExcluded);
        }

        match records::has_session(store) {
            Ok(true) => {}
            Ok(false) => return GateDecision::Denied(DenyReason::NoSession),
            Err(e) => {
                tracing::debug!(error = %e, "session lookup failed");
                return GateDecision::Denied(DenyReason::StoreUnavailable);
            }
        }

        let attendance = match AttendanceDayRecord::load_for(store, today) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(error = %e, "attendance lookup failed");
                return GateDecision::Denied(DenyReason::StoreUnavailable);
            }
        };
        if transition::day_is_terminal(&attendance) {
            return GateDecision::Denied(DenyReason::AttendanceCompleted);
        }

        if !self.source.background_location().await.is_granted() {
            return GateDecision::Denied(DenyReason::BackgroundLocationDenied);
        }

        if self.platform.requires_notification_permission()
            && !self.source.post_notifications().await.is_granted()
        {
            return GateDecision::Denied(DenyReason::NotificationsDenied);
        }

        GateDecision::Allowed(attendance)
    }
}
