//! Scripted collaborators shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use chrono::NaiveDate;
use geoattend_core::store::SESSION_TOKEN_KEY;
use geoattend_core::{
    AttendanceDayRecord, AttendanceNotification, BackgroundFacility, BackgroundTaskOptions,
    ChannelSpec, GeofenceEngine, KeyValueStore, LocationError, LocationFix, LocationProbe,
    LocationProvider, LocationRequest, MemoryStore, NotificationDispatcher, Notifier,
    NotifyError, OfficeGeofence, PermissionGate, PermissionSource, PermissionStatus,
    PlatformProfile, SchedulerError,
};

pub const OFFICE: OfficeGeofence = OfficeGeofence {
    latitude: 19.137887,
    longitude: 72.838727,
    radius_m: 100.0,
};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

pub fn at_office() -> LocationFix {
    LocationFix::new(OFFICE.latitude, OFFICE.longitude)
}

/// About 1.1 km north of the office.
pub fn away() -> LocationFix {
    LocationFix::new(OFFICE.latitude + 0.01, OFFICE.longitude)
}

// ============================================================================
// Permissions
// ============================================================================

pub struct Grants {
    pub location: Cell<PermissionStatus>,
    pub notifications: Cell<PermissionStatus>,
}

impl Grants {
    pub fn all() -> Self {
        Self {
            location: Cell::new(PermissionStatus::Granted),
            notifications: Cell::new(PermissionStatus::Granted),
        }
    }
}

impl PermissionSource for Grants {
    async fn background_location(&self) -> PermissionStatus {
        self.location.get()
    }

    async fn post_notifications(&self) -> PermissionStatus {
        self.notifications.get()
    }
}

// ============================================================================
// Location
// ============================================================================

/// Hands out queued fixes one per request, optionally after a delay.
#[derive(Default)]
pub struct ScriptedLocation {
    fixes: RefCell<VecDeque<Result<LocationFix, LocationError>>>,
    pub requests: Cell<u32>,
    pub delay: Cell<Option<Duration>>,
}

impl ScriptedLocation {
    pub fn push(&self, fix: Result<LocationFix, LocationError>) {
        self.fixes.borrow_mut().push_back(fix);
    }
}

impl LocationProvider for ScriptedLocation {
    async fn current_position(&self, _request: &LocationRequest) -> Result<LocationFix, LocationError> {
        self.requests.set(self.requests.get() + 1);
        if let Some(delay) = self.delay.get() {
            tokio::time::sleep(delay).await;
        }
        self.fixes
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(LocationError::Unavailable("script exhausted".into())))
    }
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    pub fail_channel: Cell<bool>,
    pub fail_display: Cell<bool>,
    pub shown: RefCell<Vec<AttendanceNotification>>,
}

impl Notifier for RecordingNotifier {
    async fn ensure_channel(&self, channel: &ChannelSpec) -> Result<(), NotifyError> {
        if self.fail_channel.get() {
            return Err(NotifyError::ChannelFailed {
                channel: channel.id.clone(),
                message: "channel service down".into(),
            });
        }
        Ok(())
    }

    async fn display(&self, notification: &AttendanceNotification) -> Result<(), NotifyError> {
        if self.fail_display.get() {
            return Err(NotifyError::DisplayFailed("display refused".into()));
        }
        self.shown.borrow_mut().push(notification.clone());
        Ok(())
    }
}

// ============================================================================
// Background facility
// ============================================================================

#[derive(Default)]
pub struct RecordingFacility {
    pub configured: RefCell<Vec<BackgroundTaskOptions>>,
    pub finished: RefCell<Vec<String>>,
    pub stopped: Cell<u32>,
}

impl BackgroundFacility for RecordingFacility {
    fn configure(&self, options: &BackgroundTaskOptions) -> Result<(), SchedulerError> {
        self.configured.borrow_mut().push(options.clone());
        Ok(())
    }

    fn finish(&self, task_id: &str) {
        self.finished.borrow_mut().push(task_id.to_string());
    }

    fn stop(&self) -> Result<(), SchedulerError> {
        self.stopped.set(self.stopped.get() + 1);
        Ok(())
    }
}

// ============================================================================
// Wiring
// ============================================================================

/// Everything a test needs to drive and inspect cycles.
pub struct Harness {
    pub store: MemoryStore,
    pub grants: Grants,
    pub location: ScriptedLocation,
    pub notifier: RecordingNotifier,
    pub platform: PlatformProfile,
}

pub type TestEngine<'a> =
    GeofenceEngine<&'a MemoryStore, &'a Grants, &'a ScriptedLocation, &'a RecordingNotifier>;

impl Harness {
    /// Logged in, all permissions granted, nothing done today.
    pub fn new() -> Self {
        let store = MemoryStore::new();
        store.set(SESSION_TOKEN_KEY, "session-token").unwrap();
        Self {
            store,
            grants: Grants::all(),
            location: ScriptedLocation::default(),
            notifier: RecordingNotifier::default(),
            platform: PlatformProfile::default(),
        }
    }

    pub fn engine(&self) -> TestEngine<'_> {
        GeofenceEngine::new(
            &self.store,
            OFFICE,
            PermissionGate::new(&self.grants, self.platform),
            LocationProbe::new(&self.location),
            NotificationDispatcher::new(&self.notifier),
        )
    }

    pub fn set_attendance(&self, check_in_done: bool, check_out_done: bool) {
        AttendanceDayRecord {
            date: Some(today()),
            check_in_done,
            check_out_done,
            is_completed: check_in_done && check_out_done,
        }
        .save(&self.store)
        .unwrap();
    }

    pub fn shown(&self) -> usize {
        self.notifier.shown.borrow().len()
    }
}
