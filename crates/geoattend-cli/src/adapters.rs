//! Desktop stand-ins for the platform collaborators.
//!
//! A desktop host has no permission service, GPS or notification shade, so
//! each collaborator is answered from configuration or command-line flags.

use std::cell::{Cell, RefCell};

use geoattend_core::config::PermissionsConfig;
use geoattend_core::{
    AttendanceNotification, BackgroundFacility, BackgroundTaskOptions, ChannelSpec, Config,
    GeofenceEngine, KeyValueStore, LocationError, LocationFix, LocationProbe, LocationProvider,
    LocationRequest, NotificationDispatcher, Notifier, NotifyError, PermissionGate,
    PermissionSource, PermissionStatus, SchedulerError,
};

/// Grants read from `[permissions]`, optionally overridden on the command line.
pub struct StaticPermissions {
    background_location: PermissionStatus,
    post_notifications: PermissionStatus,
}

impl StaticPermissions {
    pub fn new(config: &PermissionsConfig, deny_location: bool, deny_notifications: bool) -> Self {
        Self {
            background_location: if deny_location {
                PermissionStatus::Denied
            } else {
                config.background_location
            },
            post_notifications: if deny_notifications {
                PermissionStatus::Denied
            } else {
                config.post_notifications
            },
        }
    }
}

impl PermissionSource for StaticPermissions {
    async fn background_location(&self) -> PermissionStatus {
        self.background_location
    }

    async fn post_notifications(&self) -> PermissionStatus {
        self.post_notifications
    }
}

/// Reports a position given on the command line, or no fix at all.
pub struct FixedLocation {
    fix: Option<LocationFix>,
}

impl FixedLocation {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>, error_m: Option<f64>) -> Self {
        let fix = match (latitude, longitude) {
            (Some(lat), Some(lon)) => {
                let fix = LocationFix::new(lat, lon);
                Some(match error_m {
                    Some(e) => fix.with_error(e),
                    None => fix,
                })
            }
            _ => None,
        };
        Self { fix }
    }
}

impl LocationProvider for FixedLocation {
    async fn current_position(&self, _request: &LocationRequest) -> Result<LocationFix, LocationError> {
        self.fix
            .ok_or_else(|| LocationError::Unavailable("no position given (--lat/--lon)".into()))
    }
}

/// Collects notifications so the command can print them with its report.
#[derive(Default)]
pub struct ConsoleNotifier {
    channels: RefCell<Vec<String>>,
    shown: RefCell<Vec<AttendanceNotification>>,
}

impl ConsoleNotifier {
    pub fn take_shown(&self) -> Vec<AttendanceNotification> {
        self.shown.take()
    }
}

impl Notifier for ConsoleNotifier {
    async fn ensure_channel(&self, channel: &ChannelSpec) -> Result<(), NotifyError> {
        let mut channels = self.channels.borrow_mut();
        if !channels.contains(&channel.id) {
            tracing::debug!(channel = %channel.id, "channel declared");
            channels.push(channel.id.clone());
        }
        Ok(())
    }

    async fn display(&self, notification: &AttendanceNotification) -> Result<(), NotifyError> {
        tracing::info!(title = %notification.title, screen = %notification.data.screen, "notification");
        self.shown.borrow_mut().push(notification.clone());
        Ok(())
    }
}

/// In-process background facility; the command drives invocations itself.
#[derive(Default)]
pub struct LocalFacility {
    completed: Cell<u64>,
}

impl LocalFacility {
    /// Number of completion signals received.
    pub fn completed(&self) -> u64 {
        self.completed.get()
    }
}

impl BackgroundFacility for LocalFacility {
    fn configure(&self, options: &BackgroundTaskOptions) -> Result<(), SchedulerError> {
        tracing::debug!(?options, "local facility configured");
        Ok(())
    }

    fn finish(&self, task_id: &str) {
        tracing::debug!(%task_id, "completion signalled");
        self.completed.set(self.completed.get() + 1);
    }

    fn stop(&self) -> Result<(), SchedulerError> {
        Ok(())
    }
}

pub type HostEngine<'a, S> =
    GeofenceEngine<&'a S, &'a StaticPermissions, &'a FixedLocation, &'a ConsoleNotifier>;

/// Compose the engine from configuration and the host collaborators.
pub fn engine<'a, S: KeyValueStore>(
    config: &Config,
    store: &'a S,
    permissions: &'a StaticPermissions,
    location: &'a FixedLocation,
    notifier: &'a ConsoleNotifier,
) -> HostEngine<'a, S> {
    GeofenceEngine::new(
        store,
        config.geofence(),
        PermissionGate::new(permissions, config.platform_profile()),
        LocationProbe::with_request(location, config.location_request()),
        NotificationDispatcher::with_channel(notifier, config.channel(), &config.notifications.screen),
    )
}
