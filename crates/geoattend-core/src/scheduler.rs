//! Background scheduling adapter.
//!
//! The platform wakes the pipeline periodically, after boot, or headless with
//! no UI process alive. Every wake-up must be answered with exactly one
//! completion signal or the OS throttles the task. [`CompletionGuard`]
//! signals on `complete()` or, failing that, on drop, including while a
//! panic unwinds. Builds with `panic = "abort"` lose that last path.
//!
//! The OS may also time a task out while its cycle is still running. The
//! guard and [`SchedulerAdapter::on_timeout`] settle the same [`InFlight`]
//! entry, so whichever comes first signals and the other stays silent.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::engine::GeofenceEngine;
use crate::error::{CoreError, SchedulerError};
use crate::events::CycleOutcome;
use crate::location::{duration_ms, LocationProvider};
use crate::notify::Notifier;
use crate::permission::PermissionSource;
use crate::store::KeyValueStore;

pub const DEFAULT_TASK_ID: &str = "geoattend.attendance-geofence";

/// Minimum re-fire interval most platforms accept for periodic work.
pub const DEFAULT_MINIMUM_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Options handed to the platform background facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundTaskOptions {
    pub task_id: String,
    #[serde(with = "duration_ms")]
    pub minimum_interval: Duration,
    /// Keep running after the app is terminated.
    pub stop_on_terminate: bool,
    /// Resume after device reboot.
    pub start_on_boot: bool,
    /// Allow invocation with no UI process.
    pub enable_headless: bool,
}

impl Default for BackgroundTaskOptions {
    fn default() -> Self {
        Self {
            task_id: DEFAULT_TASK_ID.to_string(),
            minimum_interval: DEFAULT_MINIMUM_INTERVAL,
            stop_on_terminate: false,
            start_on_boot: true,
            enable_headless: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerSource {
    Periodic,
    Boot,
    Headless,
}

/// One wake-up from the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub task_id: String,
    pub source: TriggerSource,
}

impl Invocation {
    pub fn new(task_id: impl Into<String>, source: TriggerSource) -> Self {
        Self {
            task_id: task_id.into(),
            source,
        }
    }

    /// A headless invocation with a fresh task id.
    pub fn headless() -> Self {
        Self::new(format!("headless-{}", Uuid::new_v4()), TriggerSource::Headless)
    }
}

/// Platform background-task subsystem.
pub trait BackgroundFacility {
    fn configure(&self, options: &BackgroundTaskOptions) -> Result<(), SchedulerError>;
    /// Tell the OS the invocation `task_id` is done.
    fn finish(&self, task_id: &str);
    fn stop(&self) -> Result<(), SchedulerError>;
}

impl<T: BackgroundFacility + ?Sized> BackgroundFacility for &T {
    fn configure(&self, options: &BackgroundTaskOptions) -> Result<(), SchedulerError> {
        (**self).configure(options)
    }

    fn finish(&self, task_id: &str) {
        (**self).finish(task_id)
    }

    fn stop(&self) -> Result<(), SchedulerError> {
        (**self).stop()
    }
}

/// Task ids whose completion has not been signalled yet.
#[derive(Debug, Default)]
pub struct InFlight {
    ids: Mutex<HashSet<String>>,
}

impl InFlight {
    fn begin(&self, task_id: &str) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(task_id.to_string());
    }

    /// Remove `task_id`; true if the caller is the one to signal it.
    fn settle(&self, task_id: &str) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(task_id)
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(task_id)
    }
}

/// Signals completion for one invocation exactly once.
pub struct CompletionGuard<'a, F: BackgroundFacility> {
    facility: &'a F,
    in_flight: &'a InFlight,
    task_id: Option<String>,
}

impl<'a, F: BackgroundFacility> CompletionGuard<'a, F> {
    pub fn new(facility: &'a F, in_flight: &'a InFlight, task_id: &str) -> Self {
        in_flight.begin(task_id);
        Self {
            facility,
            in_flight,
            task_id: Some(task_id.to_string()),
        }
    }

    pub fn complete(mut self) {
        if let Some(task_id) = self.task_id.take() {
            self.signal(&task_id);
        }
    }

    fn signal(&self, task_id: &str) {
        if self.in_flight.settle(task_id) {
            self.facility.finish(task_id);
        } else {
            tracing::debug!(%task_id, "completion already signalled");
        }
    }
}

impl<F: BackgroundFacility> Drop for CompletionGuard<'_, F> {
    fn drop(&mut self) {
        if let Some(task_id) = self.task_id.take() {
            tracing::warn!(%task_id, "cycle ended abnormally, signalling completion");
            self.signal(&task_id);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Registration {
    Registered,
    /// The platform capability is off; nothing was registered.
    Unsupported,
}

/// One handled invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub task_id: String,
    pub source: TriggerSource,
    pub outcome: CycleOutcome,
}

pub struct SchedulerAdapter<F, S, P, L, N> {
    facility: F,
    engine: GeofenceEngine<S, P, L, N>,
    options: BackgroundTaskOptions,
    in_flight: InFlight,
}

impl<F, S, P, L, N> SchedulerAdapter<F, S, P, L, N>
where
    F: BackgroundFacility,
    S: KeyValueStore,
    P: PermissionSource,
    L: LocationProvider,
    N: Notifier,
{
    pub fn new(facility: F, engine: GeofenceEngine<S, P, L, N>, options: BackgroundTaskOptions) -> Self {
        Self {
            facility,
            engine,
            options,
            in_flight: InFlight::default(),
        }
    }

    pub fn engine(&self) -> &GeofenceEngine<S, P, L, N> {
        &self.engine
    }

    pub fn facility(&self) -> &F {
        &self.facility
    }

    pub fn options(&self) -> &BackgroundTaskOptions {
        &self.options
    }

    /// Whether a cycle for `task_id` is running and not yet acknowledged.
    pub fn is_in_flight(&self, task_id: &str) -> bool {
        self.in_flight.contains(task_id)
    }

    /// Register the pipeline with the platform, unless the platform
    /// capability is off.
    ///
    /// # Errors
    ///
    /// Returns the facility's registration error.
    pub fn register(&self) -> Result<Registration, SchedulerError> {
        if !self.engine.gate().platform().geofence_supported {
            tracing::info!("geofence reminders unsupported on this platform, not registering");
            return Ok(Registration::Unsupported);
        }
        self.facility.configure(&self.options)?;
        tracing::info!(
            task_id = %self.options.task_id,
            interval_ms = self.options.minimum_interval.as_millis() as u64,
            "background task registered"
        );
        Ok(Registration::Registered)
    }

    /// Handle one wake-up. Completion is signalled on every path.
    pub async fn on_invocation(&self, invocation: &Invocation, today: NaiveDate) -> CycleReport {
        let guard = CompletionGuard::new(&self.facility, &self.in_flight, &invocation.task_id);
        let span = tracing::info_span!("cycle", task_id = %invocation.task_id, source = ?invocation.source);
        let outcome = self.engine.run_cycle(today).instrument(span).await;
        guard.complete();
        CycleReport {
            task_id: invocation.task_id.clone(),
            source: invocation.source,
            outcome,
        }
    }

    /// The OS ran out of patience for `task_id`; acknowledge it.
    ///
    /// If a cycle for `task_id` is still running, this takes over its
    /// completion signal and the cycle finishes silently.
    pub fn on_timeout(&self, task_id: &str) {
        if self.in_flight.settle(task_id) {
            tracing::warn!(%task_id, "background task timed out mid-cycle");
        } else {
            tracing::warn!(%task_id, "background task timed out");
        }
        self.facility.finish(task_id);
    }

    /// Deregister the task and forget geofence state (logout).
    ///
    /// # Errors
    ///
    /// Returns the facility's stop error or the store error from clearing
    /// state.
    pub fn stop(&self) -> Result<(), CoreError> {
        self.facility.stop()?;
        self.engine.reset()?;
        Ok(())
    }
}
