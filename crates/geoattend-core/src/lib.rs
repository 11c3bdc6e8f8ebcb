//! # geoattend Core Library
//!
//! A background engine that reminds field staff to check in when they arrive
//! at the office and to check out when they leave. It runs from the
//! platform's background task facility, with or without a UI process, and
//! fires at most one check-in and one check-out reminder per day.
//!
//! ## Architecture
//!
//! - **Geofence**: planar distance from the office, inclusive radius
//! - **Permission gate**: session, attendance and platform grants reduced to
//!   allow/deny
//! - **Location probe**: one bounded high-accuracy fix per cycle
//! - **Store**: injected key-value state (SQLite or in-memory)
//! - **Transition machine**: edge detection with a cold-start seed
//! - **Dispatcher**: channel declaration plus a deep-linkable notification
//! - **Scheduler adapter**: registration and the completion signal
//!
//! ## Key Components
//!
//! - [`GeofenceEngine`]: one cycle of the pipeline
//! - [`SchedulerAdapter`]: wires the engine to a [`BackgroundFacility`]
//! - [`KeyValueStore`]: persistence seam
//! - [`Config`]: TOML configuration

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod geofence;
pub mod location;
pub mod notify;
pub mod permission;
pub mod platform;
pub mod scheduler;
pub mod store;
pub mod transition;

pub use config::Config;
pub use engine::GeofenceEngine;
pub use error::{ConfigError, CoreError, LocationError, NotifyError, SchedulerError, StoreError};
pub use events::CycleOutcome;
pub use geofence::{GeofenceEvaluation, OfficeGeofence};
pub use location::{LocationFix, LocationProbe, LocationProvider, LocationRequest};
pub use notify::{
    AttendanceNotification, ChannelSpec, DispatchReport, NotificationDispatcher, Notifier,
    ReminderKind,
};
pub use permission::{DenyReason, GateDecision, PermissionGate, PermissionSource, PermissionStatus};
pub use platform::{PlatformOs, PlatformProfile};
pub use scheduler::{
    BackgroundFacility, BackgroundTaskOptions, CompletionGuard, CycleReport, InFlight, Invocation,
    Registration, SchedulerAdapter, TriggerSource,
};
pub use store::{AttendanceDayRecord, KeyValueStore, MemoryStore, SqliteStore, TransitionState};
pub use transition::{Classification, GeofenceState};
