//! TOML-based engine configuration.
//!
//! Stores:
//! - The office geofence
//! - Location probe budget
//! - Background task options
//! - Platform profile and capability
//! - Notification channel and deep-link target
//! - Static permission grants for hosts without a permission service
//!
//! Configuration is stored at `~/.config/geoattend/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geofence::OfficeGeofence;
use crate::location::LocationRequest;
use crate::notify::{ChannelSpec, Importance, DEFAULT_CHANNEL_ID, DEFAULT_SCREEN};
use crate::permission::PermissionStatus;
use crate::platform::{PlatformOs, PlatformProfile};
use crate::scheduler::{BackgroundTaskOptions, DEFAULT_TASK_ID};
use crate::store::data_dir;

/// Platforms refuse periodic work more frequent than this.
const MIN_INTERVAL_MIN: u64 = 15;
const MAX_INTERVAL_MIN: u64 = 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeofenceConfig {
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    #[serde(default = "default_radius_m")]
    pub radius_m: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_true")]
    pub high_accuracy: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_maximum_age_secs")]
    pub maximum_age_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_task_id")]
    pub task_id: String,
    #[serde(default = "default_interval_min")]
    pub minimum_interval_min: u64,
    #[serde(default)]
    pub stop_on_terminate: bool,
    #[serde(default = "default_true")]
    pub start_on_boot: bool,
    #[serde(default = "default_true")]
    pub enable_headless: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_os")]
    pub os: PlatformOs,
    #[serde(default = "default_api_level")]
    pub api_level: u32,
    /// Overrides the per-OS default capability when set.
    #[serde(default)]
    pub geofence_supported: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_channel_id")]
    pub channel_id: String,
    #[serde(default = "default_channel_name")]
    pub channel_name: String,
    #[serde(default = "default_screen")]
    pub screen: String,
    #[serde(default = "default_importance")]
    pub importance: Importance,
}

/// Grants reported by hosts that have no platform permission service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsConfig {
    #[serde(default = "default_granted")]
    pub background_location: PermissionStatus,
    #[serde(default = "default_granted")]
    pub post_notifications: PermissionStatus,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/geoattend/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub geofence: GeofenceConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub permissions: PermissionsConfig,
}

fn default_latitude() -> f64 {
    OfficeGeofence::DEFAULT.latitude
}
fn default_longitude() -> f64 {
    OfficeGeofence::DEFAULT.longitude
}
fn default_radius_m() -> f64 {
    OfficeGeofence::DEFAULT.radius_m
}
fn default_true() -> bool {
    true
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_maximum_age_secs() -> u64 {
    10
}
fn default_task_id() -> String {
    DEFAULT_TASK_ID.into()
}
fn default_interval_min() -> u64 {
    15
}
fn default_os() -> PlatformOs {
    PlatformOs::Android
}
fn default_api_level() -> u32 {
    34
}
fn default_channel_id() -> String {
    DEFAULT_CHANNEL_ID.into()
}
fn default_channel_name() -> String {
    "Attendance reminders".into()
}
fn default_screen() -> String {
    DEFAULT_SCREEN.into()
}
fn default_importance() -> Importance {
    Importance::High
}
fn default_granted() -> PermissionStatus {
    PermissionStatus::Granted
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
            radius_m: default_radius_m(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_secs: default_timeout_secs(),
            maximum_age_secs: default_maximum_age_secs(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            task_id: default_task_id(),
            minimum_interval_min: default_interval_min(),
            stop_on_terminate: false,
            start_on_boot: true,
            enable_headless: true,
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            os: default_os(),
            api_level: default_api_level(),
            geofence_supported: None,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            channel_id: default_channel_id(),
            channel_name: default_channel_name(),
            screen: default_screen(),
            importance: default_importance(),
        }
    }
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            background_location: PermissionStatus::Granted,
            post_notifications: PermissionStatus::Granted,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                // Optional overrides are stored as null until set.
                serde_json::Value::Null => match value {
                    "true" => serde_json::Value::Bool(true),
                    "false" => serde_json::Value::Bool(false),
                    "" | "none" => serde_json::Value::Null,
                    other => serde_json::Value::String(other.into()),
                },
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/geoattend"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or return (and persist) the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the default cannot
    /// be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value is invalid, or the
    /// config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.geofence;
        if !(-90.0..=90.0).contains(&g.latitude) {
            return Err(ConfigError::InvalidValue {
                key: "geofence.latitude".into(),
                message: format!("{} is outside -90..=90", g.latitude),
            });
        }
        if !(-180.0..=180.0).contains(&g.longitude) {
            return Err(ConfigError::InvalidValue {
                key: "geofence.longitude".into(),
                message: format!("{} is outside -180..=180", g.longitude),
            });
        }
        if !(g.radius_m.is_finite() && g.radius_m > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "geofence.radius_m".into(),
                message: "radius must be positive".into(),
            });
        }
        let interval = self.scheduler.minimum_interval_min;
        if !(MIN_INTERVAL_MIN..=MAX_INTERVAL_MIN).contains(&interval) {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.minimum_interval_min".into(),
                message: format!(
                    "{interval} is outside {MIN_INTERVAL_MIN}..={MAX_INTERVAL_MIN} minutes"
                ),
            });
        }
        if self.probe.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "probe.timeout_secs".into(),
                message: "timeout must be at least one second".into(),
            });
        }
        Ok(())
    }

    pub fn geofence(&self) -> OfficeGeofence {
        OfficeGeofence::new(
            self.geofence.latitude,
            self.geofence.longitude,
            self.geofence.radius_m,
        )
    }

    pub fn location_request(&self) -> LocationRequest {
        LocationRequest {
            high_accuracy: self.probe.high_accuracy,
            timeout: Duration::from_secs(self.probe.timeout_secs),
            maximum_age: Duration::from_secs(self.probe.maximum_age_secs),
        }
    }

    pub fn task_options(&self) -> BackgroundTaskOptions {
        BackgroundTaskOptions {
            task_id: self.scheduler.task_id.clone(),
            minimum_interval: Duration::from_secs(
                self.scheduler.minimum_interval_min.saturating_mul(60),
            ),
            stop_on_terminate: self.scheduler.stop_on_terminate,
            start_on_boot: self.scheduler.start_on_boot,
            enable_headless: self.scheduler.enable_headless,
        }
    }

    pub fn platform_profile(&self) -> PlatformProfile {
        let mut profile = PlatformProfile::for_os(self.platform.os, self.platform.api_level);
        if let Some(supported) = self.platform.geofence_supported {
            profile.geofence_supported = supported;
        }
        profile
    }

    pub fn channel(&self) -> ChannelSpec {
        ChannelSpec {
            id: self.notifications.channel_id.clone(),
            name: self.notifications.channel_name.clone(),
            importance: self.notifications.importance,
        }
    }
}
