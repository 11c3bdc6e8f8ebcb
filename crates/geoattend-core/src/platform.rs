//! Platform capability flags decided at the composition root.

use serde::{Deserialize, Serialize};

/// Android API level that introduced the runtime notification permission.
pub const NOTIFICATION_PERMISSION_API_LEVEL: u32 = 33;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformOs {
    Android,
    Ios,
    Desktop,
}

/// What the host platform is and which parts of the engine it supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformProfile {
    pub os: PlatformOs,
    /// OS API level (Android SDK int); ignored elsewhere.
    #[serde(default)]
    pub api_level: u32,
    /// Whether geofence attendance reminders run on this platform at all.
    pub geofence_supported: bool,
}

impl PlatformProfile {
    /// Profile with the default capability for `os`: every platform except
    /// iOS runs the geofence engine.
    pub fn for_os(os: PlatformOs, api_level: u32) -> Self {
        Self {
            os,
            api_level,
            geofence_supported: os != PlatformOs::Ios,
        }
    }

    /// Whether posting notifications needs an explicit runtime grant.
    pub fn requires_notification_permission(&self) -> bool {
        self.os == PlatformOs::Android && self.api_level >= NOTIFICATION_PERMISSION_API_LEVEL
    }
}

impl Default for PlatformProfile {
    fn default() -> Self {
        Self::for_os(PlatformOs::Android, 34)
    }
}
