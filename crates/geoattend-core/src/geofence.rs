//! Planar geofence evaluation.
//!
//! Office radii are tens to low hundreds of meters, so an equirectangular
//! projection is used instead of a great-circle formula. The longitude delta
//! is scaled by `cos(mean latitude)` and both axes are converted to meters
//! with the Earth's mean radius.

use serde::{Deserialize, Serialize};

use crate::location::LocationFix;

/// Earth's mean radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A circular region around the office.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OfficeGeofence {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
}

impl OfficeGeofence {
    /// The office the app ships with.
    pub const DEFAULT: OfficeGeofence = OfficeGeofence {
        latitude: 19.137887,
        longitude: 72.838727,
        radius_m: 100.0,
    };

    pub fn new(latitude: f64, longitude: f64, radius_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius_m,
        }
    }

    /// Evaluate a fix against this geofence.
    pub fn evaluate(&self, fix: &LocationFix) -> GeofenceEvaluation {
        let distance_m = planar_distance_m(fix.latitude, fix.longitude, self.latitude, self.longitude);
        GeofenceEvaluation {
            inside: distance_m <= self.radius_m,
            distance_m,
        }
    }
}

impl Default for OfficeGeofence {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Result of a single geofence evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceEvaluation {
    pub inside: bool,
    pub distance_m: f64,
}

/// Equirectangular distance in meters between two coordinates in degrees.
pub fn planar_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let mean_lat = ((lat1 + lat2) / 2.0).to_radians();
    let x = (lon2 - lon1).to_radians() * mean_lat.cos();
    let y = (lat2 - lat1).to_radians();
    x.hypot(y) * EARTH_RADIUS_M
}
