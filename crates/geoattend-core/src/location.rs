//! Single-fix location probe.
//!
//! The probe asks the platform for one high-accuracy fix and bounds the wait
//! itself, so a provider that never answers cannot stall the background
//! cycle past the OS execution budget.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LocationError;

/// Default upper bound for acquiring a fix.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default maximum age of a cached fix the provider may return.
pub const DEFAULT_MAXIMUM_AGE: Duration = Duration::from_secs(10);

/// A position reported by the platform. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported horizontal error radius in meters, if the provider has one.
    #[serde(default)]
    pub error_m: Option<f64>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            error_m: None,
        }
    }

    pub fn with_error(mut self, error_m: f64) -> Self {
        self.error_m = Some(error_m);
        self
    }

    /// Finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Parameters passed to the platform for one fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRequest {
    pub high_accuracy: bool,
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
    #[serde(with = "duration_ms")]
    pub maximum_age: Duration,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: DEFAULT_TIMEOUT,
            maximum_age: DEFAULT_MAXIMUM_AGE,
        }
    }
}

/// Platform location subsystem.
#[allow(async_fn_in_trait)]
pub trait LocationProvider {
    /// Acquire the current position. Implementations should honor
    /// `request.timeout`, but the probe enforces it regardless.
    async fn current_position(&self, request: &LocationRequest) -> Result<LocationFix, LocationError>;
}

impl<T: LocationProvider + ?Sized> LocationProvider for &T {
    async fn current_position(&self, request: &LocationRequest) -> Result<LocationFix, LocationError> {
        (**self).current_position(request).await
    }
}

/// Acquires one fix per cycle, bounded by the request timeout.
pub struct LocationProbe<L> {
    provider: L,
    request: LocationRequest,
}

impl<L: LocationProvider> LocationProbe<L> {
    pub fn new(provider: L) -> Self {
        Self::with_request(provider, LocationRequest::default())
    }

    pub fn with_request(provider: L, request: LocationRequest) -> Self {
        Self { provider, request }
    }

    pub fn request(&self) -> &LocationRequest {
        &self.request
    }

    pub fn provider(&self) -> &L {
        &self.provider
    }

    /// Acquire a single validated fix.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Timeout`] when no fix arrives in time, the
    /// provider's own error, or [`LocationError::InvalidFix`] for coordinates
    /// that are not finite or out of range.
    pub async fn acquire(&self) -> Result<LocationFix, LocationError> {
        let timeout = self.request.timeout;
        let fix = bounded(timeout, self.provider.current_position(&self.request)).await?;
        if !fix.is_valid() {
            return Err(LocationError::InvalidFix {
                latitude: fix.latitude,
                longitude: fix.longitude,
            });
        }
        Ok(fix)
    }
}

async fn bounded<F>(timeout: Duration, fut: F) -> Result<LocationFix, LocationError>
where
    F: Future<Output = Result<LocationFix, LocationError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(LocationError::Timeout(timeout)),
    }
}

pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<LocationFix, LocationError>);

    impl LocationProvider for Fixed {
        async fn current_position(&self, _request: &LocationRequest) -> Result<LocationFix, LocationError> {
            self.0.clone()
        }
    }

    struct Hanging;

    impl LocationProvider for Hanging {
        async fn current_position(&self, _request: &LocationRequest) -> Result<LocationFix, LocationError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn returns_provider_fix() {
        let probe = LocationProbe::new(Fixed(Ok(LocationFix::new(19.1, 72.8).with_error(5.0))));
        let fix = probe.acquire().await.unwrap();
        assert_eq!(fix.latitude, 19.1);
        assert_eq!(fix.error_m, Some(5.0));
    }

    #[tokio::test]
    async fn passes_provider_error_through() {
        let probe = LocationProbe::new(Fixed(Err(LocationError::PermissionDenied)));
        assert_eq!(probe.acquire().await, Err(LocationError::PermissionDenied));
    }

    #[tokio::test]
    async fn rejects_out_of_range_fix() {
        let probe = LocationProbe::new(Fixed(Ok(LocationFix::new(91.0, 0.0))));
        assert!(matches!(
            probe.acquire().await,
            Err(LocationError::InvalidFix { .. })
        ));

        let probe = LocationProbe::new(Fixed(Ok(LocationFix::new(f64::NAN, 0.0))));
        assert!(probe.acquire().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_provider_times_out() {
        let probe = LocationProbe::new(Hanging);
        assert_eq!(
            probe.acquire().await,
            Err(LocationError::Timeout(DEFAULT_TIMEOUT))
        );
    }

    #[test]
    fn default_request_matches_background_budget() {
        let req = LocationRequest::default();
        assert!(req.high_accuracy);
        assert_eq!(req.timeout, Duration::from_secs(15));
        assert_eq!(req.maximum_age, Duration::from_secs(10));
    }
}
