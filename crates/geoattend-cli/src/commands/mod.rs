pub mod attendance;
pub mod config;
pub mod run;
pub mod session;
pub mod state;
pub mod watch;

use clap::{Args, ValueEnum};
use geoattend_core::TriggerSource;

/// Position and permission overrides shared by `run` and `watch`.
#[derive(Args, Debug, Clone)]
pub struct PositionArgs {
    /// Latitude of the simulated fix
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,
    /// Longitude of the simulated fix
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,
    /// Reported horizontal error in meters
    #[arg(long)]
    pub error_m: Option<f64>,
    /// Report background location as denied
    #[arg(long)]
    pub deny_location: bool,
    /// Report notification permission as denied
    #[arg(long)]
    pub deny_notifications: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Source {
    Periodic,
    Boot,
    Headless,
}

impl From<Source> for TriggerSource {
    fn from(source: Source) -> Self {
        match source {
            Source::Periodic => TriggerSource::Periodic,
            Source::Boot => TriggerSource::Boot,
            Source::Headless => TriggerSource::Headless,
        }
    }
}

pub(crate) fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
}
