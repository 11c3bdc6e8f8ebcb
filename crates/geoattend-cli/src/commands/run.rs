use chrono::Local;
use clap::Args;
use geoattend_core::{Config, Invocation, SchedulerAdapter, SqliteStore};
use serde_json::json;

use super::{runtime, PositionArgs, Source};
use crate::adapters::{self, ConsoleNotifier, FixedLocation, LocalFacility, StaticPermissions};

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    position: PositionArgs,
    /// Trigger to report for this invocation
    #[arg(long, value_enum, default_value = "headless")]
    source: Source,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = SqliteStore::open()?;
    let pos = &args.position;
    let permissions = StaticPermissions::new(&config.permissions, pos.deny_location, pos.deny_notifications);
    let location = FixedLocation::new(pos.lat, pos.lon, pos.error_m);
    let notifier = ConsoleNotifier::default();
    let facility = LocalFacility::default();

    let engine = adapters::engine(&config, &store, &permissions, &location, &notifier);
    let adapter = SchedulerAdapter::new(&facility, engine, config.task_options());

    let mut invocation = Invocation::headless();
    invocation.source = args.source.into();

    let report = runtime()?.block_on(adapter.on_invocation(&invocation, Local::now().date_naive()));

    let output = json!({
        "report": report,
        "notifications": notifier.take_shown(),
        "completed": facility.completed(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
