use std::time::Duration;

use chrono::Local;
use clap::Args;
use geoattend_core::{Config, Invocation, Registration, SchedulerAdapter, SqliteStore, TriggerSource};
use serde_json::json;

use super::{runtime, PositionArgs};
use crate::adapters::{self, ConsoleNotifier, FixedLocation, LocalFacility, StaticPermissions};

#[derive(Args)]
pub struct WatchArgs {
    #[command(flatten)]
    position: PositionArgs,
    /// Stop after this many cycles (runs forever if omitted)
    #[arg(long)]
    ticks: Option<u32>,
    /// Seconds between cycles (defaults to the configured minimum interval)
    #[arg(long)]
    interval_secs: Option<u64>,
}

pub fn run(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = SqliteStore::open()?;
    let pos = &args.position;
    let permissions = StaticPermissions::new(&config.permissions, pos.deny_location, pos.deny_notifications);
    let location = FixedLocation::new(pos.lat, pos.lon, pos.error_m);
    let notifier = ConsoleNotifier::default();
    let facility = LocalFacility::default();

    let options = config.task_options();
    let period = args
        .interval_secs
        .map(Duration::from_secs)
        .unwrap_or(options.minimum_interval);
    let task_id = options.task_id.clone();

    let engine = adapters::engine(&config, &store, &permissions, &location, &notifier);
    let adapter = SchedulerAdapter::new(&facility, engine, options);

    if adapter.register()? == Registration::Unsupported {
        println!("{}", json!({ "registration": Registration::Unsupported }));
        return Ok(());
    }
    if args.ticks == Some(0) {
        tracing::info!("no cycles requested");
        return Ok(());
    }

    runtime()?.block_on(async {
        let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
        let mut tick: u32 = 0;
        loop {
            interval.tick().await;
            // The first wake-up stands in for the boot trigger.
            let source = if tick == 0 {
                TriggerSource::Boot
            } else {
                TriggerSource::Periodic
            };
            let invocation = Invocation::new(format!("{task_id}#{tick}"), source);
            let report = adapter
                .on_invocation(&invocation, Local::now().date_naive())
                .await;
            let line = json!({
                "report": report,
                "notifications": notifier.take_shown(),
            });
            println!("{line}");

            tick += 1;
            if args.ticks.is_some_and(|max| tick >= max) {
                break;
            }
        }
    });

    tracing::info!(cycles = facility.completed(), "watch finished");
    Ok(())
}
