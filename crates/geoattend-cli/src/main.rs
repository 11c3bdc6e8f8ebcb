use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod adapters;
mod commands;

#[derive(Parser)]
#[command(name = "geoattend", version, about = "Geofence attendance reminder engine")]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one headless cycle with a given position
    Run(commands::run::RunArgs),
    /// Register the task and run periodic cycles in-process
    Watch(commands::watch::WatchArgs),
    /// Stored geofence state
    State {
        #[command(subcommand)]
        action: commands::state::StateAction,
    },
    /// Session token (simulates the login flow)
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Today's attendance record (simulates the attendance flow)
    Attendance {
        #[command(subcommand)]
        action: commands::attendance::AttendanceAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Watch(args) => commands::watch::run(args),
        Commands::State { action } => commands::state::run(action),
        Commands::Session { action } => commands::session::run(action),
        Commands::Attendance { action } => commands::attendance::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
