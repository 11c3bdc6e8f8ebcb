use chrono::Local;
use clap::Subcommand;
use geoattend_core::{AttendanceDayRecord, SqliteStore};

#[derive(Subcommand)]
pub enum AttendanceAction {
    /// Print today's attendance record as JSON
    Show,
    /// Overwrite today's attendance record
    Set {
        /// Check-in has been submitted
        #[arg(long)]
        check_in: bool,
        /// Check-out has been submitted
        #[arg(long)]
        check_out: bool,
    },
    /// Clear today's progress
    Clear,
}

pub fn run(action: AttendanceAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteStore::open()?;
    let today = Local::now().date_naive();

    match action {
        AttendanceAction::Show => {
            let record = AttendanceDayRecord::load_for(&store, today)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        AttendanceAction::Set {
            check_in,
            check_out,
        } => {
            let record = AttendanceDayRecord {
                date: Some(today),
                check_in_done: check_in,
                check_out_done: check_out,
                is_completed: check_in && check_out,
            };
            record.save(&store)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        AttendanceAction::Clear => {
            let record = AttendanceDayRecord::for_day(today);
            record.save(&store)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }
    Ok(())
}
