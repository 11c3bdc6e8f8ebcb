use clap::Subcommand;
use geoattend_core::{GeofenceState, SqliteStore, TransitionState};
use serde_json::json;

#[derive(Subcommand)]
pub enum StateAction {
    /// Print the stored geofence state as JSON
    Show,
    /// Forget the stored geofence state; the next cycle reseeds
    Reset,
}

pub fn run(action: StateAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteStore::open()?;

    match action {
        StateAction::Show => {
            let state = TransitionState::load(&store)?;
            let output = json!({
                "last_inside": state.last_inside,
                "state": GeofenceState::from(state.last_inside),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        StateAction::Reset => {
            TransitionState::clear(&store)?;
            println!("{{\"type\": \"state_reset\"}}");
        }
    }
    Ok(())
}
