use clap::Subcommand;
use geoattend_core::store::SESSION_TOKEN_KEY;
use geoattend_core::{KeyValueStore, SqliteStore, TransitionState};
use uuid::Uuid;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Store a session token (random if omitted)
    Login {
        #[arg(long)]
        token: Option<String>,
    },
    /// Remove the session token and forget geofence state
    Logout,
    /// Print whether a session is present
    Status,
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteStore::open()?;

    match action {
        SessionAction::Login { token } => {
            let token = token.unwrap_or_else(|| Uuid::new_v4().to_string());
            store.set(SESSION_TOKEN_KEY, &token)?;
            println!("{{\"type\": \"logged_in\"}}");
        }
        SessionAction::Logout => {
            store.remove(SESSION_TOKEN_KEY)?;
            // The next user must not inherit this user's geofence memory.
            TransitionState::clear(&store)?;
            println!("{{\"type\": \"logged_out\"}}");
        }
        SessionAction::Status => {
            let present = geoattend_core::store::records::has_session(&store)?;
            println!("{{\"logged_in\": {present}}}");
        }
    }
    Ok(())
}
