use std::{sync::Arc, time::Duration};

use tokio::sync::broadcast;

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod notifier;
pub mod roster;
pub mod session;
pub mod token_store;
pub mod view;

pub use api::{ApiFailure, HttpRosterApi, RosterApi};
pub use config::{load_settings, ClientSettings};
pub use error::{ClientError, SetupError};
pub use events::{UiEvent, UiVisibility};
pub use notifier::{DisplayMessage, MessageKind, Notifier};
pub use roster::RosterController;
pub use session::{SessionController, SessionState};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use view::{ActivityCard, ParticipantRow, RemovalControl, RosterView};

/// Outcome of the startup sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyState {
    pub session: SessionState,
    pub roster_loaded: bool,
}

/// Wires both controllers to one API, one token slot, one notifier and one
/// event bus.
pub struct RosterApp {
    pub session: Arc<SessionController>,
    pub roster: Arc<RosterController>,
    pub notifier: Arc<Notifier>,
    events: events::UiEventSender,
}

impl RosterApp {
    pub fn new(api: Arc<dyn RosterApi>, store: Arc<dyn TokenStore>, message_ttl: Duration) -> Self {
        let events = events::event_channel();
        let notifier = Arc::new(Notifier::new(events.clone(), message_ttl));
        let session = Arc::new(SessionController::new(
            Arc::clone(&api),
            store,
            Arc::clone(&notifier),
            events.clone(),
        ));
        let roster = Arc::new(RosterController::new(
            api,
            Arc::clone(&session),
            Arc::clone(&notifier),
            events.clone(),
        ));
        Self {
            session,
            roster,
            notifier,
            events,
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, SetupError> {
        let api = HttpRosterApi::new(&settings.server_url)?;
        let store = FileTokenStore::new(settings.resolved_token_file()?);
        Ok(Self::new(
            Arc::new(api),
            Arc::new(store),
            settings.message_ttl(),
        ))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    /// Restores the session and fetches the roster concurrently; the view is
    /// ready once both have finished.
    pub async fn start(&self) -> ReadyState {
        let (session, roster) =
            futures::join!(self.session.restore_session(), self.roster.fetch_roster());
        ReadyState {
            session,
            roster_loaded: roster.is_ok(),
        }
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
