//! Roster fetch/render and the session-gated mutations.

use std::sync::Arc;

use shared::domain::Roster;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::{
    api::RosterApi,
    error::{ActionCopy, ClientError, SIGNUP_COPY, UNREGISTER_COPY},
    events::{UiEvent, UiEventSender},
    notifier::{MessageKind, Notifier},
    session::SessionController,
    view::{RosterView, ROSTER_LOAD_FAILED},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Signup,
    Unregister,
}

impl Mutation {
    fn label(self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Unregister => "unregister",
        }
    }

    fn copy(self) -> &'static ActionCopy {
        match self {
            Self::Signup => &SIGNUP_COPY,
            Self::Unregister => &UNREGISTER_COPY,
        }
    }
}

/// Owns the last fetched roster. The roster is never edited locally: every
/// successful mutation is followed by a full re-fetch.
///
/// Overlapping calls are not serialized. Whichever fetch completes last
/// determines the stored roster and the last `RosterRendered` event.
pub struct RosterController {
    api: Arc<dyn RosterApi>,
    session: Arc<SessionController>,
    notifier: Arc<Notifier>,
    events: UiEventSender,
    roster: RwLock<Roster>,
    view: RwLock<Option<RosterView>>,
}

impl RosterController {
    pub fn new(
        api: Arc<dyn RosterApi>,
        session: Arc<SessionController>,
        notifier: Arc<Notifier>,
        events: UiEventSender,
    ) -> Self {
        Self {
            api,
            session,
            notifier,
            events,
            roster: RwLock::new(Roster::new()),
            view: RwLock::new(None),
        }
    }

    pub async fn roster(&self) -> Roster {
        self.roster.read().await.clone()
    }

    /// Last successfully rendered view, if any fetch has succeeded yet.
    pub async fn view(&self) -> Option<RosterView> {
        self.view.read().await.clone()
    }

    /// On failure the previous roster and view are kept and the failure
    /// message is rendered in their place.
    pub async fn fetch_roster(&self) -> Result<RosterView, ClientError> {
        let roster = match self.api.fetch_activities().await {
            Ok(roster) => roster,
            Err(failure) => {
                error!(error = %failure, "roster: fetch failed");
                let _ = self
                    .events
                    .send(UiEvent::RosterFailed(ROSTER_LOAD_FAILED.to_string()));
                return Err(failure.into());
            }
        };

        let view = RosterView::render(&roster);
        *self.roster.write().await = roster;
        *self.view.write().await = Some(view.clone());
        info!(activities = view.cards.len(), "roster: rendered");
        let _ = self.events.send(UiEvent::RosterRendered(view.clone()));
        Ok(view)
    }

    pub async fn signup(&self, activity: &str, email: &str) -> Result<String, ClientError> {
        self.mutate(Mutation::Signup, activity, email).await
    }

    pub async fn unregister(&self, activity: &str, email: &str) -> Result<String, ClientError> {
        self.mutate(Mutation::Unregister, activity, email).await
    }

    async fn mutate(
        &self,
        mutation: Mutation,
        activity: &str,
        email: &str,
    ) -> Result<String, ClientError> {
        let copy = mutation.copy();
        let Some(token) = self.session.bearer_token().await else {
            warn!(action = mutation.label(), "roster: rejected while signed out");
            self.notifier.show(copy.unauthorized, MessageKind::Error).await;
            return Err(ClientError::Authorization);
        };

        let outcome = match mutation {
            Mutation::Signup => self.api.signup(activity, email, &token).await,
            Mutation::Unregister => self.api.unregister(activity, email, &token).await,
        };

        match outcome {
            Ok(response) => {
                info!(action = mutation.label(), activity, "roster: mutation accepted");
                self.notifier
                    .show(response.message.clone(), MessageKind::Success)
                    .await;
                if mutation == Mutation::Signup {
                    let _ = self.events.send(UiEvent::SignupFormReset);
                }
                // A failed refresh renders its own failure; the mutation
                // itself still succeeded.
                let _ = self.fetch_roster().await;
                Ok(response.message)
            }
            Err(failure) => {
                let err = ClientError::from_authorized_call(failure);
                warn!(action = mutation.label(), activity, error = %err, "roster: mutation failed");
                if err.is_authentication() {
                    self.session.invalidate().await;
                }
                self.notifier
                    .show(err.user_message(copy), MessageKind::Error)
                    .await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/roster_tests.rs"]
mod tests;
