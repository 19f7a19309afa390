//! Authentication state and its persisted token.
//!
//! ```text
//! Anonymous --(login ok | status check ok)--> Authenticated
//! Authenticated --(logout | status check failed | 401 on mutation)--> Anonymous
//! ```

use std::{fmt, sync::Arc};

use shared::protocol::LoginForm;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    api::RosterApi,
    error::{ClientError, LOGIN_COPY},
    events::{UiEvent, UiEventSender, UiVisibility},
    notifier::{MessageKind, Notifier},
    token_store::TokenStore,
};

pub const LOGIN_SUCCEEDED: &str = "Login successful! You can now manage student activities.";
pub const LOGGED_OUT: &str = "Logged out successfully.";
const UNKNOWN_USERNAME: &str = "unknown";

#[derive(Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated { username: String, token: String },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { username, .. } => Some(username),
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { token, .. } => Some(token),
        }
    }
}

// Keeps bearer tokens out of logs and assertion output.
impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Authenticated { username, .. } => f
                .debug_struct("Authenticated")
                .field("username", username)
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

pub struct SessionController {
    api: Arc<dyn RosterApi>,
    store: Arc<dyn TokenStore>,
    notifier: Arc<Notifier>,
    events: UiEventSender,
    state: RwLock<SessionState>,
}

impl SessionController {
    pub fn new(
        api: Arc<dyn RosterApi>,
        store: Arc<dyn TokenStore>,
        notifier: Arc<Notifier>,
        events: UiEventSender,
    ) -> Self {
        Self {
            api,
            store,
            notifier,
            events,
            state: RwLock::new(SessionState::Anonymous),
        }
    }

    pub async fn current(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn bearer_token(&self) -> Option<String> {
        self.state.read().await.token().map(str::to_string)
    }

    /// Validates a previously stored token. Every failure path ends in
    /// `Anonymous` with the stored token cleared.
    pub async fn restore_session(&self) -> SessionState {
        let Some(token) = self.store.load() else {
            info!("session: no stored token");
            return self.transition(SessionState::Anonymous).await;
        };

        match self.api.auth_status(&token).await {
            Ok(status) if status.authenticated => {
                let username = status
                    .username
                    .unwrap_or_else(|| UNKNOWN_USERNAME.to_string());
                info!(username = %username, "session: stored token accepted");
                self.transition(SessionState::Authenticated { username, token })
                    .await
            }
            Ok(_) => {
                info!("session: stored token no longer valid");
                self.discard_stored_token();
                self.transition(SessionState::Anonymous).await
            }
            Err(err) => {
                warn!(error = %err, "session: auth status check failed");
                self.discard_stored_token();
                self.transition(SessionState::Anonymous).await
            }
        }
    }

    /// Returns the signed-in username. On failure the session is left as it
    /// was and the user sees the server detail or a fallback.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let form = LoginForm {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = match self.api.login(&form).await {
            Ok(response) => response,
            Err(failure) => {
                let err = ClientError::from(failure);
                warn!(username, error = %err, "session: login failed");
                self.notifier
                    .show(err.user_message(&LOGIN_COPY), MessageKind::Error)
                    .await;
                return Err(err);
            }
        };

        if let Err(err) = self.store.save(&response.token) {
            warn!(
                error = %err,
                "session: failed to persist token; session will not survive restart"
            );
        }
        info!(
            username = %response.username,
            server_message = response.message.as_deref().unwrap_or(""),
            "session: logged in"
        );
        self.transition(SessionState::Authenticated {
            username: response.username.clone(),
            token: response.token,
        })
        .await;
        self.notifier.show(LOGIN_SUCCEEDED, MessageKind::Success).await;
        Ok(response.username)
    }

    /// Always ends `Anonymous`; the server call is best effort.
    pub async fn logout(&self) {
        if let Some(token) = self.bearer_token().await {
            if let Err(err) = self.api.logout(&token).await {
                warn!(error = %err, "session: server logout failed; clearing locally");
            }
        }
        self.discard_stored_token();
        self.transition(SessionState::Anonymous).await;
        info!("session: logged out");
        self.notifier.show(LOGGED_OUT, MessageKind::Info).await;
    }

    /// Drops a token the server has refused, without a network call.
    pub async fn invalidate(&self) {
        if !self.state.read().await.is_authenticated() {
            return;
        }
        warn!("session: token refused by server; signing out");
        self.discard_stored_token();
        self.transition(SessionState::Anonymous).await;
    }

    fn discard_stored_token(&self) {
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "session: failed to clear stored token");
        }
    }

    async fn transition(&self, next: SessionState) -> SessionState {
        {
            let mut state = self.state.write().await;
            *state = next.clone();
        }
        let _ = self
            .events
            .send(UiEvent::SessionChanged(UiVisibility::for_session(&next)));
        next
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
