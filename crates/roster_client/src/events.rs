//! Typed notifications from the controllers to whatever renders them.

use tokio::sync::broadcast;

use crate::{notifier::DisplayMessage, session::SessionState, view::RosterView};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    SessionChanged(UiVisibility),
    RosterRendered(RosterView),
    RosterFailed(String),
    MessageShown(DisplayMessage),
    MessageCleared,
    SignupFormReset,
}

/// What the page chrome should show for a given session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiVisibility {
    pub signup_form_visible: bool,
    pub user_info: Option<String>,
    pub login_affordance_visible: bool,
}

impl UiVisibility {
    pub fn for_session(state: &SessionState) -> Self {
        match state {
            SessionState::Anonymous => Self {
                signup_form_visible: false,
                user_info: None,
                login_affordance_visible: true,
            },
            SessionState::Authenticated { username, .. } => Self {
                signup_form_visible: true,
                user_info: Some(username.clone()),
                login_affordance_visible: false,
            },
        }
    }
}

pub type UiEventSender = broadcast::Sender<UiEvent>;

pub fn event_channel() -> UiEventSender {
    let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    events
}
