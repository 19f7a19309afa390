use shared::error::ApiRejection;
use thiserror::Error;

use crate::api::{ApiFailure, ServerUrlError};

/// Failure of a user-triggered action, as seen by the controllers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(String),
    /// The bearer token was refused; the session has been demoted.
    #[error("authentication failed: {}", .detail.as_deref().unwrap_or("token rejected"))]
    Authentication { detail: Option<String> },
    /// A mutation was attempted while anonymous. Never reaches the network.
    #[error("not authorized: a teacher must be signed in")]
    Authorization,
    #[error("server rejected request ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected { status: u16, detail: Option<String> },
    #[error("undecodable server response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Like `From<ApiFailure>`, but a 401 means the token itself was refused.
    pub fn from_authorized_call(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::Rejected(rejection) if rejection.is_unauthorized() => {
                Self::Authentication {
                    detail: rejection.detail,
                }
            }
            other => other.into(),
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Text shown to the user. Server detail is surfaced verbatim; transport
    /// and decode failures never leak their raw cause.
    pub fn user_message(&self, copy: &ActionCopy) -> String {
        match self {
            Self::Rejected { detail, .. } | Self::Authentication { detail } => detail
                .clone()
                .filter(|detail| !detail.trim().is_empty())
                .unwrap_or_else(|| copy.rejected.to_string()),
            Self::Transport(_) | Self::Decode(_) => copy.transport.to_string(),
            Self::Authorization => copy.unauthorized.to_string(),
        }
    }
}

impl From<ApiFailure> for ClientError {
    fn from(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::Transport(cause) => Self::Transport(cause),
            ApiFailure::Decode(cause) => Self::Decode(cause),
            ApiFailure::Rejected(ApiRejection { status, detail, .. }) => {
                Self::Rejected { status, detail }
            }
        }
    }
}

/// Fallback wording for one kind of user action.
#[derive(Debug, Clone, Copy)]
pub struct ActionCopy {
    pub rejected: &'static str,
    pub transport: &'static str,
    pub unauthorized: &'static str,
}

pub const LOGIN_COPY: ActionCopy = ActionCopy {
    rejected: "Login failed",
    transport: "Login failed. Please try again.",
    unauthorized: "Login failed",
};

pub const SIGNUP_COPY: ActionCopy = ActionCopy {
    rejected: "An error occurred",
    transport: "Failed to sign up. Please try again.",
    unauthorized: "Only teachers can register students. Please log in.",
};

pub const UNREGISTER_COPY: ActionCopy = ActionCopy {
    rejected: "An error occurred",
    transport: "Failed to unregister. Please try again.",
    unauthorized: "Only teachers can unregister students. Please log in.",
};

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    ServerUrl(#[from] ServerUrlError),
    #[error("no token file configured and no platform data directory available")]
    NoTokenLocation,
}
