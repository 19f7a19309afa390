use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Internal,
    Other,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            400 | 409 | 422 => Self::Validation,
            500..=599 => Self::Internal,
            _ => Self::Other,
        }
    }
}

/// Failure body returned by the server: `{"detail": "..."}`.
///
/// `detail` is optional because proxies and framework defaults may answer
/// with a body that carries no detail at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, deserialize_with = "detail_as_text")]
    pub detail: Option<String>,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
        }
    }

    /// Decodes a failure body, treating anything unreadable as "no detail".
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }
}

// Validation failures carry a structured list instead of a string; keep it
// readable rather than dropping it.
fn detail_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, Error)]
#[error("{code:?} ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
pub struct ApiRejection {
    pub code: ErrorCode,
    pub status: u16,
    pub detail: Option<String>,
}

impl ApiRejection {
    pub fn new(status: u16, body: ErrorDetail) -> Self {
        Self {
            code: ErrorCode::from_status(status),
            status,
            detail: body.detail,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.code == ErrorCode::Unauthorized
    }
}
