//! HTTP seam to the roster server.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::Roster,
    error::{ApiRejection, ErrorDetail},
    protocol::{AuthStatusResponse, LoginForm, LoginResponse, MessageResponse},
};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Error)]
pub enum ApiFailure {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("server rejected request: {0}")]
    Rejected(#[from] ApiRejection),
    #[error("undecodable server response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// One method per server endpoint. Tokens are passed per call; the
/// implementation holds no session state of its own.
#[async_trait]
pub trait RosterApi: Send + Sync {
    async fn fetch_activities(&self) -> Result<Roster, ApiFailure>;
    async fn auth_status(&self, token: &str) -> Result<AuthStatusResponse, ApiFailure>;
    async fn login(&self, form: &LoginForm) -> Result<LoginResponse, ApiFailure>;
    async fn logout(&self, token: &str) -> Result<(), ApiFailure>;
    async fn signup(
        &self,
        activity: &str,
        email: &str,
        token: &str,
    ) -> Result<MessageResponse, ApiFailure>;
    async fn unregister(
        &self,
        activity: &str,
        email: &str,
        token: &str,
    ) -> Result<MessageResponse, ApiFailure>;
}

#[derive(Debug, Error)]
pub enum ServerUrlError {
    #[error("invalid server url '{url}': {source}")]
    Parse {
        url: String,
        source: url::ParseError,
    },
    #[error("server url must start with http:// or https://, got '{0}'")]
    UnsupportedScheme(String),
}

pub struct HttpRosterApi {
    http: Client,
    base: Url,
}

impl HttpRosterApi {
    pub fn new(server_url: &str) -> Result<Self, ServerUrlError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, ServerUrlError> {
        let base = Url::parse(server_url.trim()).map_err(|source| ServerUrlError::Parse {
            url: server_url.to_string(),
            source,
        })?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(ServerUrlError::UnsupportedScheme(server_url.to_string()));
        }
        Ok(Self { http, base })
    }

    /// Appends `segments` to the base path, percent-encoding each one, so an
    /// activity name like `Chess Club` or `A/B` stays a single segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiFailure> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ApiRejection::new(status.as_u16(), ErrorDetail::from_body(&body)).into());
    }
    serde_json::from_str(&body).map_err(|err| ApiFailure::Decode(err.to_string()))
}

#[async_trait]
impl RosterApi for HttpRosterApi {
    async fn fetch_activities(&self) -> Result<Roster, ApiFailure> {
        let response = self.http.get(self.endpoint(&["activities"])).send().await?;
        decode_json(response).await
    }

    async fn auth_status(&self, token: &str) -> Result<AuthStatusResponse, ApiFailure> {
        let response = self
            .http
            .get(self.endpoint(&["auth", "status"]))
            .bearer_auth(token)
            .send()
            .await?;
        decode_json(response).await
    }

    async fn login(&self, form: &LoginForm) -> Result<LoginResponse, ApiFailure> {
        let response = self
            .http
            .post(self.endpoint(&["login"]))
            .form(form)
            .send()
            .await?;
        decode_json(response).await
    }

    async fn logout(&self, token: &str) -> Result<(), ApiFailure> {
        let response = self
            .http
            .post(self.endpoint(&["logout"]))
            .bearer_auth(token)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiRejection::new(status.as_u16(), ErrorDetail::from_body(&body)).into())
    }

    async fn signup(
        &self,
        activity: &str,
        email: &str,
        token: &str,
    ) -> Result<MessageResponse, ApiFailure> {
        let response = self
            .http
            .post(self.endpoint(&["activities", activity, "signup"]))
            .query(&[("email", email)])
            .bearer_auth(token)
            .send()
            .await?;
        decode_json(response).await
    }

    async fn unregister(
        &self,
        activity: &str,
        email: &str,
        token: &str,
    ) -> Result<MessageResponse, ApiFailure> {
        let response = self
            .http
            .delete(self.endpoint(&["activities", activity, "unregister"]))
            .query(&[("email", email)])
            .bearer_auth(token)
            .send()
            .await?;
        decode_json(response).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
