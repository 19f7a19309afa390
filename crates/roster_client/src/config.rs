use std::{fs, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::warn;

use crate::{error::SetupError, notifier::DEFAULT_MESSAGE_TTL, token_store::FileTokenStore};

pub const DEFAULT_SETTINGS_FILE: &str = "roster.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    /// `None` means the platform data directory.
    pub token_file: Option<PathBuf>,
    pub message_ttl_secs: u64,
    pub log_filter: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            token_file: None,
            message_ttl_secs: DEFAULT_MESSAGE_TTL.as_secs(),
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    token_file: Option<PathBuf>,
    message_ttl_secs: Option<u64>,
    log_filter: Option<String>,
}

impl ClientSettings {
    pub fn message_ttl(&self) -> Duration {
        Duration::from_secs(self.message_ttl_secs)
    }

    pub fn resolved_token_file(&self) -> Result<PathBuf, SetupError> {
        self.token_file
            .clone()
            .or_else(FileTokenStore::default_path)
            .ok_or(SetupError::NoTokenLocation)
    }

    fn apply_file(&mut self, raw: &str) {
        let file_cfg = match toml::from_str::<FileSettings>(raw) {
            Ok(file_cfg) => file_cfg,
            Err(err) => {
                warn!(error = %err, "config: ignoring unreadable settings file");
                return;
            }
        };
        if let Some(v) = file_cfg.server_url {
            self.server_url = v;
        }
        if let Some(v) = file_cfg.token_file {
            self.token_file = Some(v);
        }
        if let Some(v) = file_cfg.message_ttl_secs {
            self.message_ttl_secs = v;
        }
        if let Some(v) = file_cfg.log_filter {
            self.log_filter = v;
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("ROSTER_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = var("APP__SERVER_URL") {
            self.server_url = v;
        }

        if let Some(v) = var("ROSTER_TOKEN_FILE") {
            self.token_file = Some(PathBuf::from(v));
        }

        if let Some(v) = var("APP__MESSAGE_TTL_SECS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.message_ttl_secs = parsed;
            }
        }

        if let Some(v) = var("RUST_LOG") {
            self.log_filter = v;
        }
    }
}

/// Defaults, then `roster.toml` (or `path`), then environment.
pub fn load_settings(path: Option<PathBuf>) -> ClientSettings {
    let mut settings = ClientSettings::default();
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
    if let Ok(raw) = fs::read_to_string(&path) {
        settings.apply_file(&raw);
    }
    settings.apply_env(|key| std::env::var(key).ok());
    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
