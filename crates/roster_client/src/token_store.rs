//! Durable slot for the session bearer token.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde_json::{Map, Value};
use thiserror::Error;

/// Key the token is stored under, shared with any other client reading the
/// same storage.
pub const TOKEN_STORAGE_KEY: &str = "authToken";

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("failed to write token file '{}': {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to encode token file: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Only `SessionController` writes through this trait.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> Result<(), TokenStoreError>;
    fn clear(&self) -> Result<(), TokenStoreError>;
}

#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        *self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        Ok(())
    }
}

/// Key/value JSON file, e.g. `{"authToken": "teacher_mchen_0"}`. Keys other
/// than [`TOKEN_STORAGE_KEY`] are preserved on write.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("roster_client").join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Map<String, Value> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), TokenStoreError> {
        let io_err = |source: io::Error| TokenStoreError::Io {
            path: self.path.clone(),
            source,
        };
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(err) if err.kind() != io::ErrorKind::NotFound => Err(io_err(err)),
                _ => Ok(()),
            };
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, raw).map_err(io_err)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        self.read_entries()
            .get(TOKEN_STORAGE_KEY)
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        let mut entries = self.read_entries();
        entries.insert(TOKEN_STORAGE_KEY.to_string(), Value::from(token));
        self.write_entries(&entries)
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        let mut entries = self.read_entries();
        if entries.remove(TOKEN_STORAGE_KEY).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}
