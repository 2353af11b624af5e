//! Credential persistence.
//!
//! One bearer token is kept under the `auth_token` key: read at startup,
//! written on sign-in, removed on sign-out.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage key of the token.
pub const TOKEN_KEY: &str = "auth_token";

/// File name used by [`FileTokenStore::in_dir`].
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Credential storage errors.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Reading or writing the backing file failed.
    #[error("credential file {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The backing file is not valid JSON.
    #[error("credential file {path} is corrupt: {source}")]
    Corrupt {
        /// File involved.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Where the auth token lives between runs.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// The stored token, if any.
    async fn load(&self) -> Result<Option<String>, CredentialError>;

    /// Replace the stored token.
    async fn save(&self, token: &str) -> Result<(), CredentialError>;

    /// Forget the token. Not an error if none is stored.
    async fn clear(&self) -> Result<(), CredentialError>;
}

/// In-process token store, for tests and one-shot sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<String>, CredentialError> {
        Ok(self.slot().clone())
    }

    async fn save(&self, token: &str) -> Result<(), CredentialError> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        self.slot().take();
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CredentialFile {
    auth_token: Option<String>,
}

/// Token kept in a JSON file, readable only by the owner on Unix.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `credentials.json` inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(CREDENTIALS_FILE))
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CredentialError {
        CredentialError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<String>, CredentialError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let file: CredentialFile =
            serde_json::from_str(&contents).map_err(|source| CredentialError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        Ok(file.auth_token.filter(|t| !t.is_empty()))
    }

    async fn save(&self, token: &str) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let file = CredentialFile {
            auth_token: Some(token.to_string()),
        };
        let contents =
            serde_json::to_string_pretty(&file).map_err(|source| CredentialError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|e| self.io_error(e))?;
        set_file_permissions_0600(&self.path)
            .await
            .map_err(|e| self.io_error(e))
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
