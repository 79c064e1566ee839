//! File-backed OAuth2 token store.
//!
//! Tokens are exchanged once through the consent flow and persisted to a
//! JSON file, then refreshed transparently before authenticated calls. All
//! mutation goes through one `tokio` mutex: a single-writer discipline, so
//! concurrent refreshes cannot interleave partial states.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Errors from reading or writing the persisted token file.
#[derive(Error, Debug)]
pub enum TokenStoreError {
    #[error("Token file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Token file parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The persisted token set. Field names match the provider's token
/// response, so the file round-trips the exchange payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Absolute expiry of the access token, unix milliseconds.
    pub expiry_ms: Option<i64>,
}

impl StoredTokens {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Link status reported by `GET /status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    pub google_linked: bool,
    pub has_access_token: bool,
    pub has_refresh_token: bool,
    pub expiry_date: Option<i64>,
}

/// File-backed token store with in-memory cache.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    state: Mutex<StoredTokens>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(StoredTokens::default()),
        }
    }

    /// Load the persisted file into memory. Returns whether tokens were
    /// found. A missing file is not an error; a corrupt one is logged and
    /// treated as absent.
    pub async fn load(&self) -> Result<bool, TokenStoreError> {
        let mut state = self.state.lock().await;
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice::<StoredTokens>(&bytes) {
                Ok(tokens) => {
                    let linked = !tokens.is_empty();
                    *state = tokens;
                    info!("Loaded persisted Google tokens (linked: {})", linked);
                    Ok(linked)
                }
                Err(e) => {
                    warn!("Ignoring unreadable token file {:?}: {}", self.path, e);
                    Ok(false)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist a new token set to disk and memory.
    pub async fn save(&self, tokens: StoredTokens) -> Result<(), TokenStoreError> {
        let mut state = self.state.lock().await;
        let bytes = serde_json::to_vec_pretty(&tokens)?;
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }
        tokio::fs::write(&self.path, bytes).await?;
        *state = tokens;
        Ok(())
    }

    /// Drop tokens from memory and remove the file.
    pub async fn clear(&self) -> Result<(), TokenStoreError> {
        let mut state = self.state.lock().await;
        *state = StoredTokens::default();
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Current in-memory tokens.
    pub async fn snapshot(&self) -> StoredTokens {
        self.state.lock().await.clone()
    }

    pub async fn status(&self) -> TokenStatus {
        let state = self.state.lock().await;
        TokenStatus {
            google_linked: !state.is_empty(),
            has_access_token: state.access_token.is_some(),
            has_refresh_token: state.refresh_token.is_some(),
            expiry_date: state.expiry_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn tokens_round_trip_through_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        let store = FileTokenStore::new(&path);

        assert!(!store.load().await.unwrap());

        store
            .save(StoredTokens {
                access_token: Some("at".to_string()),
                refresh_token: Some("rt".to_string()),
                expiry_ms: Some(1_700_000_000_000),
            })
            .await
            .unwrap();

        // A fresh store over the same path sees the persisted tokens.
        let reloaded = FileTokenStore::new(&path);
        assert!(reloaded.load().await.unwrap());
        let snapshot = reloaded.snapshot().await;
        assert_eq!(snapshot.access_token.as_deref(), Some("at"));
        assert_eq!(snapshot.refresh_token.as_deref(), Some("rt"));

        let status = reloaded.status().await;
        assert!(status.google_linked);
        assert_eq!(status.expiry_date, Some(1_700_000_000_000));
    }

    #[tokio::test]
    async fn clear_removes_the_file_and_memory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        let store = FileTokenStore::new(&path);
        store
            .save(StoredTokens {
                access_token: Some("at".to_string()),
                refresh_token: None,
                expiry_ms: None,
            })
            .await
            .unwrap();

        store.clear().await.unwrap();
        assert!(!path.exists());
        assert!(store.snapshot().await.is_empty());
        // Clearing twice is fine.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_is_treated_as_unlinked() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let store = FileTokenStore::new(&path);
        assert!(!store.load().await.unwrap());
    }
}
