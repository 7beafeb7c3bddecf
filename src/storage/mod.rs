//! Persisted client state
//!
//! The only state surviving app restarts is the session identifier,
//! stored as a small JSON file under the data directory. It is cleared
//! only by explicit user action or when rehydration fails.

use crate::config::SESSION_FILE_NAME;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    session_id: String,
}

/// File-backed store for the persisted session identifier.
#[derive(Clone)]
pub struct SessionIdStore {
    path: PathBuf,
}

impl SessionIdStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE_NAME),
        }
    }

    /// Load the persisted session id, if any. A corrupt file is treated
    /// as absent; session bootstrap will replace it.
    pub async fn load(&self) -> Option<String> {
        let content = fs::read_to_string(&self.path).await.ok()?;

        match serde_json::from_str::<PersistedSession>(&content) {
            Ok(persisted) => Some(persisted.session_id),
            Err(e) => {
                tracing::warn!("Ignoring corrupt session file {:?}: {}", self.path, e);
                None
            }
        }
    }

    /// Persist the session id, creating the data directory if needed.
    pub async fn save(&self, session_id: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(&PersistedSession {
            session_id: session_id.to_string(),
        })?;
        fs::write(&self.path, content).await?;

        tracing::info!("Session id persisted to {:?}", self.path);
        Ok(())
    }

    /// Erase the persisted session id. Missing file is not an error.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::info!("Persisted session id cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (SessionIdStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionIdStore::new(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_load_returns_none_when_empty() {
        let (store, _temp) = create_test_store();
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let (store, _temp) = create_test_store();

        store.save("session-abc").await.unwrap();
        assert_eq!(store.load().await.as_deref(), Some("session-abc"));
    }

    #[tokio::test]
    async fn test_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();

        {
            let store = SessionIdStore::new(dir.clone());
            store.save("session-xyz").await.unwrap();
        }

        let store = SessionIdStore::new(dir);
        assert_eq!(store.load().await.as_deref(), Some("session-xyz"));
    }

    #[tokio::test]
    async fn test_clear_removes_file() {
        let (store, _temp) = create_test_store();

        store.save("session-abc").await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.is_none());

        // Clearing again is a no-op.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_treated_as_absent() {
        let (store, temp) = create_test_store();

        tokio::fs::write(temp.path().join(SESSION_FILE_NAME), "not json")
            .await
            .unwrap();
        assert!(store.load().await.is_none());
    }
}
