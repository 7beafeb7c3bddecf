//! Application state and initialization
//!
//! Central wiring for the client engine: one backend handle injected
//! into every service, session bootstrap at startup, and the single
//! notification drain loop the presentation layer subscribes to.

use crate::api::{ApiClient, Backend, Session};
use crate::config::AppConfig;
use crate::error::Result;
use crate::services::{
    CheckpointStore, DiscoveryController, Notification, NotificationQueue, ProgressTracker,
    SessionService, SettingsService,
};
use crate::storage::SessionIdStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Central application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub session: Session,
    pub sessions: SessionService,
    pub checkpoints: CheckpointStore,
    pub progress: ProgressTracker,
    pub notifications: NotificationQueue,
    pub discovery: DiscoveryController,
    pub settings: SettingsService,
}

impl AppState {
    /// Initialize against the configured HTTP backend.
    pub async fn initialize(config: &AppConfig) -> Result<Self> {
        let backend = Arc::new(ApiClient::new(&config.api_url)?);
        Self::with_backend(backend, config.data_dir.clone()).await
    }

    /// Initialize with an explicit backend (in-memory demo, tests).
    pub async fn with_backend(backend: Arc<dyn Backend>, data_dir: PathBuf) -> Result<Self> {
        tracing::info!("Initializing application state");

        let sessions = SessionService::new(backend.clone(), SessionIdStore::new(data_dir));
        let session = sessions.initialize().await?;

        let checkpoints = CheckpointStore::new(backend.clone());
        let progress = ProgressTracker::new(backend.clone());
        let notifications = NotificationQueue::new();
        let discovery = DiscoveryController::new(
            backend.clone(),
            checkpoints.clone(),
            progress.clone(),
            notifications.clone(),
        );
        let settings = SettingsService::new(backend.clone());

        tracing::info!("Application initialized with session {}", session.id);

        Ok(Self {
            backend,
            session,
            sessions,
            checkpoints,
            progress,
            notifications,
            discovery,
            settings,
        })
    }

    /// Start the notification drain loop and return the receiving end
    /// for the presentation layer.
    pub fn spawn_notification_dispatcher(&self) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = self.notifications.clone();
        tokio::spawn(async move { queue.run(tx).await });
        rx
    }

    /// Discard the current session and start a fresh one. Checkpoint
    /// and progress state must be reloaded by the caller for the new
    /// session; in-flight responses for the old one become stale and
    /// are discarded by the controller.
    pub async fn clear_session(&mut self) -> Result<()> {
        self.session = self.sessions.clear().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryBackend;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_initialize_and_clear_session() {
        let temp = TempDir::new().unwrap();
        let backend = Arc::new(MemoryBackend::with_sample_data());

        let mut state = AppState::with_backend(backend.clone(), temp.path().to_path_buf())
            .await
            .unwrap();
        let original = state.session.id.clone();

        state.clear_session().await.unwrap();
        assert_ne!(state.session.id, original);
        assert_eq!(backend.session_count(), 2);
    }
}
