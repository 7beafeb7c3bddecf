//! AR settings service
//!
//! Typed access to the per-session AR preferences stored server-side.

use crate::api::{ArSettings, Backend};
use crate::error::Result;
use std::sync::Arc;

#[derive(Clone)]
pub struct SettingsService {
    backend: Arc<dyn Backend>,
}

impl SettingsService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Fetch the session's AR settings; the server answers defaults for
    /// a session that never saved any.
    pub async fn get(&self, session_id: &str) -> Result<ArSettings> {
        self.backend.get_settings(session_id).await
    }

    /// Persist updated AR settings for the session. The sensitivity is
    /// clamped to the detector's valid range before sending.
    pub async fn update(&self, session_id: &str, mut settings: ArSettings) -> Result<ArSettings> {
        settings.marker_detection_sensitivity =
            settings.marker_detection_sensitivity.clamp(0.0, 1.0);

        let saved = self.backend.update_settings(session_id, &settings).await?;
        tracing::info!("AR settings updated for session {}", session_id);

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryBackend;

    #[tokio::test]
    async fn test_defaults_then_update_round_trip() {
        let backend = Arc::new(MemoryBackend::with_sample_data());
        let session = backend.create_session("device_test").await.unwrap();
        let service = SettingsService::new(backend.clone());

        let settings = service.get(&session.id).await.unwrap();
        assert!(settings.camera_enabled);
        assert_eq!(settings.render_quality, "high");

        let mut updated = settings.clone();
        updated.sound_enabled = false;
        updated.render_quality = "low".to_string();
        service.update(&session.id, updated).await.unwrap();

        let reloaded = service.get(&session.id).await.unwrap();
        assert!(!reloaded.sound_enabled);
        assert_eq!(reloaded.render_quality, "low");
    }

    #[tokio::test]
    async fn test_sensitivity_clamped() {
        let backend = Arc::new(MemoryBackend::with_sample_data());
        let session = backend.create_session("device_test").await.unwrap();
        let service = SettingsService::new(backend.clone());

        let mut settings = service.get(&session.id).await.unwrap();
        settings.marker_detection_sensitivity = 3.5;

        let saved = service.update(&session.id, settings).await.unwrap();
        assert_eq!(saved.marker_detection_sensitivity, 1.0);
    }
}
