//! Session service
//!
//! Establishes and persists the anonymous device-bound session that is
//! the root of all server identity for this client. Created once per
//! device, rehydrated from the persisted id on later launches, and
//! replaced only by explicit user action or a failed rehydration.

use crate::api::{Backend, Session};
use crate::config::DEVICE_ID_SUFFIX_LEN;
use crate::error::{AppError, Result};
use crate::storage::SessionIdStore;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;

/// Generate a device identifier: time-based prefix plus random suffix.
/// Unique per call with overwhelmingly high probability; it is only a
/// bootstrap hint for the server, not a security credential.
pub fn generate_device_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(DEVICE_ID_SUFFIX_LEN)
        .map(char::from)
        .collect();

    format!("device_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// Service managing the session lifecycle.
#[derive(Clone)]
pub struct SessionService {
    backend: Arc<dyn Backend>,
    store: SessionIdStore,
}

impl SessionService {
    pub fn new(backend: Arc<dyn Backend>, store: SessionIdStore) -> Self {
        Self { backend, store }
    }

    /// Load or create the session.
    ///
    /// A persisted id is tried first; if the server no longer knows it
    /// (or the fetch fails), the stale id is discarded and exactly one
    /// new session is created and persisted. Failure to create is
    /// terminal until the user re-initializes.
    pub async fn initialize(&self) -> Result<Session> {
        if let Some(session_id) = self.store.load().await {
            match self.backend.get_session(&session_id).await {
                Ok(session) => {
                    tracing::info!("Rehydrated session {}", session.id);
                    return Ok(session);
                }
                Err(e) => {
                    tracing::warn!("Stored session {} not usable ({}), replacing", session_id, e);
                    self.store.clear().await?;
                }
            }
        }

        let device_id = generate_device_id();
        tracing::info!("Creating new session for device {}", device_id);

        let session = self
            .backend
            .create_session(&device_id)
            .await
            .map_err(|e| AppError::SessionInit(e.to_string()))?;

        self.store.save(&session.id).await?;
        tracing::info!("Session {} created", session.id);

        Ok(session)
    }

    /// Erase the persisted identifier and re-initialize, yielding a new
    /// session.
    pub async fn clear(&self) -> Result<Session> {
        tracing::info!("Clearing session by user request");
        self.store.clear().await?;
        self.initialize().await
    }
}
