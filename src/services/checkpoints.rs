//! Checkpoint store
//!
//! Holds the checkpoints of the active trail, each tagged with its
//! discovery state, and reconciles them with server state. Entry order
//! is the load-response order and is never changed, so UI layout stays
//! deterministic. `discovered` is monotonic within a session: once a
//! checkpoint reaches `Discovered` it never reverts.
//!
//! State tags move only through the documented entry points used by the
//! discovery controller; the view layer never mutates them directly.

use crate::api::{Backend, Checkpoint};
use crate::error::{AppError, Result};
use std::sync::{Arc, Mutex};

/// Per-checkpoint discovery state.
///
/// `Pending` gates duplicate submissions: at most one in-flight
/// discovery request per checkpoint at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    Undiscovered,
    Pending,
    Discovered,
}

/// A checkpoint plus the client-side state tracked alongside it.
#[derive(Debug, Clone)]
pub struct TrackedCheckpoint {
    pub checkpoint: Checkpoint,
    pub state: DiscoveryState,
    /// Transient "in progress" visual flag. Cleared when the request
    /// resolves, and independently by a watchdog timeout.
    pub busy: bool,
}

#[derive(Default)]
struct StoreInner {
    session_id: Option<String>,
    trail_id: Option<String>,
    entries: Vec<TrackedCheckpoint>,
}

/// Store owning the active trail's checkpoints for the session.
#[derive(Clone)]
pub struct CheckpointStore {
    backend: Arc<dyn Backend>,
    inner: Arc<Mutex<StoreInner>>,
}

impl CheckpointStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            inner: Arc::new(Mutex::new(StoreInner::default())),
        }
    }

    /// Fetch checkpoints for a trail, annotated with this session's
    /// discovery state, and make them the live context. Order is
    /// preserved from the response.
    pub async fn load(
        &self,
        trail_id: Option<&str>,
        session_id: &str,
    ) -> Result<Vec<TrackedCheckpoint>> {
        let checkpoints = self
            .backend
            .list_checkpoints(trail_id, Some(session_id))
            .await
            .map_err(|e| AppError::Load(format!("checkpoints: {}", e)))?;

        tracing::info!(
            "Loaded {} checkpoints for trail {:?}",
            checkpoints.len(),
            trail_id
        );

        let entries: Vec<TrackedCheckpoint> = checkpoints
            .into_iter()
            .map(|checkpoint| {
                let state = if checkpoint.discovered {
                    DiscoveryState::Discovered
                } else {
                    DiscoveryState::Undiscovered
                };
                TrackedCheckpoint {
                    checkpoint,
                    state,
                    busy: false,
                }
            })
            .collect();

        let mut inner = self.inner.lock().unwrap();
        inner.session_id = Some(session_id.to_string());
        inner.trail_id = trail_id.map(str::to_string);
        inner.entries = entries.clone();

        Ok(entries)
    }

    /// Snapshot of the current entries, in load order.
    pub fn snapshot(&self) -> Vec<TrackedCheckpoint> {
        self.inner.lock().unwrap().entries.clone()
    }

    pub fn get(&self, checkpoint_id: u32) -> Option<TrackedCheckpoint> {
        self.inner
            .lock()
            .unwrap()
            .entries
            .iter()
            .find(|e| e.checkpoint.id == checkpoint_id)
            .cloned()
    }

    pub fn session_id(&self) -> Option<String> {
        self.inner.lock().unwrap().session_id.clone()
    }

    pub fn trail_id(&self) -> Option<String> {
        self.inner.lock().unwrap().trail_id.clone()
    }

    /// Whether a response issued for this context may still be applied.
    /// Responses arriving after the session or trail changed mid-flight
    /// must be discarded rather than corrupting unrelated state.
    pub fn is_context_live(&self, session_id: &str, checkpoint_id: u32) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.session_id.as_deref() == Some(session_id)
            && inner
                .entries
                .iter()
                .any(|e| e.checkpoint.id == checkpoint_id)
    }

    /// Gate a new discovery request: `Undiscovered -> Pending`.
    /// Returns false when the checkpoint is unknown, already pending,
    /// or already discovered, in which case no request may be issued.
    pub fn begin_discovery(&self, checkpoint_id: u32) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .entries
            .iter_mut()
            .find(|e| e.checkpoint.id == checkpoint_id)
        {
            Some(entry) if entry.state == DiscoveryState::Undiscovered => {
                entry.state = DiscoveryState::Pending;
                entry.busy = true;
                true
            }
            _ => false,
        }
    }

    /// Idempotent local mutation setting `discovered = true`.
    /// No-op if the id is absent or already discovered; never removes
    /// or reorders entries.
    pub fn mark_discovered(&self, checkpoint_id: u32) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner
            .entries
            .iter_mut()
            .find(|e| e.checkpoint.id == checkpoint_id)
        {
            entry.state = DiscoveryState::Discovered;
            entry.checkpoint.discovered = true;
            entry.busy = false;
        }
    }

    /// Roll back a failed request: `Pending -> Undiscovered`.
    /// `Discovered` is terminal and never reverts here.
    pub fn abort_discovery(&self, checkpoint_id: u32) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner
            .entries
            .iter_mut()
            .find(|e| e.checkpoint.id == checkpoint_id)
        {
            if entry.state == DiscoveryState::Pending {
                entry.state = DiscoveryState::Undiscovered;
                entry.busy = false;
            }
        }
    }

    /// Watchdog entry point: clear the visual flag regardless of where
    /// the request stands, bounding worst-case visual lock-up.
    pub fn clear_busy(&self, checkpoint_id: u32) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner
            .entries
            .iter_mut()
            .find(|e| e.checkpoint.id == checkpoint_id)
        {
            if entry.busy {
                tracing::debug!("Clearing stalled busy flag on checkpoint {}", checkpoint_id);
                entry.busy = false;
            }
        }
    }
}
