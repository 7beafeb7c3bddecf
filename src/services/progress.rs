//! Progress aggregator
//!
//! Maintains the cached per-session progress snapshot. The authoritative
//! copy lives server-side; the cache is refreshed at load and merged
//! with fragments carried inside discovery responses so counts reflect
//! exactly what the server reported, never a local `+= 1` guess.

use crate::api::{Backend, ProgressDelta, ProgressSummary};
use crate::error::{AppError, Result};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct ProgressTracker {
    backend: Arc<dyn Backend>,
    snapshot: Arc<Mutex<ProgressSummary>>,
}

impl ProgressTracker {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            snapshot: Arc::new(Mutex::new(ProgressSummary::default())),
        }
    }

    /// Current cached snapshot.
    pub fn snapshot(&self) -> ProgressSummary {
        self.snapshot.lock().unwrap().clone()
    }

    /// Fetch the authoritative snapshot for the session and replace the
    /// cache with it. The server's completion percentage is taken as-is.
    pub async fn refresh(&self, session_id: &str) -> Result<ProgressSummary> {
        let summary = self
            .backend
            .get_progress(session_id)
            .await
            .map_err(|e| AppError::Load(format!("progress: {}", e)))?;

        Self::check_invariants(&summary);
        *self.snapshot.lock().unwrap() = summary.clone();

        tracing::debug!(
            "Progress refreshed: {}/{} discoveries",
            summary.total_discoveries,
            summary.total_checkpoints
        );
        Ok(summary)
    }

    /// Merge a response-carried fragment into the cached snapshot.
    /// Fields absent from the fragment are left unchanged. Completion
    /// percentage is derived locally only because the fragment never
    /// carries it; a full refresh takes the server's value.
    pub fn apply_delta(&self, delta: &ProgressDelta) -> ProgressSummary {
        let mut snapshot = self.snapshot.lock().unwrap();

        if let Some(discovered) = &delta.checkpoints_discovered {
            snapshot.total_discoveries = discovered.len() as u32;
        }
        if let Some(total) = delta.total_checkpoints {
            snapshot.total_checkpoints = total;
        }
        if let Some(plants) = delta.plants_collected {
            snapshot.plants_collected = plants;
        }
        if let Some(unlocked) = &delta.achievements_unlocked {
            snapshot.achievements_count = unlocked.len() as u32;
        }
        if let Some(trails) = &delta.completed_trails {
            snapshot.trails_completed = trails.len() as u32;
        }
        if let Some(time_spent) = delta.time_spent {
            snapshot.time_spent = time_spent;
        }

        if delta.checkpoints_discovered.is_some() || delta.total_checkpoints.is_some() {
            snapshot.completion_percentage = if snapshot.total_checkpoints == 0 {
                0.0
            } else {
                100.0 * snapshot.total_discoveries as f32 / snapshot.total_checkpoints as f32
            };
        }

        Self::check_invariants(&snapshot);
        snapshot.clone()
    }

    fn check_invariants(summary: &ProgressSummary) {
        if summary.total_discoveries > summary.total_checkpoints {
            tracing::warn!(
                "Progress snapshot inconsistent: {} discoveries > {} checkpoints",
                summary.total_discoveries,
                summary.total_checkpoints
            );
        }
    }
}
