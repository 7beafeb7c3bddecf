//! Discovery controller
//!
//! Orchestrates the tap-to-discover interaction: per-checkpoint state
//! machine `Undiscovered -> Pending -> Discovered` (with rollback to
//! `Undiscovered` on failure), de-duplication of rapid repeat taps,
//! merge of server-returned achievement and progress deltas, and the
//! sequenced notifications that follow a successful discovery.
//!
//! Every request carries the context it was issued for; a response
//! whose context is no longer live (session or trail changed
//! mid-flight) is discarded silently instead of corrupting state.

use crate::api::Backend;
use crate::config::{ACHIEVEMENT_TOAST_DELAY_MS, INFO_VIEW_DELAY_MS, PENDING_VISUAL_TIMEOUT_MS};
use crate::services::checkpoints::{CheckpointStore, DiscoveryState};
use crate::services::notifications::{Notification, NotificationQueue};
use crate::services::progress::ProgressTracker;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Result of a tap, for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    /// Checkpoint was already discovered: pure read, the info view
    /// opens immediately and no network call is made.
    AlreadyDiscovered,
    /// A discovery request for this checkpoint is already in flight;
    /// the tap is a no-op.
    InFlight,
    /// The tap did not match a known checkpoint.
    UnknownCheckpoint,
    /// Discovery recorded by the server.
    Discovered { achievement_unlocked: bool },
    /// Server-side idempotent rejection; client state now trusts the
    /// server and shows the checkpoint as discovered.
    AlreadyRecorded,
    /// Network/server failure; state rolled back, tap again to retry.
    Failed,
    /// The response arrived after the session or trail changed and was
    /// discarded without touching state.
    Stale,
}

#[derive(Clone)]
pub struct DiscoveryController {
    backend: Arc<dyn Backend>,
    store: CheckpointStore,
    progress: ProgressTracker,
    notifications: NotificationQueue,
}

impl DiscoveryController {
    pub fn new(
        backend: Arc<dyn Backend>,
        store: CheckpointStore,
        progress: ProgressTracker,
        notifications: NotificationQueue,
    ) -> Self {
        Self {
            backend,
            store,
            progress,
            notifications,
        }
    }

    /// Handle a tap on a checkpoint marker.
    pub async fn tap(&self, checkpoint_id: u32) -> TapOutcome {
        let Some(entry) = self.store.get(checkpoint_id) else {
            tracing::debug!("Tap on unknown checkpoint {}", checkpoint_id);
            return TapOutcome::UnknownCheckpoint;
        };

        if entry.state == DiscoveryState::Discovered {
            // Pure read: open the informational view, no network call.
            self.notifications
                .push(Duration::ZERO, Notification::OpenInfoView { checkpoint_id });
            return TapOutcome::AlreadyDiscovered;
        }

        if !self.store.begin_discovery(checkpoint_id) {
            tracing::debug!("Tap ignored, checkpoint {} already pending", checkpoint_id);
            return TapOutcome::InFlight;
        }

        let Some(session_id) = self.store.session_id() else {
            // No live session context; undo the gate and drop the tap.
            self.store.abort_discovery(checkpoint_id);
            tracing::warn!("Tap on checkpoint {} with no session loaded", checkpoint_id);
            return TapOutcome::Failed;
        };

        let request_id = Uuid::new_v4();
        tracing::info!(
            "Discovery request {} for checkpoint {} (session {})",
            request_id,
            checkpoint_id,
            session_id
        );

        // Watchdog: the visual flag clears after a fixed timeout even if
        // a cleanup step is missed, independent of response timing.
        {
            let store = self.store.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(PENDING_VISUAL_TIMEOUT_MS)).await;
                store.clear_busy(checkpoint_id);
            });
        }

        let result = self
            .backend
            .discover_checkpoint(&session_id, checkpoint_id)
            .await;

        if !self.store.is_context_live(&session_id, checkpoint_id) {
            tracing::debug!(
                "Discarding stale response for request {} (context changed)",
                request_id
            );
            return TapOutcome::Stale;
        }

        match result {
            Ok(response) if response.success => {
                self.store.mark_discovered(checkpoint_id);

                self.notifications.push(
                    Duration::ZERO,
                    Notification::DiscoverySuccess {
                        plant_name: entry.checkpoint.plant.name.clone(),
                        message: response.message,
                    },
                );

                let achievement_unlocked = response.achievement_unlocked.is_some();
                if let Some(achievement) = response.achievement_unlocked {
                    tracing::info!("Achievement unlocked: {}", achievement.name);
                    self.notifications.push(
                        Duration::from_millis(ACHIEVEMENT_TOAST_DELAY_MS),
                        Notification::AchievementUnlocked {
                            name: achievement.name,
                            icon: achievement.icon,
                        },
                    );
                }

                if let Some(delta) = &response.progress {
                    self.progress.apply_delta(delta);
                }

                // Deferred so the discovery animation plays before the
                // info view opens.
                self.notifications.push(
                    Duration::from_millis(INFO_VIEW_DELAY_MS),
                    Notification::OpenInfoView { checkpoint_id },
                );

                TapOutcome::Discovered {
                    achievement_unlocked,
                }
            }
            Ok(response) => {
                // The server already has this discovery (or rejected the
                // checkpoint). Trust server state: show as discovered,
                // informational toast only.
                tracing::info!(
                    "Discovery rejected for checkpoint {}: {}",
                    checkpoint_id,
                    response.message
                );
                self.store.mark_discovered(checkpoint_id);

                if let Some(delta) = &response.progress {
                    self.progress.apply_delta(delta);
                }

                self.notifications.push(
                    Duration::ZERO,
                    Notification::Info {
                        message: response.message,
                    },
                );

                TapOutcome::AlreadyRecorded
            }
            Err(e) => {
                tracing::warn!(
                    "Discovery request {} failed for checkpoint {}: {}",
                    request_id,
                    checkpoint_id,
                    e
                );
                self.store.abort_discovery(checkpoint_id);

                self.notifications.push(
                    Duration::ZERO,
                    Notification::Error {
                        message: format!("Could not record discovery: {}", e),
                    },
                );

                TapOutcome::Failed
            }
        }
    }
}
