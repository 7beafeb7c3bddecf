//! Integration tests for Trailhead
//!
//! These tests exercise the engine end-to-end through AppState:
//! session bootstrap and persistence, checkpoint loading, the
//! tap-to-discover flow, and progress reconciliation.

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use trailhead::api::memory::MemoryBackend;
use trailhead::api::Backend;
use trailhead::app::AppState;
use trailhead::services::{DiscoveryState, Notification, TapOutcome};

async fn create_test_app() -> (AppState, Arc<MemoryBackend>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(MemoryBackend::with_sample_data());
    let state = AppState::with_backend(backend.clone(), temp_dir.path().to_path_buf())
        .await
        .unwrap();
    (state, backend, temp_dir)
}

#[tokio::test]
async fn test_full_discovery_journey() {
    let (state, backend, _temp) = create_test_app().await;

    // Load the trail's checkpoints for this session.
    let trail = &backend.list_trails().await.unwrap()[0];
    let checkpoints = state
        .checkpoints
        .load(Some(&trail.id), &state.session.id)
        .await
        .unwrap();
    assert_eq!(checkpoints.len(), 5);
    assert!(checkpoints.iter().all(|e| !e.checkpoint.discovered));

    // Tap checkpoint 3: server records it and reports the delta.
    let outcome = state.discovery.tap(3).await;
    assert_eq!(
        outcome,
        TapOutcome::Discovered {
            achievement_unlocked: true
        }
    );
    assert_eq!(
        state.checkpoints.get(3).unwrap().state,
        DiscoveryState::Discovered
    );

    let progress = state.progress.snapshot();
    assert_eq!(progress.plants_collected, 1);
    assert_eq!(progress.total_discoveries, 1);

    // Tap again: read-only, no second discovery call.
    let calls = backend.discover_calls();
    let outcome = state.discovery.tap(3).await;
    assert_eq!(outcome, TapOutcome::AlreadyDiscovered);
    assert_eq!(backend.discover_calls(), calls);

    // The authoritative snapshot agrees with the merged delta.
    let refreshed = state.progress.refresh(&state.session.id).await.unwrap();
    assert_eq!(refreshed.total_discoveries, 1);
    assert!((refreshed.completion_percentage - 20.0).abs() < 0.01);
}

#[tokio::test]
async fn test_notifications_arrive_in_flow_order() {
    let (state, _backend, _temp) = create_test_app().await;
    state
        .checkpoints
        .load(None, &state.session.id)
        .await
        .unwrap();

    let mut rx = state.spawn_notification_dispatcher();
    state.discovery.tap(1).await;

    // Success toast, achievement toast (first discovery), then the
    // deferred info view, strictly in that order.
    let first = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(first, Notification::DiscoverySuccess { .. }));

    let second = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(second, Notification::AchievementUnlocked { .. }));

    let third = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(third, Notification::OpenInfoView { checkpoint_id: 1 });
}

#[tokio::test]
async fn test_session_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(MemoryBackend::with_sample_data());

    let first = AppState::with_backend(backend.clone(), temp_dir.path().to_path_buf())
        .await
        .unwrap();
    let session_id = first.session.id.clone();
    drop(first);

    // A new app instance over the same data dir rehydrates the session.
    let second = AppState::with_backend(backend.clone(), temp_dir.path().to_path_buf())
        .await
        .unwrap();
    assert_eq!(second.session.id, session_id);
    assert_eq!(backend.session_count(), 1);
}

#[tokio::test]
async fn test_server_forgotten_session_replaced_once() {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(MemoryBackend::with_sample_data());

    let first = AppState::with_backend(backend.clone(), temp_dir.path().to_path_buf())
        .await
        .unwrap();
    backend.forget_session(&first.session.id);
    drop(first);

    let second = AppState::with_backend(backend.clone(), temp_dir.path().to_path_buf())
        .await
        .unwrap();
    assert_eq!(backend.session_count(), 1);

    // Discoveries recorded under the old session are gone with it.
    second
        .checkpoints
        .load(None, &second.session.id)
        .await
        .unwrap();
    assert!(second
        .checkpoints
        .snapshot()
        .iter()
        .all(|e| e.state == DiscoveryState::Undiscovered));
}

#[tokio::test]
async fn test_failed_discovery_recovers_after_retry() {
    let (state, backend, _temp) = create_test_app().await;
    state
        .checkpoints
        .load(None, &state.session.id)
        .await
        .unwrap();

    backend.set_offline(true);
    assert_eq!(state.discovery.tap(2).await, TapOutcome::Failed);
    assert_eq!(
        state.checkpoints.get(2).unwrap().state,
        DiscoveryState::Undiscovered
    );
    assert_eq!(state.progress.snapshot().total_discoveries, 0);

    backend.set_offline(false);
    assert!(matches!(
        state.discovery.tap(2).await,
        TapOutcome::Discovered { .. }
    ));
    assert_eq!(state.progress.snapshot().total_discoveries, 1);
}

#[tokio::test]
async fn test_clear_session_resets_discovery_scope() {
    let (mut state, backend, _temp) = create_test_app().await;
    state
        .checkpoints
        .load(None, &state.session.id)
        .await
        .unwrap();
    state.discovery.tap(1).await;

    state.clear_session().await.unwrap();
    assert_eq!(backend.session_count(), 2);

    // Reloading under the fresh session shows nothing discovered.
    state
        .checkpoints
        .load(None, &state.session.id)
        .await
        .unwrap();
    assert!(state
        .checkpoints
        .snapshot()
        .iter()
        .all(|e| e.state == DiscoveryState::Undiscovered));

    let progress = state.progress.refresh(&state.session.id).await.unwrap();
    assert_eq!(progress.total_discoveries, 0);
}
