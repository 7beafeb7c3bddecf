//! Trailhead - headless client engine for an AR plant scavenger hunt
//!
//! The binary runs a smoke flow against the configured backend: session
//! bootstrap, health check, trail and checkpoint load, and a progress
//! summary. With `TRAILHEAD_OFFLINE=1` it runs against the bundled
//! in-memory backend and demonstrates a full tap-to-discover flow.

use anyhow::Context;
use std::sync::Arc;
use trailhead::api::memory::MemoryBackend;
use trailhead::app::AppState;
use trailhead::config::AppConfig;
use trailhead::services::Notification;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trailhead=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    let offline = std::env::var("TRAILHEAD_OFFLINE").is_ok();
    tracing::info!(
        "Starting Trailhead (backend: {})",
        if offline {
            "in-memory"
        } else {
            config.api_url.as_str()
        }
    );

    let state = if offline {
        let backend = Arc::new(MemoryBackend::with_sample_data());
        AppState::with_backend(backend, config.data_dir.clone()).await?
    } else {
        AppState::initialize(&config).await?
    };

    let mut notifications = state.spawn_notification_dispatcher();
    let printer = tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            match &notification {
                Notification::DiscoverySuccess { message, .. } => {
                    tracing::info!("toast: {}", message)
                }
                Notification::AchievementUnlocked { name, icon } => {
                    tracing::info!("toast: {} achievement unlocked: {}", icon, name)
                }
                Notification::Info { message } | Notification::Error { message } => {
                    tracing::info!("toast: {}", message)
                }
                Notification::OpenInfoView { checkpoint_id } => {
                    tracing::info!("open info view for checkpoint {}", checkpoint_id);
                    return;
                }
            }
        }
    });

    let health = state.backend.health_check().await?;
    tracing::info!("Backend: {}", health.message);

    let achievements = state.backend.list_achievements().await?;
    tracing::info!("{} achievements available", achievements.len());

    let trails = state.backend.list_trails().await?;
    let trail = trails.first().context("backend has no trails configured")?;
    tracing::info!("Active trail: {} ({:?})", trail.name, trail.difficulty);

    let checkpoints = state
        .checkpoints
        .load(Some(&trail.id), &state.session.id)
        .await?;
    for entry in &checkpoints {
        tracing::info!(
            "  checkpoint {} '{}' ({:?}) discovered={}",
            entry.checkpoint.id,
            entry.checkpoint.name,
            entry.checkpoint.plant.rarity,
            entry.checkpoint.discovered
        );
    }

    if offline {
        if let Some(target) = checkpoints.iter().find(|e| !e.checkpoint.discovered) {
            tracing::info!("Tapping checkpoint {}...", target.checkpoint.id);
            let outcome = state.discovery.tap(target.checkpoint.id).await;
            tracing::info!("Tap outcome: {:?}", outcome);
            // Let the queued toasts and the deferred info view play out.
            let _ = tokio::time::timeout(std::time::Duration::from_secs(10), printer).await;
        }
    } else {
        printer.abort();
    }

    let progress = state.progress.refresh(&state.session.id).await?;
    tracing::info!(
        "Progress: {}/{} discoveries, {} achievements, {:.0}% complete",
        progress.total_discoveries,
        progress.total_checkpoints,
        progress.achievements_count,
        progress.completion_percentage
    );

    Ok(())
}
