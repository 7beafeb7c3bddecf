//! Application configuration
//!
//! Central location for configuration constants, timing contracts,
//! and environment-driven settings used throughout the engine.

use std::path::PathBuf;

// ===== Persisted State =====

/// File name under the data directory holding the persisted session id.
/// The id survives app restarts and is cleared only by explicit user
/// action or a failed rehydration.
pub const SESSION_FILE_NAME: &str = "session.json";

// ===== Device Identity =====

/// Number of random alphanumeric characters appended to a device id.
/// The id is a bootstrap hint for the server, not a security credential.
pub const DEVICE_ID_SUFFIX_LEN: usize = 12;

// ===== Notification Sequencing =====

/// Delay before an achievement toast, so it does not visually collide
/// with the discovery success toast shown immediately before it.
pub const ACHIEVEMENT_TOAST_DELAY_MS: u64 = 1_500;

/// Delay before the checkpoint info view opens after a successful
/// discovery, letting the discovery animation play out first.
pub const INFO_VIEW_DELAY_MS: u64 = 2_500;

/// Upper bound on how long a checkpoint may show its "in progress"
/// visual flag, independent of network response timing. Bounds
/// worst-case visual lock-up if a cleanup step is missed.
pub const PENDING_VISUAL_TIMEOUT_MS: u64 = 10_000;

// ===== Environment =====

/// Environment variable naming the backend API root.
pub const API_URL_ENV: &str = "TRAILHEAD_API_URL";

/// Environment variable naming the local data directory.
pub const DATA_DIR_ENV: &str = "TRAILHEAD_DATA_DIR";

/// Fallback API root for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Runtime configuration resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend root URL; the `/api` prefix is appended by the client.
    pub api_url: String,
    /// Directory for persisted client state (session id).
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Build configuration from the environment, falling back to local
    /// development defaults.
    pub fn from_env() -> Self {
        let api_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let data_dir = std::env::var(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("trailhead"));

        Self { api_url, data_dir }
    }
}
