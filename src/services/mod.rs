//! Services module
//!
//! Business logic services that coordinate between the presentation
//! layer and the backend API.

pub mod checkpoints;
pub mod discovery;
pub mod notifications;
pub mod progress;
pub mod session;
pub mod settings;

pub use checkpoints::{CheckpointStore, DiscoveryState, TrackedCheckpoint};
pub use discovery::{DiscoveryController, TapOutcome};
pub use notifications::{Notification, NotificationQueue, QueuedNotification};
pub use progress::ProgressTracker;
pub use session::SessionService;
pub use settings::SettingsService;
