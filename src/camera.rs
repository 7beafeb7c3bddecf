//! Camera stream lifecycle
//!
//! The camera is a shared resource: acquired once when AR mode starts
//! and released (all tracks stopped) whenever AR mode ends, on every
//! exit path including permission denial with a partially acquired
//! stream. Actual capture belongs to the platform; this module owns
//! only the acquisition/release contract.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome of the permission prompt, surfaced to the presentation
/// layer. `Denied` blocks AR mode until the user re-grants access
/// through OS/browser settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraPermission {
    Granted,
    Denied,
}

/// A single media track. Stopping is idempotent.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    label: String,
    live: Arc<AtomicBool>,
}

impl MediaTrack {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            tracing::debug!("Stopped media track '{}'", self.label);
        }
    }
}

/// An acquired camera stream. Dropping the stream stops every track, so
/// no exit path can leak a live camera.
#[derive(Debug)]
pub struct CameraStream {
    tracks: Vec<MediaTrack>,
}

impl CameraStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Platform seam for camera acquisition.
///
/// Implementations must not leave tracks live when returning an error:
/// wrap partial acquisitions in a [`CameraStream`] and drop it before
/// failing with [`crate::error::AppError::PermissionDenied`].
#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn request_stream(&self) -> Result<CameraStream>;
}

/// AR mode handle. Acquires the camera once at start to establish
/// permission, then releases it immediately; the AR engine performs its
/// own capture.
#[derive(Debug)]
pub struct ArMode {
    permission: CameraPermission,
    active: bool,
}

impl ArMode {
    pub async fn start(device: &dyn CameraDevice) -> Self {
        match device.request_stream().await {
            Ok(stream) => {
                // Permission established; the bootstrap stream is not
                // kept, the AR engine re-acquires the camera itself.
                stream.stop_all();
                tracing::info!("AR mode started, camera permission granted");
                Self {
                    permission: CameraPermission::Granted,
                    active: true,
                }
            }
            Err(e) => {
                tracing::warn!("AR mode not started: {}", e);
                Self {
                    permission: CameraPermission::Denied,
                    active: false,
                }
            }
        }
    }

    pub fn permission(&self) -> CameraPermission {
        self.permission
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn stop(&mut self) {
        if self.active {
            self.active = false;
            tracing::info!("AR mode stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::Mutex;

    /// Fake device handing out tracks the test keeps handles to.
    struct FakeCamera {
        deny: bool,
        handed_out: Mutex<Vec<MediaTrack>>,
    }

    impl FakeCamera {
        fn new(deny: bool) -> Self {
            Self {
                deny,
                handed_out: Mutex::new(Vec::new()),
            }
        }

        fn tracks(&self) -> Vec<MediaTrack> {
            self.handed_out.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CameraDevice for FakeCamera {
        async fn request_stream(&self) -> Result<CameraStream> {
            let track = MediaTrack::new("video0");
            self.handed_out.lock().unwrap().push(track.clone());
            let stream = CameraStream::new(vec![track]);

            if self.deny {
                // Partial acquisition: the stream is dropped (stopping
                // its tracks) before the denial is reported.
                drop(stream);
                return Err(AppError::PermissionDenied(
                    "user refused camera access".to_string(),
                ));
            }
            Ok(stream)
        }
    }

    #[tokio::test]
    async fn test_granted_start_leaves_no_live_tracks() {
        let camera = FakeCamera::new(false);
        let ar = ArMode::start(&camera).await;

        assert_eq!(ar.permission(), CameraPermission::Granted);
        assert!(ar.is_active());
        assert!(camera.tracks().iter().all(|t| !t.is_live()));
    }

    #[tokio::test]
    async fn test_denied_start_blocks_ar_and_releases_stream() {
        let camera = FakeCamera::new(true);
        let ar = ArMode::start(&camera).await;

        assert_eq!(ar.permission(), CameraPermission::Denied);
        assert!(!ar.is_active());
        // No active media tracks remain after the denial path.
        assert!(camera.tracks().iter().all(|t| !t.is_live()));
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let camera = FakeCamera::new(false);
        let mut ar = ArMode::start(&camera).await;

        ar.stop();
        ar.stop();
        assert!(!ar.is_active());
    }

    #[test]
    fn test_dropping_stream_stops_tracks() {
        let track = MediaTrack::new("video0");
        let observer = track.clone();

        let stream = CameraStream::new(vec![track]);
        assert!(observer.is_live());
        drop(stream);
        assert!(!observer.is_live());
    }
}
