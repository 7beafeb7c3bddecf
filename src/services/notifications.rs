//! Notification queue
//!
//! An explicit ordered queue of deferred UI actions. Producers append
//! entries with a delay; a single drain loop emits them to the sink in
//! append order, sleeping each entry's delay before emitting it. Delays
//! are relative to the previous emission, so ordering within a flow
//! (success toast, then achievement toast, then info view) holds
//! without chained timers scattered through view code.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::Notify;

/// A user-visible event produced by the discovery flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Primary success toast naming the discovered plant.
    DiscoverySuccess { plant_name: String, message: String },
    /// Visually distinct achievement toast, shown after the success one.
    AchievementUnlocked { name: String, icon: String },
    /// Informational toast (e.g. server-side idempotent rejection).
    Info { message: String },
    /// Transient error toast; the action remains retryable.
    Error { message: String },
    /// Deferred request to open a checkpoint's informational view.
    OpenInfoView { checkpoint_id: u32 },
}

/// A queued notification with the gap to wait before emitting it.
#[derive(Debug, Clone)]
pub struct QueuedNotification {
    pub delay: Duration,
    pub notification: Notification,
}

/// Ordered queue of deferred notifications.
#[derive(Clone)]
pub struct NotificationQueue {
    inner: Arc<Mutex<VecDeque<QueuedNotification>>>,
    notify: Arc<Notify>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Append a notification to be emitted `delay` after the previous
    /// emission.
    pub fn push(&self, delay: Duration, notification: Notification) {
        tracing::debug!("Queueing notification after {:?}: {:?}", delay, notification);
        self.inner
            .lock()
            .unwrap()
            .push_back(QueuedNotification {
                delay,
                notification,
            });
        self.notify.notify_one();
    }

    /// Entries not yet emitted, in emission order. Used by tests and by
    /// a presentation layer that renders its own schedule.
    pub fn pending(&self) -> Vec<QueuedNotification> {
        self.inner.lock().unwrap().iter().cloned().collect()
    }

    /// Remove and return everything queued, without waiting out delays.
    pub fn drain(&self) -> Vec<QueuedNotification> {
        self.inner.lock().unwrap().drain(..).collect()
    }

    /// Drain loop: emit queued notifications to the sink in order,
    /// waiting out each entry's delay first. Runs until the receiving
    /// side is dropped.
    pub async fn run(&self, sink: mpsc::UnboundedSender<Notification>) {
        loop {
            let next = self.inner.lock().unwrap().pop_front();

            match next {
                Some(queued) => {
                    if !queued.delay.is_zero() {
                        tokio::time::sleep(queued.delay).await;
                    }
                    if sink.send(queued.notification).is_err() {
                        tracing::debug!("Notification sink closed, stopping drain loop");
                        return;
                    }
                }
                None => self.notify.notified().await,
            }
        }
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(message: &str) -> Notification {
        Notification::Info {
            message: message.to_string(),
        }
    }

    #[test]
    fn test_pending_preserves_append_order() {
        let queue = NotificationQueue::new();
        queue.push(Duration::ZERO, info("first"));
        queue.push(Duration::from_millis(500), info("second"));
        queue.push(Duration::from_millis(100), info("third"));

        let pending = queue.pending();
        assert_eq!(pending.len(), 3);
        assert_eq!(pending[0].notification, info("first"));
        assert_eq!(pending[1].notification, info("second"));
        assert_eq!(pending[2].notification, info("third"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_emits_in_order_after_delays() {
        let queue = NotificationQueue::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        queue.push(Duration::ZERO, info("immediate"));
        queue.push(Duration::from_millis(1_500), info("delayed"));

        let drain = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.run(tx).await })
        };

        assert_eq!(rx.recv().await.unwrap(), info("immediate"));
        assert_eq!(rx.recv().await.unwrap(), info("delayed"));
        assert!(queue.pending().is_empty());

        drop(rx);
        queue.push(Duration::ZERO, info("after close"));
        drain.await.unwrap();
    }

    #[test]
    fn test_drain_empties_queue() {
        let queue = NotificationQueue::new();
        queue.push(Duration::ZERO, info("one"));
        queue.push(Duration::ZERO, info("two"));

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(queue.pending().is_empty());
    }
}
