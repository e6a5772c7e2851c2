/**
 * User-Facing Notifications
 *
 * This module carries toast-style notifications from the sync machinery to
 * whatever surface is listening, the CLI today or an embedding UI tomorrow.
 *
 * # Broadcasting
 *
 * Notifications are fanned out over `tokio::sync::broadcast`, so any number
 * of listeners can subscribe and each receives a copy. Dropped or absent
 * listeners never block the sender.
 *
 * # Policy
 *
 * Only failures produce notifications. Successful syncs already show their
 * outcome through the progress stream, so completion stays quiet.
 */
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::debug;

/// Buffered notifications per subscriber before lagging kicks in
const NOTIFICATION_BUFFER: usize = 100;

/// How loud a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// A single toast-style notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            title: title.into(),
            body: body.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: title.into(),
            body: body.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Fan-out channel for notifications.
///
/// Cloning the hub is cheap and every clone publishes into the same channel,
/// so it can be handed to background tasks freely.
#[derive(Debug, Clone)]
pub struct NotificationHub {
    tx: broadcast::Sender<Notification>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(NOTIFICATION_BUFFER);
        Self { tx }
    }
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a notification to all subscribers.
    ///
    /// Returns the number of active subscribers that received it (0 if no
    /// subscribers, which is fine).
    pub fn notify(&self, notification: Notification) -> usize {
        match self.tx.send(notification) {
            Ok(subscriber_count) => {
                debug!(
                    "[Notify] Notification delivered to {} subscribers",
                    subscriber_count
                );
                subscriber_count
            }
            Err(e) => {
                // No subscribers, that's okay
                debug!("[Notify] No subscribers to receive notification: {:?}", e);
                0
            }
        }
    }

    /// Subscribe to all notifications published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Number of currently attached subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
