//! User-visible transient messages
//!
//! Fetch failures and offline detection never abort the engine; they end up
//! here so the interaction surface can show them.

use std::time::Duration;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub kind: NotificationKind,
    pub duration: Option<Duration>,
}

impl Notification {
    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NotificationKind::Alert,
            duration: None,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NotificationKind::Info,
            duration: None,
        }
    }

    pub fn lasting(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Deliver to current subscribers. Nobody listening is not an error.
    pub fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Alert => log::warn!("{}", notification.text),
            NotificationKind::Info => log::info!("{}", notification.text),
        }
        let _ = self.tx.send(notification);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
