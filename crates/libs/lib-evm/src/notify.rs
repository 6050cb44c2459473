//! # Notifications
//!
//! Transient success / error / info notices produced by the transaction flows
//! and consumed by whatever front end is attached. They travel over an
//! unbounded `async_channel`, so producers never wait on a slow renderer.
//!
//! A [`Notifier`] with no attached receiver drops notices silently.

use async_channel::{Receiver, Sender};
use chrono::{DateTime, Utc};
use lib_core::AppError;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

/// One notice shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
    /// Block explorer link for the transaction, on success notices
    pub explorer_url: Option<String>,
    pub at: DateTime<Utc>,
}

impl Notification {
    fn new(level: NotificationLevel, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            title: title.into(),
            description: description.into(),
            explorer_url: None,
            at: lib_utils::now_utc(),
        }
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, title, description)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, title, description)
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, title, description)
    }

    /// Error notice whose description is the error's user-facing message.
    pub fn from_error(title: impl Into<String>, err: &AppError) -> Self {
        Self::error(title, err.user_message())
    }

    pub fn with_explorer_url(mut self, url: Option<String>) -> Self {
        self.explorer_url = url;
        self
    }
}

/// Sending half of the notification stream. Cheap to clone.
#[derive(Clone)]
pub struct Notifier {
    tx: Sender<Notification>,
}

impl Notifier {
    /// New notifier and the receiver the front end drains.
    pub fn channel() -> (Self, Receiver<Notification>) {
        let (tx, rx) = async_channel::unbounded();
        (Self { tx }, rx)
    }

    /// Notifier whose notices go nowhere.
    pub fn disabled() -> Self {
        let (tx, _) = async_channel::unbounded();
        Self { tx }
    }

    pub fn notify(&self, notification: Notification) {
        debug!(level = ?notification.level, title = %notification.title, "notification");
        // Fails only when every receiver is gone.
        let _ = self.tx.try_send(notification);
    }
}
