//! Notifications
//!
//! Notifications are a side effect of lifecycle transitions and never part of
//! their consistency. [`QueuedNotifier`] decouples delivery from the request so a
//! slow or failing sink cannot delay a transition. [`Inbox`] is the reading side:
//! each user lists and acknowledges only their own notifications.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use core_kernel::{DomainPort, Identity, NotificationId, PortError, UserId};

use crate::error::ClaimError;
use crate::ports::{NotificationInbox, NotificationSink};

/// A stored notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A notification waiting to be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub user_id: UserId,
    pub message: String,
}

impl Outbound {
    pub fn new(user_id: UserId, message: impl Into<String>) -> Self {
        Self {
            user_id,
            message: message.into(),
        }
    }
}

/// Best-effort queue in front of another sink
///
/// `notify` only enqueues; a background task forwards to the inner sink and logs
/// failures. A full queue drops the message.
#[derive(Debug, Clone)]
pub struct QueuedNotifier {
    sender: mpsc::Sender<Outbound>,
}

impl QueuedNotifier {
    /// Spawns the delivery task on the current runtime
    pub fn spawn(inner: Arc<dyn NotificationSink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<Outbound>(capacity.max(1));
        let handle = tokio::spawn(async move {
            while let Some(outbound) = receiver.recv().await {
                if let Err(error) = inner.notify(outbound.user_id, &outbound.message).await {
                    warn!(user_id = %outbound.user_id, %error, "Queued notification failed");
                }
            }
            debug!("Notification queue closed");
        });
        (Self { sender }, handle)
    }
}

impl DomainPort for QueuedNotifier {}

#[async_trait]
impl NotificationSink for QueuedNotifier {
    async fn notify(&self, user: UserId, message: &str) -> Result<(), PortError> {
        self.sender
            .try_send(Outbound::new(user, message))
            .map_err(|error| PortError::internal(format!("notification queue: {}", error)))
    }
}

/// A caller's notification inbox
#[derive(Clone)]
pub struct Inbox {
    store: Arc<dyn NotificationInbox>,
}

impl Inbox {
    pub fn new(store: Arc<dyn NotificationInbox>) -> Self {
        Self { store }
    }

    /// The caller's notifications, newest first
    pub async fn notifications(&self, identity: &Identity, unread_only: bool) -> Result<Vec<Notification>, ClaimError> {
        Ok(self.store.notifications_for(identity.user_id, unread_only).await?)
    }

    /// Marks one of the caller's notifications read; others' report NotFound
    pub async fn mark_read(&self, identity: &Identity, id: NotificationId) -> Result<(), ClaimError> {
        if self.store.mark_read(identity.user_id, id).await? {
            debug!(user_id = %identity.user_id, notification_id = %id, "Notification read");
            Ok(())
        } else {
            Err(ClaimError::not_found("Notification", id))
        }
    }

    /// Returns how many notifications were unread
    pub async fn mark_all_read(&self, identity: &Identity) -> Result<u64, ClaimError> {
        Ok(self.store.mark_all_read(identity.user_id).await?)
    }
}
