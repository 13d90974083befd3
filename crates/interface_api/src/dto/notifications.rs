//! Notification inbox DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::NotificationId;
use domain_claims::Notification;

#[derive(Debug, Default, Deserialize)]
pub struct InboxParams {
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: NotificationId,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            message: notification.message,
            is_read: notification.is_read,
            created_at: notification.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MarkedReadResponse {
    pub marked: u64,
}
