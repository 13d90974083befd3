//! PostgreSQL Notification Store
//!
//! Stores one `notifications` row per message and serves each user's inbox.
//! Every read and update is filtered by the owning user.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, NotificationId, PortError, UserId};
use domain_claims::{Notification, NotificationInbox, NotificationSink};

use crate::error::port_error;
use crate::repositories::claims::NotificationRow;

#[derive(Debug, Clone)]
pub struct PgNotificationSink {
    pool: PgPool,
}

impl PgNotificationSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PgNotificationSink {}

#[async_trait]
impl NotificationSink for PgNotificationSink {
    #[instrument(skip(self, message), fields(user_id = %user))]
    async fn notify(&self, user: UserId, message: &str) -> Result<(), PortError> {
        sqlx::query("INSERT INTO notifications (user_id, message) VALUES ($1, $2)")
            .bind(user.get())
            .bind(message)
            .execute(&self.pool)
            .await
            .map_err(port_error)?;
        debug!("Notification stored");
        Ok(())
    }
}

#[async_trait]
impl NotificationInbox for PgNotificationSink {
    #[instrument(skip(self), fields(user_id = %user))]
    async fn notifications_for(&self, user: UserId, unread_only: bool) -> Result<Vec<Notification>, PortError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, message, is_read, created_at
            FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR NOT is_read)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user.get())
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await
        .map_err(port_error)?;
        Ok(rows.into_iter().map(Notification::from).collect())
    }

    #[instrument(skip(self), fields(user_id = %user, notification_id = %id))]
    async fn mark_read(&self, user: UserId, id: NotificationId) -> Result<bool, PortError> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
            .bind(id.get())
            .bind(user.get())
            .execute(&self.pool)
            .await
            .map_err(port_error)?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(user_id = %user))]
    async fn mark_all_read(&self, user: UserId) -> Result<u64, PortError> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
            .bind(user.get())
            .execute(&self.pool)
            .await
            .map_err(port_error)?;
        debug!(changed = result.rows_affected(), "Notifications marked read");
        Ok(result.rows_affected())
    }
}
