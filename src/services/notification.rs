//! Notification service
//!
//! Business logic for the notification engine: reading a user's
//! notifications, flipping read flags, and the internal creation contract
//! used by the follow/like/comment flows.
//!
//! Delivery is best-effort: callers fire `notify` after the triggering
//! mutation commits and log failures instead of propagating them, so a
//! broken notification insert can never fail a like or follow.

use crate::db::repositories::NotificationRepository;
use crate::models::{Notification, NotificationKind, NotificationWithSender};
use anyhow::Context;
use std::sync::Arc;

/// Error types for notification service operations
#[derive(Debug, thiserror::Error)]
pub enum NotificationServiceError {
    /// Referenced notification absent or not owned by the caller
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Notification service
pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    /// Create a new notification service
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }

    /// The recipient's notifications, newest first, with sender details
    pub async fn list(
        &self,
        recipient_id: i64,
    ) -> Result<Vec<NotificationWithSender>, NotificationServiceError> {
        let notifications = self
            .repo
            .list_for_recipient(recipient_id)
            .await
            .context("Failed to list notifications")?;
        Ok(notifications)
    }

    /// Mark one notification read.
    ///
    /// Fails with `NotFound` unless a notification with this id belongs to
    /// the recipient. Marking an already-read notification succeeds.
    pub async fn mark_read(
        &self,
        recipient_id: i64,
        id: i64,
    ) -> Result<(), NotificationServiceError> {
        let marked = self
            .repo
            .mark_read(recipient_id, id)
            .await
            .context("Failed to mark notification read")?;

        if !marked {
            return Err(NotificationServiceError::NotFound(
                "Notification not found".to_string(),
            ));
        }
        Ok(())
    }

    /// Mark every unread notification of the recipient read.
    ///
    /// Returns the number updated; zero when nothing was unread.
    pub async fn mark_all_read(&self, recipient_id: i64) -> Result<u64, NotificationServiceError> {
        let updated = self
            .repo
            .mark_all_read(recipient_id)
            .await
            .context("Failed to mark notifications read")?;
        Ok(updated)
    }

    /// Create a notification.
    ///
    /// Internal contract for the follow/like/comment flows. The caller must
    /// have already ruled out sender == recipient; no re-check happens here.
    pub async fn notify(
        &self,
        recipient_id: i64,
        sender_id: i64,
        kind: NotificationKind,
        post_id: Option<i64>,
    ) -> Result<Notification, NotificationServiceError> {
        let notification = self
            .repo
            .create(recipient_id, sender_id, kind, post_id)
            .await
            .context("Failed to create notification")?;
        Ok(notification)
    }

    /// Count the recipient's unread notifications
    pub async fn unread_count(&self, recipient_id: i64) -> Result<i64, NotificationServiceError> {
        let count = self
            .repo
            .unread_count(recipient_id)
            .await
            .context("Failed to count notifications")?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxNotificationRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{User, UserRole};

    async fn setup() -> (NotificationService, i64, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let recipient = users
            .create(
                &User::new(
                    "dr_kim".to_string(),
                    "kim@example.com".to_string(),
                    "hash".to_string(),
                    UserRole::Therapist,
                ),
                None,
                None,
            )
            .await
            .unwrap();
        let sender = users
            .create(
                &User::new(
                    "maria".to_string(),
                    "maria@example.com".to_string(),
                    "hash".to_string(),
                    UserRole::Parent,
                ),
                None,
                None,
            )
            .await
            .unwrap();

        let service = NotificationService::new(SqlxNotificationRepository::boxed(pool));
        (service, recipient.id, sender.id)
    }

    #[tokio::test]
    async fn test_notify_and_list() {
        let (service, recipient, sender) = setup().await;

        service
            .notify(recipient, sender, NotificationKind::Follow, None)
            .await
            .expect("Failed to notify");

        let list = service.list(recipient).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].notification.kind, NotificationKind::Follow);
        assert_eq!(service.unread_count(recipient).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mark_read_unknown_id_is_not_found() {
        let (service, recipient, _sender) = setup().await;

        let result = service.mark_read(recipient, 999).await;
        assert!(matches!(
            result,
            Err(NotificationServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mark_read_other_recipient_is_not_found() {
        let (service, recipient, sender) = setup().await;

        let created = service
            .notify(recipient, sender, NotificationKind::Follow, None)
            .await
            .unwrap();

        // The sender cannot mark the recipient's notification
        let result = service.mark_read(sender, created.id).await;
        assert!(matches!(
            result,
            Err(NotificationServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mark_all_read_is_idempotent() {
        let (service, recipient, sender) = setup().await;

        service
            .notify(recipient, sender, NotificationKind::Like, None)
            .await
            .unwrap();
        service
            .notify(recipient, sender, NotificationKind::Follow, None)
            .await
            .unwrap();

        assert_eq!(service.mark_all_read(recipient).await.unwrap(), 2);
        assert_eq!(service.mark_all_read(recipient).await.unwrap(), 0);
        assert_eq!(service.unread_count(recipient).await.unwrap(), 0);
    }
}
