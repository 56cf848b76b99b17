//! Notification repository
//!
//! Database operations for notifications. Rows are append-only except for
//! the read flag, and every read-side query is scoped to the recipient so
//! a user can never see or mark someone else's notifications.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Notification, NotificationKind, NotificationWithSender, User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Notification repository trait
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert a notification row.
    ///
    /// No self-send check happens here; callers rule out
    /// sender == recipient before invoking.
    async fn create(
        &self,
        recipient_id: i64,
        sender_id: i64,
        kind: NotificationKind,
        post_id: Option<i64>,
    ) -> Result<Notification>;

    /// The recipient's notifications with senders, newest first
    async fn list_for_recipient(&self, recipient_id: i64) -> Result<Vec<NotificationWithSender>>;

    /// Mark one notification read.
    ///
    /// Returns false when no notification with that id belongs to the
    /// recipient. Marking an already-read notification succeeds.
    async fn mark_read(&self, recipient_id: i64, id: i64) -> Result<bool>;

    /// Mark every unread notification of the recipient read; returns the
    /// number of rows updated
    async fn mark_all_read(&self, recipient_id: i64) -> Result<u64>;

    /// Count the recipient's unread notifications
    async fn unread_count(&self, recipient_id: i64) -> Result<i64>;
}

/// SQLx-based notification repository implementation
pub struct SqlxNotificationRepository {
    pool: DynDatabasePool,
}

impl SqlxNotificationRepository {
    /// Create a new SQLx notification repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NotificationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NotificationRepository for SqlxNotificationRepository {
    async fn create(
        &self,
        recipient_id: i64,
        sender_id: i64,
        kind: NotificationKind,
        post_id: Option<i64>,
    ) -> Result<Notification> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_sqlite(
                    self.pool.as_sqlite().unwrap(),
                    recipient_id,
                    sender_id,
                    kind,
                    post_id,
                )
                .await
            }
            DatabaseDriver::Mysql => {
                create_mysql(
                    self.pool.as_mysql().unwrap(),
                    recipient_id,
                    sender_id,
                    kind,
                    post_id,
                )
                .await
            }
        }
    }

    async fn list_for_recipient(&self, recipient_id: i64) -> Result<Vec<NotificationWithSender>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_for_recipient_sqlite(self.pool.as_sqlite().unwrap(), recipient_id).await
            }
            DatabaseDriver::Mysql => {
                list_for_recipient_mysql(self.pool.as_mysql().unwrap(), recipient_id).await
            }
        }
    }

    async fn mark_read(&self, recipient_id: i64, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND recipient_id = ?")
                    .bind(id)
                    .bind(recipient_id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to mark notification read")?
                    .rows_affected()
            }
            DatabaseDriver::Mysql => {
                // MySQL reports 0 affected rows for a no-op update, so match
                // on the row's existence instead.
                sqlx::query(
                    "UPDATE notifications SET is_read = 1 WHERE id = ? AND recipient_id = ? AND is_read = 0",
                )
                .bind(id)
                .bind(recipient_id)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to mark notification read")?
                .rows_affected();

                let row = sqlx::query(
                    "SELECT COUNT(*) as count FROM notifications WHERE id = ? AND recipient_id = ?",
                )
                .bind(id)
                .bind(recipient_id)
                .fetch_one(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to check notification")?;
                row.get::<i64, _>("count") as u64
            }
        };
        Ok(affected > 0)
    }

    async fn mark_all_read(&self, recipient_id: i64) -> Result<u64> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(
                "UPDATE notifications SET is_read = 1 WHERE recipient_id = ? AND is_read = 0",
            )
            .bind(recipient_id)
            .execute(self.pool.as_sqlite().unwrap())
            .await
            .context("Failed to mark notifications read")?
            .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(
                "UPDATE notifications SET is_read = 1 WHERE recipient_id = ? AND is_read = 0",
            )
            .bind(recipient_id)
            .execute(self.pool.as_mysql().unwrap())
            .await
            .context("Failed to mark notifications read")?
            .rows_affected(),
        };
        Ok(affected)
    }

    async fn unread_count(&self, recipient_id: i64) -> Result<i64> {
        let sql = "SELECT COUNT(*) as count FROM notifications WHERE recipient_id = ? AND is_read = 0";
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(recipient_id)
                .fetch_one(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to count notifications")?
                .get::<i64, _>("count"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(recipient_id)
                .fetch_one(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to count notifications")?
                .get::<i64, _>("count"),
        };
        Ok(count)
    }
}

const LIST_SQL: &str = r#"
    SELECT n.id, n.recipient_id, n.sender_id, n.kind, n.post_id, n.is_read, n.created_at,
           u.username AS sender_username, u.email AS sender_email,
           u.password_hash AS sender_password_hash, u.role AS sender_role,
           u.bio AS sender_bio, u.profile_picture AS sender_profile_picture,
           u.created_at AS sender_created_at, u.updated_at AS sender_updated_at
    FROM notifications n
    JOIN users u ON u.id = n.sender_id
    WHERE n.recipient_id = ?
    ORDER BY n.created_at DESC, n.id DESC
"#;

async fn create_sqlite(
    pool: &SqlitePool,
    recipient_id: i64,
    sender_id: i64,
    kind: NotificationKind,
    post_id: Option<i64>,
) -> Result<Notification> {
    let now = Utc::now();
    let kind_str = kind.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO notifications (recipient_id, sender_id, kind, post_id, is_read, created_at)
        VALUES (?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(recipient_id)
    .bind(sender_id)
    .bind(&kind_str)
    .bind(post_id)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create notification")?;

    Ok(Notification {
        id: result.last_insert_rowid(),
        recipient_id,
        sender_id,
        kind,
        post_id,
        is_read: false,
        created_at: now,
    })
}

async fn create_mysql(
    pool: &MySqlPool,
    recipient_id: i64,
    sender_id: i64,
    kind: NotificationKind,
    post_id: Option<i64>,
) -> Result<Notification> {
    let now = Utc::now();
    let kind_str = kind.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO notifications (recipient_id, sender_id, kind, post_id, is_read, created_at)
        VALUES (?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(recipient_id)
    .bind(sender_id)
    .bind(&kind_str)
    .bind(post_id)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create notification")?;

    Ok(Notification {
        id: result.last_insert_id() as i64,
        recipient_id,
        sender_id,
        kind,
        post_id,
        is_read: false,
        created_at: now,
    })
}

async fn list_for_recipient_sqlite(
    pool: &SqlitePool,
    recipient_id: i64,
) -> Result<Vec<NotificationWithSender>> {
    let rows = sqlx::query(LIST_SQL)
        .bind(recipient_id)
        .fetch_all(pool)
        .await
        .context("Failed to list notifications")?;

    let mut notifications = Vec::new();
    for row in rows {
        let kind_str: String = row.get("kind");
        let kind = NotificationKind::from_str(&kind_str)
            .with_context(|| format!("Invalid notification kind in database: {}", kind_str))?;
        let role_str: String = row.get("sender_role");
        let role = UserRole::from_str(&role_str)
            .with_context(|| format!("Invalid role in database: {}", role_str))?;

        notifications.push(NotificationWithSender {
            notification: Notification {
                id: row.get("id"),
                recipient_id: row.get("recipient_id"),
                sender_id: row.get("sender_id"),
                kind,
                post_id: row.get("post_id"),
                is_read: row.get::<i64, _>("is_read") != 0,
                created_at: row.get("created_at"),
            },
            sender: User {
                id: row.get("sender_id"),
                username: row.get("sender_username"),
                email: row.get("sender_email"),
                password_hash: row.get("sender_password_hash"),
                role,
                bio: row.get("sender_bio"),
                profile_picture: row.get("sender_profile_picture"),
                created_at: row.get("sender_created_at"),
                updated_at: row.get("sender_updated_at"),
            },
        });
    }
    Ok(notifications)
}

async fn list_for_recipient_mysql(
    pool: &MySqlPool,
    recipient_id: i64,
) -> Result<Vec<NotificationWithSender>> {
    let rows = sqlx::query(LIST_SQL)
        .bind(recipient_id)
        .fetch_all(pool)
        .await
        .context("Failed to list notifications")?;

    let mut notifications = Vec::new();
    for row in rows {
        let kind_str: String = row.get("kind");
        let kind = NotificationKind::from_str(&kind_str)
            .with_context(|| format!("Invalid notification kind in database: {}", kind_str))?;
        let role_str: String = row.get("sender_role");
        let role = UserRole::from_str(&role_str)
            .with_context(|| format!("Invalid role in database: {}", role_str))?;

        notifications.push(NotificationWithSender {
            notification: Notification {
                id: row.get("id"),
                recipient_id: row.get("recipient_id"),
                sender_id: row.get("sender_id"),
                kind,
                post_id: row.get("post_id"),
                is_read: row.get::<i64, _>("is_read") != 0,
                created_at: row.get("created_at"),
            },
            sender: User {
                id: row.get("sender_id"),
                username: row.get("sender_username"),
                email: row.get("sender_email"),
                password_hash: row.get("sender_password_hash"),
                role,
                bio: row.get("sender_bio"),
                profile_picture: row.get("sender_profile_picture"),
                created_at: row.get("sender_created_at"),
                updated_at: row.get("sender_updated_at"),
            },
        });
    }
    Ok(notifications)
}
