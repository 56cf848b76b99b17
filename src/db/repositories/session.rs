//! Session repository
//!
//! Database operations for issued access/refresh token pairs.
//!
//! This module provides:
//! - `SessionRepository` trait defining the interface for session data access
//! - `SqlxSessionRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by ID (access token)
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Get session by refresh token
    async fn get_by_refresh_token(&self, refresh_token: &str) -> Result<Option<Session>>;

    /// Delete a session
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete all sessions for a user
    async fn delete_by_user(&self, user_id: i64) -> Result<()>;

    /// Delete sessions whose refresh token has expired
    async fn delete_expired(&self) -> Result<i64>;
}

/// SQLx-based session repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_session_sqlite(self.pool.as_sqlite().unwrap(), session).await
            }
            DatabaseDriver::Mysql => {
                create_session_mysql(self.pool.as_mysql().unwrap(), session).await
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_session_sqlite(self.pool.as_sqlite().unwrap(), "id", id).await
            }
            DatabaseDriver::Mysql => {
                get_session_mysql(self.pool.as_mysql().unwrap(), "id", id).await
            }
        }
    }

    async fn get_by_refresh_token(&self, refresh_token: &str) -> Result<Option<Session>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_session_sqlite(self.pool.as_sqlite().unwrap(), "refresh_token", refresh_token)
                    .await
            }
            DatabaseDriver::Mysql => {
                get_session_mysql(self.pool.as_mysql().unwrap(), "refresh_token", refresh_token)
                    .await
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM sessions WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to delete session")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM sessions WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to delete session")?;
            }
        }
        Ok(())
    }

    async fn delete_by_user(&self, user_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM sessions WHERE user_id = ?")
                    .bind(user_id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to delete user sessions")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM sessions WHERE user_id = ?")
                    .bind(user_id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to delete user sessions")?;
            }
        }
        Ok(())
    }

    async fn delete_expired(&self) -> Result<i64> {
        let now = chrono::Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query("DELETE FROM sessions WHERE refresh_expires_at < ?")
                .bind(now)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to delete expired sessions")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query("DELETE FROM sessions WHERE refresh_expires_at < ?")
                .bind(now)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to delete expired sessions")?
                .rows_affected(),
        };
        Ok(affected as i64)
    }
}

const SESSION_COLUMNS: &str =
    "id, user_id, refresh_token, expires_at, refresh_expires_at, created_at";

async fn create_session_sqlite(pool: &SqlitePool, session: &Session) -> Result<Session> {
    sqlx::query(
        r#"
        INSERT INTO sessions (id, user_id, refresh_token, expires_at, refresh_expires_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(session.user_id)
    .bind(&session.refresh_token)
    .bind(session.expires_at)
    .bind(session.refresh_expires_at)
    .bind(session.created_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn create_session_mysql(pool: &MySqlPool, session: &Session) -> Result<Session> {
    sqlx::query(
        r#"
        INSERT INTO sessions (id, user_id, refresh_token, expires_at, refresh_expires_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(session.user_id)
    .bind(&session.refresh_token)
    .bind(session.expires_at)
    .bind(session.refresh_expires_at)
    .bind(session.created_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_session_sqlite(pool: &SqlitePool, column: &str, value: &str) -> Result<Option<Session>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM sessions WHERE {} = ?",
        SESSION_COLUMNS, column
    ))
    .bind(value)
    .fetch_optional(pool)
    .await
    .context("Failed to get session")?;

    Ok(row.map(|row| Session {
        id: row.get("id"),
        user_id: row.get("user_id"),
        refresh_token: row.get("refresh_token"),
        expires_at: row.get("expires_at"),
        refresh_expires_at: row.get("refresh_expires_at"),
        created_at: row.get("created_at"),
    }))
}

async fn get_session_mysql(pool: &MySqlPool, column: &str, value: &str) -> Result<Option<Session>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM sessions WHERE {} = ?",
        SESSION_COLUMNS, column
    ))
    .bind(value)
    .fetch_optional(pool)
    .await
    .context("Failed to get session")?;

    Ok(row.map(|row| Session {
        id: row.get("id"),
        user_id: row.get("user_id"),
        refresh_token: row.get("refresh_token"),
        expires_at: row.get("expires_at"),
        refresh_expires_at: row.get("refresh_expires_at"),
        created_at: row.get("created_at"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{User, UserRole};
    use chrono::{Duration, Utc};

    async fn setup() -> (DynDatabasePool, SqlxSessionRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::new(pool.clone());
        let user = user_repo
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
            .expect("Failed to create user");

        let repo = SqlxSessionRepository::new(pool.clone());
        (pool, repo, user.id)
    }

    fn test_session(user_id: i64, access_ttl_minutes: i64) -> Session {
        let now = Utc::now();
        Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            refresh_token: uuid::Uuid::new_v4().to_string(),
            expires_at: now + Duration::minutes(access_ttl_minutes),
            refresh_expires_at: now + Duration::days(7),
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let (_pool, repo, user_id) = setup().await;
        let session = test_session(user_id, 30);

        repo.create(&session).await.expect("Failed to create session");

        let found = repo
            .get_by_id(&session.id)
            .await
            .expect("Failed to get session")
            .expect("Session not found");

        assert_eq!(found.user_id, user_id);
        assert_eq!(found.refresh_token, session.refresh_token);
        assert!(!found.is_expired());
    }

    #[tokio::test]
    async fn test_get_by_refresh_token() {
        let (_pool, repo, user_id) = setup().await;
        let session = test_session(user_id, 30);
        repo.create(&session).await.unwrap();

        let found = repo
            .get_by_refresh_token(&session.refresh_token)
            .await
            .expect("Failed to get session")
            .expect("Session not found");

        assert_eq!(found.id, session.id);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let (_pool, repo, user_id) = setup().await;
        let session = test_session(user_id, 30);
        repo.create(&session).await.unwrap();

        repo.delete(&session.id).await.expect("Failed to delete");

        assert!(repo.get_by_id(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_by_user() {
        let (_pool, repo, user_id) = setup().await;
        repo.create(&test_session(user_id, 30)).await.unwrap();
        repo.create(&test_session(user_id, 30)).await.unwrap();

        repo.delete_by_user(user_id).await.expect("Failed to delete");

        assert_eq!(repo.delete_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_expired_only_removes_stale_sessions() {
        let (_pool, repo, user_id) = setup().await;

        let mut stale = test_session(user_id, 30);
        stale.refresh_expires_at = Utc::now() - Duration::days(1);
        repo.create(&stale).await.unwrap();

        let live = test_session(user_id, 30);
        repo.create(&live).await.unwrap();

        let removed = repo.delete_expired().await.unwrap();
        assert_eq!(removed, 1);

        assert!(repo.get_by_id(&stale.id).await.unwrap().is_none());
        assert!(repo.get_by_id(&live.id).await.unwrap().is_some());
    }
}
