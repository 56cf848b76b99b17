//! Follow repository
//!
//! Database operations for the directed follow graph between users.
//!
//! The toggle runs as a single transaction against the composite primary
//! key on (follower_id, followee_id): concurrent toggles cannot create a
//! duplicate edge, and a lost race on insert still lands on "followed".

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{FollowToggle, User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Follow repository trait
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Toggle the follow edge follower -> followee.
    ///
    /// Removes the edge if it exists, creates it otherwise. The caller is
    /// responsible for rejecting self-follows before getting here.
    async fn toggle(&self, follower_id: i64, followee_id: i64) -> Result<FollowToggle>;

    /// Check whether follower -> followee exists
    async fn is_following(&self, follower_id: i64, followee_id: i64) -> Result<bool>;

    /// Users following the given user
    async fn followers_of(&self, user_id: i64) -> Result<Vec<User>>;

    /// Users the given user follows
    async fn following_of(&self, user_id: i64) -> Result<Vec<User>>;

    /// Live (followers, following) counts for a user
    async fn counts(&self, user_id: i64) -> Result<(i64, i64)>;
}

/// SQLx-based follow repository implementation
pub struct SqlxFollowRepository {
    pool: DynDatabasePool,
}

impl SqlxFollowRepository {
    /// Create a new SQLx follow repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn FollowRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl FollowRepository for SqlxFollowRepository {
    async fn toggle(&self, follower_id: i64, followee_id: i64) -> Result<FollowToggle> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                toggle_sqlite(self.pool.as_sqlite().unwrap(), follower_id, followee_id).await
            }
            DatabaseDriver::Mysql => {
                toggle_mysql(self.pool.as_mysql().unwrap(), follower_id, followee_id).await
            }
        }
    }

    async fn is_following(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(
                "SELECT COUNT(*) as count FROM follows WHERE follower_id = ? AND followee_id = ?",
            )
            .bind(follower_id)
            .bind(followee_id)
            .fetch_one(self.pool.as_sqlite().unwrap())
            .await
            .context("Failed to check follow edge")?
            .get::<i64, _>("count"),
            DatabaseDriver::Mysql => sqlx::query(
                "SELECT COUNT(*) as count FROM follows WHERE follower_id = ? AND followee_id = ?",
            )
            .bind(follower_id)
            .bind(followee_id)
            .fetch_one(self.pool.as_mysql().unwrap())
            .await
            .context("Failed to check follow edge")?
            .get::<i64, _>("count"),
        };
        Ok(count > 0)
    }

    async fn followers_of(&self, user_id: i64) -> Result<Vec<User>> {
        let sql = r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.role, u.bio, u.profile_picture,
                   u.created_at, u.updated_at
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.followee_id = ?
        "#;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_users_sqlite(self.pool.as_sqlite().unwrap(), sql, user_id).await
            }
            DatabaseDriver::Mysql => {
                list_users_mysql(self.pool.as_mysql().unwrap(), sql, user_id).await
            }
        }
    }

    async fn following_of(&self, user_id: i64) -> Result<Vec<User>> {
        let sql = r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.role, u.bio, u.profile_picture,
                   u.created_at, u.updated_at
            FROM follows f
            JOIN users u ON u.id = f.followee_id
            WHERE f.follower_id = ?
        "#;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_users_sqlite(self.pool.as_sqlite().unwrap(), sql, user_id).await
            }
            DatabaseDriver::Mysql => {
                list_users_mysql(self.pool.as_mysql().unwrap(), sql, user_id).await
            }
        }
    }

    async fn counts(&self, user_id: i64) -> Result<(i64, i64)> {
        let sql = r#"
            SELECT
                (SELECT COUNT(*) FROM follows WHERE followee_id = ?) as followers_count,
                (SELECT COUNT(*) FROM follows WHERE follower_id = ?) as following_count
        "#;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(user_id)
                    .bind(user_id)
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to count follow edges")?;
                Ok((row.get("followers_count"), row.get("following_count")))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(user_id)
                    .bind(user_id)
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to count follow edges")?;
                Ok((row.get("followers_count"), row.get("following_count")))
            }
        }
    }
}

async fn toggle_sqlite(
    pool: &SqlitePool,
    follower_id: i64,
    followee_id: i64,
) -> Result<FollowToggle> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let deleted = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
        .bind(follower_id)
        .bind(followee_id)
        .execute(&mut *tx)
        .await
        .context("Failed to remove follow edge")?
        .rows_affected();

    let toggle = if deleted > 0 {
        FollowToggle::Unfollowed
    } else {
        // A concurrent insert is absorbed by the conflict clause; either
        // way the edge exists afterwards.
        sqlx::query(
            "INSERT INTO follows (follower_id, followee_id) VALUES (?, ?) ON CONFLICT(follower_id, followee_id) DO NOTHING",
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(&mut *tx)
        .await
        .context("Failed to create follow edge")?;
        FollowToggle::Followed
    };

    tx.commit().await.context("Failed to commit follow toggle")?;
    Ok(toggle)
}

async fn toggle_mysql(
    pool: &MySqlPool,
    follower_id: i64,
    followee_id: i64,
) -> Result<FollowToggle> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let deleted = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
        .bind(follower_id)
        .bind(followee_id)
        .execute(&mut *tx)
        .await
        .context("Failed to remove follow edge")?
        .rows_affected();

    let toggle = if deleted > 0 {
        FollowToggle::Unfollowed
    } else {
        sqlx::query("INSERT IGNORE INTO follows (follower_id, followee_id) VALUES (?, ?)")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&mut *tx)
            .await
            .context("Failed to create follow edge")?;
        FollowToggle::Followed
    };

    tx.commit().await.context("Failed to commit follow toggle")?;
    Ok(toggle)
}

async fn list_users_sqlite(pool: &SqlitePool, sql: &str, user_id: i64) -> Result<Vec<User>> {
    let rows = sqlx::query(sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list follow edges")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user_sqlite(&row)?);
    }
    Ok(users)
}

async fn list_users_mysql(pool: &MySqlPool, sql: &str, user_id: i64) -> Result<Vec<User>> {
    let rows = sqlx::query(sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list follow edges")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user_mysql(&row)?);
    }
    Ok(users)
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        bio: row.get("bio"),
        profile_picture: row.get("profile_picture"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        bio: row.get("bio"),
        profile_picture: row.get("profile_picture"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;

    async fn setup() -> (SqlxFollowRepository, i64, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let a = users
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
        let b = users
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

        (SqlxFollowRepository::new(pool), a.id, b.id)
    }

    #[tokio::test]
    async fn test_toggle_creates_then_removes_edge() {
        let (repo, a, b) = setup().await;

        assert_eq!(repo.toggle(a, b).await.unwrap(), FollowToggle::Followed);
        assert!(repo.is_following(a, b).await.unwrap());

        assert_eq!(repo.toggle(a, b).await.unwrap(), FollowToggle::Unfollowed);
        assert!(!repo.is_following(a, b).await.unwrap());
    }

    #[tokio::test]
    async fn test_toggle_twice_returns_to_original_state() {
        let (repo, a, b) = setup().await;

        let before = repo.is_following(a, b).await.unwrap();
        repo.toggle(a, b).await.unwrap();
        repo.toggle(a, b).await.unwrap();
        let after = repo.is_following(a, b).await.unwrap();

        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_edges_are_directed() {
        let (repo, a, b) = setup().await;

        repo.toggle(a, b).await.unwrap();

        assert!(repo.is_following(a, b).await.unwrap());
        assert!(!repo.is_following(b, a).await.unwrap());
    }

    #[tokio::test]
    async fn test_counts_are_live() {
        let (repo, a, b) = setup().await;

        assert_eq!(repo.counts(a).await.unwrap(), (0, 0));

        repo.toggle(a, b).await.unwrap();

        // a follows one user; b has one follower
        assert_eq!(repo.counts(a).await.unwrap(), (0, 1));
        assert_eq!(repo.counts(b).await.unwrap(), (1, 0));

        repo.toggle(a, b).await.unwrap();
        assert_eq!(repo.counts(b).await.unwrap(), (0, 0));
    }

    #[tokio::test]
    async fn test_followers_and_following_lists() {
        let (repo, a, b) = setup().await;

        repo.toggle(a, b).await.unwrap();

        let followers = repo.followers_of(b).await.unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].username, "maria");

        let following = repo.following_of(a).await.unwrap();
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].username, "dr_kim");

        assert!(repo.followers_of(a).await.unwrap().is_empty());
        assert!(repo.following_of(b).await.unwrap().is_empty());
    }
}
