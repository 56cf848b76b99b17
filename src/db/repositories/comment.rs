//! Comment repository
//!
//! Database operations for comments. A comment's post and author are fixed
//! at creation; only the content column is ever updated.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Comment, CommentWithAuthor, User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a new comment on a post
    async fn create(&self, post_id: i64, author_id: i64, content: &str) -> Result<Comment>;

    /// Get a comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments on a post with their authors, oldest first
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>>;

    /// Replace a comment's content
    async fn update_content(&self, id: i64, content: &str) -> Result<Comment>;

    /// Delete a comment; returns false when it did not exist
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    /// Create a new SQLx comment repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, post_id: i64, author_id: i64, content: &str) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_sqlite(self.pool.as_sqlite().unwrap(), post_id, author_id, content).await
            }
            DatabaseDriver::Mysql => {
                create_mysql(self.pool.as_mysql().unwrap(), post_id, author_id, content).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_for_post_sqlite(self.pool.as_sqlite().unwrap(), post_id).await
            }
            DatabaseDriver::Mysql => {
                list_for_post_mysql(self.pool.as_mysql().unwrap(), post_id).await
            }
        }
    }

    async fn update_content(&self, id: i64, content: &str) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_content_sqlite(self.pool.as_sqlite().unwrap(), id, content).await
            }
            DatabaseDriver::Mysql => {
                update_content_mysql(self.pool.as_mysql().unwrap(), id, content).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query("DELETE FROM comments WHERE id = ?")
                .bind(id)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to delete comment")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query("DELETE FROM comments WHERE id = ?")
                .bind(id)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to delete comment")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

const LIST_SQL: &str = r#"
    SELECT c.id, c.post_id, c.author_id, c.content, c.created_at,
           u.username AS author_username, u.email AS author_email,
           u.password_hash AS author_password_hash, u.role AS author_role,
           u.bio AS author_bio, u.profile_picture AS author_profile_picture,
           u.created_at AS author_created_at, u.updated_at AS author_updated_at
    FROM comments c
    JOIN users u ON u.id = c.author_id
    WHERE c.post_id = ?
    ORDER BY c.created_at ASC, c.id ASC
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(
    pool: &SqlitePool,
    post_id: i64,
    author_id: i64,
    content: &str,
) -> Result<Comment> {
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO comments (post_id, author_id, content, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(post_id)
    .bind(author_id)
    .bind(content)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        post_id,
        author_id,
        content: content.to_string(),
        created_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(
        "SELECT id, post_id, author_id, content, created_at FROM comments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get comment")?;

    Ok(row.map(|row| Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }))
}

async fn list_for_post_sqlite(pool: &SqlitePool, post_id: i64) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(LIST_SQL)
        .bind(post_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    let mut comments = Vec::new();
    for row in rows {
        let role_str: String = row.get("author_role");
        let role = UserRole::from_str(&role_str)
            .with_context(|| format!("Invalid role in database: {}", role_str))?;

        comments.push(CommentWithAuthor {
            comment: Comment {
                id: row.get("id"),
                post_id: row.get("post_id"),
                author_id: row.get("author_id"),
                content: row.get("content"),
                created_at: row.get("created_at"),
            },
            author: User {
                id: row.get("author_id"),
                username: row.get("author_username"),
                email: row.get("author_email"),
                password_hash: row.get("author_password_hash"),
                role,
                bio: row.get("author_bio"),
                profile_picture: row.get("author_profile_picture"),
                created_at: row.get("author_created_at"),
                updated_at: row.get("author_updated_at"),
            },
        });
    }
    Ok(comments)
}

async fn update_content_sqlite(pool: &SqlitePool, id: i64, content: &str) -> Result<Comment> {
    sqlx::query("UPDATE comments SET content = ? WHERE id = ?")
        .bind(content)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update comment")?;

    get_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Comment not found after update"))
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(
    pool: &MySqlPool,
    post_id: i64,
    author_id: i64,
    content: &str,
) -> Result<Comment> {
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO comments (post_id, author_id, content, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(post_id)
    .bind(author_id)
    .bind(content)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_id() as i64,
        post_id,
        author_id,
        content: content.to_string(),
        created_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(
        "SELECT id, post_id, author_id, content, created_at FROM comments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get comment")?;

    Ok(row.map(|row| Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }))
}

async fn list_for_post_mysql(pool: &MySqlPool, post_id: i64) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(LIST_SQL)
        .bind(post_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    let mut comments = Vec::new();
    for row in rows {
        let role_str: String = row.get("author_role");
        let role = UserRole::from_str(&role_str)
            .with_context(|| format!("Invalid role in database: {}", role_str))?;

        comments.push(CommentWithAuthor {
            comment: Comment {
                id: row.get("id"),
                post_id: row.get("post_id"),
                author_id: row.get("author_id"),
                content: row.get("content"),
                created_at: row.get("created_at"),
            },
            author: User {
                id: row.get("author_id"),
                username: row.get("author_username"),
                email: row.get("author_email"),
                password_hash: row.get("author_password_hash"),
                role,
                bio: row.get("author_bio"),
                profile_picture: row.get("author_profile_picture"),
                created_at: row.get("author_created_at"),
                updated_at: row.get("author_updated_at"),
            },
        });
    }
    Ok(comments)
}

async fn update_content_mysql(pool: &MySqlPool, id: i64, content: &str) -> Result<Comment> {
    sqlx::query("UPDATE comments SET content = ? WHERE id = ?")
        .bind(content)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update comment")?;

    get_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Comment not found after update"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{PostRepository, SqlxPostRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Post, User};

    async fn setup() -> (SqlxCommentRepository, i64, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let author = users
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

        let posts = SqlxPostRepository::new(pool.clone());
        let post = posts
            .create(&Post {
                id: 0,
                author_id: author.id,
                content: "Hello village".to_string(),
                media_url: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();

        (SqlxCommentRepository::new(pool), author.id, post.id)
    }

    #[tokio::test]
    async fn test_create_and_get_comment() {
        let (repo, author, post) = setup().await;

        let created = repo
            .create(post, author, "Welcome!")
            .await
            .expect("Failed to create comment");

        assert!(created.id > 0);
        assert_eq!(created.post_id, post);
        assert_eq!(created.author_id, author);

        let found = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.content, "Welcome!");
    }

    #[tokio::test]
    async fn test_list_for_post_oldest_first() {
        let (repo, author, post) = setup().await;

        repo.create(post, author, "first").await.unwrap();
        repo.create(post, author, "second").await.unwrap();

        let comments = repo.list_for_post(post).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].comment.content, "first");
        assert_eq!(comments[1].comment.content, "second");
        assert_eq!(comments[0].author.username, "dr_kim");
    }

    #[tokio::test]
    async fn test_update_content_only() {
        let (repo, author, post) = setup().await;
        let created = repo.create(post, author, "typo").await.unwrap();

        let updated = repo.update_content(created.id, "fixed").await.unwrap();

        assert_eq!(updated.content, "fixed");
        assert_eq!(updated.post_id, created.post_id);
        assert_eq!(updated.author_id, created.author_id);
    }

    #[tokio::test]
    async fn test_delete_comment() {
        let (repo, author, post) = setup().await;
        let created = repo.create(post, author, "fleeting").await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        assert!(!repo.delete(created.id).await.unwrap());
    }
}
