//! Post repository
//!
//! Database operations for posts and their likes. Posts own their likes;
//! the like toggle lives here next to the queries that count them.
//!
//! Every read path returns posts decorated with the derived fields
//! (likes_count, comments_count, liked_by_viewer). The counts come from
//! subqueries at read time so they can never go stale.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{LikeToggle, Post, PostWithMeta, User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post
    async fn create(&self, post: &Post) -> Result<Post>;

    /// Get a bare post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Get a post with author and derived fields
    async fn get_with_meta(&self, id: i64, viewer_id: Option<i64>) -> Result<Option<PostWithMeta>>;

    /// List all posts, newest first
    async fn list_all(&self, viewer_id: Option<i64>) -> Result<Vec<PostWithMeta>>;

    /// List posts authored by anyone the viewer follows, newest first
    async fn list_followed(&self, viewer_id: i64) -> Result<Vec<PostWithMeta>>;

    /// Posts whose content contains the keyword, case-insensitively.
    ///
    /// The caller handles the blank-keyword case; this always filters.
    async fn search(&self, keyword: &str, viewer_id: Option<i64>) -> Result<Vec<PostWithMeta>>;

    /// Update a post's content and media reference
    async fn update(&self, post: &Post) -> Result<Post>;

    /// Delete a post; returns false when it did not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Toggle the (user, post) like.
    ///
    /// Removes the like if it exists, creates it otherwise. Runs as a
    /// single transaction against UNIQUE(user_id, post_id).
    async fn toggle_like(&self, user_id: i64, post_id: i64) -> Result<LikeToggle>;

    /// Check whether the user has liked the post
    async fn is_liked(&self, user_id: i64, post_id: i64) -> Result<bool>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    /// Create a new SQLx post repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), post).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), post).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_with_meta(&self, id: i64, viewer_id: Option<i64>) -> Result<Option<PostWithMeta>> {
        let sql = format!("{} WHERE p.id = ?", META_SELECT);
        let rows = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                meta_query_sqlite(self.pool.as_sqlite().unwrap(), &sql, viewer_id, &[MetaArg::Id(id)])
                    .await?
            }
            DatabaseDriver::Mysql => {
                meta_query_mysql(self.pool.as_mysql().unwrap(), &sql, viewer_id, &[MetaArg::Id(id)])
                    .await?
            }
        };
        Ok(rows.into_iter().next())
    }

    async fn list_all(&self, viewer_id: Option<i64>) -> Result<Vec<PostWithMeta>> {
        let sql = format!("{} {}", META_SELECT, META_ORDER);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                meta_query_sqlite(self.pool.as_sqlite().unwrap(), &sql, viewer_id, &[]).await
            }
            DatabaseDriver::Mysql => {
                meta_query_mysql(self.pool.as_mysql().unwrap(), &sql, viewer_id, &[]).await
            }
        }
    }

    async fn list_followed(&self, viewer_id: i64) -> Result<Vec<PostWithMeta>> {
        let sql = format!(
            "{} WHERE p.author_id IN (SELECT followee_id FROM follows WHERE follower_id = ?) {}",
            META_SELECT, META_ORDER
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                meta_query_sqlite(
                    self.pool.as_sqlite().unwrap(),
                    &sql,
                    Some(viewer_id),
                    &[MetaArg::Id(viewer_id)],
                )
                .await
            }
            DatabaseDriver::Mysql => {
                meta_query_mysql(
                    self.pool.as_mysql().unwrap(),
                    &sql,
                    Some(viewer_id),
                    &[MetaArg::Id(viewer_id)],
                )
                .await
            }
        }
    }

    async fn search(&self, keyword: &str, viewer_id: Option<i64>) -> Result<Vec<PostWithMeta>> {
        let pattern = format!("%{}%", escape_like(&keyword.to_lowercase()));
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                // SQLite LIKE has no default escape character
                let sql = format!(
                    "{} WHERE LOWER(p.content) LIKE ? ESCAPE '\\' {}",
                    META_SELECT, META_ORDER
                );
                meta_query_sqlite(
                    self.pool.as_sqlite().unwrap(),
                    &sql,
                    viewer_id,
                    &[MetaArg::Text(pattern)],
                )
                .await
            }
            DatabaseDriver::Mysql => {
                // Backslash is already MySQL's LIKE escape character
                let sql = format!(
                    "{} WHERE LOWER(p.content) LIKE ? {}",
                    META_SELECT, META_ORDER
                );
                meta_query_mysql(
                    self.pool.as_mysql().unwrap(),
                    &sql,
                    viewer_id,
                    &[MetaArg::Text(pattern)],
                )
                .await
            }
        }
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), post).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), post).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query("DELETE FROM posts WHERE id = ?")
                .bind(id)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to delete post")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query("DELETE FROM posts WHERE id = ?")
                .bind(id)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to delete post")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn toggle_like(&self, user_id: i64, post_id: i64) -> Result<LikeToggle> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                toggle_like_sqlite(self.pool.as_sqlite().unwrap(), user_id, post_id).await
            }
            DatabaseDriver::Mysql => {
                toggle_like_mysql(self.pool.as_mysql().unwrap(), user_id, post_id).await
            }
        }
    }

    async fn is_liked(&self, user_id: i64, post_id: i64) -> Result<bool> {
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("SELECT COUNT(*) as count FROM likes WHERE user_id = ? AND post_id = ?")
                    .bind(user_id)
                    .bind(post_id)
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to check like")?
                    .get::<i64, _>("count")
            }
            DatabaseDriver::Mysql => {
                sqlx::query("SELECT COUNT(*) as count FROM likes WHERE user_id = ? AND post_id = ?")
                    .bind(user_id)
                    .bind(post_id)
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to check like")?
                    .get::<i64, _>("count")
            }
        };
        Ok(count > 0)
    }
}

/// Shared SELECT for decorated posts. The first placeholder is always the
/// viewer id used by the liked_by_viewer subquery.
const META_SELECT: &str = r#"
    SELECT p.id, p.author_id, p.content, p.media_url, p.created_at, p.updated_at,
           u.username AS author_username, u.email AS author_email,
           u.password_hash AS author_password_hash, u.role AS author_role,
           u.bio AS author_bio, u.profile_picture AS author_profile_picture,
           u.created_at AS author_created_at, u.updated_at AS author_updated_at,
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes_count,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count,
           EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = ?) AS liked_by_viewer
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

const META_ORDER: &str = "ORDER BY p.created_at DESC, p.id DESC";

/// Extra bind values following the viewer id
enum MetaArg {
    Id(i64),
    Text(String),
}

/// Escape LIKE wildcards so user keywords match literally
fn escape_like(keyword: &str) -> String {
    keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, post: &Post) -> Result<Post> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO posts (author_id, content, media_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(post.author_id)
    .bind(&post.content)
    .bind(&post.media_url)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_rowid(),
        author_id: post.author_id,
        content: post.content.clone(),
        media_url: post.media_url.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(
        "SELECT id, author_id, content, media_url, created_at, updated_at FROM posts WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get post")?;

    Ok(row.map(|row| Post {
        id: row.get("id"),
        author_id: row.get("author_id"),
        content: row.get("content"),
        media_url: row.get("media_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }))
}

async fn update_sqlite(pool: &SqlitePool, post: &Post) -> Result<Post> {
    let now = Utc::now();

    sqlx::query("UPDATE posts SET content = ?, media_url = ?, updated_at = ? WHERE id = ?")
        .bind(&post.content)
        .bind(&post.media_url)
        .bind(now)
        .bind(post.id)
        .execute(pool)
        .await
        .context("Failed to update post")?;

    get_by_id_sqlite(pool, post.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
}

async fn toggle_like_sqlite(pool: &SqlitePool, user_id: i64, post_id: i64) -> Result<LikeToggle> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let deleted = sqlx::query("DELETE FROM likes WHERE user_id = ? AND post_id = ?")
        .bind(user_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await
        .context("Failed to remove like")?
        .rows_affected();

    let toggle = if deleted > 0 {
        LikeToggle::Unliked
    } else {
        sqlx::query(
            "INSERT INTO likes (user_id, post_id) VALUES (?, ?) ON CONFLICT(user_id, post_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await
        .context("Failed to create like")?;
        LikeToggle::Liked
    };

    tx.commit().await.context("Failed to commit like toggle")?;
    Ok(toggle)
}

async fn meta_query_sqlite(
    pool: &SqlitePool,
    sql: &str,
    viewer_id: Option<i64>,
    args: &[MetaArg],
) -> Result<Vec<PostWithMeta>> {
    // Viewer id -1 never matches a real user, so anonymous callers get
    // liked_by_viewer = false.
    let mut query = sqlx::query(sql).bind(viewer_id.unwrap_or(-1));
    for arg in args {
        query = match arg {
            MetaArg::Id(id) => query.bind(*id),
            MetaArg::Text(text) => query.bind(text.clone()),
        };
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to query posts")?;

    let mut posts = Vec::new();
    for row in rows {
        posts.push(row_to_meta_sqlite(&row)?);
    }
    Ok(posts)
}

fn row_to_meta_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<PostWithMeta> {
    let role_str: String = row.get("author_role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(PostWithMeta {
        post: Post {
            id: row.get("id"),
            author_id: row.get("author_id"),
            content: row.get("content"),
            media_url: row.get("media_url"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
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
        likes_count: row.get("likes_count"),
        comments_count: row.get("comments_count"),
        liked_by_viewer: row.get::<i64, _>("liked_by_viewer") != 0,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, post: &Post) -> Result<Post> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO posts (author_id, content, media_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(post.author_id)
    .bind(&post.content)
    .bind(&post.media_url)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_id() as i64,
        author_id: post.author_id,
        content: post.content.clone(),
        media_url: post.media_url.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(
        "SELECT id, author_id, content, media_url, created_at, updated_at FROM posts WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get post")?;

    Ok(row.map(|row| Post {
        id: row.get("id"),
        author_id: row.get("author_id"),
        content: row.get("content"),
        media_url: row.get("media_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }))
}

async fn update_mysql(pool: &MySqlPool, post: &Post) -> Result<Post> {
    let now = Utc::now();

    sqlx::query("UPDATE posts SET content = ?, media_url = ?, updated_at = ? WHERE id = ?")
        .bind(&post.content)
        .bind(&post.media_url)
        .bind(now)
        .bind(post.id)
        .execute(pool)
        .await
        .context("Failed to update post")?;

    get_by_id_mysql(pool, post.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
}

async fn toggle_like_mysql(pool: &MySqlPool, user_id: i64, post_id: i64) -> Result<LikeToggle> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let deleted = sqlx::query("DELETE FROM likes WHERE user_id = ? AND post_id = ?")
        .bind(user_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await
        .context("Failed to remove like")?
        .rows_affected();

    let toggle = if deleted > 0 {
        LikeToggle::Unliked
    } else {
        sqlx::query("INSERT IGNORE INTO likes (user_id, post_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .context("Failed to create like")?;
        LikeToggle::Liked
    };

    tx.commit().await.context("Failed to commit like toggle")?;
    Ok(toggle)
}

async fn meta_query_mysql(
    pool: &MySqlPool,
    sql: &str,
    viewer_id: Option<i64>,
    args: &[MetaArg],
) -> Result<Vec<PostWithMeta>> {
    let mut query = sqlx::query(sql).bind(viewer_id.unwrap_or(-1));
    for arg in args {
        query = match arg {
            MetaArg::Id(id) => query.bind(*id),
            MetaArg::Text(text) => query.bind(text.clone()),
        };
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to query posts")?;

    let mut posts = Vec::new();
    for row in rows {
        posts.push(row_to_meta_mysql(&row)?);
    }
    Ok(posts)
}

fn row_to_meta_mysql(row: &sqlx::mysql::MySqlRow) -> Result<PostWithMeta> {
    let role_str: String = row.get("author_role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(PostWithMeta {
        post: Post {
            id: row.get("id"),
            author_id: row.get("author_id"),
            content: row.get("content"),
            media_url: row.get("media_url"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
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
        likes_count: row.get("likes_count"),
        comments_count: row.get("comments_count"),
        liked_by_viewer: row.get::<i64, _>("liked_by_viewer") != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxFollowRepository, FollowRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::User;

    async fn setup() -> (DynDatabasePool, SqlxPostRepository, i64, i64) {
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
        let reader = users
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

        let repo = SqlxPostRepository::new(pool.clone());
        (pool, repo, author.id, reader.id)
    }

    fn post(author_id: i64, content: &str) -> Post {
        Post {
            id: 0,
            author_id,
            content: content.to_string(),
            media_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_post() {
        let (_pool, repo, author, _reader) = setup().await;

        let created = repo
            .create(&post(author, "Hello village"))
            .await
            .expect("Failed to create post");

        assert!(created.id > 0);

        let found = repo
            .get_by_id(created.id)
            .await
            .unwrap()
            .expect("Post not found");
        assert_eq!(found.content, "Hello village");
        assert_eq!(found.author_id, author);
    }

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let (_pool, repo, author, _reader) = setup().await;

        repo.create(&post(author, "first")).await.unwrap();
        repo.create(&post(author, "second")).await.unwrap();
        repo.create(&post(author, "third")).await.unwrap();

        let posts = repo.list_all(None).await.unwrap();
        let contents: Vec<&str> = posts.iter().map(|p| p.post.content.as_str()).collect();
        assert_eq!(contents, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_meta_counts_and_viewer_flag() {
        let (pool, repo, author, reader) = setup().await;

        let created = repo.create(&post(author, "count me")).await.unwrap();

        sqlx::query("INSERT INTO comments (post_id, author_id, content) VALUES (?, ?, ?)")
            .bind(created.id)
            .bind(reader)
            .bind("nice")
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        repo.toggle_like(reader, created.id).await.unwrap();

        let meta = repo
            .get_with_meta(created.id, Some(reader))
            .await
            .unwrap()
            .expect("Post not found");
        assert_eq!(meta.likes_count, 1);
        assert_eq!(meta.comments_count, 1);
        assert!(meta.liked_by_viewer);
        assert_eq!(meta.author.username, "dr_kim");

        // A different viewer has not liked the post
        let meta = repo
            .get_with_meta(created.id, Some(author))
            .await
            .unwrap()
            .unwrap();
        assert!(!meta.liked_by_viewer);

        // Anonymous viewer gets false too
        let meta = repo.get_with_meta(created.id, None).await.unwrap().unwrap();
        assert!(!meta.liked_by_viewer);
    }

    #[tokio::test]
    async fn test_toggle_like_twice_leaves_no_likes() {
        let (_pool, repo, author, reader) = setup().await;
        let created = repo.create(&post(author, "toggle")).await.unwrap();

        assert_eq!(
            repo.toggle_like(reader, created.id).await.unwrap(),
            LikeToggle::Liked
        );
        assert!(repo.is_liked(reader, created.id).await.unwrap());

        assert_eq!(
            repo.toggle_like(reader, created.id).await.unwrap(),
            LikeToggle::Unliked
        );
        assert!(!repo.is_liked(reader, created.id).await.unwrap());

        let meta = repo.get_with_meta(created.id, None).await.unwrap().unwrap();
        assert_eq!(meta.likes_count, 0);
    }

    #[tokio::test]
    async fn test_list_followed_respects_graph() {
        let (pool, repo, author, reader) = setup().await;

        repo.create(&post(author, "from followed")).await.unwrap();
        repo.create(&post(reader, "own post")).await.unwrap();

        // Nothing followed yet
        assert!(repo.list_followed(reader).await.unwrap().is_empty());

        let follows = SqlxFollowRepository::new(pool.clone());
        follows.toggle(reader, author).await.unwrap();

        let feed = repo.list_followed(reader).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].post.content, "from followed");
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let (_pool, repo, author, _reader) = setup().await;

        repo.create(&post(author, "My CAT loves therapy")).await.unwrap();
        repo.create(&post(author, "dog post")).await.unwrap();

        let hits = repo.search("cat", None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].post.content, "My CAT loves therapy");

        let hits = repo.search("CAT", None).await.unwrap();
        assert_eq!(hits.len(), 1);

        assert!(repo.search("bird", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let (_pool, repo, author, _reader) = setup().await;

        repo.create(&post(author, "plain text")).await.unwrap();
        repo.create(&post(author, "100% honest")).await.unwrap();

        let hits = repo.search("100%", None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].post.content, "100% honest");

        // A bare % must not match everything
        let hits = repo.search("%", None).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_update_post() {
        let (_pool, repo, author, _reader) = setup().await;
        let mut created = repo.create(&post(author, "before")).await.unwrap();

        created.content = "after".to_string();
        created.media_url = Some("/media/pic.png".to_string());

        let updated = repo.update(&created).await.unwrap();
        assert_eq!(updated.content, "after");
        assert_eq!(updated.media_url.as_deref(), Some("/media/pic.png"));
    }

    #[tokio::test]
    async fn test_delete_post() {
        let (_pool, repo, author, _reader) = setup().await;
        let created = repo.create(&post(author, "gone soon")).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        assert!(!repo.delete(created.id).await.unwrap());
    }
}
