//! Feed and search service
//!
//! Composes the following-based feed and keyword search over posts, and
//! manages the stored per-user feed preferences.

use crate::db::repositories::{FeedFilterRepository, PostRepository};
use crate::models::{FeedFilter, PostWithMeta, UpdateFeedFilterInput, User};
use anyhow::Context;
use std::sync::Arc;

/// Error types for feed service operations
#[derive(Debug, thiserror::Error)]
pub enum FeedServiceError {
    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Feed service
pub struct FeedService {
    post_repo: Arc<dyn PostRepository>,
    filter_repo: Arc<dyn FeedFilterRepository>,
}

impl FeedService {
    /// Create a new feed service
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        filter_repo: Arc<dyn FeedFilterRepository>,
    ) -> Self {
        Self {
            post_repo,
            filter_repo,
        }
    }

    /// Posts authored by anyone the viewer follows, newest first.
    ///
    /// Empty when the viewer follows no one.
    // TODO: apply the viewer's stored feed preferences once the client
    // ships its sort/filter controls; until then the rows in feed_filters
    // are write-only.
    pub async fn feed(&self, viewer: &User) -> Result<Vec<PostWithMeta>, FeedServiceError> {
        let posts = self
            .post_repo
            .list_followed(viewer.id)
            .await
            .context("Failed to compose feed")?;
        Ok(posts)
    }

    /// Posts whose content contains the keyword, case-insensitively.
    ///
    /// A blank or absent keyword yields an empty result, never all posts.
    pub async fn search(
        &self,
        viewer: &User,
        keyword: &str,
    ) -> Result<Vec<PostWithMeta>, FeedServiceError> {
        if keyword.trim().is_empty() {
            return Ok(Vec::new());
        }

        let posts = self
            .post_repo
            .search(keyword.trim(), Some(viewer.id))
            .await
            .context("Failed to search posts")?;
        Ok(posts)
    }

    /// The viewer's stored feed preferences, defaults when never saved
    pub async fn preferences(&self, viewer: &User) -> Result<FeedFilter, FeedServiceError> {
        let filter = self
            .filter_repo
            .get(viewer.id)
            .await
            .context("Failed to get feed preferences")?;
        Ok(filter.unwrap_or_else(|| FeedFilter::default_for(viewer.id)))
    }

    /// Store updated feed preferences for the viewer
    pub async fn update_preferences(
        &self,
        viewer: &User,
        input: UpdateFeedFilterInput,
    ) -> Result<FeedFilter, FeedServiceError> {
        let mut filter = self.preferences(viewer).await?;

        if let Some(sort_by) = input.sort_by {
            filter.sort_by = sort_by;
        }
        if let Some(therapists_only) = input.therapists_only {
            filter.therapists_only = therapists_only;
        }
        if let Some(keyword) = input.keyword {
            filter.keyword = if keyword.trim().is_empty() {
                None
            } else {
                Some(keyword)
            };
        }

        let stored = self
            .filter_repo
            .upsert(&filter)
            .await
            .context("Failed to store feed preferences")?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        FollowRepository, PostRepository as _, SqlxFeedFilterRepository, SqlxFollowRepository,
        SqlxPostRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{FeedSort, Post, UserRole};
    use chrono::Utc;

    struct Fixture {
        service: FeedService,
        follows: SqlxFollowRepository,
        posts: SqlxPostRepository,
        viewer: User,
        author: User,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let viewer = users
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

        Fixture {
            service: FeedService::new(
                SqlxPostRepository::boxed(pool.clone()),
                SqlxFeedFilterRepository::boxed(pool.clone()),
            ),
            follows: SqlxFollowRepository::new(pool.clone()),
            posts: SqlxPostRepository::new(pool),
            viewer,
            author,
        }
    }

    async fn add_post(fixture: &Fixture, author_id: i64, content: &str) {
        fixture
            .posts
            .create(&Post {
                id: 0,
                author_id,
                content: content.to_string(),
                media_url: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_feed_empty_without_follows() {
        let fixture = setup().await;
        add_post(&fixture, fixture.author.id, "unseen").await;

        let feed = fixture.service.feed(&fixture.viewer).await.unwrap();
        assert!(feed.is_empty());
    }

    #[tokio::test]
    async fn test_feed_includes_followed_authors_newest_first() {
        let fixture = setup().await;
        add_post(&fixture, fixture.author.id, "older").await;
        add_post(&fixture, fixture.author.id, "newer").await;
        add_post(&fixture, fixture.viewer.id, "own post, not followed").await;

        fixture
            .follows
            .toggle(fixture.viewer.id, fixture.author.id)
            .await
            .unwrap();

        let feed = fixture.service.feed(&fixture.viewer).await.unwrap();
        let contents: Vec<&str> = feed.iter().map(|p| p.post.content.as_str()).collect();
        assert_eq!(contents, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_search_blank_keyword_returns_nothing() {
        let fixture = setup().await;
        add_post(&fixture, fixture.author.id, "anything at all").await;

        assert!(fixture
            .service
            .search(&fixture.viewer, "")
            .await
            .unwrap()
            .is_empty());
        assert!(fixture
            .service
            .search(&fixture.viewer, "   ")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_search_matches_case_insensitively() {
        let fixture = setup().await;
        add_post(&fixture, fixture.author.id, "My CAT is calm today").await;
        add_post(&fixture, fixture.author.id, "dog days").await;

        let hits = fixture.service.search(&fixture.viewer, "cat").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].post.content, "My CAT is calm today");
    }

    #[tokio::test]
    async fn test_preferences_default_then_roundtrip() {
        let fixture = setup().await;

        let prefs = fixture.service.preferences(&fixture.viewer).await.unwrap();
        assert_eq!(prefs.sort_by, FeedSort::Date);
        assert!(!prefs.therapists_only);

        let stored = fixture
            .service
            .update_preferences(
                &fixture.viewer,
                UpdateFeedFilterInput {
                    sort_by: Some(FeedSort::Popularity),
                    therapists_only: Some(true),
                    keyword: Some("sleep".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(stored.sort_by, FeedSort::Popularity);

        let prefs = fixture.service.preferences(&fixture.viewer).await.unwrap();
        assert_eq!(prefs.sort_by, FeedSort::Popularity);
        assert!(prefs.therapists_only);
        assert_eq!(prefs.keyword.as_deref(), Some("sleep"));
    }

    #[tokio::test]
    async fn test_preferences_do_not_change_feed_output() {
        let fixture = setup().await;
        add_post(&fixture, fixture.author.id, "steady").await;
        fixture
            .follows
            .toggle(fixture.viewer.id, fixture.author.id)
            .await
            .unwrap();

        let before = fixture.service.feed(&fixture.viewer).await.unwrap();

        fixture
            .service
            .update_preferences(
                &fixture.viewer,
                UpdateFeedFilterInput {
                    sort_by: Some(FeedSort::Popularity),
                    therapists_only: Some(true),
                    keyword: Some("nothing matches this".to_string()),
                },
            )
            .await
            .unwrap();

        let after = fixture.service.feed(&fixture.viewer).await.unwrap();
        assert_eq!(before.len(), after.len());
    }
}
