//! Post service
//!
//! Business logic for posts, comments, and the like toggle. The author of
//! every mutation is the authenticated actor; client-supplied author fields
//! never reach this layer. Like and comment side effects notify the post's
//! author unless they acted on their own post.

use crate::db::repositories::{CommentRepository, PostRepository};
use crate::models::{
    Comment, CommentWithAuthor, CreatePostInput, LikeToggle, NotificationKind, Post, PostWithMeta,
    UpdatePostInput, User,
};
use crate::services::notification::NotificationService;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    /// Validation error (malformed input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Authenticated but not the owner of the resource
    #[error("Permission denied: {0}")]
    PermissionError(String),

    /// Referenced post or comment absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Post service for content and the like toggle
pub struct PostService {
    post_repo: Arc<dyn PostRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    notifications: Arc<NotificationService>,
}

impl PostService {
    /// Create a new post service
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            notifications,
        }
    }

    /// Create a post authored by the acting user
    pub async fn create(
        &self,
        author: &User,
        input: CreatePostInput,
    ) -> Result<PostWithMeta, PostServiceError> {
        if input.content.trim().is_empty() {
            return Err(PostServiceError::ValidationError(
                "content: must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let post = Post {
            id: 0,
            author_id: author.id,
            content: input.content,
            media_url: input.media_url,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .post_repo
            .create(&post)
            .await
            .context("Failed to create post")?;

        self.get(created.id, Some(author.id)).await
    }

    /// Get a decorated post
    pub async fn get(
        &self,
        id: i64,
        viewer_id: Option<i64>,
    ) -> Result<PostWithMeta, PostServiceError> {
        self.post_repo
            .get_with_meta(id, viewer_id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| PostServiceError::NotFound(format!("Post {} not found", id)))
    }

    /// List all posts, newest first
    pub async fn list(&self, viewer_id: Option<i64>) -> Result<Vec<PostWithMeta>, PostServiceError> {
        let posts = self
            .post_repo
            .list_all(viewer_id)
            .await
            .context("Failed to list posts")?;
        Ok(posts)
    }

    /// Update a post; author only
    pub async fn update(
        &self,
        actor: &User,
        id: i64,
        input: UpdatePostInput,
    ) -> Result<PostWithMeta, PostServiceError> {
        let mut post = self.get_owned_post(actor, id).await?;

        if let Some(content) = input.content {
            if content.trim().is_empty() {
                return Err(PostServiceError::ValidationError(
                    "content: must not be empty".to_string(),
                ));
            }
            post.content = content;
        }
        if let Some(media_url) = input.media_url {
            post.media_url = Some(media_url);
        }

        self.post_repo
            .update(&post)
            .await
            .context("Failed to update post")?;

        self.get(id, Some(actor.id)).await
    }

    /// Delete a post; author only
    pub async fn delete(&self, actor: &User, id: i64) -> Result<(), PostServiceError> {
        let post = self.get_owned_post(actor, id).await?;

        self.post_repo
            .delete(post.id)
            .await
            .context("Failed to delete post")?;
        Ok(())
    }

    /// Comments on a post, oldest first
    pub async fn comments(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>, PostServiceError> {
        // Surface a 404 for a missing post rather than an empty list
        self.require_post(post_id).await?;

        let comments = self
            .comment_repo
            .list_for_post(post_id)
            .await
            .context("Failed to list comments")?;
        Ok(comments)
    }

    /// Comment on a post as the acting user.
    ///
    /// Commenting on someone else's post notifies its author; commenting on
    /// your own post stays silent.
    pub async fn add_comment(
        &self,
        actor: &User,
        post_id: i64,
        content: &str,
    ) -> Result<Comment, PostServiceError> {
        if content.trim().is_empty() {
            return Err(PostServiceError::ValidationError(
                "content: must not be empty".to_string(),
            ));
        }

        let post = self.require_post(post_id).await?;

        let comment = self
            .comment_repo
            .create(post_id, actor.id, content)
            .await
            .context("Failed to create comment")?;

        if post.author_id != actor.id {
            // Best-effort delivery; a failed insert must not undo the comment
            if let Err(e) = self
                .notifications
                .notify(
                    post.author_id,
                    actor.id,
                    NotificationKind::Comment,
                    Some(post.id),
                )
                .await
            {
                tracing::warn!("Failed to record comment notification: {:#}", e);
            }
        }

        Ok(comment)
    }

    /// Get a single comment
    pub async fn get_comment(&self, comment_id: i64) -> Result<Comment, PostServiceError> {
        self.comment_repo
            .get_by_id(comment_id)
            .await
            .context("Failed to get comment")?
            .ok_or_else(|| PostServiceError::NotFound(format!("Comment {} not found", comment_id)))
    }

    /// Edit a comment's content; author only
    pub async fn update_comment(
        &self,
        actor: &User,
        comment_id: i64,
        content: &str,
    ) -> Result<Comment, PostServiceError> {
        if content.trim().is_empty() {
            return Err(PostServiceError::ValidationError(
                "content: must not be empty".to_string(),
            ));
        }

        let comment = self.get_comment(comment_id).await?;
        if !actor.owns(comment.author_id) {
            return Err(PostServiceError::PermissionError(
                "You can only edit your own comments".to_string(),
            ));
        }

        let updated = self
            .comment_repo
            .update_content(comment_id, content)
            .await
            .context("Failed to update comment")?;
        Ok(updated)
    }

    /// Delete a comment; author only
    pub async fn delete_comment(
        &self,
        actor: &User,
        comment_id: i64,
    ) -> Result<(), PostServiceError> {
        let comment = self.get_comment(comment_id).await?;
        if !actor.owns(comment.author_id) {
            return Err(PostServiceError::PermissionError(
                "You can only delete your own comments".to_string(),
            ));
        }

        self.comment_repo
            .delete(comment_id)
            .await
            .context("Failed to delete comment")?;
        Ok(())
    }

    /// Toggle the actor's like on a post.
    ///
    /// Only the creation path notifies the author, and only when someone
    /// else liked the post. A like-unlike-like sequence notifies on each
    /// new like; re-sending "like" while one exists toggles it off instead.
    pub async fn toggle_like(
        &self,
        actor: &User,
        post_id: i64,
    ) -> Result<LikeToggle, PostServiceError> {
        let post = self.require_post(post_id).await?;

        let toggle = self
            .post_repo
            .toggle_like(actor.id, post_id)
            .await
            .context("Failed to toggle like")?;

        if toggle == LikeToggle::Liked && post.author_id != actor.id {
            if let Err(e) = self
                .notifications
                .notify(post.author_id, actor.id, NotificationKind::Like, Some(post.id))
                .await
            {
                tracing::warn!("Failed to record like notification: {:#}", e);
            }
        }

        Ok(toggle)
    }

    async fn require_post(&self, post_id: i64) -> Result<Post, PostServiceError> {
        self.post_repo
            .get_by_id(post_id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| PostServiceError::NotFound(format!("Post {} not found", post_id)))
    }

    async fn get_owned_post(&self, actor: &User, id: i64) -> Result<Post, PostServiceError> {
        let post = self.require_post(id).await?;

        if !actor.owns(post.author_id) {
            return Err(PostServiceError::PermissionError(
                "You can only modify your own posts".to_string(),
            ));
        }
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxCommentRepository, SqlxNotificationRepository, SqlxPostRepository, SqlxUserRepository,
        UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::UserRole;

    async fn setup() -> (PostService, Arc<NotificationService>, User, User) {
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

        let notifications = Arc::new(NotificationService::new(
            SqlxNotificationRepository::boxed(pool.clone()),
        ));
        let service = PostService::new(
            SqlxPostRepository::boxed(pool.clone()),
            SqlxCommentRepository::boxed(pool.clone()),
            notifications.clone(),
        );
        (service, notifications, author, reader)
    }

    fn content_input(content: &str) -> CreatePostInput {
        CreatePostInput {
            content: content.to_string(),
            media_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_forces_author() {
        let (service, _, author, _) = setup().await;

        let post = service
            .create(&author, content_input("Hello village"))
            .await
            .unwrap();

        assert_eq!(post.post.author_id, author.id);
        assert_eq!(post.author.username, "dr_kim");
        assert_eq!(post.likes_count, 0);
        assert_eq!(post.comments_count, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_content() {
        let (service, _, author, _) = setup().await;

        let result = service.create(&author, content_input("   ")).await;
        assert!(matches!(result, Err(PostServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete_are_owner_only() {
        let (service, _, author, reader) = setup().await;
        let post = service
            .create(&author, content_input("mine"))
            .await
            .unwrap();

        let result = service
            .update(
                &reader,
                post.post.id,
                UpdatePostInput {
                    content: Some("hijacked".to_string()),
                    media_url: None,
                },
            )
            .await;
        assert!(matches!(result, Err(PostServiceError::PermissionError(_))));

        let result = service.delete(&reader, post.post.id).await;
        assert!(matches!(result, Err(PostServiceError::PermissionError(_))));

        // The author can do both
        service
            .update(
                &author,
                post.post.id,
                UpdatePostInput {
                    content: Some("edited".to_string()),
                    media_url: None,
                },
            )
            .await
            .unwrap();
        service.delete(&author, post.post.id).await.unwrap();

        let result = service.get(post.post.id, None).await;
        assert!(matches!(result, Err(PostServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_comment_on_missing_post_is_not_found() {
        let (service, _, _, reader) = setup().await;

        let result = service.add_comment(&reader, 999, "hello?").await;
        assert!(matches!(result, Err(PostServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_comment_on_own_post_stays_silent() {
        let (service, notifications, author, _) = setup().await;
        let post = service
            .create(&author, content_input("my post"))
            .await
            .unwrap();

        service
            .add_comment(&author, post.post.id, "replying to myself")
            .await
            .unwrap();

        assert_eq!(notifications.unread_count(author.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_comment_on_others_post_notifies_author() {
        let (service, notifications, author, reader) = setup().await;
        let post = service
            .create(&author, content_input("ask me anything"))
            .await
            .unwrap();

        service
            .add_comment(&reader, post.post.id, "what about sleep?")
            .await
            .unwrap();

        let list = notifications.list(author.id).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].notification.kind, NotificationKind::Comment);
        assert_eq!(list[0].notification.post_id, Some(post.post.id));
        assert_eq!(list[0].sender.username, "maria");
    }

    #[tokio::test]
    async fn test_comment_edit_is_owner_only() {
        let (service, _, author, reader) = setup().await;
        let post = service
            .create(&author, content_input("post"))
            .await
            .unwrap();
        let comment = service
            .add_comment(&reader, post.post.id, "typo her")
            .await
            .unwrap();

        let result = service.update_comment(&author, comment.id, "not yours").await;
        assert!(matches!(result, Err(PostServiceError::PermissionError(_))));

        let updated = service
            .update_comment(&reader, comment.id, "typo here")
            .await
            .unwrap();
        assert_eq!(updated.content, "typo here");

        let result = service.delete_comment(&author, comment.id).await;
        assert!(matches!(result, Err(PostServiceError::PermissionError(_))));
        service.delete_comment(&reader, comment.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_like_toggle_notification_rules() {
        let (service, notifications, author, reader) = setup().await;
        let post = service
            .create(&author, content_input("like me"))
            .await
            .unwrap();

        // New like notifies the author
        assert_eq!(
            service.toggle_like(&reader, post.post.id).await.unwrap(),
            LikeToggle::Liked
        );
        assert_eq!(notifications.unread_count(author.id).await.unwrap(), 1);

        // Unlike stays silent and removes the row
        assert_eq!(
            service.toggle_like(&reader, post.post.id).await.unwrap(),
            LikeToggle::Unliked
        );
        assert_eq!(notifications.unread_count(author.id).await.unwrap(), 1);
        let meta = service.get(post.post.id, Some(reader.id)).await.unwrap();
        assert_eq!(meta.likes_count, 0);
        assert!(!meta.liked_by_viewer);

        // A fresh like after the unlike is a new transition and notifies again
        service.toggle_like(&reader, post.post.id).await.unwrap();
        assert_eq!(notifications.unread_count(author.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_liking_own_post_stays_silent() {
        let (service, notifications, author, _) = setup().await;
        let post = service
            .create(&author, content_input("self like"))
            .await
            .unwrap();

        service.toggle_like(&author, post.post.id).await.unwrap();

        assert_eq!(notifications.unread_count(author.id).await.unwrap(), 0);
        let meta = service.get(post.post.id, Some(author.id)).await.unwrap();
        assert_eq!(meta.likes_count, 1);
        assert!(meta.liked_by_viewer);
    }

    #[tokio::test]
    async fn test_like_on_missing_post_is_not_found() {
        let (service, _, _, reader) = setup().await;

        let result = service.toggle_like(&reader, 12345).await;
        assert!(matches!(result, Err(PostServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_comments_listing_requires_post() {
        let (service, _, author, reader) = setup().await;

        let result = service.comments(999).await;
        assert!(matches!(result, Err(PostServiceError::NotFound(_))));

        let post = service
            .create(&author, content_input("discuss"))
            .await
            .unwrap();
        service
            .add_comment(&reader, post.post.id, "first")
            .await
            .unwrap();
        service
            .add_comment(&author, post.post.id, "second")
            .await
            .unwrap();

        let comments = service.comments(post.post.id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].comment.content, "first");
        assert_eq!(comments[1].author.username, "dr_kim");
    }
}
