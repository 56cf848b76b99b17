//! Post API endpoints
//!
//! Handles HTTP requests for posts, comments, and likes:
//! - GET|POST /api/posts - Listing and creation
//! - GET|PATCH|DELETE /api/posts/{id} - Detail, owner-only mutation
//! - GET|POST /api/posts/{id}/comments - Comment listing and creation
//! - GET|PATCH|DELETE /api/posts/{id}/comments/{comment_id}
//! - POST /api/posts/{id}/like - Like toggle

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{CommentResponse, PostResponse, UserSummary};
use crate::models::{Comment, CreatePostInput, LikeToggle, UpdatePostInput, User};

/// Request body for creating or editing a comment
#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub content: String,
}

/// Response for the like toggle
#[derive(Debug, Serialize)]
pub struct LikeStatusResponse {
    pub status: &'static str,
}

/// Build the post routes (all require auth)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/", post(create_post))
        .route("/{id}", get(get_post))
        .route("/{id}", patch(update_post))
        .route("/{id}", delete(delete_post))
        .route("/{id}/comments", get(list_comments))
        .route("/{id}/comments", post(create_comment))
        .route("/{id}/comments/{comment_id}", get(get_comment))
        .route("/{id}/comments/{comment_id}", patch(update_comment))
        .route("/{id}/comments/{comment_id}", delete(delete_comment))
        .route("/{id}/like", post(toggle_like))
}

/// GET /api/posts - All posts, newest first
async fn list_posts(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(viewer)): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    let posts = state.post_service.list(Some(viewer.id)).await?;
    Ok(Json(posts.into_iter().map(Into::into).collect()))
}

/// POST /api/posts - Create a post; the author is always the caller
async fn create_post(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Json(body): Json<CreatePostInput>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.post_service.create(&actor, body).await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

/// GET /api/posts/{id}
async fn get_post(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(viewer)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.post_service.get(id, Some(viewer.id)).await?;
    Ok(Json(post.into()))
}

/// PATCH /api/posts/{id} - Author only
async fn update_post(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePostInput>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.post_service.update(&actor, id, body).await?;
    Ok(Json(post.into()))
}

/// DELETE /api/posts/{id} - Author only
async fn delete_post(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.post_service.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/posts/{id}/comments - Oldest first
async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let comments = state.post_service.comments(id).await?;
    Ok(Json(comments.into_iter().map(Into::into).collect()))
}

/// POST /api/posts/{id}/comments
async fn create_comment(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .post_service
        .add_comment(&actor, id, &body.content)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(comment_response(comment, actor)),
    ))
}

/// GET /api/posts/{id}/comments/{comment_id}
async fn get_comment(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Json<CommentResponse>, ApiError> {
    let comment = require_comment_on_post(&state, post_id, comment_id).await?;

    let comments = state.post_service.comments(post_id).await?;
    let entry = comments
        .into_iter()
        .find(|c| c.comment.id == comment.id)
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;
    Ok(Json(entry.into()))
}

/// PATCH /api/posts/{id}/comments/{comment_id} - Author only
async fn update_comment(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    Json(body): Json<CommentBody>,
) -> Result<Json<CommentResponse>, ApiError> {
    require_comment_on_post(&state, post_id, comment_id).await?;

    let comment = state
        .post_service
        .update_comment(&actor, comment_id, &body.content)
        .await?;
    Ok(Json(comment_response(comment, actor)))
}

/// DELETE /api/posts/{id}/comments/{comment_id} - Author only
async fn delete_comment(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    require_comment_on_post(&state, post_id, comment_id).await?;

    state.post_service.delete_comment(&actor, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/posts/{id}/like - 201 on like, 200 on unlike
async fn toggle_like(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let toggle = state.post_service.toggle_like(&actor, id).await?;

    Ok(match toggle {
        LikeToggle::Liked => (
            StatusCode::CREATED,
            Json(LikeStatusResponse { status: "liked" }),
        ),
        LikeToggle::Unliked => (
            StatusCode::OK,
            Json(LikeStatusResponse { status: "unliked" }),
        ),
    })
}

/// A comment fetched through a post URL must belong to that post
async fn require_comment_on_post(
    state: &AppState,
    post_id: i64,
    comment_id: i64,
) -> Result<Comment, ApiError> {
    let comment = state.post_service.get_comment(comment_id).await?;
    if comment.post_id != post_id {
        return Err(ApiError::not_found("Comment not found"));
    }
    Ok(comment)
}

fn comment_response(comment: Comment, author: User) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        author: UserSummary::from(author),
        content: comment.content,
        created_at: comment.created_at.to_rfc3339(),
    }
}
