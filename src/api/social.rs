//! Social API endpoints
//!
//! Handles HTTP requests for the feed, keyword search, and stored feed
//! preferences:
//! - GET /api/social/feed
//! - GET /api/social/search?q=keyword
//! - GET|PUT /api/social/preferences

use axum::{
    extract::{Query, State},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{FeedFilterResponse, PostResponse};
use crate::models::UpdateFeedFilterInput;

/// Query parameters for keyword search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Build the social routes (all require auth)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feed", get(feed))
        .route("/search", get(search))
        .route("/preferences", get(get_preferences))
        .route("/preferences", put(update_preferences))
}

/// GET /api/social/feed - Posts from followed authors, newest first
async fn feed(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(viewer)): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    let posts = state.feed_service.feed(&viewer).await?;
    Ok(Json(posts.into_iter().map(Into::into).collect()))
}

/// GET /api/social/search?q=keyword
///
/// A blank or missing keyword yields an empty list, never all posts.
async fn search(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(viewer)): Extension<AuthenticatedUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    let posts = state.feed_service.search(&viewer, &query.q).await?;
    Ok(Json(posts.into_iter().map(Into::into).collect()))
}

/// GET /api/social/preferences - Stored feed preferences, defaults if unset
async fn get_preferences(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(viewer)): Extension<AuthenticatedUser>,
) -> Result<Json<FeedFilterResponse>, ApiError> {
    let filter = state.feed_service.preferences(&viewer).await?;
    Ok(Json(filter.into()))
}

/// PUT /api/social/preferences - Store feed preferences
async fn update_preferences(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(viewer)): Extension<AuthenticatedUser>,
    Json(body): Json<UpdateFeedFilterInput>,
) -> Result<Json<FeedFilterResponse>, ApiError> {
    let filter = state.feed_service.update_preferences(&viewer, body).await?;
    Ok(Json(filter.into()))
}
