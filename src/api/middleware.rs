//! API middleware
//!
//! Contains middleware for:
//! - Authentication (access token validation)
//! - The shared application state
//! - The JSON error envelope and its mapping from service errors

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::User;
use crate::services::{
    FeedService, FeedServiceError, LoginRateLimiter, NotificationService,
    NotificationServiceError, PostService, PostServiceError, UserService, UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: crate::db::DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub post_service: Arc<PostService>,
    pub notification_service: Arc<NotificationService>,
    pub feed_service: Arc<FeedService>,
    pub rate_limiter: Arc<LoginRateLimiter>,
}

impl AppState {
    /// Wire repositories and services over a connection pool
    pub fn new(pool: crate::db::DynDatabasePool) -> Self {
        use crate::db::repositories::{
            SqlxCommentRepository, SqlxFeedFilterRepository, SqlxFollowRepository,
            SqlxNotificationRepository, SqlxPostRepository, SqlxSessionRepository,
            SqlxUserRepository,
        };

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let follow_repo = SqlxFollowRepository::boxed(pool.clone());
        let post_repo = SqlxPostRepository::boxed(pool.clone());
        let comment_repo = SqlxCommentRepository::boxed(pool.clone());
        let notification_repo = SqlxNotificationRepository::boxed(pool.clone());
        let filter_repo = SqlxFeedFilterRepository::boxed(pool.clone());

        let notification_service = Arc::new(NotificationService::new(notification_repo));
        let user_service = Arc::new(UserService::new(
            user_repo,
            session_repo,
            follow_repo,
            notification_service.clone(),
        ));
        let post_service = Arc::new(PostService::new(
            post_repo.clone(),
            comment_repo,
            notification_service.clone(),
        ));
        let feed_service = Arc::new(FeedService::new(post_repo, filter_repo));

        Self {
            pool,
            user_service,
            post_service,
            notification_service,
            feed_service,
            rate_limiter: Arc::new(LoginRateLimiter::new()),
        }
    }
}

/// Authenticated user extracted from the request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "RATE_LIMIT" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::PermissionError(msg) => ApiError::forbidden(msg),
            UserServiceError::UserExists(msg) => ApiError::conflict(msg),
            UserServiceError::NotFound(msg) => ApiError::not_found(msg),
            UserServiceError::InternalError(e) => {
                tracing::error!("User service error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<PostServiceError> for ApiError {
    fn from(e: PostServiceError) -> Self {
        match e {
            PostServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            PostServiceError::PermissionError(msg) => ApiError::forbidden(msg),
            PostServiceError::NotFound(msg) => ApiError::not_found(msg),
            PostServiceError::InternalError(e) => {
                tracing::error!("Post service error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<NotificationServiceError> for ApiError {
    fn from(e: NotificationServiceError) -> Self {
        match e {
            NotificationServiceError::NotFound(msg) => ApiError::not_found(msg),
            NotificationServiceError::InternalError(e) => {
                tracing::error!("Notification service error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<FeedServiceError> for ApiError {
    fn from(e: FeedServiceError) -> Self {
        match e {
            FeedServiceError::InternalError(e) => {
                tracing::error!("Feed service error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

/// Extract the access token from the request
fn extract_session_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await
        .map_err(|e| ApiError::internal_error(format!("Session validation failed: {}", e)))?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}
