//! Notification API endpoints
//!
//! Handles HTTP requests for reading and acknowledging notifications:
//! - GET /api/notifications
//! - POST /api/notifications/{id}/read
//! - POST /api/notifications/read-all
//!
//! Every route is scoped to the authenticated recipient; there is no way
//! to read or mark another user's notifications.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::NotificationResponse;

/// Response for the notification listing
#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: i64,
}

/// Response for read acknowledgements
#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<u64>,
}

/// Build the notification routes (all require auth)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/{id}/read", post(mark_read))
        .route("/read-all", post(mark_all_read))
}

/// GET /api/notifications - The caller's notifications, newest first
async fn list_notifications(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(recipient)): Extension<AuthenticatedUser>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let notifications = state.notification_service.list(recipient.id).await?;
    let unread_count = state
        .notification_service
        .unread_count(recipient.id)
        .await?;

    Ok(Json(NotificationListResponse {
        notifications: notifications.into_iter().map(Into::into).collect(),
        unread_count,
    }))
}

/// POST /api/notifications/{id}/read - Idempotent
async fn mark_read(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(recipient)): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    state.notification_service.mark_read(recipient.id, id).await?;

    Ok(Json(MarkReadResponse {
        status: "marked as read",
        updated: None,
    }))
}

/// POST /api/notifications/read-all - No-op when nothing is unread
async fn mark_all_read(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(recipient)): Extension<AuthenticatedUser>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let updated = state.notification_service.mark_all_read(recipient.id).await?;

    Ok(Json(MarkReadResponse {
        status: "all notifications marked as read",
        updated: Some(updated),
    }))
}
