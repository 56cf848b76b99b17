//! User API endpoints
//!
//! Handles HTTP requests for identity and the follow graph:
//! - POST /api/users/register - Registration (returns a token pair)
//! - POST /api/users/login - Login (rate limited)
//! - POST /api/users/token/refresh - Token rotation
//! - POST /api/users/logout - Session invalidation
//! - GET|PATCH /api/users/profile/{username} - Profile read/update
//! - POST /api/users/follow/{username} - Follow toggle
//! - GET /api/users/therapists - Verified therapist discovery
//! - GET /api/users/{username}/followers|following - Graph listings

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::UserResponse;
use crate::models::{FollowToggle, RegisterInput, UpdateProfileInput};
use crate::services::LoginInput;

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Request body for token refresh
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Token pair issued at login and refresh
#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

/// Response for successful registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub access: String,
    pub refresh: String,
    pub message: String,
}

/// Response for the follow toggle
#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub status: &'static str,
    pub user: String,
}

/// Build public user routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/token/refresh", post(refresh_token))
}

/// Build protected user routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/profile/{username}", get(get_profile))
        .route("/profile/{username}", patch(update_profile))
        .route("/follow/{username}", post(follow))
        .route("/therapists", get(list_therapists))
        .route("/{username}/followers", get(list_followers))
        .route("/{username}/following", get(list_following))
}

/// POST /api/users/register - Register and log the new user in
///
/// The client gets a token pair right away so no separate login call is
/// needed after signup.
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.register(body).await?;

    let session = state.user_service.create_session(user.id).await?;
    let username = user.username.clone();
    let profile = state.user_service.profile_for(user).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: profile.into(),
            access: session.id,
            refresh: session.refresh_token,
            message: format!("Welcome to MyVillage, {}.", username),
        }),
    ))
}

/// POST /api/users/login - Login with username or email
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let ip_address = extract_ip_address(&headers);

    // Per-IP budget first, then per-username failed-attempt budget
    if let Some(ip) = ip_address.as_ref().and_then(|s| s.parse().ok()) {
        if state.rate_limiter.is_ip_limited(ip).await {
            return Err(ApiError::with_details(
                "RATE_LIMIT",
                "Too many requests, try again later",
                serde_json::json!({"retry_after": 60}),
            ));
        }
        state.rate_limiter.record_ip_request(ip).await;
    }

    if state
        .rate_limiter
        .is_username_limited(&body.username_or_email)
        .await
    {
        return Err(ApiError::with_details(
            "RATE_LIMIT",
            "Too many failed logins, try again later",
            serde_json::json!({"retry_after": 900}),
        ));
    }

    let input = LoginInput::new(body.username_or_email.clone(), body.password);

    let session = match state.user_service.login(input).await {
        Ok(session) => session,
        Err(e) => {
            state
                .rate_limiter
                .record_failed_attempt(&body.username_or_email)
                .await;
            return Err(e.into());
        }
    };

    state
        .rate_limiter
        .clear_username_attempts(&body.username_or_email)
        .await;

    Ok(Json(TokenPairResponse {
        access: session.id,
        refresh: session.refresh_token,
    }))
}

/// POST /api/users/token/refresh - Swap a refresh token for a new pair
async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let session = state.user_service.refresh(&body.refresh).await?;

    Ok(Json(TokenPairResponse {
        access: session.id,
        refresh: session.refresh_token,
    }))
}

/// POST /api/users/logout - Invalidate the presented session
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    // The middleware already validated this token; pull it back out so the
    // exact presented session is the one deleted.
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .or_else(|| {
            headers
                .get(header::COOKIE)
                .and_then(|h| h.to_str().ok())
                .and_then(|s| {
                    s.split(';')
                        .map(str::trim)
                        .find_map(|c| c.strip_prefix("session="))
                })
        })
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    state.user_service.logout(token).await?;

    Ok((
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        )],
        Json(serde_json::json!({"message": "Logged out"})),
    ))
}

/// GET /api/users/profile/{username} - Any authenticated user may view
async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let profile = state.user_service.profile(&username).await?;
    Ok(Json(profile.into()))
}

/// PATCH /api/users/profile/{username} - Self-only; role immutable
async fn update_profile(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(username): Path<String>,
    Json(body): Json<UpdateProfileInput>,
) -> Result<Json<UserResponse>, ApiError> {
    let profile = state
        .user_service
        .update_profile(&actor, &username, body)
        .await?;
    Ok(Json(profile.into()))
}

/// POST /api/users/follow/{username} - Toggle the follow edge
async fn follow(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(actor)): Extension<AuthenticatedUser>,
    Path(username): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    let (toggle, target) = state.user_service.toggle_follow(&actor, &username).await?;

    Ok(Json(FollowResponse {
        status: match toggle {
            FollowToggle::Followed => "followed",
            FollowToggle::Unfollowed => "unfollowed",
        },
        user: target.username,
    }))
}

/// GET /api/users/therapists - Only verified therapists surface here
async fn list_therapists(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let therapists = state.user_service.verified_therapists().await?;
    Ok(Json(therapists.into_iter().map(Into::into).collect()))
}

/// GET /api/users/{username}/followers
async fn list_followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let followers = state.user_service.followers(&username).await?;
    Ok(Json(followers.into_iter().map(Into::into).collect()))
}

/// GET /api/users/{username}/following
async fn list_following(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let following = state.user_service.following(&username).await?;
    Ok(Json(following.into_iter().map(Into::into).collect()))
}

/// Extract the client IP from proxy headers
fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
        .or_else(|| {
            headers
                .get(header::FORWARDED)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split("for=").nth(1))
                .map(|s| s.split(';').next().unwrap_or(s).trim().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_ip_from_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());

        assert_eq!(
            extract_ip_address(&headers),
            Some("203.0.113.9".to_string())
        );
    }

    #[test]
    fn test_extract_ip_from_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "198.51.100.4".parse().unwrap());

        assert_eq!(
            extract_ip_address(&headers),
            Some("198.51.100.4".to_string())
        );
    }

    #[test]
    fn test_extract_ip_missing() {
        let headers = HeaderMap::new();
        assert!(extract_ip_address(&headers).is_none());
    }
}
