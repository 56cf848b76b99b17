//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the MyVillage backend:
//! - User/auth endpoints (registration, login, profiles, follow graph)
//! - Post endpoints (posts, comments, likes)
//! - Social endpoints (feed, search, stored preferences)
//! - Notification endpoints
//!
//! Everything except register/login/refresh sits behind the session
//! middleware; anonymous callers get 401.

pub mod middleware;
pub mod notifications;
pub mod posts;
pub mod responses;
pub mod social;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let auth = axum_middleware::from_fn_with_state(state, middleware::require_auth);

    Router::new()
        .nest(
            "/users",
            users::public_router()
                .merge(users::protected_router().route_layer(auth.clone())),
        )
        .nest("/posts", posts::router().route_layer(auth.clone()))
        .nest("/social", social::router().route_layer(auth.clone()))
        .nest("/notifications", notifications::router().route_layer(auth))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
