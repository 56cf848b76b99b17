//! User service
//!
//! Implements business logic for identity and the follow graph:
//! - Registration with role-specific validation and profile creation
//! - Login/logout and access/refresh token rotation
//! - Profile reads and owner-only updates
//! - The follow toggle and its notification side effect
//! - Therapist discovery and the privileged verification switch

use crate::db::repositories::{FollowRepository, SessionRepository, UserRepository};
use crate::models::{
    FollowToggle, NotificationKind, RegisterInput, Session, UpdateProfileInput, User, UserProfile,
    UserRole,
};
use crate::services::notification::NotificationService;
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Access token lifetime in minutes
const ACCESS_TOKEN_TTL_MINUTES: i64 = 60;

/// Refresh token lifetime in days
const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials or token)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (malformed or contradictory input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Authenticated but not allowed to touch this resource
    #[error("Permission denied: {0}")]
    PermissionError(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Referenced user absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for logging in
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username_or_email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(username_or_email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username_or_email: username_or_email.into(),
            password: password.into(),
        }
    }
}

/// User service for identity, sessions, and the follow graph
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    follow_repo: Arc<dyn FollowRepository>,
    notifications: Arc<NotificationService>,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        follow_repo: Arc<dyn FollowRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            follow_repo,
            notifications,
        }
    }

    /// Register a new user.
    ///
    /// Creates the user and its role-matching profile in one transaction.
    /// Therapists must supply a license number up front so an unlicensed
    /// account can never reach the verification queue.
    ///
    /// # Errors
    ///
    /// - `ValidationError` for blank fields, password mismatch, or a
    ///   therapist registration without a license number
    /// - `UserExists` if username or email is already taken
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        self.validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        let mut user = User::new(input.username, input.email, password_hash, input.role);
        user.bio = input.bio;
        user.profile_picture = input.profile_picture;

        let created = self
            .user_repo
            .create(
                &user,
                input.parent_profile.as_ref(),
                input.therapist_profile.as_ref(),
            )
            .await
            .context("Failed to create user")?;

        Ok(created)
    }

    fn validate_register_input(&self, input: &RegisterInput) -> Result<(), UserServiceError> {
        if input.username.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "username: must not be empty".to_string(),
            ));
        }
        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "email: must be a valid email address".to_string(),
            ));
        }
        if input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "password: must not be empty".to_string(),
            ));
        }
        if input.password != input.password2 {
            return Err(UserServiceError::ValidationError(
                "password: passwords do not match".to_string(),
            ));
        }
        if input.role == UserRole::Therapist {
            let has_license = input
                .therapist_profile
                .as_ref()
                .and_then(|p| p.license_number.as_deref())
                .map(|l| !l.trim().is_empty())
                .unwrap_or(false);
            if !has_license {
                return Err(UserServiceError::ValidationError(
                    "license_number: therapists must provide a license number".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Login with credentials and issue a fresh token pair
    ///
    /// # Errors
    ///
    /// - `AuthenticationError` if the credentials are invalid
    pub async fn login(&self, input: LoginInput) -> Result<Session, UserServiceError> {
        let user = self
            .find_user_by_username_or_email(&input.username_or_email)
            .await?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError("Invalid username or password".to_string())
            })?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;

        if !password_valid {
            return Err(UserServiceError::AuthenticationError(
                "Invalid username or password".to_string(),
            ));
        }

        self.create_session(user.id).await
    }

    /// Issue a session pair for a user without re-checking credentials.
    ///
    /// Used by registration, which logs the new user in immediately.
    pub async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            refresh_token: Uuid::new_v4().to_string(),
            expires_at: now + Duration::minutes(ACCESS_TOKEN_TTL_MINUTES),
            refresh_expires_at: now + Duration::days(REFRESH_TOKEN_TTL_DAYS),
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(created)
    }

    /// Swap a refresh token for a new access/refresh pair.
    ///
    /// The old pair is invalidated; a stolen refresh token stops working
    /// the moment its owner rotates.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, UserServiceError> {
        let session = self
            .session_repo
            .get_by_refresh_token(refresh_token)
            .await
            .context("Failed to look up refresh token")?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError("Invalid refresh token".to_string())
            })?;

        if session.is_refresh_expired() {
            self.session_repo
                .delete(&session.id)
                .await
                .context("Failed to delete expired session")?;
            return Err(UserServiceError::AuthenticationError(
                "Refresh token expired".to_string(),
            ));
        }

        self.session_repo
            .delete(&session.id)
            .await
            .context("Failed to rotate session")?;

        self.create_session(session.user_id).await
    }

    /// Logout (invalidate the session)
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Validate an access token and return the associated user.
    ///
    /// Expired sessions are deleted on sight and validate to `None`.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?;

        let session = match session {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo
                .delete(&session.id)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get session user")?;

        Ok(user)
    }

    /// Get a user by username
    pub async fn get_by_username(&self, username: &str) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| UserServiceError::NotFound(format!("User '{}' not found", username)))
    }

    /// Full profile view for a username: user, role profile, live counts
    pub async fn profile(&self, username: &str) -> Result<UserProfile, UserServiceError> {
        let user = self.get_by_username(username).await?;
        self.profile_for(user).await
    }

    /// Build the profile view for an already-loaded user
    pub async fn profile_for(&self, user: User) -> Result<UserProfile, UserServiceError> {
        let parent_profile = self
            .user_repo
            .get_parent_profile(user.id)
            .await
            .context("Failed to get parent profile")?;
        let therapist_profile = self
            .user_repo
            .get_therapist_profile(user.id)
            .await
            .context("Failed to get therapist profile")?;
        let (followers_count, following_count) = self
            .follow_repo
            .counts(user.id)
            .await
            .context("Failed to count follow edges")?;

        Ok(UserProfile {
            user,
            parent_profile,
            therapist_profile,
            followers_count,
            following_count,
        })
    }

    /// Update a user's own profile.
    ///
    /// Only the target user may edit; the role never changes; nested
    /// profile fields are applied only when they match the user's role.
    ///
    /// # Errors
    ///
    /// - `PermissionError` when the actor is not the target
    /// - `NotFound` when the target does not exist
    pub async fn update_profile(
        &self,
        actor: &User,
        username: &str,
        input: UpdateProfileInput,
    ) -> Result<UserProfile, UserServiceError> {
        let mut target = self.get_by_username(username).await?;

        if actor.id != target.id {
            return Err(UserServiceError::PermissionError(
                "You can only edit your own profile".to_string(),
            ));
        }

        if let Some(bio) = input.bio {
            target.bio = Some(bio);
        }
        if let Some(picture) = input.profile_picture {
            target.profile_picture = Some(picture);
        }

        let updated = self
            .user_repo
            .update(&target)
            .await
            .context("Failed to update user")?;

        // Cross-role payloads are ignored: a parent's request cannot touch
        // therapist fields and vice versa.
        match updated.role {
            UserRole::Parent => {
                if let Some(profile_input) = input.parent_profile.as_ref() {
                    self.user_repo
                        .update_parent_profile(updated.id, profile_input)
                        .await
                        .context("Failed to update parent profile")?;
                }
            }
            UserRole::Therapist => {
                if let Some(profile_input) = input.therapist_profile.as_ref() {
                    self.user_repo
                        .update_therapist_profile(updated.id, profile_input)
                        .await
                        .context("Failed to update therapist profile")?;
                }
            }
        }

        self.profile_for(updated).await
    }

    /// Toggle whether the actor follows the target user.
    ///
    /// On a new edge the target is notified; removing an edge notifies
    /// nobody. Returns the resulting state and the target user.
    ///
    /// # Errors
    ///
    /// - `ValidationError` on self-follow, regardless of prior state
    /// - `NotFound` when the target does not exist
    pub async fn toggle_follow(
        &self,
        actor: &User,
        username: &str,
    ) -> Result<(FollowToggle, User), UserServiceError> {
        let target = self.get_by_username(username).await?;

        if target.id == actor.id {
            return Err(UserServiceError::ValidationError(
                "You can't follow yourself".to_string(),
            ));
        }

        let toggle = self
            .follow_repo
            .toggle(actor.id, target.id)
            .await
            .context("Failed to toggle follow edge")?;

        if toggle == FollowToggle::Followed {
            // Self-follow was rejected above, so sender != recipient holds.
            // Delivery is best-effort; a failed insert must not undo the
            // follow.
            if let Err(e) = self
                .notifications
                .notify(target.id, actor.id, NotificationKind::Follow, None)
                .await
            {
                tracing::warn!("Failed to record follow notification: {:#}", e);
            }
        }

        Ok((toggle, target))
    }

    /// Profiles of everyone following the given user
    pub async fn followers(&self, username: &str) -> Result<Vec<UserProfile>, UserServiceError> {
        let user = self.get_by_username(username).await?;
        let users = self
            .follow_repo
            .followers_of(user.id)
            .await
            .context("Failed to list followers")?;
        self.profiles_for(users).await
    }

    /// Profiles of everyone the given user follows
    pub async fn following(&self, username: &str) -> Result<Vec<UserProfile>, UserServiceError> {
        let user = self.get_by_username(username).await?;
        let users = self
            .follow_repo
            .following_of(user.id)
            .await
            .context("Failed to list following")?;
        self.profiles_for(users).await
    }

    /// Therapists whose profile has been verified.
    ///
    /// Unverified therapists never appear in discovery.
    pub async fn verified_therapists(&self) -> Result<Vec<UserProfile>, UserServiceError> {
        let users = self
            .user_repo
            .list_verified_therapists()
            .await
            .context("Failed to list therapists")?;
        self.profiles_for(users).await
    }

    /// Privileged switch for therapist verification.
    ///
    /// Not exposed over HTTP; reached from operator tooling only. The
    /// owning user can never flip this through profile updates.
    pub async fn set_therapist_verified(
        &self,
        username: &str,
        verified: bool,
    ) -> Result<(), UserServiceError> {
        let user = self.get_by_username(username).await?;

        let updated = self
            .user_repo
            .set_therapist_verified(user.id, verified)
            .await
            .context("Failed to set therapist verification")?;

        if !updated {
            return Err(UserServiceError::NotFound(format!(
                "User '{}' has no therapist profile",
                username
            )));
        }
        Ok(())
    }

    async fn profiles_for(&self, users: Vec<User>) -> Result<Vec<UserProfile>, UserServiceError> {
        let mut profiles = Vec::with_capacity(users.len());
        for user in users {
            profiles.push(self.profile_for(user).await?);
        }
        Ok(profiles)
    }

    async fn find_user_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> Result<Option<User>, UserServiceError> {
        let by_username = self
            .user_repo
            .get_by_username(username_or_email)
            .await
            .context("Failed to look up username")?;
        if by_username.is_some() {
            return Ok(by_username);
        }

        let by_email = self
            .user_repo
            .get_by_email(username_or_email)
            .await
            .context("Failed to look up email")?;
        Ok(by_email)
    }
}
