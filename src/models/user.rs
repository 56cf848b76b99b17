//! User model
//!
//! This module defines the User entity, the role-specific profile
//! extensions, and the input types used by registration and profile
//! updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User entity representing a registered member of the village.
///
/// Every user is either a parent or a therapist; the role is fixed at
/// registration and determines which profile extension exists for the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role
    pub role: UserRole,
    /// Short self-description
    pub bio: Option<String>,
    /// Profile picture URL reference
    pub profile_picture: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// Note: The password should already be hashed before calling this
    /// function. Use `services::password::hash_password()` to hash it.
    pub fn new(username: String, email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            password_hash,
            role,
            bio: None,
            profile_picture: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user registered as a parent
    pub fn is_parent(&self) -> bool {
        self.role == UserRole::Parent
    }

    /// Check if the user registered as a therapist
    pub fn is_therapist(&self) -> bool {
        self.role == UserRole::Therapist
    }

    /// Check if the user owns content authored by `author_id`.
    ///
    /// Mutating operations on posts and comments are gated on this.
    pub fn owns(&self, author_id: i64) -> bool {
        self.id == author_id
    }
}

/// User role, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Parent looking for support
    Parent,
    /// Therapist offering services
    Therapist,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Parent => write!(f, "parent"),
            UserRole::Therapist => write!(f, "therapist"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parent" => Ok(UserRole::Parent),
            "therapist" => Ok(UserRole::Therapist),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Parent profile extension, one row per parent user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentProfile {
    pub user_id: i64,
    pub number_of_children: i64,
    pub children_age_range: Option<String>,
    pub concerns: Option<String>,
}

impl ParentProfile {
    /// Empty profile for a freshly registered parent
    pub fn empty(user_id: i64) -> Self {
        Self {
            user_id,
            number_of_children: 0,
            children_age_range: None,
            concerns: None,
        }
    }
}

/// Therapist profile extension, one row per therapist user.
///
/// `is_verified` is only ever flipped through the privileged service call,
/// never from profile payloads supplied by the owning user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TherapistProfile {
    pub user_id: i64,
    pub license_number: Option<String>,
    pub specialization: Option<String>,
    pub years_of_experience: i64,
    pub is_verified: bool,
    pub accepting_clients: bool,
}

impl TherapistProfile {
    /// Empty profile for a freshly registered therapist
    pub fn empty(user_id: i64) -> Self {
        Self {
            user_id,
            license_number: None,
            specialization: None,
            years_of_experience: 0,
            is_verified: false,
            accepting_clients: true,
        }
    }
}

/// Client-supplied parent profile fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParentProfileInput {
    pub number_of_children: Option<i64>,
    pub children_age_range: Option<String>,
    pub concerns: Option<String>,
}

/// Client-supplied therapist profile fields.
///
/// There is deliberately no `is_verified` field here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TherapistProfileInput {
    pub license_number: Option<String>,
    pub specialization: Option<String>,
    pub years_of_experience: Option<i64>,
    pub accepting_clients: Option<bool>,
}

/// Input for registering a new user
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    pub role: UserRole,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub parent_profile: Option<ParentProfileInput>,
    pub therapist_profile: Option<TherapistProfileInput>,
}

/// Input for updating a user's own profile.
///
/// There is no role field: the role can never change after registration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileInput {
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub parent_profile: Option<ParentProfileInput>,
    pub therapist_profile: Option<TherapistProfileInput>,
}

/// A user together with the role profile and live follow counts.
///
/// Counts are computed from the follow edges at read time, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub user: User,
    pub parent_profile: Option<ParentProfile>,
    pub therapist_profile: Option<TherapistProfile>,
    pub followers_count: i64,
    pub following_count: i64,
}

/// Outcome of a follow toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowToggle {
    Followed,
    Unfollowed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new(
            "maria".to_string(),
            "maria@example.com".to_string(),
            "hashed_password".to_string(),
            UserRole::Parent,
        );

        assert_eq!(user.id, 0);
        assert_eq!(user.username, "maria");
        assert_eq!(user.email, "maria@example.com");
        assert_eq!(user.role, UserRole::Parent);
        assert!(user.bio.is_none());
    }

    #[test]
    fn test_role_predicates() {
        let parent = User::new(
            "p".to_string(),
            "p@test.com".to_string(),
            "hash".to_string(),
            UserRole::Parent,
        );
        let therapist = User::new(
            "t".to_string(),
            "t@test.com".to_string(),
            "hash".to_string(),
            UserRole::Therapist,
        );

        assert!(parent.is_parent());
        assert!(!parent.is_therapist());
        assert!(therapist.is_therapist());
        assert!(!therapist.is_parent());
    }

    #[test]
    fn test_user_owns() {
        let mut user = User::new(
            "author".to_string(),
            "author@test.com".to_string(),
            "hash".to_string(),
            UserRole::Parent,
        );
        user.id = 7;

        assert!(user.owns(7));
        assert!(!user.owns(8));
    }

    #[test]
    fn test_user_role_display() {
        assert_eq!(UserRole::Parent.to_string(), "parent");
        assert_eq!(UserRole::Therapist.to_string(), "therapist");
    }

    #[test]
    fn test_user_role_from_str() {
        assert_eq!(UserRole::from_str("parent").unwrap(), UserRole::Parent);
        assert_eq!(UserRole::from_str("PARENT").unwrap(), UserRole::Parent);
        assert_eq!(
            UserRole::from_str("Therapist").unwrap(),
            UserRole::Therapist
        );
        assert!(UserRole::from_str("admin").is_err());
    }

    #[test]
    fn test_empty_therapist_profile_unverified() {
        let profile = TherapistProfile::empty(3);
        assert_eq!(profile.user_id, 3);
        assert!(!profile.is_verified);
        assert!(profile.accepting_clients);
        assert_eq!(profile.years_of_experience, 0);
    }
}
