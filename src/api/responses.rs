//! Shared API response types
//!
//! Common response structures used across endpoints. Derived fields
//! (follow counts, like/comment counts, the viewer's like flag) are
//! carried through from the service layer, never recomputed here.

use serde::{Deserialize, Serialize};

use crate::models::{
    CommentWithAuthor, FeedFilter, NotificationWithSender, ParentProfile, PostWithMeta,
    TherapistProfile, User, UserProfile,
};

/// Parent profile fields embedded in a user response
#[derive(Debug, Serialize, Deserialize)]
pub struct ParentProfileResponse {
    pub number_of_children: i64,
    pub children_age_range: Option<String>,
    pub concerns: Option<String>,
}

impl From<ParentProfile> for ParentProfileResponse {
    fn from(profile: ParentProfile) -> Self {
        Self {
            number_of_children: profile.number_of_children,
            children_age_range: profile.children_age_range,
            concerns: profile.concerns,
        }
    }
}

/// Therapist profile fields embedded in a user response
#[derive(Debug, Serialize, Deserialize)]
pub struct TherapistProfileResponse {
    pub license_number: Option<String>,
    pub specialization: Option<String>,
    pub years_of_experience: i64,
    pub is_verified: bool,
    pub accepting_clients: bool,
}

impl From<TherapistProfile> for TherapistProfileResponse {
    fn from(profile: TherapistProfile) -> Self {
        Self {
            license_number: profile.license_number,
            specialization: profile.specialization,
            years_of_experience: profile.years_of_experience,
            is_verified: profile.is_verified,
            accepting_clients: profile.accepting_clients,
        }
    }
}

/// Full user response with role profile and live follow counts
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_profile: Option<ParentProfileResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub therapist_profile: Option<TherapistProfileResponse>,
    pub followers_count: i64,
    pub following_count: i64,
    pub created_at: String,
}

impl From<UserProfile> for UserResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.user.id,
            username: profile.user.username,
            email: profile.user.email,
            role: profile.user.role.to_string(),
            bio: profile.user.bio,
            profile_picture: profile.user.profile_picture,
            parent_profile: profile.parent_profile.map(Into::into),
            therapist_profile: profile.therapist_profile.map(Into::into),
            followers_count: profile.followers_count,
            following_count: profile.following_count,
            created_at: profile.user.created_at.to_rfc3339(),
        }
    }
}

/// Compact user reference embedded in posts, comments, and notifications
#[derive(Debug, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role.to_string(),
            bio: user.bio,
            profile_picture: user.profile_picture,
        }
    }
}

/// Post response with derived fields
#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    pub author: UserSummary,
    pub content: String,
    pub media_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_liked_by_user: bool,
}

impl From<PostWithMeta> for PostResponse {
    fn from(meta: PostWithMeta) -> Self {
        Self {
            id: meta.post.id,
            author: meta.author.into(),
            content: meta.post.content,
            media_url: meta.post.media_url,
            created_at: meta.post.created_at.to_rfc3339(),
            updated_at: meta.post.updated_at.to_rfc3339(),
            likes_count: meta.likes_count,
            comments_count: meta.comments_count,
            is_liked_by_user: meta.liked_by_viewer,
        }
    }
}

/// Comment response with its author
#[derive(Debug, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub author: UserSummary,
    pub content: String,
    pub created_at: String,
}

impl From<CommentWithAuthor> for CommentResponse {
    fn from(entry: CommentWithAuthor) -> Self {
        Self {
            id: entry.comment.id,
            post_id: entry.comment.post_id,
            author: entry.author.into(),
            content: entry.comment.content,
            created_at: entry.comment.created_at.to_rfc3339(),
        }
    }
}

/// Notification response with its sender
#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub id: i64,
    pub sender: UserSummary,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    pub is_read: bool,
    pub created_at: String,
}

impl From<NotificationWithSender> for NotificationResponse {
    fn from(entry: NotificationWithSender) -> Self {
        Self {
            id: entry.notification.id,
            sender: entry.sender.into(),
            kind: entry.notification.kind.to_string(),
            post_id: entry.notification.post_id,
            is_read: entry.notification.is_read,
            created_at: entry.notification.created_at.to_rfc3339(),
        }
    }
}

/// Stored feed preferences response
#[derive(Debug, Serialize, Deserialize)]
pub struct FeedFilterResponse {
    pub sort_by: String,
    pub therapists_only: bool,
    pub keyword: Option<String>,
    pub updated_at: String,
}

impl From<FeedFilter> for FeedFilterResponse {
    fn from(filter: FeedFilter) -> Self {
        Self {
            sort_by: filter.sort_by.to_string(),
            therapists_only: filter.therapists_only,
            keyword: filter.keyword,
            updated_at: filter.updated_at.to_rfc3339(),
        }
    }
}
