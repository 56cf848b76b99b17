//! Data models
//!
//! This module contains all data structures used throughout the MyVillage
//! backend. Models represent:
//! - Database entities (User, profiles, Post, Comment, Like, Notification,
//!   Session, FeedFilter)
//! - Input types for mutations
//! - Display projections with derived fields

mod feed_filter;
mod notification;
mod post;
mod session;
mod user;

pub use feed_filter::{FeedFilter, FeedSort, UpdateFeedFilterInput};
pub use notification::{Notification, NotificationKind, NotificationWithSender};
pub use post::{
    Comment, CommentWithAuthor, CreatePostInput, Like, LikeToggle, Post, PostWithMeta,
    UpdatePostInput,
};
pub use session::Session;
pub use user::{
    FollowToggle, ParentProfile, ParentProfileInput, RegisterInput, TherapistProfile,
    TherapistProfileInput, UpdateProfileInput, User, UserProfile, UserRole,
};
