//! Services layer - Business logic
//!
//! This module contains all business logic services for the MyVillage
//! backend. Services are responsible for:
//! - Implementing business rules
//! - Coordinating between repositories
//! - Handling validation and error cases

pub mod feed;
pub mod notification;
pub mod password;
pub mod post;
pub mod rate_limiter;
pub mod user;

pub use feed::{FeedService, FeedServiceError};
pub use notification::{NotificationService, NotificationServiceError};
pub use password::{hash_password, verify_password};
pub use post::{PostService, PostServiceError};
pub use rate_limiter::LoginRateLimiter;
pub use user::{LoginInput, UserService, UserServiceError};
