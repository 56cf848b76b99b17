//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::User;

/// What kind of social action produced a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Like => write!(f, "like"),
            NotificationKind::Comment => write!(f, "comment"),
            NotificationKind::Follow => write!(f, "follow"),
        }
    }
}

impl FromStr for NotificationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "like" => Ok(NotificationKind::Like),
            "comment" => Ok(NotificationKind::Comment),
            "follow" => Ok(NotificationKind::Follow),
            _ => Err(anyhow::anyhow!("Invalid notification kind: {}", s)),
        }
    }
}

/// Notification entity.
///
/// Immutable after creation except for the read flag, which only the
/// recipient can set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub sender_id: i64,
    pub kind: NotificationKind,
    /// Set for like and comment notifications, absent for follows
    pub post_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A notification joined with its sender for display
#[derive(Debug, Clone, Serialize)]
pub struct NotificationWithSender {
    pub notification: Notification,
    pub sender: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(NotificationKind::Like.to_string(), "like");
        assert_eq!(NotificationKind::Comment.to_string(), "comment");
        assert_eq!(NotificationKind::Follow.to_string(), "follow");
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(
            NotificationKind::from_str("like").unwrap(),
            NotificationKind::Like
        );
        assert_eq!(
            NotificationKind::from_str("FOLLOW").unwrap(),
            NotificationKind::Follow
        );
        assert!(NotificationKind::from_str("poke").is_err());
    }
}
