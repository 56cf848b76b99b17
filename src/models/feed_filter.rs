//! Feed filter model
//!
//! Stores per-user feed preferences so sorting and filter choices persist
//! between sessions. The feed composer does not apply these yet; the rows
//! are kept so client preferences survive until the controls ship.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Feed sort preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedSort {
    /// Newest first (default)
    #[default]
    Date,
    /// Most liked first
    Popularity,
}

impl fmt::Display for FeedSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSort::Date => write!(f, "date"),
            FeedSort::Popularity => write!(f, "popularity"),
        }
    }
}

impl FromStr for FeedSort {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" => Ok(FeedSort::Date),
            "popularity" => Ok(FeedSort::Popularity),
            _ => Err(anyhow::anyhow!("Invalid feed sort: {}", s)),
        }
    }
}

/// Stored feed preferences, one row per user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedFilter {
    pub user_id: i64,
    pub sort_by: FeedSort,
    pub therapists_only: bool,
    pub keyword: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl FeedFilter {
    /// Default preferences for a user who never saved any
    pub fn default_for(user_id: i64) -> Self {
        Self {
            user_id,
            sort_by: FeedSort::Date,
            therapists_only: false,
            keyword: None,
            updated_at: Utc::now(),
        }
    }
}

/// Input for updating stored feed preferences
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFeedFilterInput {
    pub sort_by: Option<FeedSort>,
    pub therapists_only: Option<bool>,
    pub keyword: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_roundtrip() {
        assert_eq!(FeedSort::from_str("date").unwrap(), FeedSort::Date);
        assert_eq!(
            FeedSort::from_str("Popularity").unwrap(),
            FeedSort::Popularity
        );
        assert!(FeedSort::from_str("random").is_err());
        assert_eq!(FeedSort::Popularity.to_string(), "popularity");
    }

    #[test]
    fn test_default_preferences() {
        let filter = FeedFilter::default_for(9);
        assert_eq!(filter.user_id, 9);
        assert_eq!(filter.sort_by, FeedSort::Date);
        assert!(!filter.therapists_only);
        assert!(filter.keyword.is_none());
    }
}
