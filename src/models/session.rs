//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session entity backing the issued access/refresh token pair.
///
/// The session id doubles as the access token; the refresh token is a
/// second random value with a longer lifetime used to rotate the pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (access token)
    pub id: String,
    /// Associated user ID
    pub user_id: i64,
    /// Refresh token (unique)
    pub refresh_token: String,
    /// Access token expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Refresh token expiration timestamp
    pub refresh_expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Check if the access token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    /// Check if the refresh token has expired
    pub fn is_refresh_expired(&self) -> bool {
        self.refresh_expires_at < Utc::now()
    }
}
