//! Rate limiter for login attempts
//!
//! Protects the login endpoint against brute force:
//! - per-username failed attempts (5 per 15 minutes)
//! - per-IP requests (10 per minute)

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

const MAX_USERNAME_ATTEMPTS: usize = 5;
const USERNAME_WINDOW_MINUTES: i64 = 15;
const MAX_IP_REQUESTS: usize = 10;
const IP_WINDOW_MINUTES: i64 = 1;

/// Login rate limiter
pub struct LoginRateLimiter {
    /// Failed login attempts by username
    username_attempts: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
    /// Request attempts by IP address
    ip_attempts: Arc<RwLock<HashMap<IpAddr, Vec<DateTime<Utc>>>>>,
}

impl LoginRateLimiter {
    /// Create a new rate limiter
    pub fn new() -> Self {
        Self {
            username_attempts: Arc::new(RwLock::new(HashMap::new())),
            ip_attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check if a username has exceeded its failed-attempt budget
    pub async fn is_username_limited(&self, username: &str) -> bool {
        let mut attempts = self.username_attempts.write().await;
        let cutoff = Utc::now() - Duration::minutes(USERNAME_WINDOW_MINUTES);

        let entries = attempts.entry(username.to_lowercase()).or_default();
        entries.retain(|time| *time > cutoff);

        entries.len() >= MAX_USERNAME_ATTEMPTS
    }

    /// Record a failed login attempt for a username
    pub async fn record_failed_attempt(&self, username: &str) {
        let mut attempts = self.username_attempts.write().await;
        attempts
            .entry(username.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Clear failed attempts for a username (on successful login)
    pub async fn clear_username_attempts(&self, username: &str) {
        let mut attempts = self.username_attempts.write().await;
        attempts.remove(&username.to_lowercase());
    }

    /// Check if an IP has exceeded its request budget
    pub async fn is_ip_limited(&self, ip: IpAddr) -> bool {
        let mut attempts = self.ip_attempts.write().await;
        let cutoff = Utc::now() - Duration::minutes(IP_WINDOW_MINUTES);

        let entries = attempts.entry(ip).or_default();
        entries.retain(|time| *time > cutoff);

        entries.len() >= MAX_IP_REQUESTS
    }

    /// Record a request from an IP
    pub async fn record_ip_request(&self, ip: IpAddr) {
        let mut attempts = self.ip_attempts.write().await;
        attempts.entry(ip).or_default().push(Utc::now());
    }

    /// Drop entries whose window has fully passed (called periodically)
    pub async fn cleanup(&self) {
        let username_cutoff = Utc::now() - Duration::minutes(USERNAME_WINDOW_MINUTES);
        let ip_cutoff = Utc::now() - Duration::minutes(IP_WINDOW_MINUTES);

        {
            let mut attempts = self.username_attempts.write().await;
            attempts.retain(|_, times| {
                times.retain(|time| *time > username_cutoff);
                !times.is_empty()
            });
        }

        {
            let mut attempts = self.ip_attempts.write().await;
            attempts.retain(|_, times| {
                times.retain(|time| *time > ip_cutoff);
                !times.is_empty()
            });
        }
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_username_rate_limit() {
        let limiter = LoginRateLimiter::new();

        for _ in 0..4 {
            assert!(!limiter.is_username_limited("maria").await);
            limiter.record_failed_attempt("maria").await;
        }

        limiter.record_failed_attempt("maria").await;
        assert!(limiter.is_username_limited("maria").await);

        limiter.clear_username_attempts("maria").await;
        assert!(!limiter.is_username_limited("maria").await);
    }

    #[tokio::test]
    async fn test_ip_rate_limit() {
        let limiter = LoginRateLimiter::new();
        let ip = IpAddr::from_str("127.0.0.1").unwrap();

        for _ in 0..9 {
            assert!(!limiter.is_ip_limited(ip).await);
            limiter.record_ip_request(ip).await;
        }

        limiter.record_ip_request(ip).await;
        assert!(limiter.is_ip_limited(ip).await);
    }

    #[tokio::test]
    async fn test_username_matching_is_case_insensitive() {
        let limiter = LoginRateLimiter::new();

        limiter.record_failed_attempt("Maria").await;
        limiter.record_failed_attempt("maria").await;
        limiter.record_failed_attempt("MARIA").await;
        limiter.record_failed_attempt("maria").await;
        limiter.record_failed_attempt("maria").await;

        assert!(limiter.is_username_limited("mArIa").await);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_entries() {
        let limiter = LoginRateLimiter::new();
        limiter.record_failed_attempt("maria").await;

        limiter.cleanup().await;

        // A fresh attempt survives cleanup
        limiter.record_failed_attempt("maria").await;
        limiter.record_failed_attempt("maria").await;
        limiter.record_failed_attempt("maria").await;
        limiter.record_failed_attempt("maria").await;
        assert!(limiter.is_username_limited("maria").await);
    }
}
