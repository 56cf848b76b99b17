//! Feed filter repository
//!
//! Database operations for stored feed preferences, one row per user.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{FeedFilter, FeedSort};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Feed filter repository trait
#[async_trait]
pub trait FeedFilterRepository: Send + Sync {
    /// Get the stored preferences for a user
    async fn get(&self, user_id: i64) -> Result<Option<FeedFilter>>;

    /// Insert or replace the stored preferences for a user
    async fn upsert(&self, filter: &FeedFilter) -> Result<FeedFilter>;
}

/// SQLx-based feed filter repository implementation
pub struct SqlxFeedFilterRepository {
    pool: DynDatabasePool,
}

impl SqlxFeedFilterRepository {
    /// Create a new SQLx feed filter repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn FeedFilterRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl FeedFilterRepository for SqlxFeedFilterRepository {
    async fn get(&self, user_id: i64) -> Result<Option<FeedFilter>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_sqlite(self.pool.as_sqlite().unwrap(), user_id).await,
            DatabaseDriver::Mysql => get_mysql(self.pool.as_mysql().unwrap(), user_id).await,
        }
    }

    async fn upsert(&self, filter: &FeedFilter) -> Result<FeedFilter> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => upsert_sqlite(self.pool.as_sqlite().unwrap(), filter).await,
            DatabaseDriver::Mysql => upsert_mysql(self.pool.as_mysql().unwrap(), filter).await,
        }
    }
}

const FILTER_COLUMNS: &str = "user_id, sort_by, therapists_only, keyword, updated_at";

async fn get_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Option<FeedFilter>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM feed_filters WHERE user_id = ?",
        FILTER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get feed filter")?;

    row.map(|row| row_to_filter_sqlite(&row)).transpose()
}

async fn get_mysql(pool: &MySqlPool, user_id: i64) -> Result<Option<FeedFilter>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM feed_filters WHERE user_id = ?",
        FILTER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get feed filter")?;

    row.map(|row| row_to_filter_mysql(&row)).transpose()
}

async fn upsert_sqlite(pool: &SqlitePool, filter: &FeedFilter) -> Result<FeedFilter> {
    let now = Utc::now();
    let sort_str = filter.sort_by.to_string();

    sqlx::query(
        r#"
        INSERT INTO feed_filters (user_id, sort_by, therapists_only, keyword, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            sort_by = excluded.sort_by,
            therapists_only = excluded.therapists_only,
            keyword = excluded.keyword,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(filter.user_id)
    .bind(&sort_str)
    .bind(filter.therapists_only)
    .bind(&filter.keyword)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to upsert feed filter")?;

    Ok(FeedFilter {
        updated_at: now,
        ..filter.clone()
    })
}

async fn upsert_mysql(pool: &MySqlPool, filter: &FeedFilter) -> Result<FeedFilter> {
    let now = Utc::now();
    let sort_str = filter.sort_by.to_string();

    sqlx::query(
        r#"
        INSERT INTO feed_filters (user_id, sort_by, therapists_only, keyword, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            sort_by = VALUES(sort_by),
            therapists_only = VALUES(therapists_only),
            keyword = VALUES(keyword),
            updated_at = VALUES(updated_at)
        "#,
    )
    .bind(filter.user_id)
    .bind(&sort_str)
    .bind(filter.therapists_only)
    .bind(&filter.keyword)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to upsert feed filter")?;

    Ok(FeedFilter {
        updated_at: now,
        ..filter.clone()
    })
}

fn row_to_filter_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<FeedFilter> {
    let sort_str: String = row.get("sort_by");
    let sort_by = FeedSort::from_str(&sort_str)
        .with_context(|| format!("Invalid feed sort in database: {}", sort_str))?;

    Ok(FeedFilter {
        user_id: row.get("user_id"),
        sort_by,
        therapists_only: row.get::<i64, _>("therapists_only") != 0,
        keyword: row.get("keyword"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_filter_mysql(row: &sqlx::mysql::MySqlRow) -> Result<FeedFilter> {
    let sort_str: String = row.get("sort_by");
    let sort_by = FeedSort::from_str(&sort_str)
        .with_context(|| format!("Invalid feed sort in database: {}", sort_str))?;

    Ok(FeedFilter {
        user_id: row.get("user_id"),
        sort_by,
        therapists_only: row.get::<i64, _>("therapists_only") != 0,
        keyword: row.get("keyword"),
        updated_at: row.get("updated_at"),
    })
}
