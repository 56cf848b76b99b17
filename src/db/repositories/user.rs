//! User repository
//!
//! Database operations for users and their role profiles.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL
//!
//! Creating a user and creating its role-matching profile happen in one
//! transaction, so a user row can never exist without its profile row.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{
    ParentProfile, ParentProfileInput, TherapistProfile, TherapistProfileInput, User, UserRole,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user together with its role-matching profile row.
    ///
    /// Client-supplied profile fields are applied when present; the
    /// therapist verification flag always starts false.
    async fn create(
        &self,
        user: &User,
        parent: Option<&ParentProfileInput>,
        therapist: Option<&TherapistProfileInput>,
    ) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update a user's mutable base fields (bio, profile picture)
    async fn update(&self, user: &User) -> Result<User>;

    /// Get the parent profile for a user
    async fn get_parent_profile(&self, user_id: i64) -> Result<Option<ParentProfile>>;

    /// Get the therapist profile for a user
    async fn get_therapist_profile(&self, user_id: i64) -> Result<Option<TherapistProfile>>;

    /// Update the parent profile fields that were supplied
    async fn update_parent_profile(&self, user_id: i64, input: &ParentProfileInput) -> Result<()>;

    /// Update the therapist profile fields that were supplied.
    ///
    /// The verification flag is not touched here; see
    /// [`UserRepository::set_therapist_verified`].
    async fn update_therapist_profile(
        &self,
        user_id: i64,
        input: &TherapistProfileInput,
    ) -> Result<()>;

    /// Flip the verification flag on a therapist profile.
    ///
    /// Returns false when the user has no therapist profile.
    async fn set_therapist_verified(&self, user_id: i64, verified: bool) -> Result<bool>;

    /// List all therapists whose profile has been verified
    async fn list_verified_therapists(&self) -> Result<Vec<User>>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(
        &self,
        user: &User,
        parent: Option<&ParentProfileInput>,
        therapist: Option<&TherapistProfileInput>,
    ) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_user_sqlite(self.pool.as_sqlite().unwrap(), user, parent, therapist).await
            }
            DatabaseDriver::Mysql => {
                create_user_mysql(self.pool.as_mysql().unwrap(), user, parent, therapist).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_user_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_user_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_username_sqlite(self.pool.as_sqlite().unwrap(), username).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_username_mysql(self.pool.as_mysql().unwrap(), username).await
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_email_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_email_mysql(self.pool.as_mysql().unwrap(), email).await
            }
        }
    }

    async fn update(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_user_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => update_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn get_parent_profile(&self, user_id: i64) -> Result<Option<ParentProfile>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_parent_profile_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                get_parent_profile_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }

    async fn get_therapist_profile(&self, user_id: i64) -> Result<Option<TherapistProfile>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_therapist_profile_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                get_therapist_profile_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }

    async fn update_parent_profile(&self, user_id: i64, input: &ParentProfileInput) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_parent_profile_sqlite(self.pool.as_sqlite().unwrap(), user_id, input).await
            }
            DatabaseDriver::Mysql => {
                update_parent_profile_mysql(self.pool.as_mysql().unwrap(), user_id, input).await
            }
        }
    }

    async fn update_therapist_profile(
        &self,
        user_id: i64,
        input: &TherapistProfileInput,
    ) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_therapist_profile_sqlite(self.pool.as_sqlite().unwrap(), user_id, input).await
            }
            DatabaseDriver::Mysql => {
                update_therapist_profile_mysql(self.pool.as_mysql().unwrap(), user_id, input).await
            }
        }
    }

    async fn set_therapist_verified(&self, user_id: i64, verified: bool) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_therapist_verified_sqlite(self.pool.as_sqlite().unwrap(), user_id, verified)
                    .await
            }
            DatabaseDriver::Mysql => {
                set_therapist_verified_mysql(self.pool.as_mysql().unwrap(), user_id, verified).await
            }
        }
    }

    async fn list_verified_therapists(&self) -> Result<Vec<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_verified_therapists_sqlite(self.pool.as_sqlite().unwrap()).await
            }
            DatabaseDriver::Mysql => {
                list_verified_therapists_mysql(self.pool.as_mysql().unwrap()).await
            }
        }
    }
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, bio, profile_picture, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(
    pool: &SqlitePool,
    user: &User,
    parent: Option<&ParentProfileInput>,
    therapist: Option<&TherapistProfileInput>,
) -> Result<User> {
    let now = Utc::now();
    let role_str = user.role.to_string();

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, role, bio, profile_picture, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&role_str)
    .bind(&user.bio)
    .bind(&user.profile_picture)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_rowid();

    // Profile row created in the same transaction as the user row
    match user.role {
        UserRole::Parent => {
            let input = parent.cloned().unwrap_or_default();
            sqlx::query(
                r#"
                INSERT INTO parent_profiles (user_id, number_of_children, children_age_range, concerns)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(input.number_of_children.unwrap_or(0))
            .bind(&input.children_age_range)
            .bind(&input.concerns)
            .execute(&mut *tx)
            .await
            .context("Failed to create parent profile")?;
        }
        UserRole::Therapist => {
            let input = therapist.cloned().unwrap_or_default();
            sqlx::query(
                r#"
                INSERT INTO therapist_profiles
                    (user_id, license_number, specialization, years_of_experience, is_verified, accepting_clients)
                VALUES (?, ?, ?, ?, 0, ?)
                "#,
            )
            .bind(id)
            .bind(&input.license_number)
            .bind(&input.specialization)
            .bind(input.years_of_experience.unwrap_or(0))
            .bind(input.accepting_clients.unwrap_or(true))
            .execute(&mut *tx)
            .await
            .context("Failed to create therapist profile")?;
        }
    }

    tx.commit().await.context("Failed to commit registration")?;

    Ok(User {
        id,
        username: user.username.clone(),
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        role: user.role,
        bio: user.bio.clone(),
        profile_picture: user.profile_picture.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_username_sqlite(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by username")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn update_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    // Username, email, and role are fixed after registration
    sqlx::query(
        r#"
        UPDATE users
        SET bio = ?, profile_picture = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.bio)
    .bind(&user.profile_picture)
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    get_user_by_id_sqlite(pool, user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found after update"))
}

async fn get_parent_profile_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Option<ParentProfile>> {
    let row = sqlx::query(
        "SELECT user_id, number_of_children, children_age_range, concerns FROM parent_profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get parent profile")?;

    Ok(row.map(|row| ParentProfile {
        user_id: row.get("user_id"),
        number_of_children: row.get("number_of_children"),
        children_age_range: row.get("children_age_range"),
        concerns: row.get("concerns"),
    }))
}

async fn get_therapist_profile_sqlite(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<TherapistProfile>> {
    let row = sqlx::query(
        r#"
        SELECT user_id, license_number, specialization, years_of_experience, is_verified, accepting_clients
        FROM therapist_profiles WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get therapist profile")?;

    Ok(row.map(|row| TherapistProfile {
        user_id: row.get("user_id"),
        license_number: row.get("license_number"),
        specialization: row.get("specialization"),
        years_of_experience: row.get("years_of_experience"),
        is_verified: row.get::<i64, _>("is_verified") != 0,
        accepting_clients: row.get::<i64, _>("accepting_clients") != 0,
    }))
}

async fn update_parent_profile_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    input: &ParentProfileInput,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE parent_profiles
        SET number_of_children = COALESCE(?, number_of_children),
            children_age_range = COALESCE(?, children_age_range),
            concerns = COALESCE(?, concerns)
        WHERE user_id = ?
        "#,
    )
    .bind(input.number_of_children)
    .bind(&input.children_age_range)
    .bind(&input.concerns)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to update parent profile")?;

    Ok(())
}

async fn update_therapist_profile_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    input: &TherapistProfileInput,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE therapist_profiles
        SET license_number = COALESCE(?, license_number),
            specialization = COALESCE(?, specialization),
            years_of_experience = COALESCE(?, years_of_experience),
            accepting_clients = COALESCE(?, accepting_clients)
        WHERE user_id = ?
        "#,
    )
    .bind(&input.license_number)
    .bind(&input.specialization)
    .bind(input.years_of_experience)
    .bind(input.accepting_clients)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to update therapist profile")?;

    Ok(())
}

async fn set_therapist_verified_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    verified: bool,
) -> Result<bool> {
    let result = sqlx::query("UPDATE therapist_profiles SET is_verified = ? WHERE user_id = ?")
        .bind(verified)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to set therapist verification")?;

    Ok(result.rows_affected() > 0)
}

async fn list_verified_therapists_sqlite(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query(
        r#"
        SELECT u.id, u.username, u.email, u.password_hash, u.role, u.bio, u.profile_picture,
               u.created_at, u.updated_at
        FROM users u
        JOIN therapist_profiles tp ON tp.user_id = u.id
        WHERE u.role = 'therapist' AND tp.is_verified = 1
        ORDER BY u.username
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list verified therapists")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user_sqlite(&row)?);
    }

    Ok(users)
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        bio: row.get("bio"),
        profile_picture: row.get("profile_picture"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(
    pool: &MySqlPool,
    user: &User,
    parent: Option<&ParentProfileInput>,
    therapist: Option<&TherapistProfileInput>,
) -> Result<User> {
    let now = Utc::now();
    let role_str = user.role.to_string();

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, role, bio, profile_picture, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&role_str)
    .bind(&user.bio)
    .bind(&user.profile_picture)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_id() as i64;

    match user.role {
        UserRole::Parent => {
            let input = parent.cloned().unwrap_or_default();
            sqlx::query(
                r#"
                INSERT INTO parent_profiles (user_id, number_of_children, children_age_range, concerns)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(input.number_of_children.unwrap_or(0))
            .bind(&input.children_age_range)
            .bind(&input.concerns)
            .execute(&mut *tx)
            .await
            .context("Failed to create parent profile")?;
        }
        UserRole::Therapist => {
            let input = therapist.cloned().unwrap_or_default();
            sqlx::query(
                r#"
                INSERT INTO therapist_profiles
                    (user_id, license_number, specialization, years_of_experience, is_verified, accepting_clients)
                VALUES (?, ?, ?, ?, 0, ?)
                "#,
            )
            .bind(id)
            .bind(&input.license_number)
            .bind(&input.specialization)
            .bind(input.years_of_experience.unwrap_or(0))
            .bind(input.accepting_clients.unwrap_or(true))
            .execute(&mut *tx)
            .await
            .context("Failed to create therapist profile")?;
        }
    }

    tx.commit().await.context("Failed to commit registration")?;

    Ok(User {
        id,
        username: user.username.clone(),
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        role: user.role,
        bio: user.bio.clone(),
        profile_picture: user.profile_picture.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_username_mysql(pool: &MySqlPool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by username")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn update_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE users
        SET bio = ?, profile_picture = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.bio)
    .bind(&user.profile_picture)
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    get_user_by_id_mysql(pool, user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found after update"))
}

async fn get_parent_profile_mysql(pool: &MySqlPool, user_id: i64) -> Result<Option<ParentProfile>> {
    let row = sqlx::query(
        "SELECT user_id, number_of_children, children_age_range, concerns FROM parent_profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get parent profile")?;

    Ok(row.map(|row| ParentProfile {
        user_id: row.get("user_id"),
        number_of_children: row.get("number_of_children"),
        children_age_range: row.get("children_age_range"),
        concerns: row.get("concerns"),
    }))
}

async fn get_therapist_profile_mysql(
    pool: &MySqlPool,
    user_id: i64,
) -> Result<Option<TherapistProfile>> {
    let row = sqlx::query(
        r#"
        SELECT user_id, license_number, specialization, years_of_experience, is_verified, accepting_clients
        FROM therapist_profiles WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get therapist profile")?;

    Ok(row.map(|row| TherapistProfile {
        user_id: row.get("user_id"),
        license_number: row.get("license_number"),
        specialization: row.get("specialization"),
        years_of_experience: row.get("years_of_experience"),
        is_verified: row.get::<i64, _>("is_verified") != 0,
        accepting_clients: row.get::<i64, _>("accepting_clients") != 0,
    }))
}

async fn update_parent_profile_mysql(
    pool: &MySqlPool,
    user_id: i64,
    input: &ParentProfileInput,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE parent_profiles
        SET number_of_children = COALESCE(?, number_of_children),
            children_age_range = COALESCE(?, children_age_range),
            concerns = COALESCE(?, concerns)
        WHERE user_id = ?
        "#,
    )
    .bind(input.number_of_children)
    .bind(&input.children_age_range)
    .bind(&input.concerns)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to update parent profile")?;

    Ok(())
}

async fn update_therapist_profile_mysql(
    pool: &MySqlPool,
    user_id: i64,
    input: &TherapistProfileInput,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE therapist_profiles
        SET license_number = COALESCE(?, license_number),
            specialization = COALESCE(?, specialization),
            years_of_experience = COALESCE(?, years_of_experience),
            accepting_clients = COALESCE(?, accepting_clients)
        WHERE user_id = ?
        "#,
    )
    .bind(&input.license_number)
    .bind(&input.specialization)
    .bind(input.years_of_experience)
    .bind(input.accepting_clients)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to update therapist profile")?;

    Ok(())
}

async fn set_therapist_verified_mysql(
    pool: &MySqlPool,
    user_id: i64,
    verified: bool,
) -> Result<bool> {
    let result = sqlx::query("UPDATE therapist_profiles SET is_verified = ? WHERE user_id = ?")
        .bind(verified)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to set therapist verification")?;

    Ok(result.rows_affected() > 0)
}

async fn list_verified_therapists_mysql(pool: &MySqlPool) -> Result<Vec<User>> {
    let rows = sqlx::query(
        r#"
        SELECT u.id, u.username, u.email, u.password_hash, u.role, u.bio, u.profile_picture,
               u.created_at, u.updated_at
        FROM users u
        JOIN therapist_profiles tp ON tp.user_id = u.id
        WHERE u.role = 'therapist' AND tp.is_verified = 1
        ORDER BY u.username
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list verified therapists")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user_mysql(&row)?);
    }

    Ok(users)
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        bio: row.get("bio"),
        profile_picture: row.get("profile_picture"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
