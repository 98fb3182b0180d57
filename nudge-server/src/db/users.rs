//! User database operations

use nudge_common::db::models::User;
use nudge_common::{Error, Result};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::parse_guid;

/// Profile fields accepted on user upsert; scores are not settable here
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertUser {
    pub username: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub expertise_goal: Option<i64>,
    pub junk_tolerance: Option<i64>,
}

pub(crate) fn user_from_row(row: &SqliteRow) -> Result<User> {
    let guid: String = row.get("guid");

    Ok(User {
        guid: parse_guid(&guid)?,
        username: row.get("username"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        profile_image_url: row.get("profile_image_url"),
        wisdom_score: row.get("wisdom_score"),
        critic_score: row.get("critic_score"),
        expertise_goal: row.get("expertise_goal"),
        junk_tolerance: row.get("junk_tolerance"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

pub(crate) const USER_COLUMNS: &str = "guid, username, email, display_name, profile_image_url, \
     wisdom_score, critic_score, expertise_goal, junk_tolerance, created_at, updated_at";

/// Create a user or update an existing one's profile, keyed by username
///
/// Wisdom and critic scores are never touched here; they belong to the
/// gamification processes.
pub async fn upsert_user(pool: &SqlitePool, upsert: UpsertUser) -> Result<User> {
    if upsert.username.trim().is_empty() {
        return Err(Error::Validation("Username must not be empty".to_string()));
    }
    if let Some(goal) = upsert.expertise_goal {
        if !(1..=10).contains(&goal) {
            return Err(Error::Validation(format!(
                "expertise_goal must be between 1 and 10, got {}",
                goal
            )));
        }
    }
    if let Some(tolerance) = upsert.junk_tolerance {
        if !(1..=5).contains(&tolerance) {
            return Err(Error::Validation(format!(
                "junk_tolerance must be between 1 and 5, got {}",
                tolerance
            )));
        }
    }

    sqlx::query(
        r#"
        INSERT INTO users (
            guid, username, email, display_name, profile_image_url,
            expertise_goal, junk_tolerance, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, COALESCE(?, 5), COALESCE(?, 3), CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(username) DO UPDATE SET
            email = excluded.email,
            display_name = excluded.display_name,
            profile_image_url = excluded.profile_image_url,
            expertise_goal = excluded.expertise_goal,
            junk_tolerance = excluded.junk_tolerance,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&upsert.username)
    .bind(&upsert.email)
    .bind(&upsert.display_name)
    .bind(&upsert.profile_image_url)
    .bind(upsert.expertise_goal)
    .bind(upsert.junk_tolerance)
    .execute(pool)
    .await?;

    get_user_by_username(pool, &upsert.username)
        .await?
        .ok_or_else(|| Error::Internal(format!("User vanished after upsert: {}", upsert.username)))
}

/// Load a user by guid
pub async fn get_user(pool: &SqlitePool, guid: Uuid) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE guid = ?", USER_COLUMNS))
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(user_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Load a user by username
pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(user_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Highest wisdom scores first
pub async fn top_users(pool: &SqlitePool, limit: i64) -> Result<Vec<User>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM users ORDER BY wisdom_score DESC, guid ASC LIMIT ?",
        USER_COLUMNS
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(user_from_row).collect()
}
