//! User-authored content database operations
//!
//! Content a user publishes themselves (videos, articles, debate
//! contributions). Carries its own single-scalar rating counters,
//! maintained outside the media-item aggregator.

use nudge_common::db::models::ContentType;
use nudge_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::parse_guid;

#[derive(Debug, Clone, Serialize)]
pub struct UserContent {
    pub guid: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content_type: ContentType,
    pub body: Option<String>,
    pub url: Option<String>,
    pub avg_rating: f64,
    pub total_ratings: i64,
    pub views: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUserContent {
    pub title: String,
    pub content_type: ContentType,
    pub body: Option<String>,
    pub url: Option<String>,
}

fn content_from_row(row: &SqliteRow) -> Result<UserContent> {
    let guid: String = row.get("guid");
    let user_id: String = row.get("user_id");
    let content_type: String = row.get("content_type");

    Ok(UserContent {
        guid: parse_guid(&guid)?,
        user_id: parse_guid(&user_id)?,
        title: row.get("title"),
        content_type: content_type.parse()?,
        body: row.get("body"),
        url: row.get("url"),
        avg_rating: row.get("avg_rating"),
        total_ratings: row.get("total_ratings"),
        views: row.get("views"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// A user's published content, newest first
pub async fn list_content(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<UserContent>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, user_id, title, content_type, body, url, avg_rating,
               total_ratings, views, created_at, updated_at
        FROM user_content
        WHERE user_id = ?
        ORDER BY created_at DESC, guid ASC
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(content_from_row).collect()
}

/// Publish content; rating and view counters start at zero
pub async fn create_content(
    pool: &SqlitePool,
    user_id: Uuid,
    new: NewUserContent,
) -> Result<UserContent> {
    if new.title.trim().is_empty() {
        return Err(Error::Validation("Content title must not be empty".to_string()));
    }

    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO user_content (guid, user_id, title, content_type, body, url,
                                  created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(user_id.to_string())
    .bind(&new.title)
    .bind(new.content_type.as_str())
    .bind(&new.body)
    .bind(&new.url)
    .execute(pool)
    .await?;

    let row = sqlx::query(
        r#"
        SELECT guid, user_id, title, content_type, body, url, avg_rating,
               total_ratings, views, created_at, updated_at
        FROM user_content
        WHERE guid = ?
        "#,
    )
    .bind(guid.to_string())
    .fetch_one(pool)
    .await?;

    content_from_row(&row)
}
