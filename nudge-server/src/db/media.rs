//! Media item database operations
//!
//! Media items are created and deleted administratively; their aggregate
//! columns are maintained by the rating store (see [`crate::db::ratings`]).

use nudge_common::db::models::{MediaItem, MediaType};
use nudge_common::{Error, Result};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::parse_guid;

/// Fields for creating a media item; aggregates start at the 3.0 midpoint
#[derive(Debug, Clone, Deserialize)]
pub struct NewMediaItem {
    pub title: String,
    pub media_type: MediaType,
    pub author: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub external_id: Option<String>,
}

pub(crate) const MEDIA_ITEM_COLUMNS: &str = "guid, title, media_type, author, description, \
     image_url, external_id, avg_mind_expanding, avg_informative, avg_entertaining, \
     total_ratings, created_at, updated_at";

/// Map a media_items row (unaliased columns) to a MediaItem
pub(crate) fn media_item_from_row(row: &SqliteRow) -> Result<MediaItem> {
    let guid: String = row.get("guid");
    let media_type: String = row.get("media_type");

    Ok(MediaItem {
        guid: parse_guid(&guid)?,
        title: row.get("title"),
        media_type: media_type.parse()?,
        author: row.get("author"),
        description: row.get("description"),
        image_url: row.get("image_url"),
        external_id: row.get("external_id"),
        avg_mind_expanding: row.get("avg_mind_expanding"),
        avg_informative: row.get("avg_informative"),
        avg_entertaining: row.get("avg_entertaining"),
        total_ratings: row.get("total_ratings"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Create a media item with seed aggregates (3.0/3.0/3.0, zero ratings)
pub async fn create_media_item(pool: &SqlitePool, new: NewMediaItem) -> Result<MediaItem> {
    if new.title.trim().is_empty() {
        return Err(Error::Validation("Media title must not be empty".to_string()));
    }

    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO media_items (
            guid, title, media_type, author, description, image_url, external_id,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(&new.title)
    .bind(new.media_type.as_str())
    .bind(&new.author)
    .bind(&new.description)
    .bind(&new.image_url)
    .bind(&new.external_id)
    .execute(pool)
    .await?;

    get_media_item(pool, guid)
        .await?
        .ok_or_else(|| Error::Internal(format!("Media item vanished after insert: {}", guid)))
}

/// Load a media item by guid
pub async fn get_media_item(pool: &SqlitePool, guid: Uuid) -> Result<Option<MediaItem>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM media_items WHERE guid = ?",
        MEDIA_ITEM_COLUMNS
    ))
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(media_item_from_row(&row)?)),
        None => Ok(None),
    }
}

/// List media items, best-rated first, optionally filtered by type
pub async fn list_media_items(
    pool: &SqlitePool,
    media_type: Option<MediaType>,
    limit: i64,
) -> Result<Vec<MediaItem>> {
    let mut sql = format!("SELECT {} FROM media_items", MEDIA_ITEM_COLUMNS);
    if media_type.is_some() {
        sql.push_str(" WHERE media_type = ?");
    }
    sql.push_str(" ORDER BY avg_mind_expanding DESC, total_ratings DESC, guid ASC LIMIT ?");

    let mut query = sqlx::query(&sql);
    if let Some(t) = media_type {
        query = query.bind(t.as_str());
    }
    query = query.bind(limit);

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(media_item_from_row).collect()
}

/// Case-insensitive search over title, author, and description
pub async fn search_media_items(
    pool: &SqlitePool,
    pattern: &str,
    media_type: Option<MediaType>,
    limit: i64,
) -> Result<Vec<MediaItem>> {
    if pattern.trim().is_empty() {
        return Err(Error::Validation("Empty search pattern".to_string()));
    }

    let like = format!("%{}%", pattern);
    let mut sql = format!(
        "SELECT {} FROM media_items WHERE (title LIKE ? OR author LIKE ? OR description LIKE ?)",
        MEDIA_ITEM_COLUMNS
    );
    if media_type.is_some() {
        sql.push_str(" AND media_type = ?");
    }
    sql.push_str(" ORDER BY avg_mind_expanding DESC, total_ratings DESC, guid ASC LIMIT ?");

    let mut query = sqlx::query(&sql).bind(&like).bind(&like).bind(&like);
    if let Some(t) = media_type {
        query = query.bind(t.as_str());
    }
    query = query.bind(limit);

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(media_item_from_row).collect()
}

/// Delete a media item; its ratings are removed by the cascade
pub async fn delete_media_item(pool: &SqlitePool, guid: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM media_items WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Media item not found: {}", guid)));
    }

    Ok(())
}
