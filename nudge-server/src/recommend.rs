//! Recommendation selection
//!
//! Produces a ranked candidate list of media items the requesting user has
//! not yet rated. Pure read - no side effects on ratings or aggregates.

use nudge_common::db::models::{MediaItem, MediaType};
use nudge_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::media::{media_item_from_row, MEDIA_ITEM_COLUMNS};

/// Rank unseen media items for a user, best candidates first
///
/// Candidates are media items without a rating from this user, optionally
/// restricted to one type. Ordering: mind-expanding aggregate descending,
/// ties broken by total ratings descending (more-validated items first),
/// then guid ascending for determinism. `limit` of None means unbounded
/// (the browse-everything mode). A user who has rated every candidate gets
/// an empty list, not an error.
pub async fn recommend(
    pool: &SqlitePool,
    user_id: Uuid,
    media_type: Option<MediaType>,
    limit: Option<i64>,
) -> Result<Vec<MediaItem>> {
    if let Some(n) = limit {
        if n < 0 {
            return Err(Error::Validation(format!(
                "Recommendation limit must not be negative, got {}",
                n
            )));
        }
    }

    let mut sql = format!(
        "SELECT {} FROM media_items \
         WHERE guid NOT IN (SELECT media_id FROM user_media_ratings WHERE user_id = ?)",
        MEDIA_ITEM_COLUMNS
    );
    if media_type.is_some() {
        sql.push_str(" AND media_type = ?");
    }
    sql.push_str(" ORDER BY avg_mind_expanding DESC, total_ratings DESC, guid ASC");
    if limit.is_some() {
        sql.push_str(" LIMIT ?");
    }

    let mut query = sqlx::query(&sql).bind(user_id.to_string());
    if let Some(t) = media_type {
        query = query.bind(t.as_str());
    }
    if let Some(n) = limit {
        query = query.bind(n);
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(media_item_from_row).collect()
}
