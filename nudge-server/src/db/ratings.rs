//! Rating store and aggregate maintenance
//!
//! A rating upsert and the recomputation of the target media item's
//! aggregate columns run inside one transaction: either both land or
//! neither does, so an aggregate can never drift out of sync with the
//! ratings on file. SQLite's single-writer lock serializes concurrent
//! upserts against the same item.

use nudge_common::db::models::{MediaItem, RatingWithMedia, UserMediaRating};
use nudge_common::{Error, Result};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::parse_guid;

/// Aggregate value of a media item with no ratings on file.
///
/// The scale midpoint, so an unrated item reads as neither best nor worst.
pub const NEUTRAL_AGGREGATE: f64 = 3.0;

/// The three rating dimensions, each an integer in [1,5]
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RatingDimensions {
    pub mind_expanding: i64,
    pub informative: i64,
    pub entertaining: i64,
}

impl RatingDimensions {
    /// Reject any dimension outside [1,5] before anything is written
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("mind_expanding", self.mind_expanding),
            ("informative", self.informative),
            ("entertaining", self.entertaining),
        ] {
            if !(1..=5).contains(&value) {
                return Err(Error::Validation(format!(
                    "{} rating must be between 1 and 5, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

fn rating_from_row(row: &SqliteRow) -> Result<UserMediaRating> {
    let guid: String = row.get("guid");
    let user_id: String = row.get("user_id");
    let media_id: String = row.get("media_id");

    Ok(UserMediaRating {
        guid: parse_guid(&guid)?,
        user_id: parse_guid(&user_id)?,
        media_id: parse_guid(&media_id)?,
        mind_expanding: row.get("mind_expanding"),
        informative: row.get("informative"),
        entertaining: row.get("entertaining"),
        review: row.get("review"),
        consumed_at: row.get("consumed_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Record or replace a user's rating of a media item
///
/// At most one rating row exists per (user, media) pair; a resubmission
/// overwrites the dimensions, review, and consumption date. The media
/// item's aggregates are recomputed from a fresh read inside the same
/// transaction, so a failure in either step rolls back both.
pub async fn upsert_rating(
    pool: &SqlitePool,
    user_id: Uuid,
    media_id: Uuid,
    dims: RatingDimensions,
    review: Option<String>,
    consumed_at: Option<String>,
) -> Result<UserMediaRating> {
    dims.validate()?;

    let mut tx = pool.begin().await?;

    let media_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM media_items WHERE guid = ?)")
            .bind(media_id.to_string())
            .fetch_one(&mut *tx)
            .await?;
    if !media_exists {
        return Err(Error::NotFound(format!("Media item not found: {}", media_id)));
    }

    sqlx::query(
        r#"
        INSERT INTO user_media_ratings (
            guid, user_id, media_id, mind_expanding, informative, entertaining,
            review, consumed_at, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(user_id, media_id) DO UPDATE SET
            mind_expanding = excluded.mind_expanding,
            informative = excluded.informative,
            entertaining = excluded.entertaining,
            review = excluded.review,
            consumed_at = excluded.consumed_at,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id.to_string())
    .bind(media_id.to_string())
    .bind(dims.mind_expanding)
    .bind(dims.informative)
    .bind(dims.entertaining)
    .bind(&review)
    .bind(&consumed_at)
    .execute(&mut *tx)
    .await?;

    recompute(&mut tx, media_id).await?;

    let row = sqlx::query(
        r#"
        SELECT guid, user_id, media_id, mind_expanding, informative, entertaining,
               review, consumed_at, created_at, updated_at
        FROM user_media_ratings
        WHERE user_id = ? AND media_id = ?
        "#,
    )
    .bind(user_id.to_string())
    .bind(media_id.to_string())
    .fetch_one(&mut *tx)
    .await?;
    let rating = rating_from_row(&row)?;

    tx.commit().await?;

    Ok(rating)
}

/// Recompute a media item's aggregate columns from its ratings
///
/// Empty rating set resets the aggregates to the neutral default.
/// Idempotent: recomputing twice with no intervening rating change
/// yields identical values.
pub async fn recompute(conn: &mut SqliteConnection, media_id: Uuid) -> Result<()> {
    let row = sqlx::query(
        r#"
        SELECT AVG(mind_expanding) AS avg_mind_expanding,
               AVG(informative) AS avg_informative,
               AVG(entertaining) AS avg_entertaining,
               COUNT(*) AS total_ratings
        FROM user_media_ratings
        WHERE media_id = ?
        "#,
    )
    .bind(media_id.to_string())
    .fetch_one(&mut *conn)
    .await?;

    let total_ratings: i64 = row.get("total_ratings");
    let (avg_mind_expanding, avg_informative, avg_entertaining) = if total_ratings == 0 {
        (NEUTRAL_AGGREGATE, NEUTRAL_AGGREGATE, NEUTRAL_AGGREGATE)
    } else {
        (
            row.get::<f64, _>("avg_mind_expanding"),
            row.get::<f64, _>("avg_informative"),
            row.get::<f64, _>("avg_entertaining"),
        )
    };

    let result = sqlx::query(
        r#"
        UPDATE media_items SET
            avg_mind_expanding = ?,
            avg_informative = ?,
            avg_entertaining = ?,
            total_ratings = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(avg_mind_expanding)
    .bind(avg_informative)
    .bind(avg_entertaining)
    .bind(total_ratings)
    .bind(media_id.to_string())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Media item not found: {}", media_id)));
    }

    Ok(())
}

/// Recompute aggregates for a media item in its own transaction
pub async fn recompute_media_aggregates(pool: &SqlitePool, media_id: Uuid) -> Result<()> {
    let mut tx = pool.begin().await?;
    recompute(&mut tx, media_id).await?;
    tx.commit().await?;
    Ok(())
}

/// Load one user's rating of one media item
pub async fn get_rating(
    pool: &SqlitePool,
    user_id: Uuid,
    media_id: Uuid,
) -> Result<Option<UserMediaRating>> {
    let row = sqlx::query(
        r#"
        SELECT guid, user_id, media_id, mind_expanding, informative, entertaining,
               review, consumed_at, created_at, updated_at
        FROM user_media_ratings
        WHERE user_id = ? AND media_id = ?
        "#,
    )
    .bind(user_id.to_string())
    .bind(media_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(rating_from_row(&row)?)),
        None => Ok(None),
    }
}

/// All of a user's ratings joined with their media items, newest first
pub async fn ratings_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<RatingWithMedia>> {
    let rows = sqlx::query(
        r#"
        SELECT r.guid, r.user_id, r.media_id, r.mind_expanding, r.informative,
               r.entertaining, r.review, r.consumed_at, r.created_at, r.updated_at,
               m.guid AS m_guid, m.title AS m_title, m.media_type AS m_media_type,
               m.author AS m_author, m.description AS m_description,
               m.image_url AS m_image_url, m.external_id AS m_external_id,
               m.avg_mind_expanding AS m_avg_mind_expanding,
               m.avg_informative AS m_avg_informative,
               m.avg_entertaining AS m_avg_entertaining,
               m.total_ratings AS m_total_ratings,
               m.created_at AS m_created_at, m.updated_at AS m_updated_at
        FROM user_media_ratings r
        JOIN media_items m ON m.guid = r.media_id
        WHERE r.user_id = ?
        ORDER BY r.created_at DESC, r.guid ASC
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let m_guid: String = row.get("m_guid");
            let m_media_type: String = row.get("m_media_type");

            Ok(RatingWithMedia {
                rating: rating_from_row(row)?,
                media: MediaItem {
                    guid: parse_guid(&m_guid)?,
                    title: row.get("m_title"),
                    media_type: m_media_type.parse()?,
                    author: row.get("m_author"),
                    description: row.get("m_description"),
                    image_url: row.get("m_image_url"),
                    external_id: row.get("m_external_id"),
                    avg_mind_expanding: row.get("m_avg_mind_expanding"),
                    avg_informative: row.get("m_avg_informative"),
                    avg_entertaining: row.get("m_avg_entertaining"),
                    total_ratings: row.get("m_total_ratings"),
                    created_at: row.get("m_created_at"),
                    updated_at: row.get("m_updated_at"),
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::media::{create_media_item, get_media_item, NewMediaItem};
    use nudge_common::db::models::MediaType;
    use sqlx::sqlite::SqlitePoolOptions;

    // Single connection so every query sees the same in-memory database
    async fn setup_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .unwrap();
        nudge_common::db::create_schema(&pool).await.unwrap();
        pool
    }

    async fn insert_user(pool: &SqlitePool, username: &str) -> Uuid {
        let guid = Uuid::new_v4();
        sqlx::query("INSERT INTO users (guid, username) VALUES (?, ?)")
            .bind(guid.to_string())
            .bind(username)
            .execute(pool)
            .await
            .unwrap();
        guid
    }

    async fn insert_media(pool: &SqlitePool, title: &str) -> Uuid {
        create_media_item(
            pool,
            NewMediaItem {
                title: title.to_string(),
                media_type: MediaType::Book,
                author: None,
                description: None,
                image_url: None,
                external_id: None,
            },
        )
        .await
        .unwrap()
        .guid
    }

    fn dims(mind_expanding: i64, informative: i64, entertaining: i64) -> RatingDimensions {
        RatingDimensions {
            mind_expanding,
            informative,
            entertaining,
        }
    }

    #[tokio::test]
    async fn test_first_rating_sets_exact_aggregates() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "alice").await;
        let media = insert_media(&pool, "Book").await;

        upsert_rating(&pool, user, media, dims(5, 4, 3), None, None)
            .await
            .expect("Failed to upsert rating");

        let item = get_media_item(&pool, media).await.unwrap().unwrap();
        assert_eq!(item.avg_mind_expanding, 5.0);
        assert_eq!(item.avg_informative, 4.0);
        assert_eq!(item.avg_entertaining, 3.0);
        assert_eq!(item.total_ratings, 1);
    }

    #[tokio::test]
    async fn test_aggregates_are_per_dimension_means() {
        let pool = setup_pool().await;
        let media = insert_media(&pool, "Book").await;

        let submissions = [(5, 4, 3), (2, 5, 1), (4, 3, 5)];
        for (i, (m, inf, e)) in submissions.iter().enumerate() {
            let user = insert_user(&pool, &format!("user{}", i)).await;
            upsert_rating(&pool, user, media, dims(*m, *inf, *e), None, None)
                .await
                .unwrap();
        }

        let item = get_media_item(&pool, media).await.unwrap().unwrap();
        assert!((item.avg_mind_expanding - 11.0 / 3.0).abs() < 1e-9);
        assert!((item.avg_informative - 4.0).abs() < 1e-9);
        assert!((item.avg_entertaining - 3.0).abs() < 1e-9);
        assert_eq!(item.total_ratings, 3);
    }

    #[tokio::test]
    async fn test_unrated_item_has_neutral_default() {
        let pool = setup_pool().await;
        let media = insert_media(&pool, "Book").await;

        recompute_media_aggregates(&pool, media).await.unwrap();

        let item = get_media_item(&pool, media).await.unwrap().unwrap();
        assert_eq!(item.avg_mind_expanding, 3.0);
        assert_eq!(item.avg_informative, 3.0);
        assert_eq!(item.avg_entertaining, 3.0);
        assert_eq!(item.total_ratings, 0);
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "alice").await;
        let media = insert_media(&pool, "Book").await;
        upsert_rating(&pool, user, media, dims(5, 2, 4), None, None)
            .await
            .unwrap();

        recompute_media_aggregates(&pool, media).await.unwrap();
        let first = get_media_item(&pool, media).await.unwrap().unwrap();

        recompute_media_aggregates(&pool, media).await.unwrap();
        let second = get_media_item(&pool, media).await.unwrap().unwrap();

        assert_eq!(first.avg_mind_expanding, second.avg_mind_expanding);
        assert_eq!(first.avg_informative, second.avg_informative);
        assert_eq!(first.avg_entertaining, second.avg_entertaining);
        assert_eq!(first.total_ratings, second.total_ratings);
    }

    #[tokio::test]
    async fn test_resubmission_overwrites_single_row() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "alice").await;
        let media = insert_media(&pool, "Book").await;

        upsert_rating(&pool, user, media, dims(1, 1, 1), None, None)
            .await
            .unwrap();
        let second = upsert_rating(
            &pool,
            user,
            media,
            dims(5, 4, 3),
            Some("changed my mind".to_string()),
            None,
        )
        .await
        .unwrap();

        assert_eq!(second.mind_expanding, 5);
        assert_eq!(second.review.as_deref(), Some("changed my mind"));

        let row_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_media_ratings WHERE user_id = ? AND media_id = ?",
        )
        .bind(user.to_string())
        .bind(media.to_string())
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(row_count, 1);

        // Aggregate reflects only the latest submission, not both
        let item = get_media_item(&pool, media).await.unwrap().unwrap();
        assert_eq!(item.avg_mind_expanding, 5.0);
        assert_eq!(item.avg_informative, 4.0);
        assert_eq!(item.avg_entertaining, 3.0);
        assert_eq!(item.total_ratings, 1);
    }

    #[tokio::test]
    async fn test_out_of_range_dimension_rejected_before_write() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "alice").await;
        let media = insert_media(&pool, "Book").await;

        let before = get_media_item(&pool, media).await.unwrap().unwrap();

        let result = upsert_rating(&pool, user, media, dims(6, 3, 3), None, None).await;
        assert!(matches!(result, Err(Error::Validation(_))));

        let after = get_media_item(&pool, media).await.unwrap().unwrap();
        assert_eq!(before.avg_mind_expanding, after.avg_mind_expanding);
        assert_eq!(before.total_ratings, after.total_ratings);

        let row_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_media_ratings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row_count, 0);
    }

    #[tokio::test]
    async fn test_unknown_media_is_not_found() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "alice").await;

        let result = upsert_rating(&pool, user, Uuid::new_v4(), dims(3, 3, 3), None, None).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_ratings_for_user_joins_media() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "alice").await;
        let media_a = insert_media(&pool, "First").await;
        let media_b = insert_media(&pool, "Second").await;

        upsert_rating(&pool, user, media_a, dims(4, 4, 4), None, None)
            .await
            .unwrap();
        upsert_rating(
            &pool,
            user,
            media_b,
            dims(2, 3, 5),
            None,
            Some("2026-01-15T00:00:00Z".to_string()),
        )
        .await
        .unwrap();

        let ratings = ratings_for_user(&pool, user).await.unwrap();
        assert_eq!(ratings.len(), 2);
        let titles: Vec<&str> = ratings.iter().map(|r| r.media.title.as_str()).collect();
        assert!(titles.contains(&"First"));
        assert!(titles.contains(&"Second"));

        // Empty result is valid, not an error
        let other = insert_user(&pool, "bob").await;
        let none = ratings_for_user(&pool, other).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_media_delete_cascades_ratings() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "alice").await;
        let media = insert_media(&pool, "Book").await;
        upsert_rating(&pool, user, media, dims(4, 4, 4), None, None)
            .await
            .unwrap();

        crate::db::media::delete_media_item(&pool, media).await.unwrap();

        let row_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_media_ratings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row_count, 0);
    }
}
