//! Follow graph database operations

use nudge_common::db::models::{MediaType, User};
use nudge_common::{Error, Result};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::parse_guid;
use super::users::user_from_row;

/// One entry in the followed-users activity feed: a recent rating with
/// enough user and media context to render it
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub rating_guid: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub media_title: String,
    pub media_type: MediaType,
    pub mind_expanding: i64,
    pub informative: i64,
    pub entertaining: i64,
    pub review: Option<String>,
    pub created_at: String,
}

/// Follow a user; already-following is not an error
pub async fn follow(pool: &SqlitePool, follower_id: Uuid, following_id: Uuid) -> Result<()> {
    if follower_id == following_id {
        return Err(Error::Validation("Cannot follow yourself".to_string()));
    }

    let target_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE guid = ?)")
            .bind(following_id.to_string())
            .fetch_one(pool)
            .await?;
    if !target_exists {
        return Err(Error::NotFound(format!("User not found: {}", following_id)));
    }

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO user_follows (follower_id, following_id, created_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(follower_id.to_string())
    .bind(following_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Unfollow a user; not-following is not an error
pub async fn unfollow(pool: &SqlitePool, follower_id: Uuid, following_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM user_follows WHERE follower_id = ? AND following_id = ?")
        .bind(follower_id.to_string())
        .bind(following_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

const JOINED_USER_COLUMNS: &str = "u.guid, u.username, u.email, u.display_name, \
     u.profile_image_url, u.wisdom_score, u.critic_score, u.expertise_goal, \
     u.junk_tolerance, u.created_at, u.updated_at";

/// Users following the given user
pub async fn followers(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<User>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM users u \
         JOIN user_follows f ON u.guid = f.follower_id \
         WHERE f.following_id = ? \
         ORDER BY f.created_at DESC",
        JOINED_USER_COLUMNS
    ))
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(user_from_row).collect()
}

/// Users the given user follows
pub async fn following(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<User>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM users u \
         JOIN user_follows f ON u.guid = f.following_id \
         WHERE f.follower_id = ? \
         ORDER BY f.created_at DESC",
        JOINED_USER_COLUMNS
    ))
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(user_from_row).collect()
}

/// Latest ratings by users the given user follows, newest first
///
/// Following nobody yields an empty feed.
pub async fn recent_activity(
    pool: &SqlitePool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<ActivityEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT r.guid AS rating_guid, r.user_id, u.username, u.display_name,
               u.profile_image_url, m.title AS media_title, m.media_type,
               r.mind_expanding, r.informative, r.entertaining, r.review,
               r.created_at
        FROM user_media_ratings r
        JOIN users u ON u.guid = r.user_id
        JOIN media_items m ON m.guid = r.media_id
        WHERE r.user_id IN (SELECT following_id FROM user_follows WHERE follower_id = ?)
        ORDER BY r.created_at DESC, r.guid ASC
        LIMIT ?
        "#,
    )
    .bind(user_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let rating_guid: String = row.get("rating_guid");
            let rater_id: String = row.get("user_id");
            let media_type: String = row.get("media_type");

            Ok(ActivityEntry {
                rating_guid: parse_guid(&rating_guid)?,
                user_id: parse_guid(&rater_id)?,
                username: row.get("username"),
                display_name: row.get("display_name"),
                profile_image_url: row.get("profile_image_url"),
                media_title: row.get("media_title"),
                media_type: media_type.parse()?,
                mind_expanding: row.get("mind_expanding"),
                informative: row.get("informative"),
                entertaining: row.get("entertaining"),
                review: row.get("review"),
                created_at: row.get("created_at"),
            })
        })
        .collect()
}

/// Follower / following counts for a profile page
pub async fn follow_counts(pool: &SqlitePool, user_id: Uuid) -> Result<(i64, i64)> {
    let followers: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM user_follows WHERE following_id = ?")
            .bind(user_id.to_string())
            .fetch_one(pool)
            .await?;
    let following: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM user_follows WHERE follower_id = ?")
            .bind(user_id.to_string())
            .fetch_one(pool)
            .await?;

    Ok((followers, following))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::media::{create_media_item, NewMediaItem};
    use crate::db::ratings::{upsert_rating, RatingDimensions};
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

    #[tokio::test]
    async fn test_follow_unfollow_roundtrip() {
        let pool = setup_pool().await;
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;

        follow(&pool, alice, bob).await.unwrap();
        // Idempotent
        follow(&pool, alice, bob).await.unwrap();

        let bobs_followers = followers(&pool, bob).await.unwrap();
        assert_eq!(bobs_followers.len(), 1);
        assert_eq!(bobs_followers[0].username, "alice");

        let alices_following = following(&pool, alice).await.unwrap();
        assert_eq!(alices_following.len(), 1);
        assert_eq!(alices_following[0].username, "bob");

        unfollow(&pool, alice, bob).await.unwrap();
        assert!(followers(&pool, bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_self_follow_rejected() {
        let pool = setup_pool().await;
        let alice = insert_user(&pool, "alice").await;

        let result = follow(&pool, alice, alice).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_follow_unknown_user_is_not_found() {
        let pool = setup_pool().await;
        let alice = insert_user(&pool, "alice").await;

        let result = follow(&pool, alice, Uuid::new_v4()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_activity_only_from_followed_users() {
        let pool = setup_pool().await;
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;
        let carol = insert_user(&pool, "carol").await;

        let media = create_media_item(
            &pool,
            NewMediaItem {
                title: "Book".to_string(),
                media_type: MediaType::Book,
                author: None,
                description: None,
                image_url: None,
                external_id: None,
            },
        )
        .await
        .unwrap()
        .guid;

        let dims = RatingDimensions {
            mind_expanding: 4,
            informative: 4,
            entertaining: 4,
        };
        upsert_rating(&pool, bob, media, dims, Some("great".to_string()), None)
            .await
            .unwrap();
        upsert_rating(&pool, carol, media, dims, None, None)
            .await
            .unwrap();

        follow(&pool, alice, bob).await.unwrap();

        let feed = recent_activity(&pool, alice, 20).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].username, "bob");
        assert_eq!(feed[0].media_title, "Book");

        // Empty when following nobody
        let empty = recent_activity(&pool, carol, 20).await.unwrap();
        assert!(empty.is_empty());
    }
}
