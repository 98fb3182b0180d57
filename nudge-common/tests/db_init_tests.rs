//! Integration tests for database initialization
//!
//! Covers first-run creation, idempotent re-initialization, seeded rows,
//! default settings, and schema-level constraints.

use nudge_common::db::{init_database, ANONYMOUS_USER_GUID};
use tempfile::TempDir;

#[tokio::test]
async fn test_init_creates_database_file() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("data").join("medianudge.db");

    let pool = init_database(&db_path).await.expect("Should initialize database");
    drop(pool);

    assert!(db_path.exists(), "Database file should be created");
}

#[tokio::test]
async fn test_init_seeds_anonymous_user() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("medianudge.db");

    let pool = init_database(&db_path).await.unwrap();

    let username: String = sqlx::query_scalar("SELECT username FROM users WHERE guid = ?")
        .bind(ANONYMOUS_USER_GUID.to_string())
        .fetch_one(&pool)
        .await
        .expect("Anonymous user should exist");
    assert_eq!(username, "Anonymous");
}

#[tokio::test]
async fn test_init_seeds_default_settings() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("medianudge.db");

    let pool = init_database(&db_path).await.unwrap();

    for key in [
        "auth_required",
        "recommendation_preview_limit",
        "activity_feed_limit",
        "media_search_limit",
        "top_users_limit",
    ] {
        let value = nudge_common::db::settings::get_setting(&pool, key)
            .await
            .unwrap();
        assert!(value.is_some(), "Setting '{}' should be seeded", key);
    }

    assert_eq!(
        nudge_common::db::settings::get_i64_setting(&pool, "recommendation_preview_limit", 0)
            .await
            .unwrap(),
        3
    );
}

#[tokio::test]
async fn test_init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("medianudge.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO media_items (guid, title, media_type) VALUES ('g1', 'Book', 'book')")
        .execute(&pool)
        .await
        .unwrap();
    drop(pool);

    // Re-opening must not wipe existing data
    let pool = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media_items")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_foreign_keys_enforced() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("medianudge.db");

    let pool = init_database(&db_path).await.unwrap();

    let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(enabled, 1);

    // A rating referencing a nonexistent media item must be rejected
    let result = sqlx::query(
        r#"
        INSERT INTO user_media_ratings
            (guid, user_id, media_id, mind_expanding, informative, entertaining)
        VALUES ('r1', ?, 'missing-media', 3, 3, 3)
        "#,
    )
    .bind(ANONYMOUS_USER_GUID.to_string())
    .execute(&pool)
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_media_type_check_constraint() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("medianudge.db");

    let pool = init_database(&db_path).await.unwrap();

    let result = sqlx::query(
        "INSERT INTO media_items (guid, title, media_type) VALUES ('g1', 'Thing', 'sculpture')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "Unknown media type should violate CHECK");
}

#[tokio::test]
async fn test_one_rating_row_per_user_media_pair() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("medianudge.db");

    let pool = init_database(&db_path).await.unwrap();

    sqlx::query("INSERT INTO media_items (guid, title, media_type) VALUES ('m1', 'Book', 'book')")
        .execute(&pool)
        .await
        .unwrap();

    let insert = r#"
        INSERT INTO user_media_ratings
            (guid, user_id, media_id, mind_expanding, informative, entertaining)
        VALUES (?, ?, 'm1', 3, 3, 3)
        "#;
    sqlx::query(insert)
        .bind("r1")
        .bind(ANONYMOUS_USER_GUID.to_string())
        .execute(&pool)
        .await
        .unwrap();

    // A second plain insert for the same pair violates the unique key
    let result = sqlx::query(insert)
        .bind("r2")
        .bind(ANONYMOUS_USER_GUID.to_string())
        .execute(&pool)
        .await;
    assert!(result.is_err());
}
