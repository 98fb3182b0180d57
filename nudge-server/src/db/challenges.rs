//! Weekly challenge database operations
//!
//! Challenges are seeded administratively; users track progress against
//! the active one. Requirements and progress are free-form JSON.

use nudge_common::{Error, Result};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::parse_guid;

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyChallenge {
    pub guid: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub requirements: serde_json::Value,
    pub active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChallengeProgress {
    pub guid: Uuid,
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    pub progress: serde_json::Value,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

fn parse_json_column(raw: &str, column: &str) -> Result<serde_json::Value> {
    serde_json::from_str(raw)
        .map_err(|e| Error::Internal(format!("Invalid JSON in {}: {}", column, e)))
}

fn challenge_from_row(row: &SqliteRow) -> Result<WeeklyChallenge> {
    let guid: String = row.get("guid");
    let requirements: String = row.get("requirements");
    let active: i64 = row.get("active");

    Ok(WeeklyChallenge {
        guid: parse_guid(&guid)?,
        title: row.get("title"),
        description: row.get("description"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        requirements: parse_json_column(&requirements, "requirements")?,
        active: active != 0,
        created_at: row.get("created_at"),
    })
}

fn progress_from_row(row: &SqliteRow) -> Result<ChallengeProgress> {
    let guid: String = row.get("guid");
    let user_id: String = row.get("user_id");
    let challenge_id: String = row.get("challenge_id");
    let progress: String = row.get("progress");
    let completed: i64 = row.get("completed");

    Ok(ChallengeProgress {
        guid: parse_guid(&guid)?,
        user_id: parse_guid(&user_id)?,
        challenge_id: parse_guid(&challenge_id)?,
        progress: parse_json_column(&progress, "progress")?,
        completed: completed != 0,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// The most recently created active challenge, if any
pub async fn active_challenge(pool: &SqlitePool) -> Result<Option<WeeklyChallenge>> {
    let row = sqlx::query(
        r#"
        SELECT guid, title, description, start_date, end_date, requirements,
               active, created_at
        FROM weekly_challenges
        WHERE active = 1
        ORDER BY created_at DESC, guid ASC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(challenge_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Seed a challenge (administrative)
pub async fn create_challenge(
    pool: &SqlitePool,
    title: &str,
    description: &str,
    start_date: &str,
    end_date: &str,
    requirements: &serde_json::Value,
) -> Result<WeeklyChallenge> {
    if title.trim().is_empty() {
        return Err(Error::Validation("Challenge title must not be empty".to_string()));
    }

    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO weekly_challenges (guid, title, description, start_date, end_date,
                                       requirements, active, created_at)
        VALUES (?, ?, ?, ?, ?, ?, 1, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(title)
    .bind(description)
    .bind(start_date)
    .bind(end_date)
    .bind(requirements.to_string())
    .execute(pool)
    .await?;

    let row = sqlx::query(
        r#"
        SELECT guid, title, description, start_date, end_date, requirements,
               active, created_at
        FROM weekly_challenges
        WHERE guid = ?
        "#,
    )
    .bind(guid.to_string())
    .fetch_one(pool)
    .await?;

    challenge_from_row(&row)
}

/// A user's progress against one challenge
pub async fn get_progress(
    pool: &SqlitePool,
    user_id: Uuid,
    challenge_id: Uuid,
) -> Result<Option<ChallengeProgress>> {
    let row = sqlx::query(
        r#"
        SELECT guid, user_id, challenge_id, progress, completed, created_at, updated_at
        FROM user_challenge_progress
        WHERE user_id = ? AND challenge_id = ?
        "#,
    )
    .bind(user_id.to_string())
    .bind(challenge_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(progress_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Record a user's progress; one row per (user, challenge)
pub async fn upsert_progress(
    pool: &SqlitePool,
    user_id: Uuid,
    challenge_id: Uuid,
    progress: serde_json::Value,
    completed: bool,
) -> Result<ChallengeProgress> {
    let challenge_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM weekly_challenges WHERE guid = ?)")
            .bind(challenge_id.to_string())
            .fetch_one(pool)
            .await?;
    if !challenge_exists {
        return Err(Error::NotFound(format!("Challenge not found: {}", challenge_id)));
    }

    sqlx::query(
        r#"
        INSERT INTO user_challenge_progress (guid, user_id, challenge_id, progress,
                                             completed, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(user_id, challenge_id) DO UPDATE SET
            progress = excluded.progress,
            completed = excluded.completed,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id.to_string())
    .bind(challenge_id.to_string())
    .bind(progress.to_string())
    .bind(completed)
    .execute(pool)
    .await?;

    get_progress(pool, user_id, challenge_id)
        .await?
        .ok_or_else(|| {
            Error::Internal(format!("Progress vanished after upsert: {}", challenge_id))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
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
    async fn test_active_challenge_is_most_recent() {
        let pool = setup_pool().await;

        assert!(active_challenge(&pool).await.unwrap().is_none());

        let requirements = json!(["rate one book", "rate one debate"]);
        create_challenge(
            &pool,
            "Broaden your inputs",
            "Rate one book and one debate this week",
            "2026-08-03T00:00:00Z",
            "2026-08-10T00:00:00Z",
            &requirements,
        )
        .await
        .unwrap();

        let active = active_challenge(&pool).await.unwrap().unwrap();
        assert_eq!(active.title, "Broaden your inputs");
        assert_eq!(active.requirements, requirements);
        assert!(active.active);
    }

    #[tokio::test]
    async fn test_progress_upsert_single_row() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "alice").await;

        let challenge = create_challenge(
            &pool,
            "Challenge",
            "Desc",
            "2026-08-03T00:00:00Z",
            "2026-08-10T00:00:00Z",
            &json!(["step one", "step two"]),
        )
        .await
        .unwrap();

        upsert_progress(&pool, user, challenge.guid, json!(["step one"]), false)
            .await
            .unwrap();
        let done = upsert_progress(
            &pool,
            user,
            challenge.guid,
            json!(["step one", "step two"]),
            true,
        )
        .await
        .unwrap();

        assert!(done.completed);
        assert_eq!(done.progress, json!(["step one", "step two"]));

        let row_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_challenge_progress WHERE user_id = ?")
                .bind(user.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(row_count, 1);
    }

    #[tokio::test]
    async fn test_progress_for_unknown_challenge_is_not_found() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "alice").await;

        let result = upsert_progress(&pool, user, Uuid::new_v4(), json!([]), false).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
