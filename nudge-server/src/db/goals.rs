//! Yearly consumption goal database operations
//!
//! One goal row per user per year, holding per-type targets and
//! completed counts.

use nudge_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::parse_guid;

#[derive(Debug, Clone, Serialize)]
pub struct YearlyGoal {
    pub guid: Uuid,
    pub user_id: Uuid,
    pub year: i64,
    pub books_target: i64,
    pub courses_target: i64,
    pub debates_target: i64,
    pub podcasts_target: i64,
    pub books_completed: i64,
    pub courses_completed: i64,
    pub debates_completed: i64,
    pub podcasts_completed: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Goal fields accepted on upsert; omitted counters default to zero
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertYearlyGoal {
    pub year: i64,
    #[serde(default)]
    pub books_target: i64,
    #[serde(default)]
    pub courses_target: i64,
    #[serde(default)]
    pub debates_target: i64,
    #[serde(default)]
    pub podcasts_target: i64,
    #[serde(default)]
    pub books_completed: i64,
    #[serde(default)]
    pub courses_completed: i64,
    #[serde(default)]
    pub debates_completed: i64,
    #[serde(default)]
    pub podcasts_completed: i64,
}

fn goal_from_row(row: &SqliteRow) -> Result<YearlyGoal> {
    let guid: String = row.get("guid");
    let user_id: String = row.get("user_id");

    Ok(YearlyGoal {
        guid: parse_guid(&guid)?,
        user_id: parse_guid(&user_id)?,
        year: row.get("year"),
        books_target: row.get("books_target"),
        courses_target: row.get("courses_target"),
        debates_target: row.get("debates_target"),
        podcasts_target: row.get("podcasts_target"),
        books_completed: row.get("books_completed"),
        courses_completed: row.get("courses_completed"),
        debates_completed: row.get("debates_completed"),
        podcasts_completed: row.get("podcasts_completed"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const GOAL_COLUMNS: &str = "guid, user_id, year, books_target, courses_target, debates_target, \
     podcasts_target, books_completed, courses_completed, debates_completed, \
     podcasts_completed, created_at, updated_at";

/// Load a user's goal for one year
pub async fn get_goal(pool: &SqlitePool, user_id: Uuid, year: i64) -> Result<Option<YearlyGoal>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM yearly_goals WHERE user_id = ? AND year = ?",
        GOAL_COLUMNS
    ))
    .bind(user_id.to_string())
    .bind(year)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(goal_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Create or replace a user's goal for one year
pub async fn upsert_goal(
    pool: &SqlitePool,
    user_id: Uuid,
    goal: UpsertYearlyGoal,
) -> Result<YearlyGoal> {
    if goal.year < 1970 {
        return Err(Error::Validation(format!("Invalid goal year: {}", goal.year)));
    }
    for (name, value) in [
        ("books_target", goal.books_target),
        ("courses_target", goal.courses_target),
        ("debates_target", goal.debates_target),
        ("podcasts_target", goal.podcasts_target),
        ("books_completed", goal.books_completed),
        ("courses_completed", goal.courses_completed),
        ("debates_completed", goal.debates_completed),
        ("podcasts_completed", goal.podcasts_completed),
    ] {
        if value < 0 {
            return Err(Error::Validation(format!(
                "{} must not be negative, got {}",
                name, value
            )));
        }
    }

    sqlx::query(
        r#"
        INSERT INTO yearly_goals (
            guid, user_id, year,
            books_target, courses_target, debates_target, podcasts_target,
            books_completed, courses_completed, debates_completed, podcasts_completed,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(user_id, year) DO UPDATE SET
            books_target = excluded.books_target,
            courses_target = excluded.courses_target,
            debates_target = excluded.debates_target,
            podcasts_target = excluded.podcasts_target,
            books_completed = excluded.books_completed,
            courses_completed = excluded.courses_completed,
            debates_completed = excluded.debates_completed,
            podcasts_completed = excluded.podcasts_completed,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id.to_string())
    .bind(goal.year)
    .bind(goal.books_target)
    .bind(goal.courses_target)
    .bind(goal.debates_target)
    .bind(goal.podcasts_target)
    .bind(goal.books_completed)
    .bind(goal.courses_completed)
    .bind(goal.debates_completed)
    .bind(goal.podcasts_completed)
    .execute(pool)
    .await?;

    get_goal(pool, user_id, goal.year)
        .await?
        .ok_or_else(|| Error::Internal(format!("Goal vanished after upsert: year {}", goal.year)))
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn goal_for(year: i64) -> UpsertYearlyGoal {
        UpsertYearlyGoal {
            year,
            books_target: 12,
            courses_target: 2,
            debates_target: 0,
            podcasts_target: 24,
            books_completed: 0,
            courses_completed: 0,
            debates_completed: 0,
            podcasts_completed: 0,
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_year() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "alice").await;

        let created = upsert_goal(&pool, user, goal_for(2026)).await.unwrap();
        assert_eq!(created.books_target, 12);

        let mut progress = goal_for(2026);
        progress.books_completed = 3;
        let updated = upsert_goal(&pool, user, progress).await.unwrap();

        assert_eq!(updated.guid, created.guid);
        assert_eq!(updated.books_completed, 3);

        let row_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM yearly_goals WHERE user_id = ?")
                .bind(user.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(row_count, 1);
    }

    #[tokio::test]
    async fn test_goals_independent_per_year() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "alice").await;

        upsert_goal(&pool, user, goal_for(2025)).await.unwrap();
        upsert_goal(&pool, user, goal_for(2026)).await.unwrap();

        assert!(get_goal(&pool, user, 2025).await.unwrap().is_some());
        assert!(get_goal(&pool, user, 2026).await.unwrap().is_some());
        assert!(get_goal(&pool, user, 2024).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_negative_target_rejected() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "alice").await;

        let mut goal = goal_for(2026);
        goal.books_target = -1;
        let result = upsert_goal(&pool, user, goal).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
