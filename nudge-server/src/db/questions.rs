//! Guiding question database operations
//!
//! Guiding questions are short prompts a user sets for themselves to steer
//! what they consume next.

use nudge_common::{Error, Result};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::parse_guid;

#[derive(Debug, Clone, Serialize)]
pub struct GuidingQuestion {
    pub guid: Uuid,
    pub user_id: Uuid,
    pub question: String,
    pub created_at: String,
}

fn question_from_row(row: &SqliteRow) -> Result<GuidingQuestion> {
    let guid: String = row.get("guid");
    let user_id: String = row.get("user_id");

    Ok(GuidingQuestion {
        guid: parse_guid(&guid)?,
        user_id: parse_guid(&user_id)?,
        question: row.get("question"),
        created_at: row.get("created_at"),
    })
}

/// A user's questions, newest first
pub async fn list_questions(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<GuidingQuestion>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, user_id, question, created_at
        FROM guiding_questions
        WHERE user_id = ?
        ORDER BY created_at DESC, guid ASC
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(question_from_row).collect()
}

pub async fn create_question(
    pool: &SqlitePool,
    user_id: Uuid,
    question: &str,
) -> Result<GuidingQuestion> {
    if question.trim().is_empty() {
        return Err(Error::Validation("Question must not be empty".to_string()));
    }

    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO guiding_questions (guid, user_id, question, created_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(user_id.to_string())
    .bind(question)
    .execute(pool)
    .await?;

    let row = sqlx::query(
        "SELECT guid, user_id, question, created_at FROM guiding_questions WHERE guid = ?",
    )
    .bind(guid.to_string())
    .fetch_one(pool)
    .await?;

    question_from_row(&row)
}

/// Delete a question; scoped to the owning user
pub async fn delete_question(pool: &SqlitePool, user_id: Uuid, guid: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM guiding_questions WHERE guid = ? AND user_id = ?")
        .bind(guid.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Guiding question not found: {}", guid)));
    }

    Ok(())
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

    #[tokio::test]
    async fn test_create_list_delete() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "alice").await;

        let q = create_question(&pool, user, "What should I learn this year?")
            .await
            .unwrap();

        let listed = list_questions(&pool, user).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].question, "What should I learn this year?");

        delete_question(&pool, user, q.guid).await.unwrap();
        assert!(list_questions(&pool, user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_scoped_to_owner() {
        let pool = setup_pool().await;
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;

        let q = create_question(&pool, alice, "Why?").await.unwrap();

        // Another user cannot delete it
        let result = delete_question(&pool, bob, q.guid).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(list_questions(&pool, alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let pool = setup_pool().await;
        let user = insert_user(&pool, "alice").await;

        let result = create_question(&pool, user, "   ").await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
