//! Settings table access

use crate::Result;
use sqlx::SqlitePool;

/// Read a setting value, None if absent or NULL
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    Ok(value.flatten())
}

/// Write a setting value, creating the row if needed
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Read a boolean setting ("true"/"false"), falling back to a default
pub async fn get_bool_setting(pool: &SqlitePool, key: &str, default: bool) -> Result<bool> {
    Ok(get_setting(pool, key)
        .await?
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default))
}

/// Read an integer setting, falling back to a default
pub async fn get_i64_setting(pool: &SqlitePool, key: &str, default: i64) -> Result<i64> {
    Ok(get_setting(pool, key)
        .await?
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default))
}
