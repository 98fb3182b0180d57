//! Database initialization
//!
//! Creates the SQLite database on first run, applies pragmas, and builds the
//! full schema idempotently so existing databases are opened unchanged.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Well-known guid of the seeded Anonymous user
/// (00000000-0000-0000-0000-000000000001).
///
/// Requests arriving without an identity resolve to this user when
/// identity checking is disabled.
pub const ANONYMOUS_USER_GUID: Uuid = Uuid::from_u128(1);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Connect options apply to every pooled connection:
    // - foreign keys ON, so rating rows cannot outlive their user or media item
    // - WAL, so readers stay concurrent while a rating upsert holds the write lock
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    init_default_settings(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent - safe to call multiple times)
///
/// Separated from [`init_database`] so tests can build the schema on an
/// in-memory pool.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_media_items_table(pool).await?;
    create_user_media_ratings_table(pool).await?;
    create_guiding_questions_table(pool).await?;
    create_user_follows_table(pool).await?;
    create_yearly_goals_table(pool).await?;
    create_user_content_table(pool).await?;
    create_weekly_challenges_table(pool).await?;
    create_user_challenge_progress_table(pool).await?;
    create_settings_table(pool).await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT,
            display_name TEXT,
            profile_image_url TEXT,
            wisdom_score INTEGER NOT NULL DEFAULT 0,
            critic_score REAL NOT NULL DEFAULT 0.0,
            expertise_goal INTEGER NOT NULL DEFAULT 5,
            junk_tolerance INTEGER NOT NULL DEFAULT 3,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (wisdom_score >= 0),
            CHECK (expertise_goal >= 1 AND expertise_goal <= 10),
            CHECK (junk_tolerance >= 1 AND junk_tolerance <= 5)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create Anonymous user if it doesn't exist
    sqlx::query("INSERT OR IGNORE INTO users (guid, username) VALUES (?, 'Anonymous')")
        .bind(ANONYMOUS_USER_GUID.to_string())
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_wisdom ON users(wisdom_score)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the media_items table
///
/// The three aggregate columns hold the running mean of all ratings recorded
/// for the item along that dimension. An unrated item stays at the 3.0
/// midpoint so it ranks neither first nor last.
async fn create_media_items_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS media_items (
            guid TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            media_type TEXT NOT NULL CHECK (media_type IN ('book', 'course', 'podcast', 'movie', 'game', 'debate')),
            author TEXT,
            description TEXT,
            image_url TEXT,
            external_id TEXT,
            avg_mind_expanding REAL NOT NULL DEFAULT 3.0,
            avg_informative REAL NOT NULL DEFAULT 3.0,
            avg_entertaining REAL NOT NULL DEFAULT 3.0,
            total_ratings INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (avg_mind_expanding >= 1.0 AND avg_mind_expanding <= 5.0),
            CHECK (avg_informative >= 1.0 AND avg_informative <= 5.0),
            CHECK (avg_entertaining >= 1.0 AND avg_entertaining <= 5.0),
            CHECK (total_ratings >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_media_items_type ON media_items(media_type)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_media_items_title ON media_items(title)")
        .execute(pool)
        .await?;
    // Ranking reads sort on the mind-expanding aggregate
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_media_items_mind_expanding ON media_items(avg_mind_expanding)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the user_media_ratings table
///
/// One row per (user, media) pair - a resubmission overwrites the first.
async fn create_user_media_ratings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_media_ratings (
            guid TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            media_id TEXT NOT NULL REFERENCES media_items(guid) ON DELETE CASCADE,
            mind_expanding INTEGER NOT NULL,
            informative INTEGER NOT NULL,
            entertaining INTEGER NOT NULL,
            review TEXT,
            consumed_at TIMESTAMP,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (user_id, media_id),
            CHECK (mind_expanding >= 1 AND mind_expanding <= 5),
            CHECK (informative >= 1 AND informative <= 5),
            CHECK (entertaining >= 1 AND entertaining <= 5)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Aggregate recomputation reads all ratings for one media item
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ratings_media ON user_media_ratings(media_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_ratings_user_created ON user_media_ratings(user_id, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_guiding_questions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS guiding_questions (
            guid TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            question TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_questions_user ON guiding_questions(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_user_follows_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_follows (
            follower_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            following_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (follower_id, following_id),
            CHECK (follower_id <> following_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_follows_following ON user_follows(following_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_yearly_goals_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS yearly_goals (
            guid TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            year INTEGER NOT NULL,
            books_target INTEGER NOT NULL DEFAULT 0,
            courses_target INTEGER NOT NULL DEFAULT 0,
            debates_target INTEGER NOT NULL DEFAULT 0,
            podcasts_target INTEGER NOT NULL DEFAULT 0,
            books_completed INTEGER NOT NULL DEFAULT 0,
            courses_completed INTEGER NOT NULL DEFAULT 0,
            debates_completed INTEGER NOT NULL DEFAULT 0,
            podcasts_completed INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (user_id, year),
            CHECK (year >= 1970),
            CHECK (books_target >= 0 AND courses_target >= 0 AND debates_target >= 0 AND podcasts_target >= 0),
            CHECK (books_completed >= 0 AND courses_completed >= 0 AND debates_completed >= 0 AND podcasts_completed >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_goals_user ON yearly_goals(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_user_content_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_content (
            guid TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            title TEXT NOT NULL,
            content_type TEXT NOT NULL CHECK (content_type IN ('video', 'article', 'debate_contribution')),
            body TEXT,
            url TEXT,
            avg_rating REAL NOT NULL DEFAULT 0.0,
            total_ratings INTEGER NOT NULL DEFAULT 0,
            views INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (total_ratings >= 0),
            CHECK (views >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_content_user ON user_content(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_weekly_challenges_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS weekly_challenges (
            guid TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            start_date TIMESTAMP NOT NULL,
            end_date TIMESTAMP NOT NULL,
            requirements TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_challenges_active ON weekly_challenges(active)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_user_challenge_progress_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_challenge_progress (
            guid TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            challenge_id TEXT NOT NULL REFERENCES weekly_challenges(guid) ON DELETE CASCADE,
            progress TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (user_id, challenge_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores application configuration key-value pairs.
async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize or update default settings
///
/// This function ensures all required settings exist with default values.
/// It also handles NULL values by resetting them to defaults.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // Request identity checking; "false" lets unidentified requests act as Anonymous
    ensure_setting(pool, "auth_required", "true").await?;

    // Recommendation and feed limits
    ensure_setting(pool, "recommendation_preview_limit", "3").await?;
    ensure_setting(pool, "activity_feed_limit", "20").await?;
    ensure_setting(pool, "media_search_limit", "20").await?;
    ensure_setting(pool, "top_users_limit", "10").await?;

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it will be created with the default.
/// If the setting exists but has a NULL value, it will be reset to the default.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if !exists {
        // INSERT OR IGNORE handles concurrent initialization race conditions
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(default_value)
            .execute(pool)
            .await?;

        info!(
            "Initialized setting '{}' with default value: {}",
            key, default_value
        );
        return Ok(());
    }

    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if value.is_none() {
        sqlx::query("UPDATE settings SET value = ?, updated_at = CURRENT_TIMESTAMP WHERE key = ?")
            .bind(default_value)
            .bind(key)
            .execute(pool)
            .await?;

        tracing::warn!(
            "Setting '{}' was NULL, reset to default: {}",
            key,
            default_value
        );
    }

    Ok(())
}
