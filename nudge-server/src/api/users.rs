//! User account and profile endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use chrono::Datelike;
use nudge_common::db::models::{RatingWithMedia, User};
use nudge_common::db::settings::get_i64_setting;
use nudge_common::Error;
use serde::Serialize;

use super::{parse_path_guid, ApiError, CurrentUser};
use crate::db::content::UserContent;
use crate::db::goals::YearlyGoal;
use crate::db::questions::GuidingQuestion;
use crate::db::{content, follows, goals, questions, ratings, users};
use crate::AppState;

/// Everything a public profile page needs in one response
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub guiding_questions: Vec<GuidingQuestion>,
    pub media_ratings: Vec<RatingWithMedia>,
    pub user_content: Vec<UserContent>,
    pub yearly_goal: Option<YearlyGoal>,
    pub followers_count: i64,
    pub following_count: i64,
}

/// GET /api/auth/user
///
/// The requesting user's own record.
pub async fn current_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<User>, ApiError> {
    let user = users::get_user(&state.db, user.guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User not found: {}", user.guid)))?;
    Ok(Json(user))
}

/// POST /api/users
///
/// Create a user or update an existing one's profile, keyed by username.
pub async fn upsert_user(
    State(state): State<AppState>,
    Json(upsert): Json<users::UpsertUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = users::upsert_user(&state.db, upsert).await?;
    Ok((StatusCode::OK, Json(user)))
}

/// GET /api/profile/:user_id
///
/// Public profile: the user plus their questions, ratings, content,
/// current-year goal, and follow counts.
pub async fn profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let guid = parse_path_guid(&user_id, "user")?;

    let user = users::get_user(&state.db, guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User not found: {}", guid)))?;

    let current_year = chrono::Utc::now().year() as i64;
    let guiding_questions = questions::list_questions(&state.db, guid).await?;
    let media_ratings = ratings::ratings_for_user(&state.db, guid).await?;
    let user_content = content::list_content(&state.db, guid).await?;
    let yearly_goal = goals::get_goal(&state.db, guid, current_year).await?;
    let (followers_count, following_count) = follows::follow_counts(&state.db, guid).await?;

    Ok(Json(ProfileResponse {
        user,
        guiding_questions,
        media_ratings,
        user_content,
        yearly_goal,
        followers_count,
        following_count,
    }))
}

/// GET /api/top-users
///
/// Users ranked by wisdom score.
pub async fn top_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let limit = get_i64_setting(&state.db, "top_users_limit", 10).await?;
    let users = users::top_users(&state.db, limit).await?;
    Ok(Json(users))
}
