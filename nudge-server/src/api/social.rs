//! Follow graph and activity feed endpoints

use axum::extract::State;
use axum::Extension;
use axum::Json;
use nudge_common::db::models::User;
use nudge_common::db::settings::get_i64_setting;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, CurrentUser};
use crate::db::follows::{self, ActivityEntry};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FollowRequest {
    pub following_id: Uuid,
}

/// POST /api/user/follow
pub async fn follow(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<FollowRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    follows::follow(&state.db, user.guid, req.following_id).await?;
    Ok(Json(serde_json::json!({"success": true})))
}

/// POST /api/user/unfollow
pub async fn unfollow(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<FollowRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    follows::unfollow(&state.db, user.guid, req.following_id).await?;
    Ok(Json(serde_json::json!({"success": true})))
}

/// GET /api/user/followers
pub async fn followers(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = follows::followers(&state.db, user.guid).await?;
    Ok(Json(users))
}

/// GET /api/user/following
pub async fn following(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = follows::following(&state.db, user.guid).await?;
    Ok(Json(users))
}

/// GET /api/user/activity
///
/// Latest ratings by users the requester follows.
pub async fn recent_activity(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError> {
    let limit = get_i64_setting(&state.db, "activity_feed_limit", 20).await?;
    let feed = follows::recent_activity(&state.db, user.guid, limit).await?;
    Ok(Json(feed))
}
