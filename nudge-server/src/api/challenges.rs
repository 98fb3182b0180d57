//! Weekly challenge endpoints

use axum::extract::{Path, State};
use axum::Extension;
use axum::Json;
use nudge_common::Error;
use serde::Deserialize;
use uuid::Uuid;

use super::{parse_path_guid, ApiError, CurrentUser};
use crate::db::challenges::{self, ChallengeProgress, WeeklyChallenge};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateProgressRequest {
    pub challenge_id: Uuid,
    pub progress: serde_json::Value,
    #[serde(default)]
    pub completed: bool,
}

/// GET /api/weekly-challenge
///
/// The currently active challenge; 404 when none is running.
pub async fn active_challenge(
    State(state): State<AppState>,
) -> Result<Json<WeeklyChallenge>, ApiError> {
    let challenge = challenges::active_challenge(&state.db)
        .await?
        .ok_or_else(|| Error::NotFound("No active weekly challenge".to_string()))?;
    Ok(Json(challenge))
}

/// GET /api/user/challenge-progress/:challenge_id
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(challenge_id): Path<String>,
) -> Result<Json<ChallengeProgress>, ApiError> {
    let guid = parse_path_guid(&challenge_id, "challenge")?;

    let progress = challenges::get_progress(&state.db, user.guid, guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No progress recorded for challenge {}", guid)))?;
    Ok(Json(progress))
}

/// POST /api/user/challenge-progress
pub async fn update_progress(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateProgressRequest>,
) -> Result<Json<ChallengeProgress>, ApiError> {
    let progress = challenges::upsert_progress(
        &state.db,
        user.guid,
        req.challenge_id,
        req.progress,
        req.completed,
    )
    .await?;
    Ok(Json(progress))
}
