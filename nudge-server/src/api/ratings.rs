//! Rating submission and retrieval endpoints

use axum::extract::State;
use axum::Extension;
use axum::Json;
use nudge_common::db::models::{RatingWithMedia, UserMediaRating};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, CurrentUser};
use crate::db::ratings::{self, RatingDimensions};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRatingRequest {
    pub media_id: Uuid,
    pub mind_expanding: i64,
    pub informative: i64,
    pub entertaining: i64,
    pub review: Option<String>,
    pub consumed_at: Option<String>,
}

/// GET /api/user/media-ratings
///
/// The requesting user's ratings joined with their media items, newest first.
pub async fn list_user_ratings(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<RatingWithMedia>>, ApiError> {
    let ratings = ratings::ratings_for_user(&state.db, user.guid).await?;
    Ok(Json(ratings))
}

/// POST /api/user/media-ratings
///
/// Record or replace the requesting user's rating of a media item.
/// The media item's aggregates are updated in the same transaction.
pub async fn submit_rating(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<SubmitRatingRequest>,
) -> Result<Json<UserMediaRating>, ApiError> {
    let rating = ratings::upsert_rating(
        &state.db,
        user.guid,
        req.media_id,
        RatingDimensions {
            mind_expanding: req.mind_expanding,
            informative: req.informative,
            entertaining: req.entertaining,
        },
        req.review,
        req.consumed_at,
    )
    .await?;

    Ok(Json(rating))
}
