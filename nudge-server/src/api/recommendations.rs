//! Recommendation endpoint

use axum::extract::{Query, State};
use axum::Extension;
use axum::Json;
use nudge_common::db::models::MediaItem;
use serde::Deserialize;

use super::{parse_type_filter, ApiError, CurrentUser};
use crate::recommend;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    /// Optional type filter; unknown types are rejected
    #[serde(rename = "type")]
    pub media_type: Option<String>,

    /// Optional cap; absent means the unbounded browse mode
    pub limit: Option<i64>,
}

/// GET /api/recommendations
///
/// Ranked media items the requesting user has not yet rated. An empty
/// list means the user has rated every candidate.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<Vec<MediaItem>>, ApiError> {
    let media_type = parse_type_filter(query.media_type.as_deref())?;

    let items = recommend::recommend(&state.db, user.guid, media_type, query.limit).await?;
    Ok(Json(items))
}
