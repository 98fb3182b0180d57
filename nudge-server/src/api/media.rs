//! Media catalog endpoints
//!
//! Media items are created and deleted administratively; rating-driven
//! aggregate maintenance lives in the rating store.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use nudge_common::db::models::MediaItem;
use nudge_common::db::settings::get_i64_setting;
use nudge_common::Error;
use serde::Deserialize;

use super::{parse_path_guid, parse_type_filter, ApiError};
use crate::db::media;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MediaListQuery {
    /// Optional type filter
    #[serde(rename = "type")]
    pub media_type: Option<String>,

    /// Maximum number of items to return
    #[serde(default = "default_list_limit")]
    pub limit: i64,
}

fn default_list_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct MediaSearchQuery {
    pub q: String,

    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

/// GET /api/media
///
/// Best-rated items first, optionally restricted to one type.
pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<MediaListQuery>,
) -> Result<Json<Vec<MediaItem>>, ApiError> {
    let media_type = parse_type_filter(query.media_type.as_deref())?;
    if query.limit < 1 {
        return Err(Error::Validation(format!(
            "limit must be positive, got {}",
            query.limit
        ))
        .into());
    }

    let items = media::list_media_items(&state.db, media_type, query.limit).await?;
    Ok(Json(items))
}

/// GET /api/media/search
pub async fn search_media(
    State(state): State<AppState>,
    Query(query): Query<MediaSearchQuery>,
) -> Result<Json<Vec<MediaItem>>, ApiError> {
    let media_type = parse_type_filter(query.media_type.as_deref())?;
    let limit = get_i64_setting(&state.db, "media_search_limit", 20).await?;

    let items = media::search_media_items(&state.db, &query.q, media_type, limit).await?;
    Ok(Json(items))
}

/// GET /api/media/:id
pub async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MediaItem>, ApiError> {
    let guid = parse_path_guid(&id, "media")?;

    let item = media::get_media_item(&state.db, guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Media item not found: {}", guid)))?;
    Ok(Json(item))
}

/// POST /api/media
///
/// Administrative creation; aggregates seed at the neutral default.
pub async fn create_media(
    State(state): State<AppState>,
    Json(new): Json<media::NewMediaItem>,
) -> Result<(StatusCode, Json<MediaItem>), ApiError> {
    let item = media::create_media_item(&state.db, new).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// DELETE /api/media/:id
///
/// Administrative deletion; the item's ratings are removed by the cascade.
pub async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let guid = parse_path_guid(&id, "media")?;

    media::delete_media_item(&state.db, guid).await?;
    Ok(Json(serde_json::json!({"success": true})))
}
