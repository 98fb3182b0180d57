//! User-authored content endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;

use super::{ApiError, CurrentUser};
use crate::db::content::{self, NewUserContent, UserContent};
use crate::AppState;

/// GET /api/user/content
pub async fn list_content(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<UserContent>>, ApiError> {
    let content = content::list_content(&state.db, user.guid).await?;
    Ok(Json(content))
}

/// POST /api/user/content
pub async fn create_content(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<NewUserContent>,
) -> Result<(StatusCode, Json<UserContent>), ApiError> {
    let content = content::create_content(&state.db, user.guid, req).await?;
    Ok((StatusCode::CREATED, Json(content)))
}
