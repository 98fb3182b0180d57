//! Guiding question endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::{parse_path_guid, ApiError, CurrentUser};
use crate::db::questions::{self, GuidingQuestion};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateQuestionRequest {
    pub question: String,
}

/// GET /api/guiding-questions
pub async fn list_questions(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<GuidingQuestion>>, ApiError> {
    let questions = questions::list_questions(&state.db, user.guid).await?;
    Ok(Json(questions))
}

/// POST /api/guiding-questions
pub async fn create_question(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<GuidingQuestion>), ApiError> {
    let question = questions::create_question(&state.db, user.guid, &req.question).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// DELETE /api/guiding-questions/:id
///
/// Scoped to the requesting user's own questions.
pub async fn delete_question(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let guid = parse_path_guid(&id, "question")?;

    questions::delete_question(&state.db, user.guid, guid).await?;
    Ok(Json(serde_json::json!({"success": true})))
}
