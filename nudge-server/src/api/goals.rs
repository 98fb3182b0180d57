//! Yearly goal endpoints

use axum::extract::{Path, State};
use axum::Extension;
use axum::Json;
use nudge_common::Error;

use super::{ApiError, CurrentUser};
use crate::db::goals::{self, UpsertYearlyGoal, YearlyGoal};
use crate::AppState;

/// GET /api/user/yearly-goal/:year
pub async fn get_goal(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(year): Path<String>,
) -> Result<Json<YearlyGoal>, ApiError> {
    let year: i64 = year
        .parse()
        .map_err(|_| Error::Validation(format!("Invalid goal year: {}", year)))?;

    let goal = goals::get_goal(&state.db, user.guid, year)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No goal set for year {}", year)))?;
    Ok(Json(goal))
}

/// POST /api/user/yearly-goal
pub async fn upsert_goal(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpsertYearlyGoal>,
) -> Result<Json<YearlyGoal>, ApiError> {
    let goal = goals::upsert_goal(&state.db, user.guid, req).await?;
    Ok(Json(goal))
}
