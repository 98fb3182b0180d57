//! Request identity middleware
//!
//! Identity arrives as an `X-User-Id` header naming an existing user's
//! guid. When identity checking is disabled (auth_required = false),
//! unidentified requests act as the seeded Anonymous user; a valid header
//! is still honored.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::db::users;
use crate::AppState;
use nudge_common::db::ANONYMOUS_USER_GUID;

/// Resolved identity of the requesting user, inserted as a request extension
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub guid: Uuid,
}

/// Middleware resolving the requesting user for identity-scoped routes
pub async fn identify_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let resolved = match header.as_deref() {
        Some(raw) => match Uuid::parse_str(raw) {
            Ok(guid) => match users::get_user(&state.db, guid).await {
                Ok(Some(user)) => Some(CurrentUser { guid: user.guid }),
                Ok(None) => None,
                Err(e) => {
                    tracing::error!("Failed to resolve request identity: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({"error": "Failed to resolve request identity"})),
                    )
                        .into_response();
                }
            },
            Err(_) => None,
        },
        None => None,
    };

    let resolved = match resolved {
        Some(user) => Some(user),
        None if !state.auth_required => Some(CurrentUser {
            guid: ANONYMOUS_USER_GUID,
        }),
        None => None,
    };

    match resolved {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Missing or unknown user identity"})),
        )
            .into_response(),
    }
}
