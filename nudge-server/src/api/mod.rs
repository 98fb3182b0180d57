//! HTTP API handlers for nudge-server

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nudge_common::db::models::MediaType;
use nudge_common::Error;
use serde_json::json;
use uuid::Uuid;

pub mod auth;
pub mod challenges;
pub mod content;
pub mod goals;
pub mod health;
pub mod media;
pub mod questions;
pub mod ratings;
pub mod recommendations;
pub mod social;
pub mod users;

pub use auth::{identify_user, CurrentUser};
pub use health::health_routes;

/// HTTP boundary error: maps the common error taxonomy onto status codes
/// with a JSON error body
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            _ => {
                tracing::error!("Request failed: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string())
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Parse a guid from a path segment, rejecting malformed input as a 400
pub(crate) fn parse_path_guid(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError(Error::Validation(format!("Invalid {} id: {}", what, raw))))
}

/// Parse an optional media type filter, rejecting unknown types as a 400
pub(crate) fn parse_type_filter(raw: Option<&str>) -> Result<Option<MediaType>, ApiError> {
    match raw {
        Some(s) => Ok(Some(s.parse::<MediaType>().map_err(ApiError::from)?)),
        None => Ok(None),
    }
}
