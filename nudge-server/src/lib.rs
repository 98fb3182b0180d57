//! nudge-server library - MediaNudge service

use axum::Router;
use sqlx::SqlitePool;

pub mod api;
pub mod db;
pub mod recommend;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Whether requests must carry a valid identity header
    pub auth_required: bool,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, auth_required: bool) -> Self {
        Self { db, auth_required }
    }
}

/// Build application router
///
/// Identity-scoped routes resolve the requesting user through the
/// identity middleware; public routes do not.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post};
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;

    // Routes acting on behalf of the requesting user
    let identified = Router::new()
        .route("/api/auth/user", get(api::users::current_user))
        .route(
            "/api/guiding-questions",
            get(api::questions::list_questions).post(api::questions::create_question),
        )
        .route(
            "/api/guiding-questions/:id",
            delete(api::questions::delete_question),
        )
        .route(
            "/api/user/media-ratings",
            get(api::ratings::list_user_ratings).post(api::ratings::submit_rating),
        )
        .route("/api/user/follow", post(api::social::follow))
        .route("/api/user/unfollow", post(api::social::unfollow))
        .route("/api/user/followers", get(api::social::followers))
        .route("/api/user/following", get(api::social::following))
        .route("/api/user/activity", get(api::social::recent_activity))
        .route("/api/user/yearly-goal/:year", get(api::goals::get_goal))
        .route("/api/user/yearly-goal", post(api::goals::upsert_goal))
        .route(
            "/api/user/content",
            get(api::content::list_content).post(api::content::create_content),
        )
        .route(
            "/api/user/challenge-progress/:challenge_id",
            get(api::challenges::get_progress),
        )
        .route(
            "/api/user/challenge-progress",
            post(api::challenges::update_progress),
        )
        .route(
            "/api/recommendations",
            get(api::recommendations::get_recommendations),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::identify_user,
        ));

    // Public routes (no identity required)
    let public = Router::new()
        .route(
            "/api/media",
            get(api::media::list_media).post(api::media::create_media),
        )
        .route("/api/media/search", get(api::media::search_media))
        .route(
            "/api/media/:id",
            get(api::media::get_media).delete(api::media::delete_media),
        )
        .route("/api/users", post(api::users::upsert_user))
        .route("/api/profile/:user_id", get(api::users::profile))
        .route("/api/top-users", get(api::users::top_users))
        .route(
            "/api/weekly-challenge",
            get(api::challenges::active_challenge),
        )
        .merge(api::health::health_routes());

    Router::new()
        .merge(identified)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
