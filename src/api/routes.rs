use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::request_id_middleware;

use super::handlers;
use super::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Feeds
        .route("/feed", get(handlers::get_feed))
        .route("/feed/explore", get(handlers::get_explore_feed))
        .route("/recommendations", get(handlers::get_recommendations))
        // API keys
        .route("/keys", get(handlers::get_keys))
        .route("/keys", post(handlers::add_key))
        .route("/keys/:index", delete(handlers::remove_key))
        // Profile
        .route("/profile", get(handlers::get_profile))
        .route("/profile", put(handlers::update_profile))
        // Watch history
        .route("/history", get(handlers::get_history))
        .route("/history", post(handlers::add_to_history))
        .route("/history/:video_id", delete(handlers::remove_from_history))
        // Watch later
        .route("/watch-later", get(handlers::get_watch_later))
        .route("/watch-later", post(handlers::add_to_watch_later))
        .route(
            "/watch-later/:video_id",
            delete(handlers::remove_from_watch_later),
        )
        // Search history
        .route("/search-history", get(handlers::get_search_history))
        .route("/search-history", delete(handlers::clear_search_history))
        .route(
            "/search-history/:query",
            delete(handlers::remove_from_search_history),
        )
        // Viewing metrics
        .route("/metrics", get(handlers::get_viewing_metrics))
        .route("/metrics", post(handlers::record_watch_segment))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
