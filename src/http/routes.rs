use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Conversation control
        .route("/conversation/start", post(handlers::start_conversation))
        .route("/conversation/stop", post(handlers::stop_conversation))
        // Conversation queries
        .route("/conversation/status", get(handlers::get_status))
        .route("/conversation/transcript", get(handlers::get_transcript))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
