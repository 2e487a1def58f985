use super::state::AppState;
use crate::transcript::ConversationTurn;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub state: String,
    pub is_listening: bool,
    pub is_supported: bool,
    pub error: Option<String>,
    pub user_partial: String,
    pub model_partial: String,
    pub turns: usize,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub user_partial: String,
    pub model_partial: String,
    pub history: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /conversation/start
/// Start the live conversation
pub async fn start_conversation(State(state): State<AppState>) -> impl IntoResponse {
    if state.controller.is_listening() {
        return (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "A conversation is already in progress".to_string(),
            }),
        )
            .into_response();
    }

    match state.controller.start().await {
        Ok(()) => {
            info!("Conversation started via HTTP API");
            (
                StatusCode::OK,
                Json(ConversationResponse {
                    status: "listening".to_string(),
                    message: "Conversation started".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to start conversation: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /conversation/stop
/// Stop the live conversation
pub async fn stop_conversation(State(state): State<AppState>) -> impl IntoResponse {
    state.controller.stop().await;
    info!("Conversation stopped via HTTP API");

    (
        StatusCode::OK,
        Json(ConversationResponse {
            status: "stopped".to_string(),
            message: "Conversation stopped".to_string(),
        }),
    )
        .into_response()
}

/// GET /conversation/status
/// Get status of the live conversation
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let controller = &state.controller;

    Json(StatusResponse {
        state: controller.state().as_str().to_string(),
        is_listening: controller.is_listening(),
        is_supported: controller.is_supported(),
        error: controller.error(),
        user_partial: controller.user_partial(),
        model_partial: controller.model_partial(),
        turns: controller.history().len(),
    })
}

/// GET /conversation/transcript
/// Get the transcript accumulated so far (partials plus committed turns)
pub async fn get_transcript(State(state): State<AppState>) -> impl IntoResponse {
    let controller = &state.controller;

    Json(TranscriptResponse {
        user_partial: controller.user_partial(),
        model_partial: controller.model_partial(),
        history: controller.history(),
    })
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
