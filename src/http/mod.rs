//! HTTP API server for external control
//!
//! This module provides a REST API for controlling the live conversation:
//! - POST /conversation/start - Start listening
//! - POST /conversation/stop - Stop and tear down
//! - GET /conversation/status - Query session status
//! - GET /conversation/transcript - Get partial and committed transcripts
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
