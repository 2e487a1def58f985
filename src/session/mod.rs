//! Live session lifecycle management
//!
//! This module provides the `LiveSessionManager` abstraction that manages:
//! - The duplex session lifecycle (open, send, receive, close)
//! - Wiring capture output to the outgoing channel
//! - Dispatching incoming messages to playback and transcript state
//! - Idempotent teardown across every exit path

mod config;
mod manager;
mod state;

pub use config::{SessionConfig, DEFAULT_LIVE_MODEL};
pub use manager::LiveSessionManager;
pub use state::SessionState;
