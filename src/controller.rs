//! UI-facing conversation surface.

use std::sync::Arc;

use crate::capture::CapturePipeline;
use crate::error::SessionError;
use crate::playback::PlaybackScheduler;
use crate::session::{LiveSessionManager, SessionConfig, SessionState};
use crate::transcript::ConversationTurn;
use crate::transport::LiveTransport;

/// Public start/stop API over a live session, with read-only projections of
/// the session and transcript state. Everything here is a snapshot; the
/// manager owns the live resources.
pub struct ConversationController {
    manager: LiveSessionManager,
}

impl ConversationController {
    pub fn new(
        config: SessionConfig,
        transport: Arc<dyn LiveTransport>,
        capture: CapturePipeline,
        scheduler: PlaybackScheduler,
    ) -> Self {
        Self {
            manager: LiveSessionManager::new(config, transport, capture, scheduler),
        }
    }

    pub async fn start(&self) -> Result<(), SessionError> {
        self.manager.start().await
    }

    pub async fn stop(&self) {
        self.manager.stop().await
    }

    pub fn is_listening(&self) -> bool {
        self.manager.is_listening()
    }

    /// True iff the platform offers microphone capture.
    pub fn is_supported(&self) -> bool {
        self.manager.is_supported()
    }

    pub fn state(&self) -> SessionState {
        self.manager.state()
    }

    /// Human-readable message for the last session-fatal error, if any.
    pub fn error(&self) -> Option<String> {
        self.manager.error()
    }

    /// Live partial transcript of the current user utterance.
    pub fn user_partial(&self) -> String {
        self.manager.user_partial()
    }

    /// Live partial transcript of the current model response.
    pub fn model_partial(&self) -> String {
        self.manager.model_partial()
    }

    /// Committed turns, oldest first.
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.manager.history()
    }
}
