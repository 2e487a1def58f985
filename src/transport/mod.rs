//! Duplex streaming session abstraction.
//!
//! The remote model service is an external collaborator: this module defines
//! the contract the session manager consumes (connect, fire-and-forget send,
//! idempotent close, an event stream for everything the server pushes back)
//! plus one concrete WebSocket adapter. Tests substitute their own mock
//! transports behind the same traits.

pub mod messages;
pub mod websocket;

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::pcm::AudioBlob;

pub use messages::{AudioPayload, ServerMessage};
pub use websocket::WebSocketTransport;

/// Session configuration passed through to the remote endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    pub model: String,
    /// Request spoken audio responses from the model
    pub response_audio: bool,
    pub transcribe_input: bool,
    pub transcribe_output: bool,
    /// Behavioral instruction forwarded verbatim; opaque to this crate
    pub system_instruction: Option<String>,
}

impl LiveConfig {
    /// Full conversation: model audio plus transcription of both directions.
    pub fn conversation(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            response_audio: true,
            transcribe_input: true,
            transcribe_output: true,
            system_instruction: None,
        }
    }

    /// Input transcription only, no synthesized audio.
    pub fn transcription_only(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            response_audio: false,
            transcribe_input: true,
            transcribe_output: false,
            system_instruction: None,
        }
    }

    pub fn with_system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = Some(text.into());
        self
    }
}

/// Events delivered by an active session, in arrival order.
#[derive(Debug)]
pub enum ServerEvent {
    /// Handshake completed; the session now accepts realtime input
    Open,
    Message(ServerMessage),
    Error(String),
    Closed { reason: Option<String> },
}

/// Handle to an open session. Send is fire-and-forget; close is idempotent.
#[async_trait::async_trait]
pub trait LiveHandle: Send + Sync {
    async fn send(&self, blob: AudioBlob) -> Result<()>;
    async fn close(&self) -> Result<()>;
}

/// Connects duplex sessions to the remote model service.
#[async_trait::async_trait]
pub trait LiveTransport: Send + Sync {
    async fn connect(
        &self,
        config: &LiveConfig,
    ) -> Result<(Arc<dyn LiveHandle>, mpsc::Receiver<ServerEvent>)>;
}
