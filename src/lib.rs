pub mod capture;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod pcm;
pub mod playback;
pub mod session;
pub mod transcript;
pub mod transport;

pub use capture::{
    CaptureBackend, CaptureBackendFactory, CaptureConfig, CapturePipeline, CaptureSource,
    MicrophoneBackend, WavFileBackend,
};
pub use config::Config;
pub use controller::ConversationController;
pub use error::{CaptureError, SessionError};
pub use http::{create_router, AppState};
pub use pcm::AudioBlob;
pub use playback::{AudioOutput, CpalOutput, PlaybackScheduler};
pub use session::{LiveSessionManager, SessionConfig, SessionState};
pub use transcript::{Channel, ConversationTurn, TranscriptAggregator};
pub use transport::{
    LiveConfig, LiveHandle, LiveTransport, ServerEvent, ServerMessage, WebSocketTransport,
};
