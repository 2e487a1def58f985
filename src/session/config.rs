use crate::capture::CaptureConfig;
use crate::pcm::PLAYBACK_SAMPLE_RATE;
use crate::transport::LiveConfig;

/// Default model identifier for the live endpoint.
pub const DEFAULT_LIVE_MODEL: &str = "gemini-2.5-flash-native-audio-preview-09-2025";

/// Configuration for a live conversation session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "conversation-<uuid>")
    pub session_id: String,

    /// Capture format: sample rate, channels, frame size
    pub capture: CaptureConfig,

    /// Sample rate of audio returned by the endpoint
    pub playback_sample_rate: u32,

    /// Remote session configuration, passed through to the endpoint
    pub live: LiveConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("conversation-{}", uuid::Uuid::new_v4()),
            capture: CaptureConfig::default(),
            playback_sample_rate: PLAYBACK_SAMPLE_RATE,
            live: LiveConfig::conversation(DEFAULT_LIVE_MODEL),
        }
    }
}
