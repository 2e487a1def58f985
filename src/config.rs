use anyhow::Result;
use serde::Deserialize;

use crate::capture::CaptureConfig;
use crate::session::SessionConfig;
use crate::transport::LiveConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioSettings,
    pub live: LiveSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct AudioSettings {
    pub capture_sample_rate: u32,
    pub frame_size: usize,
    pub playback_sample_rate: u32,
}

#[derive(Debug, Deserialize)]
pub struct LiveSettings {
    /// WebSocket URL of the live endpoint, including auth query parameters
    pub url: String,
    pub model: String,
    #[serde(default)]
    pub system_instruction: Option<String>,
    #[serde(default = "default_true")]
    pub transcribe_input: bool,
    #[serde(default = "default_true")]
    pub transcribe_output: bool,
    #[serde(default = "default_true")]
    pub response_audio: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Session configuration derived from the loaded settings.
    pub fn session_config(&self) -> SessionConfig {
        let live = LiveConfig {
            model: self.live.model.clone(),
            response_audio: self.live.response_audio,
            transcribe_input: self.live.transcribe_input,
            transcribe_output: self.live.transcribe_output,
            system_instruction: self.live.system_instruction.clone(),
        };

        SessionConfig {
            session_id: format!("conversation-{}", uuid::Uuid::new_v4()),
            capture: CaptureConfig {
                sample_rate: self.audio.capture_sample_rate,
                channels: 1,
                frame_size: self.audio.frame_size,
            },
            playback_sample_rate: self.audio.playback_sample_rate,
            live,
        }
    }
}
