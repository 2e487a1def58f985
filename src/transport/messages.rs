//! Wire message shapes for the live endpoint.

use serde::{Deserialize, Serialize};

use super::LiveConfig;
use crate::pcm::{AudioBlob, PLAYBACK_SAMPLE_RATE};

// ============================================================================
// Client → server
// ============================================================================

/// Handshake sent once, immediately after the socket opens.
#[derive(Debug, Serialize)]
pub struct SetupMessage {
    pub setup: Setup,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<EmptyConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_transcription: Option<EmptyConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

/// Presence of the field is the flag; the object carries nothing.
#[derive(Debug, Default, Serialize)]
pub struct EmptyConfig {}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
pub struct TextPart {
    pub text: String,
}

impl SetupMessage {
    pub fn from_config(config: &LiveConfig) -> Self {
        Self {
            setup: Setup {
                model: config.model.clone(),
                generation_config: config.response_audio.then(|| GenerationConfig {
                    response_modalities: vec!["AUDIO".to_string()],
                }),
                input_audio_transcription: config.transcribe_input.then(EmptyConfig::default),
                output_audio_transcription: config.transcribe_output.then(EmptyConfig::default),
                system_instruction: config.system_instruction.as_ref().map(|text| Content {
                    parts: vec![TextPart { text: text.clone() }],
                }),
            },
        }
    }
}

/// One captured audio blob forwarded as realtime input.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInputMessage {
    pub realtime_input: RealtimeInput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    pub media_chunks: Vec<AudioBlob>,
}

impl RealtimeInputMessage {
    pub fn new(blob: AudioBlob) -> Self {
        Self {
            realtime_input: RealtimeInput {
                media_chunks: vec![blob],
            },
        }
    }
}

// ============================================================================
// Server → client
// ============================================================================

/// Raw server frame. Every field is optional; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerFrame {
    pub setup_complete: Option<SetupComplete>,
    pub server_content: Option<ServerContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetupComplete {}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    pub model_turn: Option<ModelTurn>,
    pub input_transcription: Option<Transcription>,
    pub output_transcription: Option<Transcription>,
    #[serde(default)]
    pub turn_complete: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelTurn {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub data: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Transcription {
    pub text: String,
}

/// What the session manager dispatches on: a server frame flattened to the
/// payloads the pipeline consumes. A single frame may carry any combination.
#[derive(Debug, Clone, Default)]
pub struct ServerMessage {
    pub audio: Option<AudioPayload>,
    pub input_transcription: Option<String>,
    pub output_transcription: Option<String>,
    pub turn_complete: bool,
}

/// Base64 PCM bytes plus the format advertised in the mime type.
#[derive(Debug, Clone)]
pub struct AudioPayload {
    pub data: String,
    pub sample_rate: u32,
    pub channels: u16,
}

impl ServerFrame {
    pub fn into_message(self) -> ServerMessage {
        let mut message = ServerMessage::default();

        if let Some(content) = self.server_content {
            if let Some(turn) = content.model_turn {
                // The endpoint sends one inline audio part per frame
                if let Some(inline) = turn.parts.into_iter().find_map(|p| p.inline_data) {
                    let sample_rate =
                        parse_pcm_rate(&inline.mime_type).unwrap_or(PLAYBACK_SAMPLE_RATE);
                    message.audio = Some(AudioPayload {
                        data: inline.data,
                        sample_rate,
                        channels: 1,
                    });
                }
            }
            message.input_transcription = content.input_transcription.map(|t| t.text);
            message.output_transcription = content.output_transcription.map(|t| t.text);
            message.turn_complete = content.turn_complete;
        }

        message
    }
}

/// Extract the rate from a mime type like `audio/pcm;rate=24000`.
pub fn parse_pcm_rate(mime_type: &str) -> Option<u32> {
    mime_type
        .split(';')
        .find_map(|part| part.trim().strip_prefix("rate="))
        .and_then(|rate| rate.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_message_field_names() {
        let config = LiveConfig::conversation("test-model")
            .with_system_instruction("You are a friendly AI assistant.");
        let json = serde_json::to_value(SetupMessage::from_config(&config)).unwrap();

        assert_eq!(json["setup"]["model"], "test-model");
        assert_eq!(
            json["setup"]["generationConfig"]["responseModalities"][0],
            "AUDIO"
        );
        assert!(json["setup"]["inputAudioTranscription"].is_object());
        assert!(json["setup"]["outputAudioTranscription"].is_object());
        assert_eq!(
            json["setup"]["systemInstruction"]["parts"][0]["text"],
            "You are a friendly AI assistant."
        );
    }

    #[test]
    fn test_transcription_only_omits_modalities() {
        let config = LiveConfig::transcription_only("test-model");
        let json = serde_json::to_value(SetupMessage::from_config(&config)).unwrap();

        assert!(json["setup"].get("generationConfig").is_none());
        assert!(json["setup"].get("outputAudioTranscription").is_none());
        assert!(json["setup"]["inputAudioTranscription"].is_object());
    }

    #[test]
    fn test_server_frame_flattening() {
        let frame: ServerFrame = serde_json::from_str(
            r#"{
                "serverContent": {
                    "modelTurn": {
                        "parts": [{"inlineData": {"data": "AAAA", "mimeType": "audio/pcm;rate=24000"}}]
                    },
                    "inputTranscription": {"text": "hello"},
                    "outputTranscription": {"text": "hi there"},
                    "turnComplete": true
                }
            }"#,
        )
        .unwrap();

        let message = frame.into_message();
        let audio = message.audio.unwrap();
        assert_eq!(audio.data, "AAAA");
        assert_eq!(audio.sample_rate, 24_000);
        assert_eq!(message.input_transcription.as_deref(), Some("hello"));
        assert_eq!(message.output_transcription.as_deref(), Some("hi there"));
        assert!(message.turn_complete);
    }

    #[test]
    fn test_parse_pcm_rate() {
        assert_eq!(parse_pcm_rate("audio/pcm;rate=16000"), Some(16_000));
        assert_eq!(parse_pcm_rate("audio/pcm; rate=24000"), Some(24_000));
        assert_eq!(parse_pcm_rate("audio/pcm"), None);
    }

    #[test]
    fn test_realtime_input_shape() {
        let blob = AudioBlob {
            data: "UFBQ".to_string(),
            mime_type: "audio/pcm;rate=16000".to_string(),
        };
        let json = serde_json::to_value(RealtimeInputMessage::new(blob)).unwrap();
        assert_eq!(json["realtimeInput"]["mediaChunks"][0]["data"], "UFBQ");
        assert_eq!(
            json["realtimeInput"]["mediaChunks"][0]["mimeType"],
            "audio/pcm;rate=16000"
        );
    }
}
