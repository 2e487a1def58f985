//! PCM sample conversion and transport encoding.
//!
//! The live endpoint consumes 16-bit little-endian PCM wrapped in base64;
//! capture and playback work in normalized f32 samples. Everything here is
//! pure and deterministic: a float/pcm16 round trip is exact to within one
//! quantization step (1/32768) per sample.

use anyhow::{bail, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Sample rate the live endpoint accepts for realtime input.
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;
/// Sample rate of the audio the live endpoint sends back.
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// Transport unit sent to the live endpoint: base64 PCM plus its mime type.
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioBlob {
    pub data: String,
    pub mime_type: String,
}

impl AudioBlob {
    /// Encode one capture frame as a transport blob.
    pub fn from_samples(samples: &[f32], sample_rate: u32) -> Self {
        let bytes = float_to_pcm16(samples);
        Self {
            data: encode_base64(&bytes),
            mime_type: format!("audio/pcm;rate={}", sample_rate),
        }
    }
}

/// Convert normalized samples to 16-bit little-endian PCM.
///
/// The cast saturates, so out-of-range input clips instead of wrapping.
pub fn float_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample * 32768.0) as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Inverse of [`float_to_pcm16`]. Errors on a truncated (odd-length) buffer.
pub fn pcm16_to_float(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 2 != 0 {
        bail!("truncated PCM buffer: {} bytes", bytes.len());
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect())
}

/// Standard base64 with padding, matching what the endpoint expects.
pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    Ok(base64::engine::general_purpose::STANDARD.decode(data)?)
}
