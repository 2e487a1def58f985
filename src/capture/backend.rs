use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::error::CaptureError;

/// A block of floating-point samples in [-1, 1] from the capture device.
pub type CaptureFrame = Vec<f32>;

/// Configuration for a capture backend
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target sample rate (the live endpoint expects 16kHz)
    pub sample_rate: u32,
    /// Target channel count (1 = mono)
    pub channels: u16,
    /// Samples per emitted frame
    pub frame_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // 16kHz mono is what the endpoint accepts
            channels: 1,
            frame_size: 4096,
        }
    }
}

/// Audio capture backend trait
///
/// Implementations:
/// - Microphone: cpal input stream (all platforms)
/// - WavFile: read frames from a WAV file (testing/batch processing)
#[async_trait::async_trait]
pub trait CaptureBackend: Send {
    /// Acquire the device exclusively and start producing frames.
    ///
    /// Returns a channel receiver that will receive capture frames. Device
    /// callbacks must never block; a stalled consumer drops frames instead.
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureFrame>, CaptureError>;

    /// Release the device. After this returns no further frames are produced.
    async fn stop(&mut self) -> Result<()>;

    /// Check if the backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// True when the platform can actually provide this capture source
    fn is_supported(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Capture source type
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// Default microphone (all platforms)
    Microphone,
    /// WAV file input (for testing/batch processing)
    WavFile(PathBuf),
}

/// Capture backend factory
pub struct CaptureBackendFactory;

impl CaptureBackendFactory {
    pub fn create(
        source: CaptureSource,
        config: CaptureConfig,
    ) -> Result<Box<dyn CaptureBackend>, CaptureError> {
        match source {
            CaptureSource::Microphone => {
                let backend = super::microphone::MicrophoneBackend::new(config);
                Ok(Box::new(backend))
            }
            CaptureSource::WavFile(path) => {
                let backend = super::wav::WavFileBackend::new(path, config);
                Ok(Box::new(backend))
            }
        }
    }
}
