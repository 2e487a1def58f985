//! Converts capture frames into encoded transport blobs.

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::backend::{CaptureBackend, CaptureConfig};
use crate::error::CaptureError;
use crate::pcm::AudioBlob;

/// Owns a capture backend and forwards each frame, encoded, to a sink in
/// capture order. Encoding is O(frame size) and happens off the device
/// callback, on the forwarding task.
pub struct CapturePipeline {
    backend: Box<dyn CaptureBackend>,
    config: CaptureConfig,
    forward_task: Option<JoinHandle<()>>,
}

impl CapturePipeline {
    pub fn new(backend: Box<dyn CaptureBackend>, config: CaptureConfig) -> Self {
        Self {
            backend,
            config,
            forward_task: None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.backend.is_supported()
    }

    pub fn is_capturing(&self) -> bool {
        self.backend.is_capturing()
    }

    /// Acquire the device and start forwarding encoded frames to `sink`.
    pub async fn start(&mut self, sink: mpsc::Sender<AudioBlob>) -> Result<(), CaptureError> {
        let mut frames = self.backend.start().await?;
        let sample_rate = self.config.sample_rate;

        let task = tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                let blob = AudioBlob::from_samples(&frame, sample_rate);
                if sink.send(blob).await.is_err() {
                    // Consumer is gone; the backend will be stopped separately
                    break;
                }
            }
        });
        self.forward_task = Some(task);

        info!("Capture pipeline started ({})", self.backend.name());
        Ok(())
    }

    /// Stop the backend and wait for the forwarder to drain.
    ///
    /// Hard ordering guarantee: once this returns, no further blobs reach the
    /// sink, so nothing can be sent into a session that is being closed.
    pub async fn stop(&mut self) -> Result<()> {
        self.backend.stop().await?;
        if let Some(task) = self.forward_task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Capture forwarder panicked: {}", e);
                }
            }
        }
        Ok(())
    }
}
