//! WAV file capture backend, for deterministic input in tests and batch runs.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use hound::WavReader;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::backend::{CaptureBackend, CaptureConfig, CaptureFrame};
use crate::error::CaptureError;

pub struct WavFileBackend {
    path: PathBuf,
    config: CaptureConfig,
    capturing: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl WavFileBackend {
    pub fn new(path: PathBuf, config: CaptureConfig) -> Self {
        Self {
            path,
            config,
            capturing: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for WavFileBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureFrame>, CaptureError> {
        if self.is_capturing() {
            return Err(CaptureError::Other("already capturing".to_string()));
        }

        let reader = WavReader::open(&self.path)
            .map_err(|e| CaptureError::Other(format!("failed to open WAV file: {}", e)))?;
        let spec = reader.spec();

        if spec.sample_rate != self.config.sample_rate || spec.channels != self.config.channels {
            return Err(CaptureError::Other(format!(
                "expected {}Hz {}ch, got {}Hz {}ch",
                self.config.sample_rate, self.config.channels, spec.sample_rate, spec.channels
            )));
        }

        let samples: Vec<f32> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CaptureError::Other(format!("failed to read samples: {}", e)))?
            .into_iter()
            .map(|s| s as f32 / 32768.0)
            .collect();

        info!(
            "WAV capture started: {} ({} samples)",
            self.path.display(),
            samples.len()
        );

        let (frame_tx, frame_rx) = mpsc::channel(32);
        let frame_size = self.config.frame_size;
        self.capturing.store(true, Ordering::SeqCst);
        let capturing = self.capturing.clone();

        // The bounded channel paces emission; there is no realtime clock here.
        let task = tokio::spawn(async move {
            for chunk in samples.chunks(frame_size) {
                if !capturing.load(Ordering::SeqCst) {
                    break;
                }
                if frame_tx.send(chunk.to_vec()).await.is_err() {
                    break;
                }
            }
            capturing.store(false, Ordering::SeqCst);
        });
        self.task = Some(task);

        Ok(frame_rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.capturing.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn is_supported(&self) -> bool {
        self.path.exists()
    }

    fn name(&self) -> &str {
        "wav file"
    }
}
