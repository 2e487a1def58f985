//! cpal microphone backend.
//!
//! The cpal stream is not `Send`, so it lives on a dedicated thread for the
//! whole capture. The device callback only converts to mono f32 and hands
//! whole frames off with `try_send`; it never blocks or allocates per sample.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use super::backend::{CaptureBackend, CaptureConfig, CaptureFrame};
use crate::error::CaptureError;

/// True when the host exposes a default input device.
pub fn microphone_supported() -> bool {
    cpal::default_host().default_input_device().is_some()
}

pub struct MicrophoneBackend {
    config: CaptureConfig,
    active: Arc<AtomicBool>,
    stop_tx: Option<std::sync::mpsc::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl MicrophoneBackend {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            active: Arc::new(AtomicBool::new(false)),
            stop_tx: None,
            thread: None,
        }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureFrame>, CaptureError> {
        if self.is_capturing() {
            return Err(CaptureError::Other("already capturing".to_string()));
        }

        let (frame_tx, frame_rx) = mpsc::channel(32);
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std::sync::mpsc::channel();

        self.active.store(true, Ordering::SeqCst);
        let active = self.active.clone();
        let config = self.config.clone();

        let thread = std::thread::spawn(move || {
            capture_thread(config, frame_tx, ready_tx, stop_rx, active);
        });

        match ready_rx.await {
            Ok(Ok(())) => {
                self.stop_tx = Some(stop_tx);
                self.thread = Some(thread);
                info!("Microphone capture started");
                Ok(frame_rx)
            }
            Ok(Err(e)) => {
                self.active.store(false, Ordering::SeqCst);
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                self.active.store(false, Ordering::SeqCst);
                Err(CaptureError::Other(
                    "capture thread exited during startup".to_string(),
                ))
            }
        }
    }

    async fn stop(&mut self) -> Result<()> {
        self.active.store(false, Ordering::SeqCst);

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(thread) = self.thread.take() {
            tokio::task::spawn_blocking(move || {
                if thread.join().is_err() {
                    warn!("Capture thread panicked");
                }
            })
            .await
            .context("Failed to join capture thread")?;
        }

        info!("Microphone capture stopped");
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn is_supported(&self) -> bool {
        microphone_supported()
    }

    fn name(&self) -> &str {
        "microphone (cpal)"
    }
}

/// Owns the cpal stream until a stop signal arrives.
fn capture_thread(
    config: CaptureConfig,
    frame_tx: mpsc::Sender<CaptureFrame>,
    ready_tx: oneshot::Sender<Result<(), CaptureError>>,
    stop_rx: std::sync::mpsc::Receiver<()>,
    active: Arc<AtomicBool>,
) {
    let host = cpal::default_host();
    let device = match host.default_input_device() {
        Some(device) => device,
        None => {
            let _ = ready_tx.send(Err(CaptureError::DeviceNotFound));
            return;
        }
    };

    let device_config = match device.default_input_config() {
        Ok(config) => config,
        Err(e) => {
            let _ = ready_tx.send(Err(CaptureError::Other(format!(
                "failed to query input config: {}",
                e
            ))));
            return;
        }
    };

    let device_rate = device_config.sample_rate().0;
    let channels = device_config.channels() as usize;

    info!(
        "Input device: {} ({}Hz, {} channels, {:?})",
        device.name().unwrap_or_default(),
        device_rate,
        channels,
        device_config.sample_format()
    );

    if device_rate % config.sample_rate != 0 {
        warn!(
            "Device rate {} is not a multiple of {}; decimation will drift",
            device_rate, config.sample_rate
        );
    }

    // Decimate by taking every Nth sample, mirroring the downsampling used
    // for file input. No upsampling: a slower device passes through as-is.
    let ratio = ((device_rate / config.sample_rate).max(1)) as usize;
    let raw_frame = config.frame_size * ratio;
    let mut accumulator: Vec<f32> = Vec::with_capacity(raw_frame * 2);

    let emit = move |accumulator: &mut Vec<f32>| {
        while accumulator.len() >= raw_frame {
            let raw: Vec<f32> = accumulator.drain(..raw_frame).collect();
            let frame: CaptureFrame = raw.into_iter().step_by(ratio).collect();
            if frame_tx.try_send(frame).is_err() {
                warn!("Dropping capture frame: consumer not keeping up");
            }
        }
    };

    let callback_active = active.clone();
    let err_fn = |e| warn!("Input stream error: {}", e);

    let stream = match device_config.sample_format() {
        SampleFormat::F32 => device.build_input_stream(
            &device_config.clone().into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if !callback_active.load(Ordering::Relaxed) {
                    return;
                }
                for frame in data.chunks(channels) {
                    accumulator.push(frame[0]);
                }
                emit(&mut accumulator);
            },
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &device_config.clone().into(),
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if !callback_active.load(Ordering::Relaxed) {
                    return;
                }
                for frame in data.chunks(channels) {
                    accumulator.push(frame[0] as f32 / 32768.0);
                }
                emit(&mut accumulator);
            },
            err_fn,
            None,
        ),
        format => {
            let _ = ready_tx.send(Err(CaptureError::Other(format!(
                "unsupported sample format: {:?}",
                format
            ))));
            return;
        }
    };

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(map_build_error(e)));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(CaptureError::Other(format!(
            "failed to start input stream: {}",
            e
        ))));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    // Block until stop; dropping the stream releases the device and the
    // frame sender, which ends the consumer's receive loop.
    let _ = stop_rx.recv();
    drop(stream);
}

fn map_build_error(e: cpal::BuildStreamError) -> CaptureError {
    match e {
        // Denied microphones surface as unavailable devices on most hosts
        cpal::BuildStreamError::DeviceNotAvailable => CaptureError::PermissionDenied,
        other => CaptureError::Other(other.to_string()),
    }
}
