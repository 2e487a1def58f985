//! Output device abstraction for scheduled playback.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{info, warn};

/// An output clock plus a sink that honors start offsets on that clock.
///
/// `now()` is seconds of audio the device has consumed since `open()`; it is
/// the clock the scheduler's timeline invariant is stated against.
pub trait AudioOutput: Send {
    /// Open the device. Called once per session.
    fn open(&mut self) -> Result<()>;

    /// Release the device and discard anything not yet played.
    fn close(&mut self) -> Result<()>;

    /// Current position of the output clock, in seconds.
    fn now(&self) -> f64;

    /// Queue mono samples to begin playing at `start` seconds on the clock.
    fn play_at(&mut self, samples: Vec<f32>, start: f64) -> Result<()>;
}

/// Queue state shared with the device callback.
#[derive(Default)]
struct OutputQueue {
    queue: VecDeque<f32>,
    /// Samples the device has consumed since open (silence included)
    played: u64,
    /// End of the queued region, in samples since open
    queued_until: u64,
}

/// cpal-backed output. Scheduled buffers land in a shared queue; gaps between
/// the queued region and a requested start offset are padded with silence so
/// the device callback can simply drain in order.
pub struct CpalOutput {
    sample_rate: u32,
    shared: Arc<Mutex<OutputQueue>>,
    stop_tx: Option<std::sync::mpsc::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl CpalOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            shared: Arc::new(Mutex::new(OutputQueue::default())),
            stop_tx: None,
            thread: None,
        }
    }
}

impl AudioOutput for CpalOutput {
    fn open(&mut self) -> Result<()> {
        if self.thread.is_some() {
            return Ok(());
        }

        *self.shared.lock().unwrap() = OutputQueue::default();

        let (ready_tx, ready_rx) = std::sync::mpsc::channel();
        let (stop_tx, stop_rx) = std::sync::mpsc::channel();
        let shared = self.shared.clone();
        let sample_rate = self.sample_rate;

        // The cpal stream is not Send; it lives on its own thread, like the
        // capture side.
        let thread = std::thread::spawn(move || {
            output_thread(sample_rate, shared, ready_tx, stop_rx);
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.stop_tx = Some(stop_tx);
                self.thread = Some(thread);
                info!("Audio output opened ({}Hz)", self.sample_rate);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => Err(anyhow!("output thread exited during startup")),
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Output thread panicked");
            }
            info!("Audio output closed");
        }
        *self.shared.lock().unwrap() = OutputQueue::default();
        Ok(())
    }

    fn now(&self) -> f64 {
        let queue = self.shared.lock().unwrap();
        queue.played as f64 / self.sample_rate as f64
    }

    fn play_at(&mut self, samples: Vec<f32>, start: f64) -> Result<()> {
        let mut queue = self.shared.lock().unwrap();
        let start_sample = (start * self.sample_rate as f64).round() as u64;

        if start_sample > queue.queued_until {
            let gap = (start_sample - queue.queued_until) as usize;
            queue.queue.extend(std::iter::repeat(0.0).take(gap));
            queue.queued_until += gap as u64;
        }

        queue.queued_until += samples.len() as u64;
        queue.queue.extend(samples);
        Ok(())
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn output_thread(
    sample_rate: u32,
    shared: Arc<Mutex<OutputQueue>>,
    ready_tx: std::sync::mpsc::Sender<Result<()>>,
    stop_rx: std::sync::mpsc::Receiver<()>,
) {
    let host = cpal::default_host();
    let device = match host.default_output_device() {
        Some(device) => device,
        None => {
            let _ = ready_tx.send(Err(anyhow!("no audio output device available")));
            return;
        }
    };

    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let callback_shared = shared.clone();
    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let mut queue = callback_shared.lock().unwrap();
            for slot in data.iter_mut() {
                *slot = queue.queue.pop_front().unwrap_or(0.0);
            }
            // The clock advances with the device, silence included
            queue.played += data.len() as u64;
            if queue.queue.is_empty() {
                queue.queued_until = queue.played;
            }
        },
        |e| warn!("Output stream error: {}", e),
        None,
    );

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(anyhow!("failed to build output stream: {}", e)));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(anyhow!("failed to start output stream: {}", e)));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    let _ = stop_rx.recv();
    drop(stream);
}
