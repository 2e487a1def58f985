//! Gapless scheduling of decoded audio chunks.

use anyhow::Result;
use tracing::debug;

use super::output::AudioOutput;
use crate::pcm;

/// Schedules decoded chunks back-to-back on the output clock.
///
/// The timeline pointer, not chunk arrival time, decides where each chunk
/// starts: `start = max(next, now)`, then `next = start + duration`. Chunks
/// arriving in a burst therefore queue seamlessly instead of playing on top
/// of each other, and nothing is ever scheduled into the past. The pointer is
/// owned here and mutated nowhere else.
pub struct PlaybackScheduler {
    output: Box<dyn AudioOutput>,
    sample_rate: u32,
    next_start: f64,
}

impl PlaybackScheduler {
    pub fn new(output: Box<dyn AudioOutput>, sample_rate: u32) -> Self {
        Self {
            output,
            sample_rate,
            next_start: 0.0,
        }
    }

    /// Open the output device.
    pub fn open(&mut self) -> Result<()> {
        self.output.open()
    }

    /// Release the output device.
    pub fn close(&mut self) -> Result<()> {
        self.output.close()
    }

    /// Decode one PCM chunk and schedule it; returns its start time.
    ///
    /// Errors are local to the chunk (truncated buffer, device trouble);
    /// callers skip the chunk and keep the session alive.
    pub fn schedule_chunk(&mut self, bytes: &[u8], sample_rate: u32, channels: u16) -> Result<f64> {
        let samples = pcm::pcm16_to_float(bytes)?;

        let channels = channels.max(1) as usize;
        let frames = samples.len() / channels;
        let mono: Vec<f32> = if channels == 1 {
            samples
        } else {
            samples
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };

        let rate = if sample_rate > 0 {
            sample_rate
        } else {
            self.sample_rate
        };
        let duration = frames as f64 / rate as f64;

        let start = self.next_start.max(self.output.now());
        self.output.play_at(mono, start)?;
        self.next_start = start + duration;

        debug!("Scheduled {:.3}s chunk at t={:.3}", duration, start);
        Ok(start)
    }

    /// Drop the timeline so a new session starts clean.
    pub fn reset(&mut self) {
        self.next_start = 0.0;
    }

    pub fn next_start(&self) -> f64 {
        self.next_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Output double with a manually advanced clock.
    struct FakeOutput {
        now: Arc<Mutex<f64>>,
        scheduled: Arc<Mutex<Vec<(f64, usize)>>>,
    }

    impl AudioOutput for FakeOutput {
        fn open(&mut self) -> Result<()> {
            Ok(())
        }
        fn close(&mut self) -> Result<()> {
            Ok(())
        }
        fn now(&self) -> f64 {
            *self.now.lock().unwrap()
        }
        fn play_at(&mut self, samples: Vec<f32>, start: f64) -> Result<()> {
            self.scheduled.lock().unwrap().push((start, samples.len()));
            Ok(())
        }
    }

    fn scheduler() -> (PlaybackScheduler, Arc<Mutex<f64>>, Arc<Mutex<Vec<(f64, usize)>>>) {
        let now = Arc::new(Mutex::new(0.0));
        let scheduled = Arc::new(Mutex::new(Vec::new()));
        let output = FakeOutput {
            now: now.clone(),
            scheduled: scheduled.clone(),
        };
        (PlaybackScheduler::new(Box::new(output), 24_000), now, scheduled)
    }

    fn silent_chunk(duration_secs: f64) -> Vec<u8> {
        vec![0u8; (duration_secs * 24_000.0) as usize * 2]
    }

    #[test]
    fn test_burst_schedules_back_to_back() {
        let (mut scheduler, _now, scheduled) = scheduler();

        // 0.5s, 0.3s and 0.2s chunks arriving at clock time 0
        scheduler.schedule_chunk(&silent_chunk(0.5), 24_000, 1).unwrap();
        scheduler.schedule_chunk(&silent_chunk(0.3), 24_000, 1).unwrap();
        scheduler.schedule_chunk(&silent_chunk(0.2), 24_000, 1).unwrap();

        let starts: Vec<f64> = scheduled.lock().unwrap().iter().map(|(s, _)| *s).collect();
        assert!((starts[0] - 0.0).abs() < 1e-9);
        assert!((starts[1] - 0.5).abs() < 1e-9);
        assert!((starts[2] - 0.8).abs() < 1e-9);
        assert!((scheduler.next_start() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_timeline_is_monotonic_and_non_overlapping() {
        let (mut scheduler, now, scheduled) = scheduler();

        let durations = [0.1, 0.25, 0.05, 0.4, 0.02];
        for (i, &d) in durations.iter().enumerate() {
            // Jittered arrival: the clock jumps around between chunks
            *now.lock().unwrap() = i as f64 * 0.13;
            scheduler.schedule_chunk(&silent_chunk(d), 24_000, 1).unwrap();
        }

        let intervals: Vec<(f64, f64)> = scheduled
            .lock()
            .unwrap()
            .iter()
            .map(|&(start, len)| (start, start + len as f64 / 24_000.0))
            .collect();

        for pair in intervals.windows(2) {
            assert!(pair[1].0 >= pair[0].0, "starts must be non-decreasing");
            assert!(pair[1].0 >= pair[0].1 - 1e-9, "intervals must not overlap");
        }
    }

    #[test]
    fn test_never_schedules_into_the_past() {
        let (mut scheduler, now, scheduled) = scheduler();

        scheduler.schedule_chunk(&silent_chunk(0.1), 24_000, 1).unwrap();
        // Playback has moved well past the first chunk
        *now.lock().unwrap() = 5.0;
        scheduler.schedule_chunk(&silent_chunk(0.1), 24_000, 1).unwrap();

        assert!((scheduled.lock().unwrap()[1].0 - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_stereo_chunk_duration_uses_frames() {
        let (mut scheduler, _now, scheduled) = scheduler();

        // 0.5s of stereo: twice the bytes of the mono equivalent
        let bytes = vec![0u8; 12_000 * 2 * 2];
        scheduler.schedule_chunk(&bytes, 24_000, 2).unwrap();

        assert_eq!(scheduled.lock().unwrap()[0].1, 12_000);
        assert!((scheduler.next_start() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_reset_clears_timeline() {
        let (mut scheduler, _now, _scheduled) = scheduler();
        scheduler.schedule_chunk(&silent_chunk(0.5), 24_000, 1).unwrap();
        scheduler.reset();
        assert_eq!(scheduler.next_start(), 0.0);
    }

    #[test]
    fn test_truncated_chunk_is_an_error_not_a_panic() {
        let (mut scheduler, _now, scheduled) = scheduler();
        assert!(scheduler.schedule_chunk(&[1, 2, 3], 24_000, 1).is_err());
        assert!(scheduled.lock().unwrap().is_empty());
    }
}
