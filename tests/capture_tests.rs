// Integration tests for the capture side: WAV backend framing and the
// frame → encoded blob pipeline.

use std::path::PathBuf;

use anyhow::Result;
use colloquy::capture::{CaptureBackend, CaptureConfig, CapturePipeline, WavFileBackend};
use colloquy::pcm::decode_base64;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Write a mono 16-bit WAV file with the given samples.
fn write_wav(dir: &TempDir, name: &str, sample_rate: u32, samples: &[i16]) -> Result<PathBuf> {
    let path = dir.path().join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(&path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(path)
}

#[tokio::test]
async fn test_wav_backend_emits_fixed_size_frames() -> Result<()> {
    let dir = TempDir::new()?;
    let samples: Vec<i16> = (0..10_000).map(|i| (i % 100) as i16).collect();
    let path = write_wav(&dir, "input.wav", 16_000, &samples)?;

    let mut backend = WavFileBackend::new(path, CaptureConfig::default());
    let mut frames = backend.start().await?;

    let mut sizes = Vec::new();
    while let Some(frame) = frames.recv().await {
        sizes.push(frame.len());
    }

    // 10000 samples at 4096 per frame: two full frames plus the tail
    assert_eq!(sizes, vec![4096, 4096, 1808]);
    backend.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_wav_backend_rejects_format_mismatch() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(&dir, "hifi.wav", 44_100, &[0i16; 512])?;

    let mut backend = WavFileBackend::new(path, CaptureConfig::default());
    assert!(backend.start().await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_stop_halts_frame_production() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(&dir, "long.wav", 16_000, &vec![0i16; 4096 * 50])?;

    let mut backend = WavFileBackend::new(path, CaptureConfig::default());
    let mut frames = backend.start().await?;

    let first = frames.recv().await;
    assert!(first.is_some());

    backend.stop().await?;
    assert!(!backend.is_capturing());

    // Frames already buffered may drain, but the channel must close: the
    // producer is gone and nothing new arrives after stop() returned.
    let mut drained = 0;
    while frames.recv().await.is_some() {
        drained += 1;
        assert!(drained <= 64, "producer kept running after stop");
    }

    Ok(())
}

#[tokio::test]
async fn test_pipeline_encodes_frames_in_capture_order() -> Result<()> {
    let dir = TempDir::new()?;
    // Two full frames with distinct content: zeros then a constant
    let mut samples = vec![0i16; 4096];
    samples.extend(vec![16_384i16; 4096]);
    let path = write_wav(&dir, "two-frames.wav", 16_000, &samples)?;

    let config = CaptureConfig::default();
    let backend = WavFileBackend::new(path, config.clone());
    let mut pipeline = CapturePipeline::new(Box::new(backend), config);

    let (blob_tx, mut blob_rx) = mpsc::channel(8);
    pipeline.start(blob_tx).await?;

    let first = blob_rx.recv().await.expect("first blob");
    let second = blob_rx.recv().await.expect("second blob");
    assert!(blob_rx.recv().await.is_none());

    pipeline.stop().await?;

    // Each 4096-sample frame decodes to 8192 bytes of PCM
    let first_bytes = decode_base64(&first.data)?;
    let second_bytes = decode_base64(&second.data)?;
    assert_eq!(first_bytes.len(), 8192);
    assert_eq!(second_bytes.len(), 8192);

    // Order is preserved: silence first, then the constant frame
    assert!(first_bytes.iter().all(|&b| b == 0));
    assert_eq!(
        i16::from_le_bytes([second_bytes[0], second_bytes[1]]),
        16_384
    );

    assert_eq!(first.mime_type, "audio/pcm;rate=16000");
    Ok(())
}

#[test]
fn test_capture_config_default() {
    let config = CaptureConfig::default();

    assert_eq!(config.sample_rate, 16_000, "endpoint expects 16kHz input");
    assert_eq!(config.channels, 1, "mono capture");
    assert_eq!(config.frame_size, 4096, "samples per callback frame");
}
