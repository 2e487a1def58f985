// Unit tests for the PCM codec
//
// These verify the round-trip properties the streaming pipeline relies on:
// float/pcm16 conversion exact to one quantization step, and lossless
// base64 transport encoding.

use colloquy::pcm::{
    decode_base64, encode_base64, float_to_pcm16, pcm16_to_float, AudioBlob, CAPTURE_SAMPLE_RATE,
};

/// Deterministic pseudo-random samples in [-1, 1].
fn generated_samples(count: usize) -> Vec<f32> {
    let mut state: u32 = 0x2545_f491;
    (0..count)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state as f64 / u32::MAX as f64 * 2.0 - 1.0) as f32
        })
        .collect()
}

#[test]
fn test_round_trip_within_one_quantization_step() {
    let mut samples = generated_samples(1000);
    samples.extend_from_slice(&[-1.0, -0.5, 0.0, 0.5, 1.0]);

    let decoded = pcm16_to_float(&float_to_pcm16(&samples)).unwrap();

    assert_eq!(decoded.len(), samples.len());
    for (original, round_tripped) in samples.iter().zip(&decoded) {
        assert!(
            (original - round_tripped).abs() <= 1.0 / 32768.0 + f32::EPSILON,
            "sample {} round-tripped to {}",
            original,
            round_tripped
        );
    }
}

#[test]
fn test_known_sample_values() {
    let bytes = float_to_pcm16(&[0.5]);
    assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), 16384);

    let decoded = pcm16_to_float(&[0x00, 0x40]).unwrap();
    assert!((decoded[0] - 0.5).abs() < f32::EPSILON);
}

#[test]
fn test_little_endian_byte_order() {
    // -2 as i16 is 0xFFFE: low byte first on the wire
    let bytes = float_to_pcm16(&[-2.0 / 32768.0]);
    assert_eq!(bytes, vec![0xFE, 0xFF]);
}

#[test]
fn test_base64_round_trip() {
    let bytes: Vec<u8> = (0..=255).cycle().take(1024).collect();
    assert_eq!(decode_base64(&encode_base64(&bytes)).unwrap(), bytes);

    // Empty input round-trips too
    assert_eq!(decode_base64(&encode_base64(&[])).unwrap(), Vec::<u8>::new());
}

#[test]
fn test_base64_uses_standard_alphabet_with_padding() {
    assert_eq!(encode_base64(&[0xFB, 0xEF, 0xBE]), "++++");
    assert_eq!(encode_base64(&[0xFF]), "/w==");
}

#[test]
fn test_invalid_base64_is_an_error() {
    assert!(decode_base64("not valid base64!!!").is_err());
}

#[test]
fn test_silent_frame_encodes_to_expected_size() {
    // A 4096-sample frame is 8192 bytes of 16-bit PCM
    let blob = AudioBlob::from_samples(&vec![0.0; 4096], CAPTURE_SAMPLE_RATE);
    let decoded = decode_base64(&blob.data).unwrap();

    assert_eq!(decoded.len(), 8192);
    assert!(decoded.iter().all(|&b| b == 0));
    assert_eq!(blob.mime_type, "audio/pcm;rate=16000");
}
