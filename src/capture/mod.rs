pub mod backend;
pub mod microphone;
pub mod pipeline;
pub mod wav;

pub use backend::{
    CaptureBackend, CaptureBackendFactory, CaptureConfig, CaptureFrame, CaptureSource,
};
pub use microphone::{microphone_supported, MicrophoneBackend};
pub use pipeline::CapturePipeline;
pub use wav::WavFileBackend;
