use std::fmt;

/// Errors raised while acquiring or driving the capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The platform offers no audio capture primitive at all
    Unsupported,
    /// The user (or OS policy) denied access to the microphone
    PermissionDenied,
    /// No capture device is present
    DeviceNotFound,
    /// Anything else (backend-specific failures)
    Other(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Unsupported => write!(f, "Audio capture is not supported on this system."),
            CaptureError::PermissionDenied => write!(f, "Microphone permission denied."),
            CaptureError::DeviceNotFound => write!(f, "No microphone found."),
            CaptureError::Other(msg) => write!(f, "Could not start audio capture: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Session-fatal errors surfaced on the controller's `error` field.
///
/// Every variant renders as a human-readable message; none of them crash the
/// event loop. Decode errors on individual chunks are deliberately absent
/// here: those are logged and skipped without ending the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    CaptureUnsupported,
    MicrophonePermissionDenied,
    MicrophoneNotFound,
    /// Capture failed for a backend-specific reason
    Capture(String),
    /// The audio output device could not be opened
    AudioOutputUnavailable(String),
    /// Connecting to the live endpoint failed
    Connect(String),
    /// The streaming session reported an error after connecting
    Remote(String),
    /// The remote side closed the session before the handshake completed
    ClosedBeforeOpen,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::CaptureUnsupported => {
                write!(f, "Audio capture is not supported on this system.")
            }
            SessionError::MicrophonePermissionDenied => write!(f, "Microphone permission denied."),
            SessionError::MicrophoneNotFound => write!(f, "No microphone found."),
            SessionError::Capture(msg) => write!(f, "Could not start audio capture: {}", msg),
            SessionError::AudioOutputUnavailable(msg) => {
                write!(f, "Audio output unavailable: {}", msg)
            }
            SessionError::Connect(msg) => write!(f, "Could not start listening: {}", msg),
            SessionError::Remote(msg) => write!(f, "An API error occurred: {}", msg),
            SessionError::ClosedBeforeOpen => {
                write!(f, "The live session closed before it was established.")
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<CaptureError> for SessionError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Unsupported => SessionError::CaptureUnsupported,
            CaptureError::PermissionDenied => SessionError::MicrophonePermissionDenied,
            CaptureError::DeviceNotFound => SessionError::MicrophoneNotFound,
            CaptureError::Other(msg) => SessionError::Capture(msg),
        }
    }
}
