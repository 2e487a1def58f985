/// Lifecycle of one live conversation session.
///
/// The state owns the lifetime of every resource below it: microphone,
/// playback output, transport handle. Transitions:
///
/// ```text
/// Idle ──start()──▶ Requesting ──remote open──▶ Open ──stop()/remote──▶ Closing ──▶ Closed
///                        │                                                 ▲
///                        └──device/context/connect error──▶ Failed ────────┘ (via start())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No session yet
    Idle,
    /// Acquiring hardware and opening the remote session
    Requesting,
    /// Duplex session established; audio and events flowing
    Open,
    /// Teardown in progress
    Closing,
    /// Terminal for a normal session; start() re-enters cleanly
    Closed,
    /// Terminal after an error; start() re-enters cleanly
    Failed(String),
}

impl SessionState {
    /// Convert state to string for API responses.
    pub fn as_str(&self) -> &str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Requesting => "requesting",
            SessionState::Open => "open",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
            SessionState::Failed(_) => "failed",
        }
    }

    /// True when a new session may be started from this state.
    pub fn can_start(&self) -> bool {
        matches!(
            self,
            SessionState::Idle | SessionState::Closed | SessionState::Failed(_)
        )
    }

    /// True while the session holds hardware or a live connection.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Requesting | SessionState::Open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_allowed_only_from_terminal_states() {
        assert!(SessionState::Idle.can_start());
        assert!(SessionState::Closed.can_start());
        assert!(SessionState::Failed("x".to_string()).can_start());
        assert!(!SessionState::Requesting.can_start());
        assert!(!SessionState::Open.can_start());
        assert!(!SessionState::Closing.can_start());
    }
}
