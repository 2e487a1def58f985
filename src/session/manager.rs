use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{SessionConfig, SessionState};
use crate::capture::CapturePipeline;
use crate::error::SessionError;
use crate::pcm::{self, AudioBlob};
use crate::playback::PlaybackScheduler;
use crate::transcript::{Channel, ConversationTurn, TranscriptAggregator};
use crate::transport::{LiveHandle, LiveTransport, ServerEvent, ServerMessage};

/// Owns the duplex session, the capture pipeline and the playback scheduler.
///
/// This is the only component permitted to open or close the microphone, the
/// audio output, or the remote session; everything above it reads snapshots.
pub struct LiveSessionManager {
    config: SessionConfig,
    transport: Arc<dyn LiveTransport>,
    supported: bool,
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<SessionState>,
    error: Mutex<Option<String>>,
    transcript: Mutex<TranscriptAggregator>,
    scheduler: Mutex<PlaybackScheduler>,
    // Async: capture stop awaits the backend and the forwarding task
    capture: AsyncMutex<CapturePipeline>,
    handle: Mutex<Option<Arc<dyn LiveHandle>>>,
    send_task: Mutex<Option<JoinHandle<()>>>,
    dispatch_task: Mutex<Option<JoinHandle<()>>>,
}

impl LiveSessionManager {
    pub fn new(
        config: SessionConfig,
        transport: Arc<dyn LiveTransport>,
        capture: CapturePipeline,
        scheduler: PlaybackScheduler,
    ) -> Self {
        let supported = capture.is_supported();
        Self {
            config,
            transport,
            supported,
            inner: Arc::new(Inner {
                state: Mutex::new(SessionState::Idle),
                error: Mutex::new(None),
                transcript: Mutex::new(TranscriptAggregator::new()),
                scheduler: Mutex::new(scheduler),
                capture: AsyncMutex::new(capture),
                handle: Mutex::new(None),
                send_task: Mutex::new(None),
                dispatch_task: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.lock().unwrap().clone()
    }

    pub fn is_listening(&self) -> bool {
        self.state().is_active()
    }

    /// True when the platform offered a capture device at construction.
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    pub fn error(&self) -> Option<String> {
        self.inner.error.lock().unwrap().clone()
    }

    pub fn user_partial(&self) -> String {
        self.inner.transcript.lock().unwrap().pending_user().to_string()
    }

    pub fn model_partial(&self) -> String {
        self.inner.transcript.lock().unwrap().pending_model().to_string()
    }

    pub fn history(&self) -> Vec<ConversationTurn> {
        self.inner.transcript.lock().unwrap().snapshot_history()
    }

    /// Begin a live conversation.
    ///
    /// No-op unless the previous session reached a terminal state, which also
    /// refuses to acquire hardware while an earlier teardown is in flight.
    pub async fn start(&self) -> Result<(), SessionError> {
        {
            let mut state = self.inner.state.lock().unwrap();
            if !state.can_start() {
                warn!("Session start ignored in state '{}'", state.as_str());
                return Ok(());
            }
            *state = SessionState::Requesting;
        }

        info!("Starting live session: {}", self.config.session_id);
        *self.inner.error.lock().unwrap() = None;
        self.inner.transcript.lock().unwrap().reset(false);
        self.inner.scheduler.lock().unwrap().reset();

        match self.open_session().await {
            Ok(()) => {
                info!("Live session open: {}", self.config.session_id);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                error!("Failed to start live session: {}", message);
                // Partial initialization still releases everything acquired
                Inner::release_local(&self.inner).await;
                *self.inner.error.lock().unwrap() = Some(message.clone());
                *self.inner.state.lock().unwrap() = SessionState::Failed(message);
                Err(e)
            }
        }
    }

    async fn open_session(&self) -> Result<(), SessionError> {
        // Microphone first: a permission failure should surface before any
        // network traffic happens.
        let (blob_tx, mut blob_rx) = mpsc::channel::<AudioBlob>(64);
        self.inner
            .capture
            .lock()
            .await
            .start(blob_tx)
            .await
            .map_err(SessionError::from)?;

        self.inner
            .scheduler
            .lock()
            .unwrap()
            .open()
            .map_err(|e| SessionError::AudioOutputUnavailable(e.to_string()))?;

        let (handle, mut events) = self
            .transport
            .connect(&self.config.live)
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;

        // The session is usable only once the remote side confirms the
        // handshake; anything else before that is a failed start.
        loop {
            match events.recv().await {
                Some(ServerEvent::Open) => break,
                Some(ServerEvent::Message(_)) => {
                    warn!("Ignoring server message before handshake completed");
                }
                Some(ServerEvent::Error(reason)) => {
                    let _ = handle.close().await;
                    return Err(SessionError::Remote(reason));
                }
                Some(ServerEvent::Closed { .. }) | None => {
                    let _ = handle.close().await;
                    return Err(SessionError::ClosedBeforeOpen);
                }
            }
        }

        *self.inner.state.lock().unwrap() = SessionState::Open;
        *self.inner.handle.lock().unwrap() = Some(handle.clone());

        // Outgoing path: one channel end to end keeps capture order.
        let send_task = tokio::spawn(async move {
            while let Some(blob) = blob_rx.recv().await {
                if let Err(e) = handle.send(blob).await {
                    warn!("Failed to send realtime input: {}", e);
                }
            }
        });
        *self.inner.send_task.lock().unwrap() = Some(send_task);

        // Incoming path: dispatch events until the stream ends.
        let inner = self.inner.clone();
        let dispatch_task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    ServerEvent::Open => {}
                    ServerEvent::Message(message) => Inner::dispatch(&inner, message),
                    ServerEvent::Error(reason) => {
                        let message = SessionError::Remote(reason).to_string();
                        error!("{}", message);
                        Inner::teardown(&inner, Some(message)).await;
                        return;
                    }
                    ServerEvent::Closed { reason } => {
                        if let Some(reason) = reason {
                            info!("Live session closed by remote: {}", reason);
                        }
                        Inner::teardown(&inner, None).await;
                        return;
                    }
                }
            }
            // Event stream ended without an explicit close
            Inner::teardown(&inner, None).await;
        });
        *self.inner.dispatch_task.lock().unwrap() = Some(dispatch_task);

        Ok(())
    }

    /// Tear down the session.
    ///
    /// Idempotent; callable from any state. Local hardware is released even
    /// if the remote close never completes.
    pub async fn stop(&self) {
        info!("Stopping live session: {}", self.config.session_id);
        Inner::teardown(&self.inner, None).await;
    }
}

impl Inner {
    /// Route one server message to playback and transcript state.
    fn dispatch(inner: &Arc<Inner>, message: ServerMessage) {
        if let Some(audio) = message.audio {
            match pcm::decode_base64(&audio.data) {
                Ok(bytes) => {
                    let mut scheduler = inner.scheduler.lock().unwrap();
                    if let Err(e) = scheduler.schedule_chunk(&bytes, audio.sample_rate, audio.channels)
                    {
                        // One bad chunk must not end the stream
                        warn!("Skipping malformed audio chunk: {}", e);
                    }
                }
                Err(e) => warn!("Skipping undecodable audio payload: {}", e),
            }
        }

        if let Some(text) = message.input_transcription {
            inner
                .transcript
                .lock()
                .unwrap()
                .append_fragment(Channel::User, &text);
        }
        if let Some(text) = message.output_transcription {
            inner
                .transcript
                .lock()
                .unwrap()
                .append_fragment(Channel::Model, &text);
        }
        if message.turn_complete {
            inner.transcript.lock().unwrap().commit_turn();
        }
    }

    /// Single cleanup funnel for user stop, remote error, remote close and
    /// failed starts. Safe to call from any of them, any number of times.
    async fn teardown(inner: &Arc<Inner>, error: Option<String>) {
        {
            let mut state = inner.state.lock().unwrap();
            match *state {
                SessionState::Idle
                | SessionState::Closing
                | SessionState::Closed
                | SessionState::Failed(_) => return,
                _ => *state = SessionState::Closing,
            }
        }

        // Local hardware goes first and does not wait on the network.
        // Stopping capture before the remote close also guarantees nothing
        // is sent into a session that is going away.
        Inner::release_local(inner).await;
        if let Some(task) = inner.send_task.lock().unwrap().take() {
            task.abort();
        }

        let handle = inner.handle.lock().unwrap().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.close().await {
                warn!("Error closing live session: {}", e);
            }
        }

        // When teardown runs on the dispatch task itself, the abort lands
        // after its final return and does nothing.
        if let Some(task) = inner.dispatch_task.lock().unwrap().take() {
            task.abort();
        }

        let final_state = match error {
            Some(message) => {
                *inner.error.lock().unwrap() = Some(message.clone());
                SessionState::Failed(message)
            }
            None => SessionState::Closed,
        };
        *inner.state.lock().unwrap() = final_state;
        info!("Live session torn down");
    }

    /// Release microphone and audio output. Tolerates partial initialization:
    /// stopping an idle capture pipeline or closing an unopened output is a
    /// no-op.
    async fn release_local(inner: &Arc<Inner>) {
        if let Err(e) = inner.capture.lock().await.stop().await {
            warn!("Error stopping capture: {}", e);
        }

        let mut scheduler = inner.scheduler.lock().unwrap();
        scheduler.reset();
        if let Err(e) = scheduler.close() {
            warn!("Error closing audio output: {}", e);
        }
    }
}
