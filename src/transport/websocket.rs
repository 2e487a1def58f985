//! WebSocket adapter for the live endpoint.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{info, warn};

use super::messages::{RealtimeInputMessage, ServerFrame, SetupMessage};
use super::{LiveConfig, LiveHandle, LiveTransport, ServerEvent};
use crate::pcm::AudioBlob;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Connects to the live endpoint over WebSocket and speaks its JSON framing.
pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    /// `url` must carry any required authentication query parameters.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait::async_trait]
impl LiveTransport for WebSocketTransport {
    async fn connect(
        &self,
        config: &LiveConfig,
    ) -> Result<(Arc<dyn LiveHandle>, mpsc::Receiver<ServerEvent>)> {
        info!("Connecting to live endpoint");

        let (stream, _) = connect_async(self.url.as_str())
            .await
            .context("Failed to connect to live endpoint")?;
        let (mut sink, source) = stream.split();

        let setup = serde_json::to_string(&SetupMessage::from_config(config))?;
        sink.send(Message::Text(setup))
            .await
            .context("Failed to send setup message")?;

        let (event_tx, event_rx) = mpsc::channel(256);
        tokio::spawn(read_loop(source, event_tx));

        let handle = Arc::new(WebSocketHandle {
            sink: Mutex::new(Some(sink)),
        });

        Ok((handle, event_rx))
    }
}

/// Forwards server frames to the session as events. The first frame after
/// setup must acknowledge the handshake before anything else is surfaced.
async fn read_loop(mut source: SplitStream<WsStream>, event_tx: mpsc::Sender<ServerEvent>) {
    let mut open = false;

    while let Some(frame) = source.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if !forward_frame(text.as_str(), &mut open, &event_tx).await {
                    return;
                }
            }
            Ok(Message::Binary(data)) => match String::from_utf8(data) {
                Ok(text) => {
                    if !forward_frame(&text, &mut open, &event_tx).await {
                        return;
                    }
                }
                Err(_) => warn!("Skipping non-UTF-8 binary frame"),
            },
            Ok(Message::Close(frame)) => {
                let reason = frame
                    .map(|f| f.reason.to_string())
                    .filter(|r| !r.is_empty());
                let _ = event_tx.send(ServerEvent::Closed { reason }).await;
                return;
            }
            Ok(_) => {}
            Err(e) => {
                let _ = event_tx.send(ServerEvent::Error(e.to_string())).await;
                return;
            }
        }
    }

    // Stream ended without a close frame
    let _ = event_tx.send(ServerEvent::Closed { reason: None }).await;
}

/// Returns false once the receiving side is gone.
async fn forward_frame(text: &str, open: &mut bool, event_tx: &mpsc::Sender<ServerEvent>) -> bool {
    let frame: ServerFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            // One malformed frame must not end the session
            warn!("Skipping unparseable server frame: {}", e);
            return true;
        }
    };

    if frame.setup_complete.is_some() && !*open {
        *open = true;
        return event_tx.send(ServerEvent::Open).await.is_ok();
    }

    if frame.server_content.is_some() {
        return event_tx
            .send(ServerEvent::Message(frame.into_message()))
            .await
            .is_ok();
    }

    true
}

struct WebSocketHandle {
    // Taken on close, which makes close idempotent and rejects later sends
    sink: Mutex<Option<WsSink>>,
}

#[async_trait::async_trait]
impl LiveHandle for WebSocketHandle {
    async fn send(&self, blob: AudioBlob) -> Result<()> {
        let payload = serde_json::to_string(&RealtimeInputMessage::new(blob))?;

        let mut guard = self.sink.lock().await;
        match guard.as_mut() {
            Some(sink) => sink
                .send(Message::Text(payload))
                .await
                .context("Failed to send realtime input")?,
            None => warn!("Dropping realtime input: session already closed"),
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut guard = self.sink.lock().await;
        if let Some(mut sink) = guard.take() {
            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.close().await;
            info!("Live endpoint connection closed");
        }
        Ok(())
    }
}
