//! WebSocket bridge to the backend service.
//!
//! Inbound frames are JSON backend messages fed to the [`SyncEngine`];
//! outbound traffic is plain-text commands drained from the engine's command
//! channel. The client owns reconnection: a dropped connection is retried
//! with exponential backoff until cancelled.

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tunesync_core::{BackendConfig, BackendMessage, Command, SyncEngine};

use crate::error::{BackendError, Result};

/// Client for the backend's local WebSocket endpoint.
pub struct BackendClient {
    config: BackendConfig,
    engine: Arc<SyncEngine>,
    commands: mpsc::UnboundedReceiver<Command>,
    cancel_token: CancellationToken,
}

impl BackendClient {
    /// Create a new client.
    ///
    /// `commands` is the receiver half returned by [`SyncEngine::new`].
    #[must_use]
    pub fn new(
        config: BackendConfig,
        engine: Arc<SyncEngine>,
        commands: mpsc::UnboundedReceiver<Command>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            engine,
            commands,
            cancel_token,
        }
    }

    /// Connect and serve until cancelled, reconnecting on failure.
    pub async fn run(mut self) {
        let url = self.config.url();
        let mut backoff_ms = self.config.reconnect_initial_ms;

        loop {
            if self.cancel_token.is_cancelled() {
                break;
            }

            match connect_async(url.as_str()).await {
                Ok((stream, _)) => {
                    info!("Connected to backend at {url}");
                    backoff_ms = self.config.reconnect_initial_ms;
                    match self.serve(stream).await {
                        Ok(()) => break,
                        Err(e) => warn!("Backend connection lost: {e}"),
                    }
                }
                Err(e) => {
                    warn!("Failed to connect to backend at {url}: {e}");
                }
            }

            tokio::select! {
                () = self.cancel_token.cancelled() => break,
                () = tokio::time::sleep(Duration::from_millis(backoff_ms)) => {}
            }
            backoff_ms = backoff_ms
                .saturating_mul(2)
                .min(self.config.reconnect_max_ms);
        }

        info!("Backend client shut down");
    }

    /// Serve one established connection until it drops or we are cancelled.
    /// `Ok` means a clean cancellation; a dropped connection is an error so
    /// the caller reconnects.
    async fn serve<S>(&mut self, stream: WebSocketStream<S>) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (mut sink, mut source) = stream.split();

        // Hello that tells the backend to start streaming state.
        sink.send(Message::text(Command::Attempt.to_string()))
            .await?;

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return Ok(());
                }
                command = self.commands.recv() => {
                    // A closed command channel means the engine is gone.
                    let Some(command) = command else { return Ok(()) };
                    debug!("Sending command: {command}");
                    sink.send(Message::text(command.to_string())).await?;
                }
                frame = source.next() => {
                    let Some(frame) = frame else {
                        return Err(BackendError::ConnectionClosed);
                    };
                    match frame? {
                        Message::Text(text) => self.dispatch(text.as_str()).await,
                        Message::Close(_) => return Err(BackendError::ConnectionClosed),
                        _ => {}
                    }
                }
            }
        }
    }

    /// Decode and hand one frame to the engine. Undecodable frames are
    /// skipped, not fatal.
    async fn dispatch(&self, payload: &str) {
        match serde_json::from_str::<BackendMessage>(payload) {
            Ok(message) => self.engine.handle_message(message).await,
            Err(e) => debug!("Skipping undecodable backend frame: {e}"),
        }
    }
}
