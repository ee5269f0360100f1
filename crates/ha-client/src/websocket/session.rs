//! WebSocket session
//!
//! One authenticated connection: the writer half shared by callers behind a
//! mutex, the reader half owned by a single background task that routes
//! results to their waiters.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace};

use crate::error::{HaError, HaResult};

use super::pending::PendingCalls;
use super::types::{AuthMessage, InboundMessage};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

// =============================================================================
// Session
// =============================================================================

/// A live, authenticated connection
pub struct Session {
    /// Writer half; most transports forbid concurrent writes
    writer: Mutex<WsSink>,
    /// In-flight calls on this connection
    pending: Arc<PendingCalls>,
    /// Background read loop
    reader: StdMutex<Option<JoinHandle<()>>>,
    /// Version reported during the handshake
    ha_version: Option<String>,
}

impl Session {
    /// Dial `url`, authenticate with `token`, and start the read loop
    ///
    /// The dial and the handshake are each bounded by `handshake_timeout`.
    /// On any failure the connection is dropped and nothing is retained.
    pub async fn connect(url: &str, token: &str, handshake_timeout: Duration) -> HaResult<Arc<Self>> {
        debug!(url = %url, "Dialing WebSocket");

        let (stream, _) = timeout(handshake_timeout, connect_async(url))
            .await
            .map_err(|_| HaError::DialTimeout(handshake_timeout))?
            .map_err(HaError::Dial)?;

        let (mut sink, mut source) = stream.split();

        let handshake = timeout(handshake_timeout, authenticate(&mut sink, &mut source, token))
            .await
            .unwrap_or_else(|_| {
                Err(HaError::Handshake(format!(
                    "no auth response within {:?}",
                    handshake_timeout
                )))
            });

        let ha_version = match handshake {
            Ok(version) => version,
            Err(e) => {
                debug!(error = %e, "WebSocket handshake failed, closing connection");
                let _ = sink.close().await;
                return Err(e);
            }
        };

        info!(
            url = %url,
            ha_version = ha_version.as_deref().unwrap_or("unknown"),
            "WebSocket authenticated"
        );

        let pending = Arc::new(PendingCalls::new());
        let reader = tokio::spawn(read_loop(source, pending.clone()));

        Ok(Arc::new(Self {
            writer: Mutex::new(sink),
            pending,
            reader: StdMutex::new(Some(reader)),
            ha_version,
        }))
    }

    pub fn pending(&self) -> &PendingCalls {
        &self.pending
    }

    pub fn ha_version(&self) -> Option<&str> {
        self.ha_version.as_deref()
    }

    /// Non-blocking liveness check
    pub fn is_closed(&self) -> bool {
        self.pending.is_closed()
    }

    /// Write one JSON message
    pub async fn send(&self, message: &Value) -> HaResult<()> {
        let text = serde_json::to_string(message)?;
        trace!(message = %text, "Sending");

        let mut writer = self.writer.lock().await;
        writer
            .send(Message::Text(text))
            .await
            .map_err(HaError::Transport)
    }

    /// Release the connection and fail every pending call
    ///
    /// Safe to call more than once and from several tasks at the same time.
    pub async fn close(&self) {
        if self.pending.close() {
            debug!("Closing WebSocket session");
        }
        self.stop_reader();

        let mut writer = self.writer.lock().await;
        let _ = writer.close().await;
    }

    fn stop_reader(&self) {
        let handle = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.pending.close();
        self.stop_reader();
    }
}

// =============================================================================
// Authentication
// =============================================================================

/// Perform the `auth_required` → `auth` → `auth_ok` exchange
///
/// Returns the server version announced in `auth_required`/`auth_ok`.
async fn authenticate(
    sink: &mut WsSink,
    source: &mut WsSource,
    token: &str,
) -> HaResult<Option<String>> {
    let required = recv_handshake(source, "auth_required").await?;
    if required.msg_type != "auth_required" {
        return Err(HaError::Handshake(format!(
            "expected auth_required, got {}",
            required.msg_type
        )));
    }

    let auth = serde_json::to_string(&AuthMessage::new(token))?;
    sink.send(Message::Text(auth))
        .await
        .map_err(|e| HaError::Handshake(format!("write auth: {}", e)))?;

    let outcome = recv_handshake(source, "auth response").await?;
    match outcome.msg_type.as_str() {
        "auth_ok" => Ok(outcome.ha_version.or(required.ha_version)),
        "auth_invalid" => {
            let message = outcome
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "invalid authentication".to_string());
            Err(HaError::AuthFailed(message))
        }
        other => Err(HaError::Handshake(format!(
            "unexpected auth response: {}",
            other
        ))),
    }
}

/// Read the next JSON message during the handshake
async fn recv_handshake(source: &mut WsSource, stage: &str) -> HaResult<InboundMessage> {
    loop {
        let frame = match source.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => return Err(HaError::Handshake(format!("read {}: {}", stage, e))),
            None => {
                return Err(HaError::Handshake(format!(
                    "read {}: connection closed",
                    stage
                )))
            }
        };

        match decode_frame(frame) {
            Ok(Some(message)) => return Ok(message),
            Ok(None) => continue,
            Err(e) => return Err(HaError::Handshake(format!("read {}: {}", stage, e))),
        }
    }
}

// =============================================================================
// Read loop
// =============================================================================

/// Route every correlated message to its waiter until the connection ends
async fn read_loop(mut source: WsSource, pending: Arc<PendingCalls>) {
    loop {
        let frame = match source.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                debug!(error = %e, "WebSocket read failed");
                break;
            }
            None => {
                debug!("WebSocket stream ended");
                break;
            }
        };

        let message = match decode_frame(frame) {
            Ok(Some(message)) => message,
            Ok(None) => continue,
            Err(e) => {
                debug!(error = %e, "Stopping WebSocket reader");
                break;
            }
        };

        match message.correlation_id() {
            Some(id) => {
                pending.deliver(id, message);
            }
            None => {
                trace!(msg_type = %message.msg_type, "Ignoring uncorrelated message");
            }
        }
    }

    pending.close();
}

/// Decode one frame
///
/// `Ok(None)` for control frames that carry no message; an error once the
/// peer closes or sends something that is not a JSON message.
fn decode_frame(frame: Message) -> HaResult<Option<InboundMessage>> {
    match frame {
        Message::Text(text) => Ok(Some(serde_json::from_str(&text)?)),
        Message::Binary(data) => Ok(Some(serde_json::from_slice(&data)?)),
        Message::Close(_) => Err(HaError::ConnectionClosed),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Ok(None),
    }
}
