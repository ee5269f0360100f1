//! WebSocket API client
//!
//! Commands without a REST equivalent (dashboards, registries) go over a
//! single persistent connection. The connection is opened lazily on the first
//! call, authenticated, and then shared by every concurrent caller:
//!
//! ```text
//!  call ──► next_id + register ──► write {.., "id": n} ──┐
//!                                                        ▼
//!  caller ◄── waiter n ◄── PendingCalls::deliver ◄── read loop
//! ```
//!
//! A dead connection is replaced on the next call; calls in flight when it
//! died fail with [`HaError::ConnectionClosed`] and are not retried.

mod pending;
mod session;
mod types;

pub use pending::{PendingCalls, Waiter};
pub use session::Session;
pub use types::{AuthMessage, InboundMessage, RemoteError};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{HaError, HaResult};

/// Path of the WebSocket endpoint relative to the base URL
pub const WEBSOCKET_PATH: &str = "/api/websocket";

/// Derive the WebSocket endpoint from a REST base URL
///
/// `http` becomes `ws`, `https` becomes `wss`; any other scheme is rejected.
pub fn websocket_url(base_url: &str) -> HaResult<String> {
    let mut url = Url::parse(base_url).map_err(|source| HaError::InvalidUrl {
        url: base_url.to_string(),
        source,
    })?;

    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => return Err(HaError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|_| HaError::UnsupportedScheme(scheme.to_string()))?;

    let path = format!("{}{}", url.path().trim_end_matches('/'), WEBSOCKET_PATH);
    url.set_path(&path);

    Ok(url.to_string())
}

/// Multiplexed WebSocket RPC client
///
/// Safe to share between tasks; every call resolves the current session
/// afresh, reconnecting if the previous one has died.
pub struct WsClient {
    url: String,
    token: String,
    handshake_timeout: Duration,
    /// Current session, replaced when found dead
    session: Mutex<Option<Arc<Session>>>,
}

impl WsClient {
    /// Create a client; no connection is made until the first call
    pub fn new(config: &ClientConfig) -> HaResult<Self> {
        config.validate()?;
        Ok(Self {
            url: websocket_url(&config.base_url)?,
            token: config.token.clone(),
            handshake_timeout: config.handshake_timeout,
            session: Mutex::new(None),
        })
    }

    /// WebSocket endpoint this client dials
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open and authenticate the connection if there is no live one
    pub async fn connect(&self) -> HaResult<()> {
        self.session().await.map(|_| ())
    }

    /// Whether a live session currently exists
    pub async fn is_connected(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .is_some_and(|session| !session.is_closed())
    }

    /// Server version reported by the current session
    pub async fn ha_version(&self) -> Option<String> {
        self.session
            .lock()
            .await
            .as_ref()
            .and_then(|session| session.ha_version().map(String::from))
    }

    /// Close the connection if open; pending calls fail with `ConnectionClosed`
    pub async fn close(&self) {
        let session = self.session.lock().await.take();
        if let Some(session) = session {
            session.close().await;
        }
    }

    /// Send a command and wait for its result payload
    ///
    /// `command` must serialize to a JSON object carrying its `type`; the
    /// request ID is added to a private copy. A successful response without a
    /// `result` field yields `Value::Null`.
    ///
    /// Dropping the returned future stops the local wait only; the server
    /// still executes the command and its late response is discarded.
    pub async fn call<C>(&self, command: &C) -> HaResult<Value>
    where
        C: Serialize + ?Sized,
    {
        let session = self.session().await?;
        let pending = session.pending();

        let id = pending.next_id();
        let payload = tag_command(command, id)?;
        let waiter = pending.register(id)?;
        let _guard = PendingGuard { pending, id };

        debug!(id, command = command_type(&payload), "Sending WebSocket command");
        session.send(&payload).await?;

        let response = waiter.await.map_err(|_| HaError::ConnectionClosed)??;
        into_result(response)
    }

    /// Send a command and decode its result into `T`
    pub async fn call_as<T, C>(&self, command: &C) -> HaResult<T>
    where
        T: DeserializeOwned,
        C: Serialize + ?Sized,
    {
        let value = self.call(command).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// [`call`](Self::call) bounded by a deadline
    pub async fn call_with_timeout<C>(&self, command: &C, limit: Duration) -> HaResult<Value>
    where
        C: Serialize + ?Sized,
    {
        tokio::time::timeout(limit, self.call(command))
            .await
            .map_err(|_| HaError::Timeout(limit))?
    }

    /// [`call`](Self::call) that gives up with [`HaError::Cancelled`] as soon
    /// as `cancel` completes
    pub async fn call_until<C, F>(&self, command: &C, cancel: F) -> HaResult<Value>
    where
        C: Serialize + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => Err(HaError::Cancelled),
            result = self.call(command) => result,
        }
    }

    /// Resolve the live session, dialing a new one when needed
    async fn session(&self) -> HaResult<Arc<Session>> {
        let mut slot = self.session.lock().await;

        if let Some(session) = slot.as_ref() {
            if !session.is_closed() {
                return Ok(session.clone());
            }
        }
        if let Some(dead) = slot.take() {
            debug!("Replacing closed WebSocket session");
            dead.close().await;
        }

        let session = Session::connect(&self.url, &self.token, self.handshake_timeout).await?;
        *slot = Some(session.clone());
        Ok(session)
    }
}

/// Removes the pending entry when a call ends for any reason
struct PendingGuard<'a> {
    pending: &'a PendingCalls,
    id: i64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.unregister(self.id);
    }
}

/// Copy `command` into a JSON object and inject `id`
fn tag_command<C>(command: &C, id: i64) -> HaResult<Value>
where
    C: Serialize + ?Sized,
{
    let mut payload = serde_json::to_value(command)?;
    let object = payload.as_object_mut().ok_or(HaError::InvalidCommand)?;
    object.insert("id".to_string(), Value::from(id));
    Ok(payload)
}

fn command_type(payload: &Value) -> &str {
    payload
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("<untyped>")
}

/// Turn a correlated response into the call's outcome
fn into_result(response: InboundMessage) -> HaResult<Value> {
    if let Some(error) = response.error {
        return Err(HaError::Command {
            code: error.code,
            message: error.message,
        });
    }
    if !response.success && response.is_result() {
        return Err(HaError::CommandFailed);
    }
    Ok(response.result.unwrap_or(Value::Null))
}
