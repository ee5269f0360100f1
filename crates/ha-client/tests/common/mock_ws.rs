//! Mock WebSocket server
//!
//! Accepts any number of connections, runs the auth handshake according to
//! [`AuthMode`], then hands the connection to a per-test handler.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

use super::{HA_VERSION, TOKEN};

/// How the server answers the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// `auth_required`, then `auth_ok` for the test token
    Accept,
    /// `auth_required`, then always `auth_invalid`
    Reject,
    /// Something other than `auth_required` first
    Unexpected,
}

/// Server side of one accepted connection
pub struct MockConnection {
    ws: WebSocketStream<TcpStream>,
}

impl MockConnection {
    pub async fn send_json(&mut self, value: Value) {
        let _ = self.ws.send(Message::Text(value.to_string())).await;
    }

    /// Next JSON message, `None` once the client goes away
    pub async fn recv_json(&mut self) -> Option<Value> {
        while let Some(frame) = self.ws.next().await {
            match frame {
                Ok(Message::Text(text)) => return serde_json::from_str(&text).ok(),
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
        None
    }

    /// Reply with a successful result for command `id`
    pub async fn reply(&mut self, id: &Value, result: Value) {
        self.send_json(json!({
            "id": id,
            "type": "result",
            "success": true,
            "result": result
        }))
        .await;
    }

    /// Reply with a structured error for command `id`
    pub async fn reply_error(&mut self, id: &Value, code: &str, message: &str) {
        self.send_json(json!({
            "id": id,
            "type": "result",
            "success": false,
            "error": {"code": code, "message": message}
        }))
        .await;
    }

    /// Keep reading without answering until the client disconnects
    pub async fn drain(&mut self) {
        while self.recv_json().await.is_some() {}
    }

    async fn handshake(&mut self, mode: AuthMode) -> bool {
        if mode == AuthMode::Unexpected {
            self.send_json(json!({"type": "event", "event": {}})).await;
            return false;
        }

        self.send_json(json!({"type": "auth_required", "ha_version": HA_VERSION}))
            .await;

        let Some(auth) = self.recv_json().await else {
            return false;
        };
        let accepted = mode == AuthMode::Accept
            && auth["type"] == "auth"
            && auth["access_token"] == TOKEN;

        if accepted {
            self.send_json(json!({"type": "auth_ok", "ha_version": HA_VERSION}))
                .await;
        } else {
            self.send_json(json!({
                "type": "auth_invalid",
                "message": "Invalid access token or password"
            }))
            .await;
        }
        accepted
    }
}

/// Running mock server
pub struct MockWsServer {
    base_url: String,
    connections: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl MockWsServer {
    /// Start a server on an ephemeral port
    ///
    /// `handler` runs once per authenticated connection; the connection is
    /// dropped when it returns.
    pub async fn start<F, Fut>(mode: AuthMode, handler: F) -> Self
    where
        F: Fn(MockConnection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(handler);

        let counter = connections.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let handler = handler.clone();

                tokio::spawn(async move {
                    let Ok(ws) = accept_async(stream).await else {
                        return;
                    };
                    let mut conn = MockConnection { ws };
                    if conn.handshake(mode).await {
                        (*handler)(conn).await;
                    }
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            connections,
            task,
        }
    }

    /// Server answering every command through `respond`
    ///
    /// `respond` gets the command and returns its result payload, or an
    /// `(code, message)` error.
    pub async fn responding<R>(respond: R) -> Self
    where
        R: Fn(&Value) -> Result<Value, (String, String)> + Send + Sync + 'static,
    {
        let respond = Arc::new(respond);
        Self::start(AuthMode::Accept, move |mut conn| {
            let respond = respond.clone();
            async move {
                while let Some(command) = conn.recv_json().await {
                    let id = command["id"].clone();
                    match (*respond)(&command) {
                        Ok(result) => conn.reply(&id, result).await,
                        Err((code, message)) => conn.reply_error(&id, &code, &message).await,
                    }
                }
            }
        })
        .await
    }

    /// HTTP base URL to build a client config from
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Connections accepted so far
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
