//! Error types for the Home Assistant client

use std::time::Duration;
use thiserror::Error;

/// Result type for client operations
pub type HaResult<T> = Result<T, HaError>;

/// Errors that can occur while talking to Home Assistant
#[derive(Debug, Error)]
pub enum HaError {
    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------
    /// No base URL configured
    #[error("base URL is required")]
    MissingBaseUrl,

    /// No access token configured
    #[error("authentication token is required")]
    MissingToken,

    /// Invalid configuration value or file
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Base URL could not be parsed
    #[error("invalid base URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Base URL uses a scheme other than http/https
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// Caller supplied an argument the API would reject
    #[error("{0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // WebSocket connect / handshake
    // -------------------------------------------------------------------------
    /// Underlying WebSocket dial failed
    #[error("websocket dial: {0}")]
    Dial(#[source] tokio_tungstenite::tungstenite::Error),

    /// Dial did not complete within the handshake timeout
    #[error("websocket dial timed out after {0:?}")]
    DialTimeout(Duration),

    /// Server violated the authentication protocol
    #[error("websocket auth: {0}")]
    Handshake(String),

    /// Server rejected the access token
    #[error("websocket auth: auth failed: {0}")]
    AuthFailed(String),

    // -------------------------------------------------------------------------
    // WebSocket commands
    // -------------------------------------------------------------------------
    /// Server answered a command with a structured error
    #[error("websocket error [{code}]: {message}")]
    Command { code: String, message: String },

    /// Server answered `success: false` without an error payload
    #[error("command failed")]
    CommandFailed,

    /// Command did not serialize to a JSON object
    #[error("command must serialize to a JSON object")]
    InvalidCommand,

    /// Correlation ID already has a waiter
    #[error("duplicate request id {0}")]
    DuplicateId(i64),

    /// Write to an established connection failed
    #[error("write command: {0}")]
    Transport(#[source] tokio_tungstenite::tungstenite::Error),

    /// Connection ended while the call was pending
    #[error("websocket connection closed")]
    ConnectionClosed,

    /// Call was cancelled by the caller
    #[error("call cancelled")]
    Cancelled,

    /// Call did not complete in time
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    // -------------------------------------------------------------------------
    // REST
    // -------------------------------------------------------------------------
    /// Transport-level HTTP failure
    #[error("execute request: {0}")]
    Http(#[from] reqwest::Error),

    /// 401 from the REST API
    #[error("unauthorized: invalid or missing token")]
    Unauthorized,

    /// 404 from the REST API
    #[error("resource not found")]
    NotFound,

    /// 400 without a message
    #[error("bad request")]
    BadRequest,

    /// 405 from the REST API
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Any other non-2xx response
    #[error("{}", format_api_error(*status, message.as_deref(), body))]
    Api {
        status: u16,
        message: Option<String>,
        body: String,
    },

    /// Both the config endpoint and the states fallback failed
    #[error("{what}: config endpoint failed ({primary}), states fallback also failed ({fallback})")]
    FallbackFailed {
        what: &'static str,
        primary: Box<HaError>,
        fallback: Box<HaError>,
    },

    // -------------------------------------------------------------------------
    // Payloads
    // -------------------------------------------------------------------------
    /// JSON encode/decode failure
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl HaError {
    /// Remote error code for [`HaError::Command`]
    pub fn code(&self) -> Option<&str> {
        match self {
            HaError::Command { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Remote error message for [`HaError::Command`]
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            HaError::Command { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whether the failure ended the WebSocket session (the next call reconnects)
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, HaError::ConnectionClosed | HaError::Transport(_))
    }
}

fn format_api_error(status: u16, message: Option<&str>, body: &str) -> String {
    match message {
        Some(msg) if !msg.is_empty() => format!("API error {}: {}", status, msg),
        _ if !body.is_empty() => format!("API error {}: {}", status, body),
        _ => format!("API error {}", status),
    }
}
