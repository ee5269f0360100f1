//! WebSocket message types
//!
//! Wire shapes for the authentication handshake and command results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Outgoing Messages
// =============================================================================

/// Credential sent in response to `auth_required`
#[derive(Debug, Serialize)]
pub struct AuthMessage<'a> {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub access_token: &'a str,
}

impl<'a> AuthMessage<'a> {
    pub fn new(access_token: &'a str) -> Self {
        Self {
            msg_type: "auth",
            access_token,
        }
    }
}

// =============================================================================
// Incoming Messages
// =============================================================================

/// Any message received from the server
///
/// Handshake messages (`auth_required`, `auth_ok`, `auth_invalid`) carry no
/// `id`; command results always do.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type", default)]
    pub msg_type: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RemoteError>,
    #[serde(default)]
    pub ha_version: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl InboundMessage {
    /// Correlation ID, if this message answers a command
    pub fn correlation_id(&self) -> Option<i64> {
        self.id.filter(|id| *id != 0)
    }

    pub fn is_result(&self) -> bool {
        self.msg_type == "result"
    }
}

/// Structured error attached to a failed result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
