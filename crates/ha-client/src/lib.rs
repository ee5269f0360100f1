//! Home Assistant API client
//!
//! Two transports against one Home Assistant instance:
//!
//! ```text
//! ┌──────────────┐   HTTP + bearer token   ┌──────────────────┐
//! │  HaClient    │ ──────────────────────► │  /api/...        │
//! └──────────────┘                         │                  │
//! ┌──────────────┐   one multiplexed WS    │  Home Assistant  │
//! │  WsClient    │ ◄─────────────────────► │  /api/websocket  │
//! └──────────────┘                         └──────────────────┘
//! ```
//!
//! [`HaClient`] covers the documented REST API plus the config endpoints
//! used for automations and scripts. [`WsClient`] carries commands that only
//! exist on the WebSocket API (registries, dashboards) and correlates
//! concurrent calls on a single connection.
//!
//! Based on: https://developers.home-assistant.io/docs/api/rest
//!           https://developers.home-assistant.io/docs/api/websocket

pub mod api;
pub mod automation;
pub mod config;
pub mod error;
pub mod lovelace;
pub mod registry;
pub mod rest;
pub mod script;
pub mod types;
pub mod websocket;

pub use automation::AutomationConfig;
pub use config::ClientConfig;
pub use error::{HaError, HaResult};
pub use lovelace::{Dashboard, DashboardConfig, Resource};
pub use registry::RegistryKind;
pub use rest::HaClient;
pub use script::ScriptConfig;
pub use types::*;
pub use websocket::WsClient;

/// REST and WebSocket clients sharing one configuration
///
/// The WebSocket side stays disconnected until its first call.
pub struct Client {
    rest: HaClient,
    ws: WsClient,
}

impl Client {
    pub fn new(config: &ClientConfig) -> HaResult<Self> {
        Ok(Self {
            rest: HaClient::new(config)?,
            ws: WsClient::new(config)?,
        })
    }

    pub fn rest(&self) -> &HaClient {
        &self.rest
    }

    pub fn ws(&self) -> &WsClient {
        &self.ws
    }

    /// Close the WebSocket connection, if one is open
    pub async fn close_websocket(&self) {
        self.ws.close().await;
    }
}
