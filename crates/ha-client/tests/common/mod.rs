//! Common test utilities
//!
//! In-process stand-ins for a Home Assistant instance: a WebSocket server
//! speaking the auth handshake, and an axum router for REST endpoints.

#![allow(dead_code)]

mod mock_rest;
mod mock_ws;

#[allow(unused_imports)]
pub use mock_rest::*;
#[allow(unused_imports)]
pub use mock_ws::*;

use ha_client::ClientConfig;

/// Token accepted by the mock servers
pub const TOKEN: &str = "test-token";

/// Version announced by the mock WebSocket server
pub const HA_VERSION: &str = "2026.1.1";

/// Client config pointing at `base_url` with the test token
pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig::new(base_url, TOKEN)
}
