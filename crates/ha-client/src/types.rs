//! REST API data types

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response of `GET /api/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
}

/// Core configuration, `GET /api/config`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub components: Vec<String>,
    pub config_dir: String,
    pub elevation: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: String,
    pub time_zone: String,
    pub unit_system: UnitSystem,
    pub version: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub safe_mode: bool,
    pub allowlist_external_dirs: Vec<String>,
    pub allowlist_external_urls: Vec<String>,
}

/// Unit system
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSystem {
    pub length: String,
    pub mass: String,
    pub temperature: String,
    pub volume: String,
    pub pressure: String,
    pub wind_speed: String,
    #[serde(rename = "accumulated_precipitation")]
    pub accumulated: String,
}

/// Entity state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    pub last_changed: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub context: Context,
}

impl State {
    /// Domain part of the entity ID (`light` for `light.kitchen`)
    pub fn domain(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map(|(domain, _)| domain)
            .unwrap_or(&self.entity_id)
    }

    /// `friendly_name` attribute, if a string
    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes.get("friendly_name").and_then(Value::as_str)
    }
}

/// Context of a state change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Body of `POST /api/states/<entity_id>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateUpdate {
    pub state: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

/// Event type with its listener count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event: String,
    pub listener_count: u64,
}

/// Services of one domain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub domain: String,
    pub services: HashMap<String, ServiceDetails>,
}

/// Description of one service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, ServiceField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Value>,
}

/// One field of a service call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<Value>,
}

/// Service call body: optional `entity_id` plus flattened data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceCallRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl ServiceCallRequest {
    pub fn for_entity(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: Some(entity_id.into()),
            data: Map::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Historical state entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub entity_id: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
    pub last_changed: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Options for history queries
#[derive(Debug, Clone, Default)]
pub struct HistoryOptions {
    /// Comma-separated entity IDs
    pub filter_entity_id: Option<String>,
    pub end_time: Option<DateTime<Utc>>,
    /// Only `last_changed` and `state`
    pub minimal_response: bool,
    pub no_attributes: bool,
    pub significant_changes_only: bool,
}

/// Logbook entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogbookEntry {
    pub when: DateTime<Utc>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

/// Options for logbook queries
#[derive(Debug, Clone, Default)]
pub struct LogbookOptions {
    pub entity: Option<String>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Body of `POST /api/template`
#[derive(Debug, Clone, Serialize)]
pub struct TemplateRequest<'a> {
    pub template: &'a str,
}

/// Result of `POST /api/config/core/check_config`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigCheckResult {
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

/// Calendar entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    pub entity_id: String,
    pub name: String,
}

/// Calendar event; `start`/`end` are dates or date-times as sent by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub start: Value,
    pub end: Value,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrule: Option<String>,
}

/// Body of `POST /api/intent/handle`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

/// Intent response; only the commonly used parts are typed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentResponse {
    pub speech: Option<Value>,
    pub card: Option<Value>,
    pub language: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_service_call_request_flattens_data() {
        let request = ServiceCallRequest::for_entity("light.kitchen").with_data("brightness", 255);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"entity_id": "light.kitchen", "brightness": 255})
        );

        let empty = ServiceCallRequest::default();
        assert_eq!(serde_json::to_value(&empty).unwrap(), json!({}));
    }

    #[test]
    fn test_state_parse_and_helpers() {
        let state: State = serde_json::from_value(json!({
            "entity_id": "automation.morning",
            "state": "on",
            "attributes": {"friendly_name": "Morning"},
            "last_changed": "2026-01-07T10:00:00+00:00",
            "last_updated": "2026-01-07T10:00:00+00:00",
            "context": {"id": "01ABC", "parent_id": null, "user_id": null}
        }))
        .unwrap();

        assert_eq!(state.domain(), "automation");
        assert_eq!(state.friendly_name(), Some("Morning"));
        assert_eq!(state.context.id, "01ABC");
    }
}
