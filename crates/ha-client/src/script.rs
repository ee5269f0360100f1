//! Script control and configuration
//!
//! Same split as automations: `script.*` services for control,
//! `/api/config/script/config/<id>` for UI-managed configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::automation::{require, string_attribute};
use crate::error::{HaError, HaResult};
use crate::rest::HaClient;
use crate::types::ServiceCallRequest;

const DOMAIN: &str = "script";

/// Full script configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub sequence: Vec<Value>,
    /// single, restart, parallel or queued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub variables: Map<String, Value>,
}

impl ScriptConfig {
    /// Body for the save endpoint; the ID travels in the path only
    fn save_payload(&self) -> HaResult<Value> {
        let mut payload = serde_json::to_value(self)?;
        if let Some(object) = payload.as_object_mut() {
            object.remove("id");
        }
        Ok(payload)
    }
}

/// Service name for a script entity (`script.wake_up` → `wake_up`)
fn script_service(entity_id: &str) -> HaResult<&str> {
    entity_id
        .strip_prefix("script.")
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            HaError::InvalidArgument(format!(
                "invalid entity_id format: expected 'script.*', got '{}'",
                entity_id
            ))
        })
}

impl HaClient {
    /// List script configurations, falling back to `script.*` states
    pub async fn script_list(&self) -> HaResult<Vec<ScriptConfig>> {
        let primary = match self.get("/api/config/script/config").await {
            Ok(configs) => return Ok(configs),
            Err(e) => e,
        };
        debug!(error = %primary, "Script config endpoint failed, listing states");

        let states = self
            .states()
            .await
            .map_err(|fallback| HaError::FallbackFailed {
                what: "script list",
                primary: Box::new(primary),
                fallback: Box::new(fallback),
            })?;

        Ok(states
            .iter()
            .filter(|state| state.domain() == DOMAIN)
            .map(|state| ScriptConfig {
                id: state.entity_id.clone(),
                alias: state
                    .friendly_name()
                    .map(String::from)
                    .unwrap_or_else(|| state.entity_id.trim_start_matches("script.").to_string()),
                icon: string_attribute(&state.attributes, "icon"),
                description: string_attribute(&state.attributes, "description"),
                mode: string_attribute(&state.attributes, "mode"),
                ..Default::default()
            })
            .collect())
    }

    /// Configuration of one script
    pub async fn script_get(&self, id: &str) -> HaResult<ScriptConfig> {
        require(id, "script id")?;
        self.get(&format!("/api/config/script/config/{}", id)).await
    }

    /// Create or update a script
    pub async fn script_save(&self, config: &ScriptConfig) -> HaResult<()> {
        require(&config.id, "script id")?;
        require(&config.alias, "script alias")?;

        let path = format!("/api/config/script/config/{}", config.id);
        self.execute(reqwest::Method::POST, &path, Some(&config.save_payload()?))
            .await
    }

    /// Delete a script configuration
    pub async fn script_delete_config(&self, id: &str) -> HaResult<()> {
        require(id, "script id")?;
        self.delete(&format!("/api/config/script/config/{}", id))
            .await
    }

    /// Reload scripts from YAML
    pub async fn script_reload(&self) -> HaResult<()> {
        self.call_service(DOMAIN, "reload", None).await?;
        Ok(())
    }

    /// Run a script synchronously as `script.<name>`; variables become
    /// top-level service data
    pub async fn script_run(&self, entity_id: &str, variables: &Map<String, Value>) -> HaResult<()> {
        require(entity_id, "entity_id")?;
        let service = script_service(entity_id)?;

        let request = ServiceCallRequest {
            entity_id: None,
            data: variables.clone(),
        };
        self.call_service(DOMAIN, service, Some(&request)).await?;
        Ok(())
    }

    /// Start a script via `script.turn_on`; variables are nested under
    /// `variables`
    pub async fn script_turn_on(
        &self,
        entity_id: &str,
        variables: &Map<String, Value>,
    ) -> HaResult<()> {
        require(entity_id, "entity_id")?;

        let mut request = ServiceCallRequest::for_entity(entity_id);
        if !variables.is_empty() {
            request = request.with_data("variables", Value::Object(variables.clone()));
        }
        self.call_service(DOMAIN, "turn_on", Some(&request)).await?;
        Ok(())
    }

    /// Stop a running script
    pub async fn script_turn_off(&self, entity_id: &str) -> HaResult<()> {
        require(entity_id, "entity_id")?;
        let request = ServiceCallRequest::for_entity(entity_id);
        self.call_service(DOMAIN, "turn_off", Some(&request)).await?;
        Ok(())
    }

    /// Toggle a script
    pub async fn script_toggle(&self, entity_id: &str) -> HaResult<()> {
        require(entity_id, "entity_id")?;
        let request = ServiceCallRequest::for_entity(entity_id);
        self.call_service(DOMAIN, "toggle", Some(&request)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_script_service_name() {
        assert_eq!(script_service("script.wake_up").unwrap(), "wake_up");
        assert!(script_service("light.kitchen").is_err());
        assert!(script_service("script.").is_err());
    }

    #[test]
    fn test_save_payload_drops_id() {
        let config = ScriptConfig {
            id: "wake_up".to_string(),
            alias: "Wake up".to_string(),
            sequence: vec![json!({"delay": 5})],
            ..Default::default()
        };

        assert_eq!(
            config.save_payload().unwrap(),
            json!({"alias": "Wake up", "sequence": [{"delay": 5}]})
        );
    }
}
