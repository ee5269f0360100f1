//! Automation control and configuration
//!
//! Control goes through the `automation.*` services. Configuration CRUD uses
//! `/api/config/automation/config/<id>`, the endpoint behind the frontend's
//! automation editor; it is undocumented and only covers UI-managed
//! automations stored in `automations.yaml`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{HaError, HaResult};
use crate::rest::HaClient;
use crate::types::ServiceCallRequest;

const DOMAIN: &str = "automation";

/// Full automation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutomationConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// single, restart, parallel or queued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// warn or silent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_exceeded: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(default)]
    pub trigger: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub condition: Vec<Value>,
    #[serde(default)]
    pub action: Vec<Value>,
}

impl AutomationConfig {
    /// Body for the save endpoint; the ID travels in the path only
    fn save_payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("alias".to_string(), Value::from(self.alias.clone()));
        payload.insert("trigger".to_string(), Value::from(self.trigger.clone()));
        payload.insert("action".to_string(), Value::from(self.action.clone()));

        if let Some(description) = &self.description {
            payload.insert("description".to_string(), Value::from(description.clone()));
        }
        if let Some(mode) = &self.mode {
            payload.insert("mode".to_string(), Value::from(mode.clone()));
        }
        if let Some(max_exceeded) = &self.max_exceeded {
            payload.insert("max_exceeded".to_string(), Value::from(max_exceeded.clone()));
        }
        if let Some(max) = self.max {
            payload.insert("max".to_string(), Value::from(max));
        }
        if !self.condition.is_empty() {
            payload.insert("condition".to_string(), Value::from(self.condition.clone()));
        }
        payload
    }
}

pub(crate) fn require(value: &str, what: &str) -> HaResult<()> {
    if value.is_empty() {
        return Err(HaError::InvalidArgument(format!("{} is required", what)));
    }
    Ok(())
}

impl HaClient {
    /// Trigger an automation, optionally skipping its conditions
    pub async fn automation_trigger(
        &self,
        entity_id: &str,
        skip_condition: Option<bool>,
    ) -> HaResult<()> {
        require(entity_id, "entity_id")?;

        let mut request = ServiceCallRequest::for_entity(entity_id);
        if let Some(skip) = skip_condition {
            request = request.with_data("skip_condition", skip);
        }
        self.call_service(DOMAIN, "trigger", Some(&request)).await?;
        Ok(())
    }

    /// Enable an automation
    pub async fn automation_turn_on(&self, entity_id: &str) -> HaResult<()> {
        self.automation_entity_service(entity_id, "turn_on").await
    }

    /// Disable an automation
    pub async fn automation_turn_off(&self, entity_id: &str) -> HaResult<()> {
        self.automation_entity_service(entity_id, "turn_off").await
    }

    /// Toggle an automation
    pub async fn automation_toggle(&self, entity_id: &str) -> HaResult<()> {
        self.automation_entity_service(entity_id, "toggle").await
    }

    /// Reload automations from YAML
    pub async fn automation_reload(&self) -> HaResult<()> {
        self.call_service(DOMAIN, "reload", None).await?;
        Ok(())
    }

    /// List automation configurations
    ///
    /// Falls back to `automation.*` states when the config endpoint is not
    /// available; fallback entries carry only ID, alias, description and
    /// mode.
    pub async fn automation_list(&self) -> HaResult<Vec<AutomationConfig>> {
        let primary = match self.get("/api/config/automation/config").await {
            Ok(configs) => return Ok(configs),
            Err(e) => e,
        };
        debug!(error = %primary, "Automation config endpoint failed, listing states");

        let states = self
            .states()
            .await
            .map_err(|fallback| HaError::FallbackFailed {
                what: "automation list",
                primary: Box::new(primary),
                fallback: Box::new(fallback),
            })?;

        Ok(states
            .iter()
            .filter(|state| state.domain() == DOMAIN)
            .map(|state| AutomationConfig {
                id: state.entity_id.clone(),
                alias: state.friendly_name().map(String::from).unwrap_or_else(|| {
                    state.entity_id.trim_start_matches("automation.").to_string()
                }),
                description: string_attribute(&state.attributes, "description"),
                mode: string_attribute(&state.attributes, "mode"),
                ..Default::default()
            })
            .collect())
    }

    /// Configuration of one automation
    pub async fn automation_get(&self, id: &str) -> HaResult<AutomationConfig> {
        require(id, "automation id")?;
        self.get(&format!("/api/config/automation/config/{}", id))
            .await
    }

    /// Create or update an automation
    pub async fn automation_save(&self, config: &AutomationConfig) -> HaResult<()> {
        require(&config.id, "automation id")?;
        require(&config.alias, "automation alias")?;

        let path = format!("/api/config/automation/config/{}", config.id);
        self.execute(reqwest::Method::POST, &path, Some(&config.save_payload()))
            .await
    }

    /// Delete an automation configuration
    pub async fn automation_delete_config(&self, id: &str) -> HaResult<()> {
        require(id, "automation id")?;
        self.delete(&format!("/api/config/automation/config/{}", id))
            .await
    }

    async fn automation_entity_service(&self, entity_id: &str, service: &str) -> HaResult<()> {
        require(entity_id, "entity_id")?;
        let request = ServiceCallRequest::for_entity(entity_id);
        self.call_service(DOMAIN, service, Some(&request)).await?;
        Ok(())
    }
}

pub(crate) fn string_attribute(attributes: &Map<String, Value>, key: &str) -> Option<String> {
    attributes
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
