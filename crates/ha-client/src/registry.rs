//! Entity, device, area, label and floor registries
//!
//! Registries are only exposed over the WebSocket API
//! (`config/<kind>_registry/list`).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{HaError, HaResult};
use crate::websocket::WsClient;

/// Which registry to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    Entity,
    Device,
    Area,
    Label,
    Floor,
}

impl RegistryKind {
    pub const ALL: [RegistryKind; 5] = [
        RegistryKind::Entity,
        RegistryKind::Device,
        RegistryKind::Area,
        RegistryKind::Label,
        RegistryKind::Floor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryKind::Entity => "entity",
            RegistryKind::Device => "device",
            RegistryKind::Area => "area",
            RegistryKind::Label => "label",
            RegistryKind::Floor => "floor",
        }
    }

    /// WebSocket command type listing this registry
    pub fn list_command(&self) -> String {
        format!("config/{}_registry/list", self.as_str())
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistryKind {
    type Err = HaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RegistryKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| HaError::InvalidArgument(format!("unknown registry: {}", s)))
    }
}

/// Entity registry entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRegistryEntry {
    pub entity_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub area_id: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub disabled_by: Option<String>,
    #[serde(default)]
    pub hidden_by: Option<String>,
    #[serde(default)]
    pub has_entity_name: bool,
    #[serde(default)]
    pub platform: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub categories: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(default)]
    pub unique_id: String,
}

/// Device registry entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRegistryEntry {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub area_id: Option<String>,
    #[serde(default)]
    pub config_entries: Vec<String>,
    #[serde(default)]
    pub connections: Vec<Vec<String>>,
    #[serde(default)]
    pub disabled_by: Option<String>,
    #[serde(default)]
    pub identifiers: Vec<Vec<String>>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub name_by_user: Option<String>,
    #[serde(default)]
    pub sw_version: Option<String>,
    #[serde(default)]
    pub hw_version: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub via_device_id: Option<String>,
    #[serde(default)]
    pub configuration_url: Option<String>,
    #[serde(default)]
    pub entry_type: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Area registry entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaRegistryEntry {
    pub area_id: String,
    pub name: String,
    #[serde(default)]
    pub floor_id: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Label registry entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRegistryEntry {
    pub label_id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Floor registry entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorRegistryEntry {
    pub floor_id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub level: Option<i64>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl WsClient {
    /// List a registry without decoding its entries
    pub async fn registry_raw(&self, kind: RegistryKind) -> HaResult<Value> {
        self.call(&json!({"type": kind.list_command()})).await
    }

    pub async fn entity_registry(&self) -> HaResult<Vec<EntityRegistryEntry>> {
        self.list_registry(RegistryKind::Entity).await
    }

    pub async fn device_registry(&self) -> HaResult<Vec<DeviceRegistryEntry>> {
        self.list_registry(RegistryKind::Device).await
    }

    pub async fn area_registry(&self) -> HaResult<Vec<AreaRegistryEntry>> {
        self.list_registry(RegistryKind::Area).await
    }

    pub async fn label_registry(&self) -> HaResult<Vec<LabelRegistryEntry>> {
        self.list_registry(RegistryKind::Label).await
    }

    pub async fn floor_registry(&self) -> HaResult<Vec<FloorRegistryEntry>> {
        self.list_registry(RegistryKind::Floor).await
    }

    async fn list_registry<T>(&self, kind: RegistryKind) -> HaResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        self.call_as(&json!({"type": kind.list_command()})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_commands() {
        assert_eq!(
            RegistryKind::Entity.list_command(),
            "config/entity_registry/list"
        );
        assert_eq!(RegistryKind::Floor.list_command(), "config/floor_registry/list");
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("area".parse::<RegistryKind>().unwrap(), RegistryKind::Area);
        assert!(matches!(
            "zone".parse::<RegistryKind>(),
            Err(HaError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_entity_entry_with_nulls() {
        let entry: EntityRegistryEntry = serde_json::from_value(serde_json::json!({
            "entity_id": "light.kitchen",
            "name": null,
            "area_id": "kitchen",
            "device_id": null,
            "labels": [],
            "platform": "hue",
            "unique_id": "abc"
        }))
        .unwrap();

        assert_eq!(entry.area_id.as_deref(), Some("kitchen"));
        assert!(entry.name.is_none());
        assert!(!entry.has_entity_name);
    }
}
