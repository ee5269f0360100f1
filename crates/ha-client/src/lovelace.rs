//! Lovelace dashboards over the WebSocket API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::HaResult;
use crate::websocket::WsClient;

/// Dashboard metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub url_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub show_in_sidebar: bool,
    #[serde(default)]
    pub require_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default)]
    pub allow_single_word: bool,
}

/// Dashboard content: views, cards, strategy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<View>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Full config as received, for pass-through
    #[serde(skip)]
    pub raw: Value,
}

/// A view (tab)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct View {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default)]
    pub panel: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub badges: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<Value>,
    #[serde(default)]
    pub subview: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
}

/// Dashboard or view generation strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    #[serde(rename = "type")]
    pub strategy_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

/// Registered frontend resource (custom card, theme, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub url: String,
}

/// New dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateDashboardRequest {
    pub url_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub show_in_sidebar: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub require_admin: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_single_word: bool,
}

/// Partial dashboard update; unset fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDashboardRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_in_sidebar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_single_word: Option<bool>,
}

// =============================================================================
// Commands
// =============================================================================

#[derive(Serialize)]
struct ConfigCommand<'a> {
    #[serde(rename = "type")]
    msg_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url_path: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    force: bool,
}

#[derive(Serialize)]
struct SaveConfigCommand<'a, C: Serialize + ?Sized> {
    #[serde(rename = "type")]
    msg_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url_path: Option<&'a str>,
    config: &'a C,
}

#[derive(Serialize)]
struct CreateDashboardCommand<'a> {
    #[serde(rename = "type")]
    msg_type: &'static str,
    #[serde(flatten)]
    request: &'a CreateDashboardRequest,
}

#[derive(Serialize)]
struct UpdateDashboardCommand<'a> {
    #[serde(rename = "type")]
    msg_type: &'static str,
    dashboard_id: &'a str,
    #[serde(flatten)]
    request: &'a UpdateDashboardRequest,
}

#[derive(Serialize)]
struct DashboardIdCommand<'a> {
    #[serde(rename = "type")]
    msg_type: &'static str,
    dashboard_id: &'a str,
}

#[derive(Serialize)]
struct TypeOnlyCommand {
    #[serde(rename = "type")]
    msg_type: &'static str,
}

impl WsClient {
    /// All dashboards, storage and YAML mode
    pub async fn lovelace_dashboards(&self) -> HaResult<Vec<Dashboard>> {
        self.call_as(&TypeOnlyCommand {
            msg_type: "lovelace/dashboards/list",
        })
        .await
    }

    /// Raw config of a dashboard; `None` selects the default dashboard
    ///
    /// `force` bypasses the server-side cache.
    pub async fn lovelace_config(&self, url_path: Option<&str>, force: bool) -> HaResult<Value> {
        self.call(&ConfigCommand {
            msg_type: "lovelace/config",
            url_path,
            force,
        })
        .await
    }

    /// Parsed config of a dashboard, keeping the raw JSON alongside
    pub async fn lovelace_config_parsed(&self, url_path: Option<&str>) -> HaResult<DashboardConfig> {
        let raw = self.lovelace_config(url_path, false).await?;
        let mut config: DashboardConfig = serde_json::from_value(raw.clone())?;
        config.raw = raw;
        Ok(config)
    }

    /// Save a dashboard config (admin only)
    ///
    /// `config` may be a [`DashboardConfig`], a map, or raw JSON.
    pub async fn lovelace_save_config<C>(&self, url_path: Option<&str>, config: &C) -> HaResult<()>
    where
        C: Serialize + ?Sized,
    {
        self.call(&SaveConfigCommand {
            msg_type: "lovelace/config/save",
            url_path,
            config,
        })
        .await?;
        Ok(())
    }

    /// Delete a dashboard config, reverting it to auto-generated (admin only)
    pub async fn lovelace_delete_config(&self, url_path: Option<&str>) -> HaResult<()> {
        self.call(&ConfigCommand {
            msg_type: "lovelace/config/delete",
            url_path,
            force: false,
        })
        .await?;
        Ok(())
    }

    /// Create a dashboard (admin only)
    pub async fn lovelace_create_dashboard(
        &self,
        request: &CreateDashboardRequest,
    ) -> HaResult<Dashboard> {
        self.call_as(&CreateDashboardCommand {
            msg_type: "lovelace/dashboards/create",
            request,
        })
        .await
    }

    /// Update a dashboard's metadata (admin only)
    pub async fn lovelace_update_dashboard(
        &self,
        dashboard_id: &str,
        request: &UpdateDashboardRequest,
    ) -> HaResult<Dashboard> {
        self.call_as(&UpdateDashboardCommand {
            msg_type: "lovelace/dashboards/update",
            dashboard_id,
            request,
        })
        .await
    }

    /// Delete a dashboard entirely (admin only)
    pub async fn lovelace_delete_dashboard(&self, dashboard_id: &str) -> HaResult<()> {
        self.call(&DashboardIdCommand {
            msg_type: "lovelace/dashboards/delete",
            dashboard_id,
        })
        .await?;
        Ok(())
    }

    /// Registered frontend resources
    pub async fn lovelace_resources(&self) -> HaResult<Vec<Resource>> {
        self.call_as(&TypeOnlyCommand {
            msg_type: "lovelace/resources",
        })
        .await
    }
}
