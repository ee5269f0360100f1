//! Typed REST endpoints

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::{Map, Value};

use crate::error::HaResult;
use crate::rest::{format_time, query_string, HaClient};
use crate::types::{
    Calendar, CalendarEvent, Config, ConfigCheckResult, Event, HistoryEntry, HistoryOptions,
    IntentRequest, IntentResponse, LogbookEntry, LogbookOptions, Service, ServiceCallRequest,
    State, StateUpdate, StatusResponse, TemplateRequest,
};

fn flag(value: bool) -> String {
    if value {
        "true".to_string()
    } else {
        String::new()
    }
}

fn optional_time(time: Option<&DateTime<Utc>>) -> String {
    time.map(format_time).unwrap_or_default()
}

impl HaClient {
    /// Check that the API is running
    pub async fn status(&self) -> HaResult<StatusResponse> {
        self.get("/api/").await
    }

    /// Current core configuration
    pub async fn config(&self) -> HaResult<Config> {
        self.get("/api/config").await
    }

    /// Loaded components
    pub async fn components(&self) -> HaResult<Vec<String>> {
        self.get("/api/components").await
    }

    /// Event types with listener counts
    pub async fn events(&self) -> HaResult<Vec<Event>> {
        self.get("/api/events").await
    }

    /// Fire an event with optional data
    pub async fn fire_event(&self, event_type: &str, data: &Map<String, Value>) -> HaResult<()> {
        let path = format!("/api/events/{}", event_type);
        self.execute(Method::POST, &path, Some(data)).await
    }

    /// Available services grouped by domain
    pub async fn services(&self) -> HaResult<Vec<Service>> {
        self.get("/api/services").await
    }

    /// Call a service; returns the states that changed
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        request: Option<&ServiceCallRequest>,
    ) -> HaResult<Vec<State>> {
        let path = format!("/api/services/{}/{}", domain, service);
        self.post(&path, request).await
    }

    /// All entity states
    pub async fn states(&self) -> HaResult<Vec<State>> {
        self.get("/api/states").await
    }

    /// State of one entity
    pub async fn state(&self, entity_id: &str) -> HaResult<State> {
        self.get(&format!("/api/states/{}", entity_id)).await
    }

    /// Create or update the state of an entity
    pub async fn set_state(&self, entity_id: &str, update: &StateUpdate) -> HaResult<State> {
        self.post(&format!("/api/states/{}", entity_id), Some(update))
            .await
    }

    /// Remove an entity's state
    pub async fn delete_state(&self, entity_id: &str) -> HaResult<()> {
        self.delete(&format!("/api/states/{}", entity_id)).await
    }

    /// State history starting at `start`
    pub async fn history(
        &self,
        start: &DateTime<Utc>,
        options: &HistoryOptions,
    ) -> HaResult<Vec<Vec<HistoryEntry>>> {
        let mut params = BTreeMap::new();
        params.insert(
            "filter_entity_id",
            options.filter_entity_id.clone().unwrap_or_default(),
        );
        params.insert("end_time", optional_time(options.end_time.as_ref()));
        params.insert("minimal_response", flag(options.minimal_response));
        params.insert("no_attributes", flag(options.no_attributes));
        params.insert(
            "significant_changes_only",
            flag(options.significant_changes_only),
        );

        let path = format!(
            "/api/history/period/{}{}",
            format_time(start),
            query_string(&params)
        );
        self.get(&path).await
    }

    /// Logbook entries starting at `start`
    pub async fn logbook(
        &self,
        start: &DateTime<Utc>,
        options: &LogbookOptions,
    ) -> HaResult<Vec<LogbookEntry>> {
        let mut params = BTreeMap::new();
        params.insert("entity", options.entity.clone().unwrap_or_default());
        params.insert("end_time", optional_time(options.end_time.as_ref()));

        let path = format!(
            "/api/logbook/{}{}",
            format_time(start),
            query_string(&params)
        );
        self.get(&path).await
    }

    /// Error log as plain text
    pub async fn error_log(&self) -> HaResult<String> {
        self.text(Method::GET, "/api/error_log", None::<&()>).await
    }

    /// Render a template server-side
    pub async fn render_template(&self, template: &str) -> HaResult<String> {
        self.text(Method::POST, "/api/template", Some(&TemplateRequest { template }))
            .await
    }

    /// Validate the configuration
    pub async fn check_config(&self) -> HaResult<ConfigCheckResult> {
        self.post("/api/config/core/check_config", None::<&()>).await
    }

    /// Still image from a camera entity
    pub async fn camera_proxy(&self, entity_id: &str) -> HaResult<Vec<u8>> {
        let path = format!("/api/camera_proxy/{}", entity_id);
        self.bytes(Method::GET, &path, None::<&()>).await
    }

    /// Calendar entities
    pub async fn calendars(&self) -> HaResult<Vec<Calendar>> {
        self.get("/api/calendars").await
    }

    /// Events of a calendar between `start` and `end`
    pub async fn calendar_events(
        &self,
        entity_id: &str,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> HaResult<Vec<CalendarEvent>> {
        let mut params = BTreeMap::new();
        params.insert("start", format_time(start));
        params.insert("end", format_time(end));

        let path = format!("/api/calendars/{}{}", entity_id, query_string(&params));
        self.get(&path).await
    }

    /// Handle an intent
    pub async fn handle_intent(&self, intent: &IntentRequest) -> HaResult<IntentResponse> {
        self.post("/api/intent/handle", Some(intent)).await
    }
}
