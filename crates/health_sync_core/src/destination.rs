//! Destination configuration and per-attempt delivery results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Tag selecting which adapter handles a destination.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum DestinationKind {
    Supabase,
    GoogleSheets,
    Zapier,
    #[serde(rename = "customAPI")]
    CustomApi,
    #[serde(other)]
    Unknown,
}

impl DestinationKind {
    pub fn display_name(self) -> &'static str {
        match self {
            DestinationKind::Supabase => "Supabase",
            DestinationKind::GoogleSheets => "Google Sheets",
            DestinationKind::Zapier => "Zapier",
            DestinationKind::CustomApi => "Custom API",
            DestinationKind::Unknown => "Unknown",
        }
    }
}

/// A user-configured remote endpoint.
///
/// `id` is fixed at creation; every other field changes only through
/// whole-record replacement in the settings store.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DestinationConfig {
    pub id: Uuid,
    pub name: String,
    pub kind: DestinationKind,
    pub enabled: bool,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

impl DestinationConfig {
    pub fn new(name: impl Into<String>, kind: DestinationKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            enabled: true,
            settings: BTreeMap::new(),
        }
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Non-empty setting value.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Outcome of one delivery attempt against one destination.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub destination_kind: DestinationKind,
    pub metrics_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
}

impl DeliveryResult {
    pub fn succeeded(kind: DestinationKind, metrics_count: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            success: true,
            destination_kind: kind,
            metrics_count,
            error_message: None,
            response_code: None,
            response_body: None,
        }
    }

    pub fn failed(kind: DestinationKind, metrics_count: usize, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            ..Self::succeeded(kind, metrics_count)
        }
    }

    pub fn with_response(mut self, code: u16, body: Option<String>) -> Self {
        self.response_code = Some(code);
        self.response_body = body;
        self
    }
}
