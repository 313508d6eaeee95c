//! REST bulk-insert adapter.
//!
//! Posts the metric batch as one JSON array to
//! `{endpointBase}/rest/v1/{collectionName}`, authenticating with the API key
//! both as an `apikey` header and as a bearer token.

use super::DestinationAdapter;
use crate::SyncError;
use crate::destination::{DeliveryResult, DestinationConfig, DestinationKind};
use crate::metric::CanonicalMetric;
use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

pub const ENDPOINT_BASE_SETTING: &str = "endpointBase";
pub const API_KEY_SETTING: &str = "apiKey";
pub const COLLECTION_NAME_SETTING: &str = "collectionName";
pub const REST_PATH: &str = "rest/v1";

const INVALID_CONFIGURATION: &str =
    "Invalid configuration: Missing endpoint URL, API key, or collection name";

#[derive(Clone, Debug)]
pub struct RestBulkInsertAdapter {
    name: String,
    kind: DestinationKind,
    endpoint_base: Option<String>,
    api_key: Option<SecretString>,
    collection_name: Option<String>,
    client: reqwest::Client,
}

impl RestBulkInsertAdapter {
    /// Build an adapter from a destination's settings. Missing settings are
    /// not an error here; they surface through [`validate`](DestinationAdapter::validate).
    pub fn new(destination: &DestinationConfig, client: reqwest::Client) -> Self {
        Self {
            name: destination.name.clone(),
            kind: destination.kind,
            endpoint_base: destination
                .setting(ENDPOINT_BASE_SETTING)
                .map(|s| s.trim().trim_end_matches('/').to_string()),
            api_key: destination
                .setting(API_KEY_SETTING)
                .map(|s| SecretString::new(s.into())),
            collection_name: destination
                .setting(COLLECTION_NAME_SETTING)
                .map(|s| s.trim().to_string()),
            client,
        }
    }

    fn endpoint_is_valid(&self) -> bool {
        let Some(base) = self.endpoint_base.as_deref() else {
            return false;
        };
        match Url::parse(base) {
            Ok(url) => {
                matches!(url.scheme(), "http" | "https")
                    && url.host_str().is_some_and(|h| !h.is_empty())
            }
            Err(_) => false,
        }
    }

    /// Full insert URL, or `None` when the settings do not form one.
    pub fn target_url(&self) -> Option<Url> {
        let base = self.endpoint_base.as_deref()?;
        let collection = self.collection_name.as_deref()?;
        Url::parse(&format!("{base}/{REST_PATH}/{collection}")).ok()
    }
}

#[async_trait]
impl DestinationAdapter for RestBulkInsertAdapter {
    fn kind(&self) -> DestinationKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> bool {
        self.api_key.is_some() && self.collection_name.is_some() && self.endpoint_is_valid()
    }

    async fn deliver(&self, metrics: &[CanonicalMetric]) -> Result<DeliveryResult, SyncError> {
        let count = metrics.len();

        if !self.validate() {
            warn!(destination = %self.name, "destination settings are incomplete");
            return Ok(DeliveryResult::failed(self.kind, count, INVALID_CONFIGURATION));
        }
        let (Some(url), Some(api_key)) = (self.target_url(), self.api_key.as_ref()) else {
            return Ok(DeliveryResult::failed(
                self.kind,
                count,
                "Invalid URL configuration",
            ));
        };

        let body = match serde_json::to_vec(metrics) {
            Ok(body) => body,
            Err(e) => {
                return Ok(DeliveryResult::failed(
                    self.kind,
                    count,
                    format!("Failed to encode metrics: {e}"),
                ));
            }
        };

        debug!(destination = %self.name, %url, metrics = count, "posting metric batch");
        let key = api_key.expose_secret();
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header("apikey", key)
            .bearer_auth(key)
            .header("Prefer", "return=minimal")
            .body(body);

        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(destination = %self.name, error = %e, "delivery request failed");
                return Ok(DeliveryResult::failed(
                    self.kind,
                    count,
                    format!("Network error: {e}"),
                ));
            }
        };

        let status = resp.status();
        let code = status.as_u16();
        let body = resp.text().await.ok();
        if status.is_success() {
            Ok(DeliveryResult::succeeded(self.kind, count).with_response(code, body))
        } else {
            let snippet: String = body.as_deref().unwrap_or_default().chars().take(256).collect();
            warn!(destination = %self.name, status = code, body = %snippet, "destination rejected batch");
            Ok(DeliveryResult::failed(self.kind, count, format!("HTTP Error: {code}"))
                .with_response(code, body))
        }
    }
}
