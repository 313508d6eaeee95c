//! Raw samples and the contract of the platform data store that supplies them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("health data is not available on this device")]
    NotAvailable,
    #[error("health data authorization failed")]
    AuthorizationFailed,
    #[error("failed to query health data: {0}")]
    QueryFailed(String),
    #[error("invalid health data received: {0}")]
    InvalidData(String),
}

/// A numeric measurement in the unit the platform recorded it in.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuantitySample {
    pub type_identifier: String,
    pub value: f64,
    pub unit: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl QuantitySample {
    /// Instantaneous sample: end date equals start date.
    pub fn new(
        type_identifier: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
        start_date: DateTime<Utc>,
    ) -> Self {
        Self {
            type_identifier: type_identifier.into(),
            value,
            unit: unit.into(),
            start_date,
            end_date: start_date,
            source: None,
        }
    }

    pub fn with_end(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = end_date;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// An enumerated observation such as a sleep stage. Not normalizable.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategorySample {
    pub type_identifier: String,
    pub value: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RawSample {
    Quantity(QuantitySample),
    Category(CategorySample),
}

impl RawSample {
    pub fn type_identifier(&self) -> &str {
        match self {
            RawSample::Quantity(s) => &s.type_identifier,
            RawSample::Category(s) => &s.type_identifier,
        }
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        match self {
            RawSample::Quantity(s) => s.start_date,
            RawSample::Category(s) => s.start_date,
        }
    }

    pub fn end_date(&self) -> DateTime<Utc> {
        match self {
            RawSample::Quantity(s) => s.end_date,
            RawSample::Category(s) => s.end_date,
        }
    }

    pub fn as_quantity(&self) -> Option<&QuantitySample> {
        match self {
            RawSample::Quantity(s) => Some(s),
            RawSample::Category(_) => None,
        }
    }
}

impl From<QuantitySample> for RawSample {
    fn from(sample: QuantitySample) -> Self {
        RawSample::Quantity(sample)
    }
}

/// Platform health store queried by the orchestrator.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Samples of `type_identifier` whose start lies within `[start, end]`.
    async fn fetch_samples(
        &self,
        type_identifier: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawSample>, DataSourceError>;
}

/// Reads a JSON array of [`RawSample`] exported from the device.
///
/// The export is re-read on every query so a fresh export is picked up by
/// the next sync without restarting.
#[derive(Clone, Debug)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<RawSample>, DataSourceError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DataSourceError::NotAvailable);
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(DataSourceError::AuthorizationFailed);
            }
            Err(e) => return Err(DataSourceError::QueryFailed(e.to_string())),
        };
        serde_json::from_slice(&bytes).map_err(|e| DataSourceError::InvalidData(e.to_string()))
    }
}

#[async_trait]
impl DataSource for JsonFileSource {
    async fn fetch_samples(
        &self,
        type_identifier: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawSample>, DataSourceError> {
        let mut samples: Vec<RawSample> = self
            .load()
            .await?
            .into_iter()
            .filter(|s| s.type_identifier() == type_identifier)
            .filter(|s| s.start_date() >= start && s.start_date() <= end)
            .collect();
        // newest first, by end date
        samples.sort_by(|a, b| b.end_date().cmp(&a.end_date()));
        Ok(samples)
    }
}
