//! Health metric normalization and delivery pipeline.
//!
//! Raw samples pulled from a platform health store are normalized into
//! [`CanonicalMetric`] records and pushed to every enabled destination by the
//! [`SyncOrchestrator`]. Each delivery attempt is recorded in a bounded
//! [`SyncLog`].

use thiserror::Error;

pub mod adapter;
pub mod config;
pub mod destination;
pub mod metric;
pub mod normalizer;
pub mod orchestrator;
pub mod quantity;
pub mod sample;
pub mod settings;
pub mod status;
pub mod sync_log;
pub mod units;
pub mod utils;

pub use adapter::{AdapterRegistry, DestinationAdapter, RestBulkInsertAdapter};
pub use config::SyncConfig;
pub use destination::{DeliveryResult, DestinationConfig, DestinationKind};
pub use metric::{CanonicalMetric, MetricCategory};
pub use normalizer::MetricNormalizer;
pub use orchestrator::{SyncOrchestrator, SyncOutcome, SyncState};
pub use quantity::QuantityType;
pub use sample::{DataSource, DataSourceError, JsonFileSource, QuantitySample, RawSample};
pub use settings::{JsonSettingsStore, SettingsStore, UserSettings};
pub use status::SyncStatus;
pub use sync_log::SyncLog;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("data source error: {0}")]
    DataSource(#[from] DataSourceError),
    #[error("delivery error: {0}")]
    Delivery(String),
}
