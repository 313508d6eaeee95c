//! Destination adapters
//!
//! An adapter implements delivery for one [`DestinationKind`]. Adapters are
//! built per destination by the [`AdapterRegistry`] at sync time.

mod registry;
mod rest;

pub use registry::{AdapterFactory, AdapterRegistry};
pub use rest::{
    API_KEY_SETTING, COLLECTION_NAME_SETTING, ENDPOINT_BASE_SETTING, REST_PATH,
    RestBulkInsertAdapter,
};

use crate::SyncError;
use crate::destination::{DeliveryResult, DestinationKind};
use crate::metric::CanonicalMetric;
use async_trait::async_trait;

/// Delivery contract shared by every destination kind.
#[async_trait]
pub trait DestinationAdapter: Send + Sync {
    fn kind(&self) -> DestinationKind;

    /// User-facing destination name, used in logs.
    fn name(&self) -> &str;

    /// Check required settings without touching the network.
    fn validate(&self) -> bool;

    /// Submit the whole batch once.
    ///
    /// Failures are reported inside the returned [`DeliveryResult`]. An `Err`
    /// means the adapter could not even produce a result; the orchestrator
    /// records it as a failed delivery.
    async fn deliver(&self, metrics: &[CanonicalMetric]) -> Result<DeliveryResult, SyncError>;
}
