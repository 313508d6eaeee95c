//! Registry mapping destination kinds to adapter factories.

use super::{DestinationAdapter, RestBulkInsertAdapter};
use crate::SyncError;
use crate::destination::{DestinationConfig, DestinationKind};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Builds an adapter for one destination.
pub trait AdapterFactory: Send + Sync {
    fn create(&self, destination: &DestinationConfig) -> Box<dyn DestinationAdapter>;
}

impl<F> AdapterFactory for F
where
    F: Fn(&DestinationConfig) -> Box<dyn DestinationAdapter> + Send + Sync,
{
    fn create(&self, destination: &DestinationConfig) -> Box<dyn DestinationAdapter> {
        self(destination)
    }
}

struct RestFactory {
    client: reqwest::Client,
}

impl AdapterFactory for RestFactory {
    fn create(&self, destination: &DestinationConfig) -> Box<dyn DestinationAdapter> {
        Box::new(RestBulkInsertAdapter::new(destination, self.client.clone()))
    }
}

/// Kinds without a registered factory resolve to no adapter; such
/// destinations are skipped rather than reported.
#[derive(Default)]
pub struct AdapterRegistry {
    factories: HashMap<DestinationKind, Box<dyn AdapterFactory>>,
}

impl AdapterRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in adapter. The REST adapter shares one HTTP
    /// client whose requests time out after `timeout`.
    pub fn with_defaults(timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let mut registry = Self::new();
        registry.register(DestinationKind::Supabase, RestFactory { client });

        info!(
            "Adapter registry initialized with {} adapter(s): {:?}",
            registry.factories.len(),
            registry.supported_kinds()
        );
        Ok(registry)
    }

    /// Register or replace the factory for `kind`.
    pub fn register(&mut self, kind: DestinationKind, factory: impl AdapterFactory + 'static) {
        self.factories.insert(kind, Box::new(factory));
    }

    pub fn is_registered(&self, kind: DestinationKind) -> bool {
        self.factories.contains_key(&kind)
    }

    pub fn supported_kinds(&self) -> Vec<DestinationKind> {
        let mut kinds: Vec<_> = self.factories.keys().copied().collect();
        kinds.sort_by_key(|k| k.display_name());
        kinds
    }

    pub fn resolve(&self, destination: &DestinationConfig) -> Option<Box<dyn DestinationAdapter>> {
        match self.factories.get(&destination.kind) {
            Some(factory) => Some(factory.create(destination)),
            None => {
                debug!(
                    destination = %destination.name,
                    kind = destination.kind.display_name(),
                    "no adapter registered for destination kind"
                );
                None
            }
        }
    }

    /// Adapters for every enabled destination that resolves.
    pub fn resolve_enabled(
        &self,
        destinations: &[DestinationConfig],
    ) -> Vec<Box<dyn DestinationAdapter>> {
        destinations
            .iter()
            .filter(|d| d.enabled)
            .filter_map(|d| self.resolve(d))
            .collect()
    }
}
