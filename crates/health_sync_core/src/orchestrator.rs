//! Single-flight sync coordinator.
//!
//! One run reads the user's selection and destinations, fetches the trailing
//! window of samples for every selected type, normalizes them into a single
//! batch, and delivers that batch to every resolvable destination. Every
//! delivery attempt is appended to the [`SyncLog`] as it completes.

use crate::SyncError;
use crate::adapter::{AdapterRegistry, DestinationAdapter};
use crate::destination::DeliveryResult;
use crate::metric::CanonicalMetric;
use crate::normalizer::MetricNormalizer;
use crate::sample::DataSource;
use crate::settings::SettingsStore;
use crate::status::SyncStatus;
use crate::sync_log::SyncLog;
use crate::utils::trailing_window;
use chrono::{Duration, Utc};
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub const DEFAULT_WINDOW_HOURS: i64 = 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Running,
}

/// Why a run produced the results it did.
#[derive(Clone, Debug, PartialEq)]
pub enum SyncOutcome {
    /// Another run was in flight; nothing happened.
    AlreadyRunning,
    NoMetricsSelected,
    NoDestinationsEnabled,
    /// Every enabled destination has a kind without a registered adapter.
    NoResolvableDestinations,
    Completed(Vec<DeliveryResult>),
}

impl SyncOutcome {
    pub fn into_results(self) -> Vec<DeliveryResult> {
        match self {
            SyncOutcome::Completed(results) => results,
            _ => Vec::new(),
        }
    }

    pub fn results(&self) -> &[DeliveryResult] {
        match self {
            SyncOutcome::Completed(results) => results,
            _ => &[],
        }
    }
}

/// Clears the running flag however the run exits.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SyncOrchestrator {
    settings: Arc<dyn SettingsStore>,
    source: Arc<dyn DataSource>,
    registry: AdapterRegistry,
    log: Arc<RwLock<SyncLog>>,
    running: AtomicBool,
    last_results: RwLock<Vec<DeliveryResult>>,
    window: Duration,
}

impl SyncOrchestrator {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        source: Arc<dyn DataSource>,
        registry: AdapterRegistry,
        log: Arc<RwLock<SyncLog>>,
    ) -> Self {
        Self {
            settings,
            source,
            registry,
            log,
            running: AtomicBool::new(false),
            last_results: RwLock::new(Vec::new()),
            window: Duration::hours(DEFAULT_WINDOW_HOURS),
        }
    }

    /// Override the trailing fetch window.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn state(&self) -> SyncState {
        if self.is_running() {
            SyncState::Running
        } else {
            SyncState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Advisory check for callers; `run` re-reads everything itself.
    pub fn can_start(&self) -> bool {
        !self.is_running()
            && !self.settings.selected_types().is_empty()
            && !self.settings.enabled_destinations().is_empty()
    }

    pub fn log(&self) -> Arc<RwLock<SyncLog>> {
        Arc::clone(&self.log)
    }

    /// Results published by the most recent run.
    pub async fn last_results(&self) -> Vec<DeliveryResult> {
        self.last_results.read().await.clone()
    }

    pub async fn status(&self) -> SyncStatus {
        let results = self.last_results.read().await;
        SyncStatus::from_results(self.is_running(), &results)
    }

    /// Run one sync. An empty list means nothing was attempted; use
    /// [`run_detailed`](Self::run_detailed) to learn why.
    pub async fn run(&self) -> Vec<DeliveryResult> {
        self.run_detailed().await.into_results()
    }

    pub async fn run_detailed(&self) -> SyncOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("sync already running, request ignored");
            return SyncOutcome::AlreadyRunning;
        }
        let _guard = RunGuard(&self.running);
        self.last_results.write().await.clear();

        let outcome = self.execute().await;

        *self.last_results.write().await = outcome.results().to_vec();
        outcome
    }

    async fn execute(&self) -> SyncOutcome {
        let selected = self.settings.selected_types();
        if selected.is_empty() {
            info!("no metric types selected, skipping sync");
            return SyncOutcome::NoMetricsSelected;
        }

        let destinations = self.settings.enabled_destinations();
        if destinations.is_empty() {
            info!("no destinations enabled, skipping sync");
            return SyncOutcome::NoDestinationsEnabled;
        }

        let adapters = self.registry.resolve_enabled(&destinations);
        if adapters.is_empty() {
            info!(
                enabled = destinations.len(),
                "no enabled destination has a registered adapter, skipping sync"
            );
            return SyncOutcome::NoResolvableDestinations;
        }

        let batch = self.collect_metrics(selected.iter().map(String::as_str)).await;
        info!(
            metrics = batch.len(),
            destinations = adapters.len(),
            "delivering metric batch"
        );

        let results = self.deliver_all(&adapters, &batch).await;
        if results.iter().any(|r| r.success) {
            self.settings.set_last_sync_time(Utc::now());
        }

        let successful = results.iter().filter(|r| r.success).count();
        info!(successful, total = results.len(), "sync finished");
        SyncOutcome::Completed(results)
    }

    async fn collect_metrics<'a>(
        &self,
        types: impl Iterator<Item = &'a str>,
    ) -> Vec<CanonicalMetric> {
        let (start, end) = trailing_window(Utc::now(), self.window);
        let mut batch = Vec::new();
        for type_identifier in types {
            match self.source.fetch_samples(type_identifier, start, end).await {
                Ok(samples) => {
                    let before = batch.len();
                    batch.extend(samples.iter().filter_map(MetricNormalizer::normalize));
                    debug!(
                        type_identifier,
                        fetched = samples.len(),
                        normalized = batch.len() - before,
                        "fetched samples"
                    );
                }
                Err(e) => {
                    warn!(type_identifier, error = %e, "failed to fetch samples");
                    metrics::counter!("health_sync_fetch_failures_total").increment(1);
                }
            }
        }
        batch
    }

    async fn deliver_all(
        &self,
        adapters: &[Box<dyn DestinationAdapter>],
        batch: &[CanonicalMetric],
    ) -> Vec<DeliveryResult> {
        let mut pending: FuturesUnordered<_> = adapters
            .iter()
            .map(|adapter| async move {
                let attempt = adapter.deliver(batch).await;
                (&**adapter, attempt)
            })
            .collect();

        let mut results = Vec::with_capacity(adapters.len());
        while let Some((adapter, attempt)) = pending.next().await {
            let result = settle(adapter, batch.len(), attempt);
            let outcome = if result.success { "success" } else { "failure" };
            metrics::counter!(
                "health_sync_deliveries_total",
                "kind" => result.destination_kind.display_name(),
                "outcome" => outcome
            )
            .increment(1);
            self.log.write().await.append(result.clone());
            results.push(result);
        }
        results
    }
}

fn settle(
    adapter: &dyn DestinationAdapter,
    count: usize,
    attempt: Result<DeliveryResult, SyncError>,
) -> DeliveryResult {
    match attempt {
        Ok(result) => result,
        Err(e) => {
            warn!(destination = adapter.name(), error = %e, "adapter failed");
            DeliveryResult::failed(adapter.kind(), count, format!("Sync failed: {e}"))
        }
    }
}
