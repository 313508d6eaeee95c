use async_trait::async_trait;
use chrono::{DateTime, Utc};
use health_sync_core::adapter::{API_KEY_SETTING, COLLECTION_NAME_SETTING, ENDPOINT_BASE_SETTING};
use health_sync_core::sample::CategorySample;
use health_sync_core::{
    AdapterRegistry, DataSource, DataSourceError, DestinationConfig, DestinationKind,
    JsonSettingsStore, QuantitySample, RawSample, SettingsStore, SyncLog, SyncOrchestrator,
    SyncOutcome, SyncState, UserSettings,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HEART_RATE: &str = "HKQuantityTypeIdentifierHeartRate";
const STEPS: &str = "HKQuantityTypeIdentifierStepCount";

#[derive(Default)]
struct MemorySource {
    samples: HashMap<String, Vec<RawSample>>,
    failing: Vec<String>,
}

impl MemorySource {
    fn with(mut self, sample: impl Into<RawSample>) -> Self {
        let sample = sample.into();
        self.samples
            .entry(sample.type_identifier().to_string())
            .or_default()
            .push(sample);
        self
    }

    fn failing(mut self, type_identifier: &str) -> Self {
        self.failing.push(type_identifier.to_string());
        self
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch_samples(
        &self,
        type_identifier: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawSample>, DataSourceError> {
        if self.failing.iter().any(|t| t == type_identifier) {
            return Err(DataSourceError::QueryFailed("store locked".into()));
        }
        Ok(self
            .samples
            .get(type_identifier)
            .into_iter()
            .flatten()
            .filter(|s| s.start_date() >= start && s.start_date() <= end)
            .cloned()
            .collect())
    }
}

/// Holds every fetch until released.
struct GatedSource {
    started: Notify,
    release: Notify,
}

#[async_trait]
impl DataSource for GatedSource {
    async fn fetch_samples(
        &self,
        _type_identifier: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<RawSample>, DataSourceError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(Vec::new())
    }
}

struct Harness {
    settings: Arc<JsonSettingsStore>,
    log: Arc<RwLock<SyncLog>>,
    orchestrator: Arc<SyncOrchestrator>,
}

fn harness(settings: UserSettings, source: impl DataSource + 'static) -> Harness {
    let settings = Arc::new(JsonSettingsStore::in_memory(settings));
    let log = Arc::new(RwLock::new(SyncLog::in_memory()));
    let registry = AdapterRegistry::with_defaults(Duration::from_secs(5)).unwrap();
    let orchestrator = Arc::new(SyncOrchestrator::new(
        settings.clone(),
        Arc::new(source),
        registry,
        log.clone(),
    ));
    Harness {
        settings,
        log,
        orchestrator,
    }
}

fn settings(types: &[&str], destinations: Vec<DestinationConfig>) -> UserSettings {
    UserSettings {
        selected_types: types.iter().map(|t| t.to_string()).collect(),
        destinations,
        ..UserSettings::default()
    }
}

fn rest_destination(name: &str, endpoint: &str) -> DestinationConfig {
    DestinationConfig::new(name, DestinationKind::Supabase)
        .with_setting(ENDPOINT_BASE_SETTING, endpoint)
        .with_setting(API_KEY_SETTING, "key")
        .with_setting(COLLECTION_NAME_SETTING, "health_metrics")
}

fn heart_rate(bpm: f64) -> QuantitySample {
    QuantitySample::new(HEART_RATE, bpm, "count/min", Utc::now() - chrono::Duration::minutes(5))
}

async fn server(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/health_metrics"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn nothing_selected_returns_empty_and_leaves_log() {
    let server = server(201).await;
    let h = harness(
        settings(&[], vec![rest_destination("db", &server.uri())]),
        MemorySource::default().with(heart_rate(70.0)),
    );

    assert!(h.orchestrator.run().await.is_empty());
    assert!(h.log.read().await.is_empty());
    assert_eq!(h.settings.last_sync_time(), None);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn no_destinations_returns_empty() {
    let h = harness(
        settings(&[HEART_RATE], vec![]),
        MemorySource::default().with(heart_rate(70.0)),
    );
    assert_eq!(
        h.orchestrator.run_detailed().await,
        SyncOutcome::NoDestinationsEnabled
    );
    assert!(h.log.read().await.is_empty());
}

#[tokio::test]
async fn disabled_destinations_do_not_count() {
    let server = server(201).await;
    let h = harness(
        settings(
            &[HEART_RATE],
            vec![rest_destination("db", &server.uri()).with_enabled(false)],
        ),
        MemorySource::default().with(heart_rate(70.0)),
    );
    assert!(!h.orchestrator.can_start());
    assert!(h.orchestrator.run().await.is_empty());
}

#[tokio::test]
async fn unresolvable_kinds_return_empty() {
    let h = harness(
        settings(
            &[HEART_RATE],
            vec![
                DestinationConfig::new("sheet", DestinationKind::GoogleSheets),
                DestinationConfig::new("zap", DestinationKind::Zapier),
            ],
        ),
        MemorySource::default().with(heart_rate(70.0)),
    );
    assert!(h.orchestrator.can_start());
    assert_eq!(
        h.orchestrator.run_detailed().await,
        SyncOutcome::NoResolvableDestinations
    );
    assert!(h.log.read().await.is_empty());
}

#[tokio::test]
async fn empty_settings_fail_with_invalid_configuration() {
    let h = harness(
        settings(
            &[HEART_RATE],
            vec![DestinationConfig::new("blank", DestinationKind::Supabase)],
        ),
        MemorySource::default().with(heart_rate(70.0)),
    );

    let results = h.orchestrator.run().await;
    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert!(results[0].error_message.as_deref().unwrap().contains("Invalid configuration"));
    assert_eq!(results[0].response_code, None);
    assert_eq!(h.log.read().await.len(), 1);
    assert_eq!(h.settings.last_sync_time(), None);
}

#[tokio::test]
async fn successful_delivery_updates_last_sync_time() {
    let server = server(201).await;
    let h = harness(
        settings(&[HEART_RATE], vec![rest_destination("db", &server.uri())]),
        MemorySource::default()
            .with(heart_rate(61.0))
            .with(heart_rate(62.0))
            .with(heart_rate(63.0)),
    );

    let before = Utc::now();
    let results = h.orchestrator.run().await;
    let after = Utc::now();

    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(results[0].metrics_count, 3);
    assert_eq!(results[0].response_code, Some(201));

    let synced = h.settings.last_sync_time().expect("last sync time");
    assert!(synced >= before && synced <= after);
    assert_eq!(h.orchestrator.last_results().await, results);
    assert_eq!(
        h.orchestrator.status().await.to_string(),
        "Last sync: 1/1 successful"
    );
}

#[tokio::test]
async fn one_success_among_failures_still_counts() {
    let ok = server(200).await;
    let broken = server(500).await;
    let h = harness(
        settings(
            &[HEART_RATE],
            vec![
                rest_destination("ok", &ok.uri()),
                rest_destination("broken", &broken.uri()),
            ],
        ),
        MemorySource::default().with(heart_rate(70.0)),
    );

    let results = h.orchestrator.run().await;
    assert_eq!(results.len(), 2);
    assert_eq!(results.iter().filter(|r| r.success).count(), 1);
    let failed = results.iter().find(|r| !r.success).unwrap();
    assert_eq!(failed.response_code, Some(500));
    assert!(h.settings.last_sync_time().is_some());
    assert_eq!(h.log.read().await.len(), 2);
}

#[tokio::test]
async fn log_records_deliveries_in_completion_order() {
    let slow = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_millis(300)))
        .mount(&slow)
        .await;
    let fast = server(200).await;

    let h = harness(
        settings(
            &[HEART_RATE],
            vec![
                rest_destination("slow", &slow.uri()),
                rest_destination("fast", &fast.uri()),
            ],
        ),
        MemorySource::default().with(heart_rate(70.0)),
    );

    let results = h.orchestrator.run().await;
    assert_eq!(results[0].response_code, Some(200));
    assert_eq!(results[1].response_code, Some(201));

    let log = h.log.read().await;
    assert_eq!(log.entries()[0].response_code, Some(201));
    assert_eq!(log.entries()[1].response_code, Some(200));
}

#[tokio::test]
async fn fetch_failures_skip_only_that_type() {
    let server = server(201).await;
    let h = harness(
        settings(
            &[HEART_RATE, STEPS],
            vec![rest_destination("db", &server.uri())],
        ),
        MemorySource::default()
            .with(heart_rate(70.0))
            .failing(STEPS),
    );

    let results = h.orchestrator.run().await;
    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(results[0].metrics_count, 1);
}

#[tokio::test]
async fn category_samples_and_stale_samples_are_not_delivered() {
    let server = server(201).await;
    let now = Utc::now();
    let sleep = CategorySample {
        type_identifier: HEART_RATE.into(),
        value: 1,
        start_date: now,
        end_date: now,
        source: None,
    };
    let stale = QuantitySample::new(HEART_RATE, 80.0, "count/min", now - chrono::Duration::days(3));
    let h = harness(
        settings(&[HEART_RATE], vec![rest_destination("db", &server.uri())]),
        MemorySource::default()
            .with(heart_rate(70.0))
            .with(RawSample::Category(sleep))
            .with(stale),
    );

    let results = h.orchestrator.run().await;
    assert_eq!(results[0].metrics_count, 1);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert!((body[0]["value"].as_f64().unwrap() - 70.0).abs() < 1e-9);
    assert_eq!(body[0]["unit"], "bpm");
}

#[tokio::test]
async fn empty_batch_is_still_delivered() {
    let server = server(201).await;
    let h = harness(
        settings(&[HEART_RATE], vec![rest_destination("db", &server.uri())]),
        MemorySource::default(),
    );

    let results = h.orchestrator.run().await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].metrics_count, 0);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].body, b"[]");
}

#[tokio::test]
async fn concurrent_run_is_rejected_without_side_effects() {
    let server = server(201).await;
    let source = Arc::new(GatedSource {
        started: Notify::new(),
        release: Notify::new(),
    });
    let settings_store = Arc::new(JsonSettingsStore::in_memory(settings(
        &[HEART_RATE],
        vec![rest_destination("db", &server.uri())],
    )));
    let log = Arc::new(RwLock::new(SyncLog::in_memory()));
    let orchestrator = Arc::new(SyncOrchestrator::new(
        settings_store.clone(),
        source.clone(),
        AdapterRegistry::with_defaults(Duration::from_secs(5)).unwrap(),
        log.clone(),
    ));

    let first = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.run().await }
    });
    source.started.notified().await;

    assert_eq!(orchestrator.state(), SyncState::Running);
    assert!(!orchestrator.can_start());
    assert_eq!(orchestrator.status().await.to_string(), "Syncing...");
    assert_eq!(
        orchestrator.run_detailed().await,
        SyncOutcome::AlreadyRunning
    );
    assert!(log.read().await.is_empty());
    assert_eq!(settings_store.last_sync_time(), None);

    source.release.notify_one();
    let results = first.await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(orchestrator.state(), SyncState::Idle);
    assert_eq!(log.read().await.len(), 1);
}
