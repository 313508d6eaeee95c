//! Command-line front end for the health sync pipeline.
//!
//! The binary is a thin trigger: each invocation opens the settings store and
//! sync log from disk, performs one command, and exits. Periodic syncing is
//! left to an external scheduler such as cron.

use anyhow::{Context, Result, bail};
use chrono::Duration;
use clap::{Parser, Subcommand};
use health_sync_core::config::SyncConfig;
use health_sync_core::utils::{format_timestamp, parse_timestamp};
use health_sync_core::{
    AdapterRegistry, DeliveryResult, DestinationConfig, DestinationKind, JsonFileSource,
    JsonSettingsStore, MetricCategory, QuantityType, SettingsStore, SyncLog, SyncOrchestrator,
    SyncOutcome, metric,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

pub const LOG_LEVEL_ENV: &str = "HEALTH_SYNC_LOG_LEVEL";

const QUIET_TARGETS: &str = "hyper=warn,hyper_util=warn,reqwest=warn";

/// Log filter from `HEALTH_SYNC_LOG_LEVEL`, then `RUST_LOG`, then `info`.
pub fn log_filter_with<F>(mut get: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    get(LOG_LEVEL_ENV)
        .or_else(|| get("RUST_LOG"))
        .unwrap_or_else(|| "info".to_string())
}

/// Build the subscriber filter, keeping HTTP internals quiet unless asked.
pub fn env_filter(log_env: &str) -> EnvFilter {
    EnvFilter::try_new(format!("{log_env},{QUIET_TARGETS}"))
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{QUIET_TARGETS}")))
}

pub fn init_tracing() {
    let log_env = log_filter_with(|k| std::env::var(k).ok());
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter(&log_env))
        .init();
    tracing::debug!("health-sync: log filter: {}", log_env);
}

#[derive(Debug, Parser)]
#[command(name = "health-sync", version, about = "Normalize health samples and push them to remote destinations")]
pub struct Cli {
    /// Settings file (overrides HEALTH_SYNC_SETTINGS_PATH)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,
    /// Sync log file (overrides HEALTH_SYNC_LOG_PATH)
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,
    /// Exported samples file (overrides HEALTH_SYNC_SAMPLES_PATH)
    #[arg(long, global = true)]
    pub samples: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Apply path flags on top of an environment-derived config.
    pub fn config(&self, mut config: SyncConfig) -> SyncConfig {
        if let Some(path) = &self.settings {
            config.settings_path = path.clone();
        }
        if let Some(path) = &self.log {
            config.log_path = path.clone();
        }
        if let Some(path) = &self.samples {
            config.samples_path = path.clone();
        }
        config
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one sync now
    Sync {
        /// Length of the trailing fetch window in hours
        #[arg(long, default_value_t = 24, value_parser = clap::value_parser!(i64).range(1..))]
        window_hours: i64,
        /// Print delivery results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show selection, destinations and the last sync
    Status,
    /// Show recent delivery attempts, newest first
    Log {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Only entries at or after this time (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_since)]
        since: Option<chrono::DateTime<chrono::Utc>>,
        #[arg(long)]
        json: bool,
    },
    /// Delete every log entry
    ClearLog,
    /// List known quantity types
    Types {
        #[arg(long, value_parser = parse_category)]
        category: Option<MetricCategory>,
    },
    /// Replace the set of type identifiers to sync
    Select {
        #[arg(required = true)]
        types: Vec<String>,
    },
    /// Manage destinations
    #[command(subcommand)]
    Destinations(DestinationCommand),
    /// Print settings as JSON
    Export,
    /// Replace settings from a JSON file
    Import { file: PathBuf },
    /// Print the JSON Schema of the delivered metric batch
    Schema,
}

#[derive(Debug, Subcommand)]
pub enum DestinationCommand {
    List,
    Add {
        name: String,
        #[arg(long, value_parser = parse_kind)]
        kind: DestinationKind,
        /// Setting as key=value, repeatable
        #[arg(id = "set", long = "set", value_parser = parse_setting)]
        settings: Vec<(String, String)>,
        #[arg(long)]
        disabled: bool,
    },
    Remove { id: Uuid },
    Enable { id: Uuid },
    Disable { id: Uuid },
}

fn parse_since(s: &str) -> Result<chrono::DateTime<chrono::Utc>, String> {
    parse_timestamp(s).ok_or_else(|| format!("invalid timestamp: {s}"))
}

pub fn parse_category(s: &str) -> Result<MetricCategory, String> {
    serde_json::from_value(serde_json::Value::String(s.to_ascii_lowercase()))
        .map_err(|_| format!("unknown category: {s}"))
}

pub fn parse_kind(s: &str) -> Result<DestinationKind, String> {
    match serde_json::from_value(serde_json::Value::String(s.to_string())) {
        Ok(DestinationKind::Unknown) | Err(_) => Err(format!("unknown destination kind: {s}")),
        Ok(kind) => Ok(kind),
    }
}

pub fn parse_setting(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected key=value, got: {s}")),
    }
}

/// Execute `command` against the stores named by `config`, writing
/// human-readable output to `out`.
pub async fn run(command: Command, config: &SyncConfig, out: &mut impl Write) -> Result<()> {
    let settings = Arc::new(JsonSettingsStore::open(&config.settings_path));
    match command {
        Command::Sync { window_hours, json } => {
            sync(config, settings, Duration::hours(window_hours), json, out).await
        }
        Command::Status => status(config, &settings, out),
        Command::Log { limit, since, json } => {
            let log = SyncLog::open(&config.log_path);
            let entries: Vec<&DeliveryResult> = log
                .entries()
                .iter()
                .filter(|r| since.is_none_or(|s| r.timestamp >= s))
                .take(limit)
                .collect();
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
            } else if entries.is_empty() {
                writeln!(out, "No delivery attempts recorded")?;
            } else {
                for entry in entries {
                    writeln!(out, "{}", describe(entry))?;
                }
            }
            Ok(())
        }
        Command::ClearLog => {
            let mut log = SyncLog::open(&config.log_path);
            let removed = log.len();
            log.clear();
            writeln!(out, "Removed {removed} log entries")?;
            Ok(())
        }
        Command::Types { category } => {
            let selected = settings.selected_types();
            for kind in QuantityType::ALL
                .iter()
                .filter(|k| category.is_none_or(|c| k.category() == c))
            {
                let mark = if selected.contains(kind.identifier()) { '*' } else { ' ' };
                writeln!(
                    out,
                    "{mark} {:<10} {:<28} {:<8} {}",
                    kind.category().display_name(),
                    kind.display_name(),
                    kind.unit_label(),
                    kind.identifier()
                )?;
            }
            Ok(())
        }
        Command::Select { types } => {
            for t in types.iter().filter(|t| QuantityType::from_identifier(t).is_none()) {
                tracing::warn!(type_identifier = %t, "not a known quantity type; it will sync with raw values");
            }
            let count = types.len();
            settings.update_selected_types(types)?;
            writeln!(out, "Selected {count} type(s)")?;
            Ok(())
        }
        Command::Destinations(action) => destinations(action, &settings, out),
        Command::Export => {
            writeln!(out, "{}", settings.export_json()?)?;
            Ok(())
        }
        Command::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            settings
                .import_json(&json)
                .with_context(|| format!("importing {}", file.display()))?;
            writeln!(out, "Imported settings from {}", file.display())?;
            Ok(())
        }
        Command::Schema => {
            writeln!(out, "{}", serde_json::to_string_pretty(&metric::batch_schema())?)?;
            Ok(())
        }
    }
}

async fn sync(
    config: &SyncConfig,
    settings: Arc<JsonSettingsStore>,
    window: Duration,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let registry = AdapterRegistry::with_defaults(config.http_timeout)?;
    let log = Arc::new(RwLock::new(SyncLog::open(&config.log_path)));
    let orchestrator = SyncOrchestrator::new(
        settings,
        Arc::new(JsonFileSource::new(&config.samples_path)),
        registry,
        log,
    )
    .with_window(window);

    let outcome = orchestrator.run_detailed().await;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(outcome.results())?)?;
        return Ok(());
    }
    match &outcome {
        SyncOutcome::AlreadyRunning => writeln!(out, "A sync is already running")?,
        SyncOutcome::NoMetricsSelected => writeln!(out, "Nothing to sync: no metric types selected")?,
        SyncOutcome::NoDestinationsEnabled => {
            writeln!(out, "Nothing to sync: no destinations enabled")?
        }
        SyncOutcome::NoResolvableDestinations => writeln!(
            out,
            "Nothing to sync: no enabled destination has a supported kind"
        )?,
        SyncOutcome::Completed(results) => {
            for result in results {
                writeln!(out, "{}", describe(result))?;
            }
        }
    }
    writeln!(out, "{}", orchestrator.status().await)?;
    Ok(())
}

fn status(config: &SyncConfig, settings: &JsonSettingsStore, out: &mut impl Write) -> Result<()> {
    let snapshot = settings.snapshot();
    let enabled = snapshot.destinations.iter().filter(|d| d.enabled).count();
    let log = SyncLog::open(&config.log_path);

    writeln!(out, "Selected types: {}", snapshot.selected_types.len())?;
    writeln!(
        out,
        "Destinations: {enabled} enabled of {}",
        snapshot.destinations.len()
    )?;
    writeln!(
        out,
        "Sync interval: {}s",
        settings.sync_interval().as_secs()
    )?;
    match settings.last_sync_time() {
        Some(at) => writeln!(out, "Last successful sync: {}", format_timestamp(at))?,
        None => writeln!(out, "Last successful sync: never")?,
    }
    writeln!(out, "Log entries: {}", log.len())?;
    if let Some(latest) = log.latest() {
        writeln!(out, "Latest attempt: {}", describe(latest))?;
    }
    Ok(())
}

fn destinations(
    action: DestinationCommand,
    settings: &JsonSettingsStore,
    out: &mut impl Write,
) -> Result<()> {
    match action {
        DestinationCommand::List => {
            let all = settings.destinations();
            if all.is_empty() {
                writeln!(out, "No destinations configured")?;
            }
            for d in all {
                let state = if d.enabled { "enabled" } else { "disabled" };
                let keys: Vec<&str> = d.settings.keys().map(String::as_str).collect();
                writeln!(
                    out,
                    "{} {:<16} {:<13} {:<8} [{}]",
                    d.id,
                    d.name,
                    d.kind.display_name(),
                    state,
                    keys.join(", ")
                )?;
            }
        }
        DestinationCommand::Add {
            name,
            kind,
            settings: pairs,
            disabled,
        } => {
            let destination = pairs
                .into_iter()
                .fold(DestinationConfig::new(name, kind), |d, (k, v)| {
                    d.with_setting(k, v)
                })
                .with_enabled(!disabled);
            let id = destination.id;
            settings.add_destination(destination)?;
            writeln!(out, "Added destination {id}")?;
        }
        DestinationCommand::Remove { id } => {
            if !settings.remove_destination(id)? {
                bail!("no destination with id {id}");
            }
            writeln!(out, "Removed destination {id}")?;
        }
        DestinationCommand::Enable { id } => set_enabled(settings, id, true, out)?,
        DestinationCommand::Disable { id } => set_enabled(settings, id, false, out)?,
    }
    Ok(())
}

fn set_enabled(
    settings: &JsonSettingsStore,
    id: Uuid,
    enabled: bool,
    out: &mut impl Write,
) -> Result<()> {
    let Some(destination) = settings.destinations().into_iter().find(|d| d.id == id) else {
        bail!("no destination with id {id}");
    };
    settings.update_destination(destination.with_enabled(enabled))?;
    let state = if enabled { "Enabled" } else { "Disabled" };
    writeln!(out, "{state} destination {id}")?;
    Ok(())
}

fn describe(result: &DeliveryResult) -> String {
    let mut line = format!(
        "{} {} {} {} metric(s)",
        format_timestamp(result.timestamp),
        if result.success { "ok    " } else { "FAILED" },
        result.destination_kind.display_name(),
        result.metrics_count
    );
    if let Some(code) = result.response_code {
        line.push_str(&format!(" [{code}]"));
    }
    if let Some(message) = &result.error_message {
        line.push_str(&format!(": {message}"));
    }
    line
}
