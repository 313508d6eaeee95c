//! User settings consumed by the orchestrator.
//!
//! [`SettingsStore`] is the read side the orchestrator depends on.
//! [`JsonSettingsStore`] is a file-backed implementation that also carries
//! the editing operations a front end needs.

use crate::SyncError;
use crate::destination::DestinationConfig;
use crate::utils::write_atomic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 3600;

fn default_sync_interval() -> u64 {
    DEFAULT_SYNC_INTERVAL_SECS
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default)]
    pub selected_types: BTreeSet<String>,
    #[serde(default)]
    pub destinations: Vec<DestinationConfig>,
    /// Suggested interval for an external scheduler. Never acted on here.
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<DateTime<Utc>>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            selected_types: BTreeSet::new(),
            destinations: Vec::new(),
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            last_sync_time: None,
        }
    }
}

pub trait SettingsStore: Send + Sync {
    /// Raw type identifiers the user chose to sync.
    fn selected_types(&self) -> BTreeSet<String>;

    fn destinations(&self) -> Vec<DestinationConfig>;

    fn enabled_destinations(&self) -> Vec<DestinationConfig> {
        self.destinations()
            .into_iter()
            .filter(|d| d.enabled)
            .collect()
    }

    fn set_last_sync_time(&self, at: DateTime<Utc>);

    fn last_sync_time(&self) -> Option<DateTime<Utc>>;
}

#[derive(Debug, Default)]
pub struct JsonSettingsStore {
    settings: RwLock<UserSettings>,
    path: Option<PathBuf>,
}

impl JsonSettingsStore {
    pub fn in_memory(settings: UserSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
            path: None,
        }
    }

    /// Open a file-backed store. Missing or unreadable files yield defaults.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load user settings");
                UserSettings::default()
            }),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "failed to read user settings");
                }
                UserSettings::default()
            }
        };
        Self {
            settings: RwLock::new(settings),
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the current settings.
    pub fn snapshot(&self) -> UserSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update<T>(&self, f: impl FnOnce(&mut UserSettings) -> T) -> Result<T, SyncError> {
        let mut guard = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        let out = f(&mut *guard);
        self.persist(&guard)?;
        Ok(out)
    }

    fn persist(&self, settings: &UserSettings) -> Result<(), SyncError> {
        if let Some(path) = &self.path {
            let bytes = serde_json::to_vec_pretty(settings)?;
            write_atomic(path, &bytes)?;
        }
        Ok(())
    }

    pub fn update_selected_types<I, S>(&self, types: I) -> Result<(), SyncError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let types: BTreeSet<String> = types.into_iter().map(Into::into).collect();
        self.update(|s| s.selected_types = types)
    }

    pub fn add_destination(&self, destination: DestinationConfig) -> Result<(), SyncError> {
        self.update(|s| s.destinations.push(destination))
    }

    /// Replace the destination with the same id. Returns `false` when no such
    /// destination exists.
    pub fn update_destination(&self, destination: DestinationConfig) -> Result<bool, SyncError> {
        let mut guard = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        let Some(slot) = guard.destinations.iter_mut().find(|d| d.id == destination.id) else {
            return Ok(false);
        };
        *slot = destination;
        self.persist(&guard)?;
        Ok(true)
    }

    pub fn remove_destination(&self, id: Uuid) -> Result<bool, SyncError> {
        self.update(|s| {
            let before = s.destinations.len();
            s.destinations.retain(|d| d.id != id);
            s.destinations.len() != before
        })
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot().sync_interval_secs)
    }

    pub fn set_sync_interval(&self, interval: Duration) -> Result<(), SyncError> {
        self.update(|s| s.sync_interval_secs = interval.as_secs())
    }

    pub fn reset(&self) -> Result<(), SyncError> {
        self.update(|s| *s = UserSettings::default())
    }

    pub fn export_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Replace all settings with `json`. Malformed input leaves the current
    /// settings untouched.
    pub fn import_json(&self, json: &str) -> Result<(), SyncError> {
        let imported: UserSettings = serde_json::from_str(json)?;
        self.update(|s| *s = imported)
    }
}

impl SettingsStore for JsonSettingsStore {
    fn selected_types(&self) -> BTreeSet<String> {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .selected_types
            .clone()
    }

    fn destinations(&self) -> Vec<DestinationConfig> {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .destinations
            .clone()
    }

    fn set_last_sync_time(&self, at: DateTime<Utc>) {
        if let Err(e) = self.update(|s| s.last_sync_time = Some(at)) {
            warn!(error = %e, "failed to save last sync time");
        }
    }

    fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last_sync_time
    }
}
