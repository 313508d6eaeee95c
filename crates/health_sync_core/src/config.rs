use crate::SyncError;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SETTINGS_PATH: &str = "health_sync_settings.json";
pub const DEFAULT_LOG_PATH: &str = "health_sync_log.json";
pub const DEFAULT_SAMPLES_PATH: &str = "health_samples.json";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, PartialEq)]
pub struct SyncConfig {
    pub settings_path: PathBuf,
    pub log_path: PathBuf,
    pub samples_path: PathBuf,
    pub http_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            settings_path: DEFAULT_SETTINGS_PATH.into(),
            log_path: DEFAULT_LOG_PATH.into(),
            samples_path: DEFAULT_SAMPLES_PATH.into(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, SyncError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let http_timeout = match get("HEALTH_SYNC_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    SyncError::Config(format!("HEALTH_SYNC_HTTP_TIMEOUT_SECS is not a number: {raw}"))
                })?;
                if secs == 0 {
                    return Err(SyncError::Config(
                        "HEALTH_SYNC_HTTP_TIMEOUT_SECS must be positive".into(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.http_timeout,
        };
        Ok(Self {
            settings_path: get("HEALTH_SYNC_SETTINGS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_path),
            log_path: get("HEALTH_SYNC_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_path),
            samples_path: get("HEALTH_SYNC_SAMPLES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.samples_path),
            http_timeout,
        })
    }
}
