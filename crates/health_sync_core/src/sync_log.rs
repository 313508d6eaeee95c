//! Bounded, newest-first history of delivery attempts.

use crate::destination::DeliveryResult;
use crate::utils::write_atomic;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const MAX_LOG_ENTRIES: usize = 100;

/// Delivery history, persisted as a JSON array after every mutation when
/// backed by a file.
#[derive(Debug, Default)]
pub struct SyncLog {
    entries: Vec<DeliveryResult>,
    path: Option<PathBuf>,
}

impl SyncLog {
    /// Log that lives only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed log. Any read or parse failure yields an empty log.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Vec<DeliveryResult>>(&bytes) {
                Ok(mut entries) => {
                    entries.truncate(MAX_LOG_ENTRIES);
                    entries
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load sync log");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read sync log");
                Vec::new()
            }
        };
        Self {
            entries,
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Insert at the front, dropping the oldest entries beyond capacity.
    pub fn append(&mut self, result: DeliveryResult) {
        self.entries.insert(0, result);
        self.entries.truncate(MAX_LOG_ENTRIES);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[DeliveryResult] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&DeliveryResult> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let written = serde_json::to_vec(&self.entries)
            .map_err(|e| e.to_string())
            .and_then(|bytes| write_atomic(path, &bytes).map_err(|e| e.to_string()));
        if let Err(e) = written {
            warn!(path = %path.display(), error = %e, "failed to save sync log");
        }
    }
}
