use crate::destination::DeliveryResult;
use serde::Serialize;
use std::fmt;

/// Snapshot of the orchestrator for status displays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub running: bool,
    pub successful: usize,
    pub total: usize,
}

impl SyncStatus {
    pub fn from_results(running: bool, results: &[DeliveryResult]) -> Self {
        Self {
            running,
            successful: results.iter().filter(|r| r.success).count(),
            total: results.len(),
        }
    }

    pub fn ready(&self) -> bool {
        !self.running
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.running {
            f.write_str("Syncing...")
        } else if self.total == 0 {
            f.write_str("Ready to sync")
        } else {
            write!(f, "Last sync: {}/{} successful", self.successful, self.total)
        }
    }
}
