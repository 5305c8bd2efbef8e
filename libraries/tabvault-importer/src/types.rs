//! Common types for the importer

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tabvault_core::{DuplicateGroup, FileRecord, FileStatus, StatsSnapshot};

/// Records per progress batch
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Configuration for scan operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfig {
    /// Records accumulated before a batch is emitted
    pub batch_size: usize,

    /// Whether to follow symbolic links while walking
    pub follow_links: bool,

    /// Maximum directory depth to traverse
    pub max_depth: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            follow_links: false,
            max_depth: None,
        }
    }
}

/// Lifecycle of a scan session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Idle,
    Scanning,
    Finished,
    Aborted,
}

/// How a scan session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Every root was walked
    Completed,
    /// Cancelled; results cover only what was visited
    Aborted,
}

/// Notification sent from the scanning worker
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Records discovered since the previous batch
    ///
    /// Statuses are provisional: a `Ready` record may still become
    /// `Duplicate` once every root has been walked.
    Batch(Vec<FileRecord>),

    /// Terminal signal with the final statistics
    Finished {
        stats: StatsSnapshot,
        outcome: ScanOutcome,
    },
}

/// Final result of a scan session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Every record in discovery order, with final statuses
    pub records: Vec<FileRecord>,

    /// Totals over `records`
    pub stats: StatsSnapshot,

    /// Fingerprints shared by more than one file, ordered by group id
    pub groups: Vec<DuplicateGroup>,

    pub outcome: ScanOutcome,

    pub duration: Duration,
}

impl ScanSummary {
    pub fn is_aborted(&self) -> bool {
        self.outcome == ScanOutcome::Aborted
    }

    /// Records with the given status
    pub fn with_status(&self, status: FileStatus) -> impl Iterator<Item = &FileRecord> {
        self.records.iter().filter(move |r| r.status == status)
    }

    /// Group with the given id, if it has more than one member
    pub fn group(&self, group_id: u32) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| g.group_id == group_id)
    }

    /// Bytes that keeping one copy per duplicate group would free
    pub fn reclaimable_bytes(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::reclaimable_bytes).sum()
    }

    pub fn summary_text(&self) -> String {
        format!(
            "Scan {}: {} files ({} bytes), {} defects, {} duplicates in {} groups",
            match self.outcome {
                ScanOutcome::Completed => "complete",
                ScanOutcome::Aborted => "aborted",
            },
            self.stats.total_files,
            self.stats.total_bytes,
            self.stats.defects,
            self.stats.duplicates,
            self.groups.len()
        )
    }
}

/// Summary of an import operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    /// Scan records with their post-import statuses
    pub records: Vec<FileRecord>,

    /// Totals including managed files and saved bytes
    pub stats: StatsSnapshot,

    /// Files stored in this run
    pub imported: usize,

    /// Files whose format could not be decoded
    pub rejected: Vec<PathBuf>,

    /// Files found in the catalog at import time
    pub already_stored: usize,

    /// Storage failures
    pub errors: Vec<(PathBuf, String)>,

    pub duration: Duration,
}

impl ImportReport {
    pub fn summary_text(&self) -> String {
        format!(
            "Import complete: {} imported, {} already stored, {} rejected, {} failed, {} bytes saved",
            self.imported,
            self.already_stored,
            self.rejected.len(),
            self.errors.len(),
            self.stats.bytes_saved
        )
    }
}
