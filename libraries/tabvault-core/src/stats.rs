//! Scan statistics
//!
//! `ScanStats` is shared between the scanning worker and whoever reads
//! progress, so all counters sit behind one internal mutex. Readers take a
//! `StatsSnapshot` when they need several values that agree with each other.

use crate::types::{FileRecord, FileStatus};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Plain copy of the counters at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Leaf files seen
    pub total_files: u64,
    /// Sum of leaf file sizes
    pub total_bytes: u64,
    /// Files classified as defects
    pub defects: u64,
    /// Files classified as duplicates
    pub duplicates: u64,
    /// Files accepted into the managed store
    pub managed: u64,
    /// Bytes not stored thanks to deduplication
    pub bytes_saved: u64,
}

impl StatsSnapshot {
    fn merge(&mut self, other: &StatsSnapshot) {
        self.total_files += other.total_files;
        self.total_bytes += other.total_bytes;
        self.defects += other.defects;
        self.duplicates += other.duplicates;
        self.managed += other.managed;
        self.bytes_saved += other.bytes_saved;
    }
}

/// Thread-safe statistics accumulator
#[derive(Debug, Default)]
pub struct ScanStats {
    inner: Mutex<StatsSnapshot>,
}

impl ScanStats {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accumulator seeded from a snapshot
    pub fn from_snapshot(snapshot: StatsSnapshot) -> Self {
        Self {
            inner: Mutex::new(snapshot),
        }
    }

    // A panicking writer must not make the counters unreadable for everyone else.
    fn lock(&self) -> MutexGuard<'_, StatsSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one file of the given size
    pub fn add_file(&self, size: u64) {
        let mut inner = self.lock();
        inner.total_files += 1;
        inner.total_bytes += size;
    }

    /// Count one defect
    pub fn add_defect(&self) {
        self.lock().defects += 1;
    }

    /// Count one duplicate
    pub fn add_duplicate(&self) {
        self.lock().duplicates += 1;
    }

    /// Count one managed file and the bytes its import saved
    pub fn add_managed(&self, saved_bytes: u64) {
        let mut inner = self.lock();
        inner.managed += 1;
        inner.bytes_saved += saved_bytes;
    }

    /// Count a record: its size plus whatever its status implies
    pub fn add_record(&self, record: &FileRecord) {
        let mut inner = self.lock();
        inner.total_files += 1;
        inner.total_bytes += record.size;
        match record.status {
            FileStatus::Defect => inner.defects += 1,
            FileStatus::Duplicate => inner.duplicates += 1,
            FileStatus::Managed => inner.managed += 1,
            FileStatus::Ready | FileStatus::AlreadyInStore | FileStatus::Rejected => {}
        }
    }

    /// Count a subtree; folders recurse and never count themselves
    pub fn add_node(&self, node: &StatsNode) {
        match node {
            StatsNode::File(record) => self.add_record(record),
            StatsNode::Folder { children, .. } => {
                for child in children {
                    self.add_node(child);
                }
            }
        }
    }

    /// Add every counter of `other` into `self`
    pub fn merge(&self, other: &ScanStats) {
        // Snapshot first so merging an accumulator into itself cannot deadlock.
        let theirs = other.snapshot();
        self.lock().merge(&theirs);
    }

    /// Zero every counter
    pub fn reset(&self) {
        *self.lock() = StatsSnapshot::default();
    }

    /// Consistent copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        *self.lock()
    }

    pub fn total_files(&self) -> u64 {
        self.lock().total_files
    }

    pub fn total_bytes(&self) -> u64 {
        self.lock().total_bytes
    }

    pub fn defects(&self) -> u64 {
        self.lock().defects
    }

    pub fn duplicates(&self) -> u64 {
        self.lock().duplicates
    }

    pub fn managed(&self) -> u64 {
        self.lock().managed
    }

    pub fn bytes_saved(&self) -> u64 {
        self.lock().bytes_saved
    }
}

impl Clone for ScanStats {
    fn clone(&self) -> Self {
        Self::from_snapshot(self.snapshot())
    }
}

/// Tree of scan results as presented to a browsing layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsNode {
    /// A leaf file entry
    File(FileRecord),
    /// A grouping node (directory or duplicate cluster); never counted itself
    Folder {
        /// Display name
        name: String,
        /// Nested entries
        children: Vec<StatsNode>,
    },
}

impl StatsNode {
    /// Create a folder node
    pub fn folder(name: impl Into<String>, children: Vec<StatsNode>) -> Self {
        Self::Folder {
            name: name.into(),
            children,
        }
    }
}

/// Aggregate a forest of nodes into one snapshot
pub fn aggregate(nodes: &[StatsNode]) -> StatsSnapshot {
    let stats = ScanStats::new();
    for node in nodes {
        stats.add_node(node);
    }
    stats.snapshot()
}
