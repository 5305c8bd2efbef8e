//! Scan sessions
//!
//! A session walks every root, fingerprints each matching file and streams
//! provisional records in fixed-size batches. Duplicate status is only
//! assigned afterwards, from occurrence counts over the whole session, so a
//! file whose twin lives in a later root is still caught.

use crate::fingerprint::fingerprint_file;
use crate::scanner::{non_overlapping_roots, FileScanner};
use crate::{ImportError, Result, ScanConfig, ScanEvent, ScanOutcome, ScanState, ScanSummary};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tabvault_core::{DuplicateGroup, FileRecord, FileStatus, ScanStats, EMPTY_FILE_FINGERPRINT};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Set-only cancellation flag shared with the controller
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; there is no way to clear it
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Session state readable from any thread
#[derive(Debug, Clone)]
struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(Self::encode(ScanState::Idle))))
    }

    fn encode(state: ScanState) -> u8 {
        match state {
            ScanState::Idle => 0,
            ScanState::Scanning => 1,
            ScanState::Finished => 2,
            ScanState::Aborted => 3,
        }
    }

    fn get(&self) -> ScanState {
        match self.0.load(Ordering::Acquire) {
            0 => ScanState::Idle,
            1 => ScanState::Scanning,
            2 => ScanState::Finished,
            _ => ScanState::Aborted,
        }
    }

    /// Idle -> Scanning, exactly once
    fn begin(&self) -> Result<()> {
        self.0
            .compare_exchange(
                Self::encode(ScanState::Idle),
                Self::encode(ScanState::Scanning),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|_| ImportError::AlreadyStarted)
    }

    fn finish(&self, outcome: ScanOutcome) {
        let state = match outcome {
            ScanOutcome::Completed => ScanState::Finished,
            ScanOutcome::Aborted => ScanState::Aborted,
        };
        self.0.store(Self::encode(state), Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy)]
struct GroupEntry {
    group_id: u32,
    count: usize,
}

/// Fingerprint -> (group id, occurrences) for one session
#[derive(Debug, Default)]
struct FingerprintIndex {
    entries: HashMap<String, GroupEntry>,
    last_group_id: u32,
}

impl FingerprintIndex {
    /// Count one occurrence and return the fingerprint's group id
    fn register(&mut self, fingerprint: &str) -> u32 {
        if let Some(entry) = self.entries.get_mut(fingerprint) {
            entry.count += 1;
            return entry.group_id;
        }

        self.last_group_id += 1;
        self.entries.insert(
            fingerprint.to_string(),
            GroupEntry {
                group_id: self.last_group_id,
                count: 1,
            },
        );
        self.last_group_id
    }

    fn count(&self, fingerprint: &str) -> usize {
        self.entries.get(fingerprint).map_or(0, |e| e.count)
    }
}

/// One-shot scan over a set of root directories
pub struct Scanner {
    roots: Vec<PathBuf>,
    walker: FileScanner,
    config: ScanConfig,
    known: HashSet<String>,
    cancel: CancelToken,
    stats: Arc<ScanStats>,
    state: SharedState,
}

impl Scanner {
    /// Scanner over `roots` using the default tab filters
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self::with_config(roots, ScanConfig::default())
    }

    /// Scanner with a custom configuration
    pub fn with_config(roots: Vec<PathBuf>, config: ScanConfig) -> Self {
        let mut walker = FileScanner::new().follow_links(config.follow_links);
        if let Some(depth) = config.max_depth {
            walker = walker.max_depth(depth);
        }

        Self {
            roots,
            walker,
            config,
            known: HashSet::new(),
            cancel: CancelToken::new(),
            stats: Arc::new(ScanStats::new()),
            state: SharedState::new(),
        }
    }

    /// Replace the file name filters
    pub fn with_filters<S: AsRef<str>>(mut self, globs: &[S]) -> Self {
        self.walker = self.walker.with_filters(globs);
        self
    }

    /// Digests already held by the external catalog
    ///
    /// Matching files are classified `AlreadyInStore` instead of `Ready`.
    pub fn with_known_fingerprints(mut self, known: HashSet<String>) -> Self {
        self.known = known;
        self
    }

    /// Handle that cancels this session
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Live counters, updated per file while scanning
    pub fn stats(&self) -> Arc<ScanStats> {
        Arc::clone(&self.stats)
    }

    pub fn state(&self) -> ScanState {
        self.state.get()
    }

    /// Run the session on the calling thread
    ///
    /// `sink` receives every batch and then one `Finished` event. Fails
    /// only if this scanner has already run.
    pub fn run<F>(&mut self, mut sink: F) -> Result<ScanSummary>
    where
        F: FnMut(ScanEvent),
    {
        self.state.begin()?;

        let started = Instant::now();
        let batch_size = self.config.batch_size.max(1);
        let roots = non_overlapping_roots(&self.roots);
        info!("Scanning {} root(s): {:?}", roots.len(), roots);

        let mut index = FingerprintIndex::default();
        let mut records: Vec<FileRecord> = Vec::new();
        let mut batch_start = 0;
        let mut outcome = ScanOutcome::Completed;

        'roots: for root in &roots {
            for entry in self.walker.walk(root) {
                if self.cancel.is_cancelled() {
                    outcome = ScanOutcome::Aborted;
                    break 'roots;
                }

                let size = match entry.metadata() {
                    Ok(metadata) => Some(metadata.len()),
                    Err(e) => {
                        debug!("Failed to stat {}: {}", entry.path().display(), e);
                        None
                    }
                };
                let record = self.classify(entry.into_path(), size, &mut index);
                self.stats.add_file(record.size);
                if record.is_defect() {
                    self.stats.add_defect();
                }
                records.push(record);

                if records.len() - batch_start >= batch_size {
                    sink(ScanEvent::Batch(records[batch_start..].to_vec()));
                    batch_start = records.len();
                    std::thread::yield_now();
                }
            }
        }

        if batch_start < records.len() {
            sink(ScanEvent::Batch(records[batch_start..].to_vec()));
        }

        let duplicates = mark_duplicates(&mut records, &index);
        for _ in 0..duplicates {
            self.stats.add_duplicate();
        }
        let groups = collect_groups(&records, &index);
        let stats = self.stats.snapshot();

        info!(
            "Scan {:?} in {:?}: {} files, {} defects, {} duplicates",
            outcome,
            started.elapsed(),
            stats.total_files,
            stats.defects,
            stats.duplicates
        );

        self.state.finish(outcome);
        sink(ScanEvent::Finished { stats, outcome });

        Ok(ScanSummary {
            records,
            stats,
            groups,
            outcome,
            duration: started.elapsed(),
        })
    }

    /// Run the session on a blocking worker thread
    ///
    /// Events arrive on the returned receiver; sending never blocks the
    /// worker. Must be called from within a Tokio runtime.
    pub fn spawn(self) -> (mpsc::UnboundedReceiver<ScanEvent>, ScanHandle) {
        let (tx, rx) = mpsc::unbounded_channel();

        let cancel = self.cancel.clone();
        let stats = Arc::clone(&self.stats);
        let state = self.state.clone();

        let join = tokio::task::spawn_blocking(move || {
            let mut scanner = self;
            scanner.run(|event| {
                // A dropped receiver just means nobody is listening any more.
                let _ = tx.send(event);
            })
        });

        (
            rx,
            ScanHandle {
                cancel,
                stats,
                state,
                join,
            },
        )
    }

    fn classify(
        &self,
        path: PathBuf,
        size: Option<u64>,
        index: &mut FingerprintIndex,
    ) -> FileRecord {
        let Some(size) = size else {
            return FileRecord::defect(path, 0, String::new());
        };

        if size == 0 {
            return FileRecord::defect(path, 0, EMPTY_FILE_FINGERPRINT.to_string());
        }

        let fingerprint = fingerprint_file(&path);
        if fingerprint.is_empty() {
            return FileRecord::defect(path, size, fingerprint);
        }
        // Truncated to nothing after the walk saw it
        if fingerprint == EMPTY_FILE_FINGERPRINT {
            return FileRecord::defect(path, 0, fingerprint);
        }

        let group_id = index.register(&fingerprint);
        let status = if self.known.contains(&fingerprint) {
            FileStatus::AlreadyInStore
        } else {
            FileStatus::Ready
        };

        FileRecord {
            path,
            size,
            fingerprint,
            group_id,
            status,
        }
    }
}

/// Controller side of a spawned scan
pub struct ScanHandle {
    cancel: CancelToken,
    stats: Arc<ScanStats>,
    state: SharedState,
    join: JoinHandle<Result<ScanSummary>>,
}

impl ScanHandle {
    /// Ask the worker to stop at the next file
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Live counters
    pub fn stats(&self) -> Arc<ScanStats> {
        Arc::clone(&self.stats)
    }

    pub fn state(&self) -> ScanState {
        self.state.get()
    }

    /// Wait for the worker and take the final summary
    pub async fn join(self) -> Result<ScanSummary> {
        self.join
            .await
            .map_err(|e| ImportError::Worker(e.to_string()))?
    }
}

/// Second pass: every `Ready` record whose fingerprint occurred more than
/// once in the session becomes `Duplicate`. Returns how many changed.
fn mark_duplicates(records: &mut [FileRecord], index: &FingerprintIndex) -> usize {
    let mut marked = 0;
    for record in records.iter_mut() {
        if record.status == FileStatus::Ready && index.count(&record.fingerprint) > 1 {
            record.status = FileStatus::Duplicate;
            marked += 1;
        }
    }
    marked
}

fn collect_groups(records: &[FileRecord], index: &FingerprintIndex) -> Vec<DuplicateGroup> {
    let mut groups: BTreeMap<u32, DuplicateGroup> = BTreeMap::new();

    for record in records {
        if record.group_id == 0 || index.count(&record.fingerprint) < 2 {
            continue;
        }
        groups
            .entry(record.group_id)
            .or_insert_with(|| DuplicateGroup {
                fingerprint: record.fingerprint.clone(),
                group_id: record.group_id,
                file_size: record.size,
                paths: Vec::new(),
            })
            .paths
            .push(record.path.clone());
    }

    groups.into_values().collect()
}
