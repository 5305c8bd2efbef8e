//! Import orchestration - hands scan results to a fingerprint catalog

use crate::{ImportError, ImportReport, Result, ScanSummary};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tabvault_core::{
    FileRecord, FileStatus, FingerprintCatalog, ScanStats, TabMetadata, TabMetadataReader,
    VaultError,
};
use tabvault_metadata::TabMetadataParser;
use tracing::{debug, error, info};

/// Outcome of importing one candidate record
enum Stored {
    Managed,
    AlreadyInStore,
    Rejected,
    Failed(String),
}

/// Tab importer
///
/// Parses every import candidate of a finished scan and stores the valid
/// ones. Candidates are `Ready` records and the first member of each
/// duplicate group; the other members stay `Duplicate`.
pub struct TabImporter<C, R = TabMetadataParser> {
    catalog: Arc<C>,
    reader: R,
}

impl<C: FingerprintCatalog> TabImporter<C> {
    /// Create an importer using the built-in tab parser
    pub fn new(catalog: Arc<C>) -> Self {
        Self {
            catalog,
            reader: TabMetadataParser::new(),
        }
    }
}

impl<C, R> TabImporter<C, R>
where
    C: FingerprintCatalog,
    R: TabMetadataReader + Clone + 'static,
{
    /// Swap the metadata reader
    pub fn with_reader<R2>(self, reader: R2) -> TabImporter<C, R2>
    where
        R2: TabMetadataReader + Clone + 'static,
    {
        TabImporter {
            catalog: self.catalog,
            reader,
        }
    }

    /// Import the candidates of `summary`
    ///
    /// Storage failures are collected in the report; only a failed parser
    /// task aborts the import.
    pub async fn import(&self, summary: &ScanSummary) -> Result<ImportReport> {
        let start_time = Instant::now();
        let stats = ScanStats::new();

        let mut records = summary.records.clone();
        let mut imported = 0;
        let mut already_stored = 0;
        let mut rejected = Vec::new();
        let mut errors = Vec::new();

        let members = group_sizes(&records);
        let mut seen_groups: HashSet<u32> = HashSet::new();

        for record in &mut records {
            let candidate = match record.status {
                FileStatus::Ready => true,
                FileStatus::Duplicate => seen_groups.insert(record.group_id),
                _ => false,
            };

            if candidate {
                match self.import_record(record).await? {
                    Stored::Managed => {
                        let copies = members.get(&record.group_id).copied().unwrap_or(1);
                        let saved = record.size * copies.saturating_sub(1);
                        record.status = FileStatus::Managed;
                        imported += 1;
                        stats.add_file(record.size);
                        stats.add_managed(saved);
                        continue;
                    }
                    Stored::AlreadyInStore => record.status = FileStatus::AlreadyInStore,
                    Stored::Rejected => {
                        record.status = FileStatus::Rejected;
                        rejected.push(record.path.clone());
                    }
                    Stored::Failed(message) => {
                        error!("Failed to import {:?}: {}", record.path, message);
                        errors.push((record.path.clone(), message));
                    }
                }
            }

            if record.status == FileStatus::AlreadyInStore {
                already_stored += 1;
            }
            stats.add_record(record);
        }

        let report = ImportReport {
            records,
            stats: stats.snapshot(),
            imported,
            rejected,
            already_stored,
            errors,
            duration: start_time.elapsed(),
        };
        info!("{}", report.summary_text());

        Ok(report)
    }

    async fn import_record(&self, record: &FileRecord) -> Result<Stored> {
        match self.catalog.has_fingerprint(&record.fingerprint).await {
            Ok(true) => return Ok(Stored::AlreadyInStore),
            Ok(false) => {}
            Err(e) => return Ok(Stored::Failed(e.to_string())),
        }

        let metadata = self.parse(record.path.clone()).await?;
        if !metadata.is_valid {
            debug!(
                "Rejecting {} (format {})",
                record.path.display(),
                metadata.format_version
            );
            return Ok(Stored::Rejected);
        }

        match self.catalog.store(record, &metadata).await {
            Ok(()) => {
                debug!(
                    "Stored {} as \"{}\"",
                    record.path.display(),
                    metadata.display_title(&record.file_name())
                );
                Ok(Stored::Managed)
            }
            Err(VaultError::Duplicate(msg)) => {
                debug!("Skipping duplicate: {}", msg);
                Ok(Stored::AlreadyInStore)
            }
            Err(e) => Ok(Stored::Failed(e.to_string())),
        }
    }

    async fn parse(&self, path: PathBuf) -> Result<TabMetadata> {
        let reader = self.reader.clone();
        tokio::task::spawn_blocking(move || reader.parse_metadata(&path))
            .await
            .map_err(|e| ImportError::Worker(e.to_string()))
    }
}

/// Members per duplicate group id
fn group_sizes(records: &[FileRecord]) -> HashMap<u32, u64> {
    let mut sizes = HashMap::new();
    for record in records {
        if record.status == FileStatus::Duplicate {
            *sizes.entry(record.group_id).or_insert(0) += 1;
        }
    }
    sizes
}
