//! End-to-end tests: scan a directory, then import into a catalog


use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tabvault_core::{
    FileRecord, FileStatus, FingerprintCatalog, MemoryCatalog, TabMetadata, TabMetadataReader,
    VaultError,
};
use tabvault_importer::{ScanSummary, Scanner, TabImporter};
use tempfile::TempDir;
use test_helpers::{init_tracing, payload, v3_tab, write_file};

fn scan(dir: &Path) -> ScanSummary {
    Scanner::new(vec![dir.to_path_buf()])
        .run(|_| {})
        .expect("Scan failed")
}

#[tokio::test]
async fn test_import_stores_valid_tabs() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "one.gp3", &v3_tab("First"));
    write_file(dir.path(), "two.gp3", &v3_tab("Second"));

    let summary = scan(dir.path());
    let catalog = Arc::new(MemoryCatalog::new());
    let report = TabImporter::new(Arc::clone(&catalog))
        .import(&summary)
        .await
        .unwrap();

    assert_eq!(report.imported, 2);
    assert_eq!(report.stats.managed, 2);
    assert_eq!(report.stats.total_files, 2);
    assert_eq!(report.stats.bytes_saved, 0);
    assert!(report.rejected.is_empty());
    assert_eq!(catalog.len(), 2);

    let titles: HashSet<String> = report
        .records
        .iter()
        .map(|r| catalog.get(&r.fingerprint).unwrap().metadata.title)
        .collect();
    assert_eq!(titles, HashSet::from(["First".to_string(), "Second".to_string()]));
}

#[tokio::test]
async fn test_import_keeps_one_copy_per_group() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let tab = v3_tab("Shared");
    for i in 0..3 {
        write_file(dir.path(), &format!("copy_{i}.gp3"), &tab);
    }

    let summary = scan(dir.path());
    assert_eq!(summary.stats.duplicates, 3);

    let catalog = Arc::new(MemoryCatalog::new());
    let report = TabImporter::new(Arc::clone(&catalog))
        .import(&summary)
        .await
        .unwrap();

    assert_eq!(report.imported, 1);
    assert_eq!(catalog.len(), 1);
    assert_eq!(report.stats.managed, 1);
    assert_eq!(report.stats.duplicates, 2);
    assert_eq!(report.stats.bytes_saved, 2 * tab.len() as u64);

    let managed: Vec<&FileRecord> = report
        .records
        .iter()
        .filter(|r| r.status == FileStatus::Managed)
        .collect();
    assert_eq!(managed.len(), 1);
}

#[tokio::test]
async fn test_import_rejects_undecodable_files() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "valid.gp3", &v3_tab("Good"));
    write_file(dir.path(), "garbage.gp5", &payload(7));
    write_file(dir.path(), "empty.gp5", b"");

    let summary = scan(dir.path());
    let catalog = Arc::new(MemoryCatalog::new());
    let report = TabImporter::new(Arc::clone(&catalog))
        .import(&summary)
        .await
        .unwrap();

    assert_eq!(report.imported, 1);
    assert_eq!(report.rejected.len(), 1);
    assert!(report.rejected[0].ends_with("garbage.gp5"));
    assert_eq!(report.stats.defects, 1);
    assert_eq!(report.stats.total_files, 3);
    assert_eq!(catalog.len(), 1);
}

#[tokio::test]
async fn test_import_skips_known_fingerprints() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "old.gp3", &v3_tab("Old"));
    write_file(dir.path(), "new.gp3", &v3_tab("New"));

    let catalog = Arc::new(MemoryCatalog::new());
    let importer = TabImporter::new(Arc::clone(&catalog));

    // First import stores both
    let first = importer.import(&scan(dir.path())).await.unwrap();
    assert_eq!(first.imported, 2);

    // Second pass, pre-classified against the catalog
    let known = catalog.known_fingerprints().await.unwrap();
    let summary = Scanner::new(vec![dir.path().to_path_buf()])
        .with_known_fingerprints(known)
        .run(|_| {})
        .unwrap();
    assert_eq!(summary.with_status(FileStatus::AlreadyInStore).count(), 2);

    let second = importer.import(&summary).await.unwrap();
    assert_eq!(second.imported, 0);
    assert_eq!(second.already_stored, 2);
    assert_eq!(catalog.len(), 2);
}

#[tokio::test]
async fn test_import_rechecks_catalog_for_ready_records() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "tab.gp3", &v3_tab("Again"));

    let catalog = Arc::new(MemoryCatalog::new());
    let importer = TabImporter::new(Arc::clone(&catalog));
    let summary = scan(dir.path());

    importer.import(&summary).await.unwrap();
    // Same summary again: the record is still Ready but now stored
    let report = importer.import(&summary).await.unwrap();

    assert_eq!(report.imported, 0);
    assert_eq!(report.already_stored, 1);
    assert_eq!(report.records[0].status, FileStatus::AlreadyInStore);
}

/// Accepts everything so the catalog error path can be exercised
#[derive(Clone)]
struct AcceptAll;

impl TabMetadataReader for AcceptAll {
    fn parse_metadata(&self, _path: &Path) -> TabMetadata {
        TabMetadata {
            format_version: "v5".to_string(),
            is_valid: true,
            ..TabMetadata::default()
        }
    }
}

struct FailingCatalog;

#[async_trait]
impl FingerprintCatalog for FailingCatalog {
    async fn has_fingerprint(&self, _digest: &str) -> tabvault_core::Result<bool> {
        Ok(false)
    }

    async fn known_fingerprints(&self) -> tabvault_core::Result<HashSet<String>> {
        Ok(HashSet::new())
    }

    async fn store(&self, _record: &FileRecord, _metadata: &TabMetadata) -> tabvault_core::Result<()> {
        Err(VaultError::catalog("disk full"))
    }
}

#[tokio::test]
async fn test_storage_failures_are_reported() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "any.gp5", &payload(1));

    let summary = scan(dir.path());
    let report = TabImporter::new(Arc::new(FailingCatalog))
        .with_reader(AcceptAll)
        .import(&summary)
        .await
        .unwrap();

    assert_eq!(report.imported, 0);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].1.contains("disk full"));
    assert_eq!(report.records[0].status, FileStatus::Ready);
}
