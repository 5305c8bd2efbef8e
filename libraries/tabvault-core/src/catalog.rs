//! In-memory fingerprint catalog

use crate::error::{Result, VaultError};
use crate::traits::FingerprintCatalog;
use crate::types::{FileRecord, TabMetadata};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

/// Catalog entry kept by [`MemoryCatalog`]
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Stored record
    pub record: FileRecord,
    /// Metadata parsed at import time
    pub metadata: TabMetadata,
}

/// Catalog that lives only as long as the process
///
/// Useful for tests and for dry runs where nothing should be persisted.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    entries: Mutex<HashMap<String, CatalogEntry>>,
}

impl MemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog pre-populated with bare digests
    pub fn with_fingerprints<I, S>(fingerprints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = fingerprints
            .into_iter()
            .map(|digest| {
                let digest = digest.into();
                let record = FileRecord::new(Default::default(), 0, digest.clone());
                (
                    digest,
                    CatalogEntry {
                        record,
                        metadata: TabMetadata::default(),
                    },
                )
            })
            .collect();

        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the entry stored under `digest`
    pub fn get(&self, digest: &str) -> Option<CatalogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(digest)
            .cloned()
    }
}

#[async_trait]
impl FingerprintCatalog for MemoryCatalog {
    async fn has_fingerprint(&self, digest: &str) -> Result<bool> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(digest))
    }

    async fn known_fingerprints(&self) -> Result<HashSet<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect())
    }

    async fn store(&self, record: &FileRecord, metadata: &TabMetadata) -> Result<()> {
        if record.fingerprint.is_empty() {
            return Err(VaultError::invalid_input(format!(
                "{} has no fingerprint",
                record.path.display()
            )));
        }

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&record.fingerprint) {
            return Err(VaultError::Duplicate(record.fingerprint.clone()));
        }

        entries.insert(
            record.fingerprint.clone(),
            CatalogEntry {
                record: record.clone(),
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }
}
