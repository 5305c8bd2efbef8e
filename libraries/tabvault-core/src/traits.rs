/// Core traits for Tabvault
use crate::error::Result;
use crate::types::{FileRecord, TabMetadata};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;

/// Tab metadata reader trait
///
/// Implementers never fail: unreadable or unsupported files come back as
/// `TabMetadata` with `is_valid == false`. Implementations must be safe to
/// call concurrently for different files.
pub trait TabMetadataReader: Send + Sync {
    /// Read metadata from the file at `path`
    fn parse_metadata(&self, path: &Path) -> TabMetadata;
}

/// Persisted catalog of already imported files
///
/// This is the storage collaborator of the ingestion pipeline. The scanner
/// never calls it; importers and applications do.
#[async_trait]
pub trait FingerprintCatalog: Send + Sync {
    /// Whether a file with this digest was already stored
    async fn has_fingerprint(&self, digest: &str) -> Result<bool>;

    /// All stored digests, used to pre-classify a scan
    async fn known_fingerprints(&self) -> Result<HashSet<String>>;

    /// Persist an accepted import
    async fn store(&self, record: &FileRecord, metadata: &TabMetadata) -> Result<()>;
}
