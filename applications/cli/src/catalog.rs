/// Fingerprint catalog persisted as a single JSON file
use crate::error::{CliError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tabvault_core::{FileRecord, FingerprintCatalog, TabMetadata, VaultError};
use tokio::sync::Mutex;

/// One stored tab
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTab {
    pub path: PathBuf,
    pub size: u64,
    pub metadata: TabMetadata,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    entries: BTreeMap<String, StoredTab>,
}

/// JSON-backed catalog
///
/// The whole file is rewritten after every store.
pub struct JsonCatalog {
    path: PathBuf,
    state: Mutex<CatalogFile>,
}

impl JsonCatalog {
    /// Open the catalog at `path`, starting empty if the file does not exist
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                CliError::CatalogFile(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Creating new catalog at {}", path.display());
                CatalogFile::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn get(&self, digest: &str) -> Option<StoredTab> {
        self.state.lock().await.entries.get(digest).cloned()
    }

    async fn persist(&self, state: &CatalogFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl FingerprintCatalog for JsonCatalog {
    async fn has_fingerprint(&self, digest: &str) -> tabvault_core::Result<bool> {
        Ok(self.state.lock().await.entries.contains_key(digest))
    }

    async fn known_fingerprints(&self) -> tabvault_core::Result<HashSet<String>> {
        Ok(self.state.lock().await.entries.keys().cloned().collect())
    }

    async fn store(&self, record: &FileRecord, metadata: &TabMetadata) -> tabvault_core::Result<()> {
        if record.fingerprint.is_empty() {
            return Err(VaultError::invalid_input("record has no fingerprint"));
        }

        let mut state = self.state.lock().await;
        if state.entries.contains_key(&record.fingerprint) {
            return Err(VaultError::Duplicate(record.fingerprint.clone()));
        }

        state.entries.insert(
            record.fingerprint.clone(),
            StoredTab {
                path: record.path.clone(),
                size: record.size,
                metadata: metadata.clone(),
            },
        );

        if let Err(e) = self.persist(&state).await {
            state.entries.remove(&record.fingerprint);
            return Err(e.into());
        }

        Ok(())
    }
}
