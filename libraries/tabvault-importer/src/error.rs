//! Error types for the importer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] tabvault_core::VaultError),

    #[error("Scan session already started")]
    AlreadyStarted,

    #[error("Scan worker failed: {0}")]
    Worker(String),
}
