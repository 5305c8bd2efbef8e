//! Tabvault Core
//!
//! Shared domain types, traits, and error handling for the tab ingestion pipeline.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `FileRecord`, `FileStatus`, `DuplicateGroup`, `TabMetadata`
//! - **Statistics**: the thread-safe `ScanStats` accumulator and tree aggregation
//! - **Core Traits**: `TabMetadataReader`, `FingerprintCatalog`
//! - **Error Handling**: Unified `VaultError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use tabvault_core::{FileRecord, FileStatus, ScanStats};
//! use std::path::PathBuf;
//!
//! let record = FileRecord::new(PathBuf::from("/tabs/song.gp5"), 1024, "00AB".to_string());
//! assert_eq!(record.status, FileStatus::Ready);
//!
//! let stats = ScanStats::new();
//! stats.add_file(record.size);
//! assert_eq!(stats.total_files(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod stats;
pub mod traits;
pub mod types;

pub use catalog::{CatalogEntry, MemoryCatalog};
pub use error::{Result, VaultError};
pub use stats::{aggregate, ScanStats, StatsNode, StatsSnapshot};
pub use traits::{FingerprintCatalog, TabMetadataReader};
pub use types::{DuplicateGroup, FileRecord, FileStatus, TabMetadata, EMPTY_FILE_FINGERPRINT};
