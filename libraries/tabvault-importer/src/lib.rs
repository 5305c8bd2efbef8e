//! Tabvault Importer
//!
//! Finds tab files on disk, fingerprints them and classifies them for
//! import.
//!
//! # Architecture
//!
//! - `fingerprint`: sparse content digest used for duplicate detection
//! - `scanner`: filesystem walking with glob filters
//! - `session`: one-shot scan sessions with batching and cancellation
//! - `importer`: hands scan results to a fingerprint catalog

mod error;
mod types;

pub mod fingerprint;
pub mod importer;
pub mod scanner;
pub mod session;

pub use error::ImportError;
pub use fingerprint::FingerprintHasher;
pub use importer::TabImporter;
pub use session::{CancelToken, ScanHandle, Scanner};
pub use types::*;

/// Result type for import operations
pub type Result<T> = std::result::Result<T, ImportError>;
