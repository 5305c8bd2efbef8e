//! Tabvault Metadata
//!
//! Metadata extraction from binary guitar tablature files.
//!
//! This crate provides:
//! - Format sniffing across the historical file revisions (v2 to v5)
//! - Header field extraction (title, artist, album, notices, ...)
//! - Heuristic tempo discovery for revisions without a fixed tempo offset
//! - Tuning discovery and naming
//!
//! Archive and compressed revisions are recognised and reported as invalid;
//! decoding them is out of scope.
//!
//! # Example
//!
//! ```rust,no_run
//! use tabvault_core::TabMetadataReader;
//! use tabvault_metadata::TabMetadataParser;
//! use std::path::Path;
//!
//! let parser = TabMetadataParser::new();
//! let meta = parser.parse_metadata(Path::new("/tabs/song.gp5"));
//! if meta.is_valid {
//!     println!("{} - {} ({} bpm, {})", meta.artist, meta.title, meta.bpm, meta.tuning);
//! }
//! ```

mod error;
mod reader;

pub mod format;
pub mod stream;
pub mod tempo;
pub mod tuning;

pub use error::{MetadataError, Result};
pub use reader::{TabMetadataParser, MAX_NOTICE_LINES};
