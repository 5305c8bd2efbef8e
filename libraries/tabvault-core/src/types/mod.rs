//! Domain types shared by the scanner, the parser and external consumers

mod file_record;
mod tab_metadata;

pub use file_record::{DuplicateGroup, FileRecord, FileStatus, EMPTY_FILE_FINGERPRINT};
pub use tab_metadata::TabMetadata;
