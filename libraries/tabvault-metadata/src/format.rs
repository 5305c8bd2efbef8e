//! Format family detection
//!
//! Every supported revision opens with a byte-length version string stored
//! in a fixed 30-byte field. Newer families are containers (a ZIP archive or
//! a compressed block stream) and are recognised only to be refused.

use crate::error::{MetadataError, Result};
use crate::stream::ByteCursor;

/// Width of the version field that follows the length byte
pub const VERSION_FIELD_LEN: usize = 30;

/// First byte after the version header
pub const HEADER_LEN: usize = 1 + VERSION_FIELD_LEN;

/// Local file header signature of a ZIP archive
pub const ZIP_SIGNATURE: &[u8; 4] = b"PK\x03\x04";

/// Leading markers of the compressed block-stream family
const COMPRESSED_MARKERS: &[&str] = &["BCFZ", "BCFS"];

/// Known format families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatFamily {
    /// Fixed-width string header, no int-prefixed fields
    Legacy,
    V3,
    V4,
    V5,
}

impl FormatFamily {
    /// Short version tag reported in `TabMetadata::format_version`
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Legacy => "v2",
            Self::V3 => "v3",
            Self::V4 => "v4",
            Self::V5 => "v5",
        }
    }
}

/// Reported when the file is a ZIP container
pub const ARCHIVE_TAG: &str = "archive";
/// Reported when the file is a compressed block stream
pub const COMPRESSED_TAG: &str = "compressed";
/// Reported when no family matched
pub const UNKNOWN_TAG: &str = "unknown";

/// Read the version header and pick a family
///
/// On success the cursor is left at [`HEADER_LEN`].
pub fn sniff(cursor: &mut ByteCursor<'_>, data: &[u8]) -> Result<FormatFamily> {
    if data.starts_with(ZIP_SIGNATURE) {
        return Err(MetadataError::UnsupportedFormat(ARCHIVE_TAG.to_string()));
    }
    if COMPRESSED_MARKERS
        .iter()
        .any(|marker| data.starts_with(marker.as_bytes()))
    {
        return Err(MetadataError::UnsupportedFormat(COMPRESSED_TAG.to_string()));
    }

    cursor.seek(0);
    let version = cursor.read_byte_string(VERSION_FIELD_LEN);
    cursor.seek(HEADER_LEN);

    if COMPRESSED_MARKERS
        .iter()
        .any(|marker| version.starts_with(&marker[..3]))
    {
        return Err(MetadataError::UnsupportedFormat(COMPRESSED_TAG.to_string()));
    }

    family_for_version(&version).ok_or(MetadataError::UnknownVersion(version))
}

/// Map a version string to its family
pub fn family_for_version(version: &str) -> Option<FormatFamily> {
    if version.contains("v2") {
        Some(FormatFamily::Legacy)
    } else if version.contains("v3") {
        Some(FormatFamily::V3)
    } else if version.contains("v4") {
        Some(FormatFamily::V4)
    } else if version.contains("v5") {
        Some(FormatFamily::V5)
    } else {
        None
    }
}
