//! Scan result types
//!
//! A `FileRecord` is created once per discovered file during a scan session.
//! Its path never changes; only the status is revised by the duplicate pass
//! that runs after every root has been walked.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fingerprint assigned to zero-byte files, which are never read
pub const EMPTY_FILE_FINGERPRINT: &str = "0";

/// Classification of a scanned file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Hashed successfully, unique so far
    #[default]
    Ready,
    /// Zero bytes or unreadable
    Defect,
    /// Shares its fingerprint with at least one other file in the scan
    Duplicate,
    /// Fingerprint already present in the external catalog
    AlreadyInStore,
    /// Accepted and stored by an importer
    Managed,
    /// Refused by an importer (e.g. unsupported tab format)
    Rejected,
}

impl FileStatus {
    /// Convert to string for storage and display
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Defect => "defect",
            Self::Duplicate => "duplicate",
            Self::AlreadyInStore => "already_in_store",
            Self::Managed => "managed",
            Self::Rejected => "rejected",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ready" => Some(Self::Ready),
            "defect" => Some(Self::Defect),
            "duplicate" => Some(Self::Duplicate),
            "already_in_store" => Some(Self::AlreadyInStore),
            "managed" => Some(Self::Managed),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scanned file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path at scan time
    pub path: PathBuf,

    /// Byte length at scan time
    pub size: u64,

    /// Hex digest, `"0"` for empty files, empty when hashing failed
    pub fingerprint: String,

    /// Duplicate cluster id, 0 when the file has no usable fingerprint
    pub group_id: u32,

    /// Current classification
    pub status: FileStatus,
}

impl FileRecord {
    /// Create a record with `Ready` status and no group yet
    pub fn new(path: PathBuf, size: u64, fingerprint: String) -> Self {
        Self {
            path,
            size,
            fingerprint,
            group_id: 0,
            status: FileStatus::Ready,
        }
    }

    /// Create a `Defect` record
    pub fn defect(path: PathBuf, size: u64, fingerprint: String) -> Self {
        Self {
            path,
            size,
            fingerprint,
            group_id: 0,
            status: FileStatus::Defect,
        }
    }

    /// Whether the record is a defect
    pub fn is_defect(&self) -> bool {
        self.status == FileStatus::Defect
    }

    /// File name component, lossily converted
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// All files of one scan that share a fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Shared fingerprint
    pub fingerprint: String,

    /// Group id shared by every member
    pub group_id: u32,

    /// Size of each member (identical fingerprints imply identical sizes)
    pub file_size: u64,

    /// Member paths in discovery order
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Number of members
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the group has no members
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Bytes that would be freed by keeping a single copy
    pub fn reclaimable_bytes(&self) -> u64 {
        self.file_size * (self.paths.len().saturating_sub(1) as u64)
    }
}
