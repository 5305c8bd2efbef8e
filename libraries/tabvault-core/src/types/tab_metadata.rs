//! Parser result type

use serde::{Deserialize, Serialize};

/// Metadata extracted from a tab file
///
/// Text fields are empty when the source format does not carry them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TabMetadata {
    /// Detected version tag ("v2".."v5"), or a marker for unsupported families
    pub format_version: String,
    /// Song title
    pub title: String,
    /// Subtitle
    pub subtitle: String,
    /// Artist
    pub artist: String,
    /// Album
    pub album: String,
    /// Author (words/music)
    pub author: String,
    /// Copyright notice
    pub copyright: String,
    /// Tabbed by
    pub tab: String,
    /// Instructions
    pub instruction: String,
    /// Free-form notice lines
    pub notice: Vec<String>,
    /// Tempo, 0 when not discoverable
    pub bpm: u32,
    /// Tuning label, empty when not discoverable
    pub tuning: String,
    /// False if the format is unrecognised, unsupported, or unreadable
    pub is_valid: bool,
}

impl TabMetadata {
    /// Invalid metadata tagged with the detected format marker
    pub fn invalid(format_version: impl Into<String>) -> Self {
        Self {
            format_version: format_version.into(),
            ..Self::default()
        }
    }

    /// Title, falling back to the given file stem when the header has none
    pub fn display_title<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.title.trim().is_empty() {
            fallback
        } else {
            &self.title
        }
    }
}
