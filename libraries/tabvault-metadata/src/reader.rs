/// Tab metadata parser
use crate::error::{MetadataError, Result};
use crate::format::{self, FormatFamily, HEADER_LEN, UNKNOWN_TAG};
use crate::stream::ByteCursor;
use crate::tempo::{self, V5_STRATEGIES};
use crate::tuning;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tabvault_core::{TabMetadata, TabMetadataReader};
use tracing::debug;

/// Only the leading part of a file is ever needed
pub const MAX_READ_BYTES: u64 = 1024 * 1024;

/// Width of each fixed string field in the legacy header
pub const LEGACY_FIELD_LEN: usize = 50;

/// Bytes between the legacy artist field and the tempo search
const LEGACY_TEMPO_GAP: usize = 10;

/// Notice counts above this are treated as corrupt
pub const MAX_NOTICE_LINES: i32 = 50;

/// Lyric lines written by v4 between the notices and the tempo
const V4_LYRIC_LINES: usize = 5;

/// Stateless parser for the supported tab format families
#[derive(Debug, Clone, Copy, Default)]
pub struct TabMetadataParser;

impl TabMetadataParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    /// Parse an in-memory file
    pub fn parse_bytes(&self, data: &[u8]) -> TabMetadata {
        let mut cursor = ByteCursor::new(data);

        let family = match format::sniff(&mut cursor, data) {
            Ok(family) => family,
            Err(MetadataError::UnsupportedFormat(tag)) => {
                debug!("Unsupported tab format family: {}", tag);
                return TabMetadata::invalid(tag);
            }
            Err(e) => {
                debug!("Unrecognised tab file: {}", e);
                return TabMetadata::invalid(UNKNOWN_TAG);
            }
        };

        let mut meta = TabMetadata {
            format_version: family.tag().to_string(),
            is_valid: true,
            ..TabMetadata::default()
        };

        match family {
            FormatFamily::Legacy => parse_legacy(&mut cursor, data, &mut meta),
            FormatFamily::V3 | FormatFamily::V4 | FormatFamily::V5 => {
                parse_modern(&mut cursor, data, family, &mut meta);
            }
        }

        meta
    }

    fn read_file(path: &Path) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        File::open(path)?
            .take(MAX_READ_BYTES)
            .read_to_end(&mut data)?;
        Ok(data)
    }
}

impl TabMetadataReader for TabMetadataParser {
    fn parse_metadata(&self, path: &Path) -> TabMetadata {
        match Self::read_file(path) {
            Ok(data) => self.parse_bytes(&data),
            Err(e) => {
                debug!("Failed to read {}: {}", path.display(), e);
                TabMetadata::default()
            }
        }
    }
}

/// Three fixed-width strings, then a searched tempo
fn parse_legacy(cursor: &mut ByteCursor<'_>, data: &[u8], meta: &mut TabMetadata) {
    cursor.seek(HEADER_LEN);
    meta.title = cursor.read_byte_string(LEGACY_FIELD_LEN);
    meta.subtitle = cursor.read_byte_string(LEGACY_FIELD_LEN);
    meta.artist = cursor.read_byte_string(LEGACY_FIELD_LEN);
    cursor.skip(LEGACY_TEMPO_GAP);

    if let Some(hit) = tempo::scan_plain_tempo(data, cursor.position()) {
        meta.bpm = hit.bpm;
    }
    meta.tuning = tuning::scan_tuning(data);
}

/// Int-prefixed string sequence shared by v3, v4 and v5
fn parse_modern(
    cursor: &mut ByteCursor<'_>,
    data: &[u8],
    family: FormatFamily,
    meta: &mut TabMetadata,
) {
    meta.title = cursor.read_int_byte_string();
    meta.subtitle = cursor.read_int_byte_string();
    meta.artist = cursor.read_int_byte_string();
    meta.album = cursor.read_int_byte_string();
    meta.author = cursor.read_int_byte_string();
    meta.copyright = cursor.read_int_byte_string();
    meta.tab = cursor.read_int_byte_string();
    meta.instruction = cursor.read_int_byte_string();

    let mut count = cursor.read_i32_le();
    if !(0..=MAX_NOTICE_LINES).contains(&count) {
        debug!("Ignoring implausible notice count {}", count);
        count = 0;
    }
    meta.notice = (0..count).map(|_| cursor.read_int_byte_string()).collect();

    match family {
        FormatFamily::V5 => match tempo::find_tempo(data, cursor.position(), &V5_STRATEGIES) {
            Some(hit) => {
                meta.bpm = hit.bpm;
                cursor.seek(hit.end());
                meta.tuning = tuning::scan_tuning(data);
            }
            None => debug!("No tempo candidate found in v5 header"),
        },
        FormatFamily::V4 => {
            skip_v4_lyrics(cursor);
            read_fixed_tempo(cursor, data, meta);
        }
        FormatFamily::V3 | FormatFamily::Legacy => read_fixed_tempo(cursor, data, meta),
    }
}

// Lyrics track number, then (start bar, text) per line; nothing here is reported.
fn skip_v4_lyrics(cursor: &mut ByteCursor<'_>) {
    cursor.skip(4);
    for _ in 0..V4_LYRIC_LINES {
        cursor.skip(4);
        cursor.read_int_byte_string();
    }
}

fn read_fixed_tempo(cursor: &mut ByteCursor<'_>, data: &[u8], meta: &mut TabMetadata) {
    meta.bpm = u32::from(cursor.read_u16_le());
    meta.tuning = tuning::scan_tuning(data);
}
