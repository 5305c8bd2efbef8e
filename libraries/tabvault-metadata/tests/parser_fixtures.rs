/// Parser tests against crafted byte fixtures
///
/// Fixtures are assembled in-test with `TabBuilder` so every offset the
/// heuristics depend on is visible next to the assertion.
use std::fs;
use tabvault_core::TabMetadataReader;
use tabvault_metadata::TabMetadataParser;
use tempfile::TempDir;

const TUNING_OFFSET: usize = 600;

#[derive(Default)]
struct TabBuilder {
    bytes: Vec<u8>,
}

impl TabBuilder {
    fn with_version(version: &str) -> Self {
        let mut builder = Self::default();
        builder.bytes.push(version.len() as u8);
        builder.bytes.extend_from_slice(version.as_bytes());
        builder.bytes.resize(31, 0);
        builder
    }

    fn int_byte_string(mut self, text: &str) -> Self {
        self.bytes
            .extend_from_slice(&(text.len() as i32 + 1).to_le_bytes());
        self.bytes.push(text.len() as u8);
        self.bytes.extend_from_slice(text.as_bytes());
        self
    }

    fn byte_string(mut self, text: &str, field_len: usize) -> Self {
        self.bytes.push(text.len() as u8);
        let start = self.bytes.len();
        self.bytes.extend_from_slice(text.as_bytes());
        self.bytes.resize(start + field_len, 0);
        self
    }

    fn i32(mut self, value: i32) -> Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    fn u16(mut self, value: u16) -> Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    fn zeros(mut self, n: usize) -> Self {
        self.bytes.resize(self.bytes.len() + n, 0);
        self
    }

    /// Pad to `TUNING_OFFSET` and write a track tuning block there
    fn tuning(mut self, pitches: &[i32]) -> Self {
        assert!(self.bytes.len() <= TUNING_OFFSET, "header overran tuning block");
        self.bytes.resize(TUNING_OFFSET, 0);
        self = self.i32(pitches.len() as i32);
        for slot in 0..7 {
            self = self.i32(pitches.get(slot).copied().unwrap_or(0));
        }
        self.zeros(64)
    }

    /// Title, subtitle, artist, album, author, copyright, tab, instruction
    fn song_info(self, title: &str, artist: &str) -> Self {
        self.int_byte_string(title)
            .int_byte_string("")
            .int_byte_string(artist)
            .int_byte_string("Demo Album")
            .int_byte_string("Someone")
            .int_byte_string("(c) 2024")
            .int_byte_string("Tabber")
            .int_byte_string("Play slowly")
    }

    fn build(self) -> Vec<u8> {
        self.bytes
    }
}

const E_STANDARD: [i32; 6] = [64, 59, 55, 50, 45, 40];
const DROP_D: [i32; 6] = [64, 59, 55, 50, 45, 38];

fn parse(bytes: &[u8]) -> tabvault_core::TabMetadata {
    TabMetadataParser::new().parse_bytes(bytes)
}

#[test]
fn v3_header_fields_and_tempo() {
    let bytes = TabBuilder::with_version("FICHIER GUITAR PRO v3.00")
        .song_info("Test Song", "Tester")
        .i32(1)
        .int_byte_string("first notice")
        .u16(120)
        .tuning(&E_STANDARD)
        .build();

    let meta = parse(&bytes);
    assert!(meta.is_valid);
    assert_eq!(meta.format_version, "v3");
    assert_eq!(meta.title, "Test Song");
    assert_eq!(meta.subtitle, "");
    assert_eq!(meta.artist, "Tester");
    assert_eq!(meta.album, "Demo Album");
    assert_eq!(meta.author, "Someone");
    assert_eq!(meta.copyright, "(c) 2024");
    assert_eq!(meta.tab, "Tabber");
    assert_eq!(meta.instruction, "Play slowly");
    assert_eq!(meta.notice, vec!["first notice".to_string()]);
    assert_eq!(meta.bpm, 120);
    assert_eq!(meta.tuning, "E-Standard");
}

#[test]
fn corrupt_notice_count_is_ignored() {
    let bytes = TabBuilder::with_version("FICHIER GUITAR PRO v3.00")
        .song_info("Test Song", "Tester")
        .i32(51)
        .u16(98)
        .build();

    let meta = parse(&bytes);
    assert!(meta.is_valid);
    assert!(meta.notice.is_empty());
    assert_eq!(meta.bpm, 98);
}

#[test]
fn negative_notice_count_is_ignored() {
    let bytes = TabBuilder::with_version("FICHIER GUITAR PRO v3.00")
        .song_info("Test Song", "Tester")
        .i32(-3)
        .u16(77)
        .build();

    let meta = parse(&bytes);
    assert!(meta.notice.is_empty());
    assert_eq!(meta.bpm, 77);
}

#[test]
fn v4_skips_lyrics_before_tempo() {
    let mut builder = TabBuilder::with_version("FICHIER GUITAR PRO v4.06")
        .song_info("Four", "Band")
        .i32(0)
        .i32(1);
    for line in ["la", "", "", "", "la la"] {
        builder = builder.i32(1).int_byte_string(line);
    }
    let bytes = builder.u16(90).tuning(&DROP_D).build();

    let meta = parse(&bytes);
    assert!(meta.is_valid);
    assert_eq!(meta.format_version, "v4");
    assert_eq!(meta.title, "Four");
    assert_eq!(meta.bpm, 90);
    assert_eq!(meta.tuning, "Drop D");
}

#[test]
fn v5_millitempo_strategy() {
    let bytes = TabBuilder::with_version("FICHIER GUITAR PRO v5.00")
        .song_info("Five", "Band")
        .i32(0)
        .zeros(4)
        .i32(120_000)
        .tuning(&E_STANDARD)
        .build();

    let meta = parse(&bytes);
    assert!(meta.is_valid);
    assert_eq!(meta.format_version, "v5");
    assert_eq!(meta.bpm, 120);
    assert_eq!(meta.tuning, "E-Standard");
}

#[test]
fn v5_labelled_tempo_strategy() {
    let bytes = TabBuilder::with_version("FICHIER GUITAR PRO v5.10")
        .song_info("Five", "Band")
        .i32(0)
        .zeros(4)
        .raw(&[8])
        .raw(b"Moderato")
        .i32(132)
        .tuning(&DROP_D)
        .build();

    let meta = parse(&bytes);
    assert_eq!(meta.bpm, 132);
    assert_eq!(meta.tuning, "Drop D");
}

#[test]
fn v5_block_labelled_tempo_strategy() {
    let bytes = TabBuilder::with_version("FICHIER GUITAR PRO v5.00")
        .song_info("Five", "Band")
        .i32(0)
        .int_byte_string("Largo")
        .i32(450)
        .tuning(&E_STANDARD)
        .build();

    let meta = parse(&bytes);
    assert_eq!(meta.bpm, 450);
    assert_eq!(meta.tuning, "E-Standard");
}

#[test]
fn v5_without_tempo_skips_tuning() {
    let bytes = TabBuilder::with_version("FICHIER GUITAR PRO v5.00")
        .song_info("Five", "Band")
        .i32(0)
        .tuning(&E_STANDARD)
        .build();

    let meta = parse(&bytes);
    assert!(meta.is_valid);
    assert_eq!(meta.bpm, 0);
    assert_eq!(meta.tuning, "");
}

#[test]
fn legacy_fixed_fields_and_searched_tempo() {
    let bytes = TabBuilder::with_version("FICHIER GUITARE PRO v2.21")
        .byte_string("Old Song", 50)
        .byte_string("", 50)
        .byte_string("Old Artist", 50)
        .zeros(10)
        .zeros(8)
        .i32(100)
        .tuning(&DROP_D)
        .build();

    let meta = parse(&bytes);
    assert!(meta.is_valid);
    assert_eq!(meta.format_version, "v2");
    assert_eq!(meta.title, "Old Song");
    assert_eq!(meta.artist, "Old Artist");
    assert!(meta.album.is_empty());
    assert_eq!(meta.bpm, 100);
    assert_eq!(meta.tuning, "Drop D");
}

#[test]
fn zip_signature_is_unsupported() {
    let mut bytes = b"PK\x03\x04".to_vec();
    bytes.extend(
        TabBuilder::with_version("FICHIER GUITAR PRO v5.00")
            .song_info("Hidden", "Band")
            .build(),
    );

    let meta = parse(&bytes);
    assert!(!meta.is_valid);
    assert_eq!(meta.format_version, "archive");
    assert!(meta.title.is_empty());
}

#[test]
fn compressed_marker_is_unsupported() {
    let meta = parse(b"BCFZ\x00\x10\x00\x00rest-of-stream");
    assert!(!meta.is_valid);
    assert_eq!(meta.format_version, "compressed");
}

#[test]
fn truncated_header_degrades_to_empty_fields() {
    let bytes = TabBuilder::with_version("FICHIER GUITAR PRO v3.00")
        .int_byte_string("Cut Short")
        .build();

    let meta = parse(&bytes);
    assert!(meta.is_valid);
    assert_eq!(meta.title, "Cut Short");
    assert!(meta.artist.is_empty());
    assert_eq!(meta.bpm, 0);
    assert_eq!(meta.tuning, "");
}

#[test]
fn parse_metadata_reads_from_disk() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("song.gp3");
    let bytes = TabBuilder::with_version("FICHIER GUITAR PRO v3.00")
        .song_info("Test Song", "Tester")
        .i32(0)
        .u16(120)
        .build();
    fs::write(&path, bytes).unwrap();

    let meta = TabMetadataParser::new().parse_metadata(&path);
    assert!(meta.is_valid);
    assert_eq!(meta.title, "Test Song");
    assert_eq!(meta.artist, "Tester");
    assert_eq!(meta.bpm, 120);
}

#[test]
fn concurrent_parsing_is_independent() {
    let parser = TabMetadataParser::new();
    let bytes = TabBuilder::with_version("FICHIER GUITAR PRO v3.00")
        .song_info("Shared", "Tester")
        .i32(0)
        .u16(150)
        .build();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| parser.parse_bytes(&bytes)))
            .collect();
        for handle in handles {
            let meta = handle.join().unwrap();
            assert_eq!(meta.bpm, 150);
            assert_eq!(meta.title, "Shared");
        }
    });
}
