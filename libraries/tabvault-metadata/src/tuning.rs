//! Tuning discovery and naming
//!
//! Track headers store a string count followed by one pitch slot per string.
//! Their offset varies with everything written before them, so the first
//! few kilobytes are searched for a plausible count+pitches pattern instead.

use crate::stream::i32_le_at;

/// Only this many leading bytes are searched
pub const TUNING_SCAN_LIMIT: usize = 4000;

/// Candidates before this offset sit inside the song header and are ignored
pub const TUNING_MIN_OFFSET: usize = 400;

/// Pitch slots stored per track
pub const MAX_PITCH_SLOTS: usize = 7;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Known tunings as ascending pitch sets
const KNOWN_TUNINGS: &[(&str, &[i32])] = &[
    ("E-Standard", &[40, 45, 50, 55, 59, 64]),
    ("Drop D", &[38, 45, 50, 55, 59, 64]),
    ("Eb-Standard", &[39, 44, 49, 54, 58, 63]),
    ("Drop C#", &[37, 44, 49, 54, 58, 63]),
    ("D-Standard", &[38, 43, 48, 53, 57, 62]),
    ("Drop C", &[36, 43, 48, 53, 57, 62]),
    ("C-Standard", &[36, 41, 46, 51, 55, 60]),
    ("B-Standard", &[35, 40, 45, 50, 54, 59]),
    ("Drop B", &[35, 42, 47, 52, 56, 61]),
    ("Open G", &[38, 43, 50, 55, 59, 62]),
    ("Open D", &[38, 45, 50, 54, 57, 62]),
    ("Open E", &[40, 47, 52, 56, 59, 64]),
    ("DADGAD", &[38, 45, 50, 55, 57, 62]),
    ("7-String Standard", &[35, 40, 45, 50, 55, 59, 64]),
    ("7-String Drop A", &[33, 40, 45, 50, 55, 59, 64]),
    ("Bass E-Standard", &[28, 33, 38, 43]),
    ("Bass Drop D", &[26, 33, 38, 43]),
    ("Bass D-Standard", &[26, 31, 36, 41]),
    ("Bass 5-String Standard", &[23, 28, 33, 38, 43]),
];

/// Search the leading bytes for a tuning and name it
///
/// Returns an empty string when nothing plausible is found.
pub fn scan_tuning(data: &[u8]) -> String {
    find_tuning_pitches(data)
        .map(|pitches| name_tuning(&pitches))
        .unwrap_or_default()
}

/// Pitches of the last plausible count+pitches pattern
///
/// The search does not stop at the first candidate: every later match
/// replaces the earlier one.
pub fn find_tuning_pitches(data: &[u8]) -> Option<Vec<i32>> {
    let data = &data[..data.len().min(TUNING_SCAN_LIMIT)];
    let mut last = None;

    for offset in TUNING_MIN_OFFSET..data.len() {
        if let Some(pitches) = pitches_at(data, offset) {
            last = Some(pitches);
        }
    }

    last
}

fn pitches_at(data: &[u8], offset: usize) -> Option<Vec<i32>> {
    let count = i32_le_at(data, offset)?;
    if !(4..=8).contains(&count) {
        return None;
    }

    let slots = (count as usize).min(MAX_PITCH_SLOTS);
    let pitches = (0..slots)
        .map(|i| i32_le_at(data, offset + 4 + i * 4))
        .collect::<Option<Vec<_>>>()?;

    pitches
        .iter()
        .all(|pitch| (10..=100).contains(pitch))
        .then_some(pitches)
}

fn note_name(pitch: i32) -> &'static str {
    NOTE_NAMES[pitch.rem_euclid(12) as usize]
}

/// Name a set of string pitches
///
/// Exact matches against the known table win. Otherwise the note names are
/// concatenated from the lowest string up, accidentals included.
/// `Custom (<lowest note>)` is only used when the names would repeat the
/// same note on every string.
pub fn name_tuning(pitches: &[i32]) -> String {
    let mut sorted = pitches.to_vec();
    sorted.sort_unstable();

    if let Some((name, _)) = KNOWN_TUNINGS.iter().find(|(_, set)| *set == sorted.as_slice()) {
        return (*name).to_string();
    }

    let Some(&lowest) = sorted.first() else {
        return String::new();
    };

    let letters: Vec<&str> = sorted.iter().map(|&p| note_name(p)).collect();
    if letters.iter().all(|name| *name == letters[0]) {
        return format!("Custom ({})", note_name(lowest));
    }
    letters.concat()
}
