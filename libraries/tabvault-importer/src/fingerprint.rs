//! Sparse content fingerprints
//!
//! A fingerprint hashes at most three 1 KiB windows (start, middle, end)
//! plus the file size. It is fast on large trees of small binary files, and
//! it is an approximation: files that differ only outside the sampled
//! windows collide.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tabvault_core::EMPTY_FILE_FINGERPRINT;

/// Bytes hashed per sampled window
pub const SAMPLE_WINDOW: u64 = 1024;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a running hash
#[derive(Debug, Clone, Copy)]
pub struct FingerprintHasher {
    state: u64,
}

impl Default for FingerprintHasher {
    fn default() -> Self {
        Self {
            state: FNV_OFFSET_BASIS,
        }
    }
}

impl FingerprintHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= u64::from(byte);
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    /// Fold a whole 64-bit value in as a single step
    pub fn write_u64(&mut self, value: u64) {
        self.state ^= value;
        self.state = self.state.wrapping_mul(FNV_PRIME);
    }

    pub fn finish(&self) -> u64 {
        self.state
    }

    /// 16 uppercase hex digits
    pub fn finish_hex(&self) -> String {
        hex::encode_upper(self.state.to_be_bytes())
    }
}

/// Fingerprint a file, or an empty string if it cannot be read
///
/// An empty result is a hashing failure, distinct from the `"0"` returned
/// for zero-byte files.
pub fn fingerprint_file(path: &Path) -> String {
    match try_fingerprint_file(path) {
        Ok(digest) => digest,
        Err(e) => {
            tracing::debug!("Failed to fingerprint {}: {}", path.display(), e);
            String::new()
        }
    }
}

/// Fingerprint a file, propagating I/O errors
pub fn try_fingerprint_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    fingerprint_reader(&mut file, size)
}

/// Fingerprint `size` bytes readable from `reader`
pub fn fingerprint_reader<R: Read + Seek>(reader: &mut R, size: u64) -> io::Result<String> {
    if size == 0 {
        return Ok(EMPTY_FILE_FINGERPRINT.to_string());
    }

    let mut hasher = FingerprintHasher::new();
    for offset in sample_offsets(size) {
        let window = read_window(reader, offset)?;
        hasher.write(&window);
    }
    hasher.write_u64(size);

    Ok(hasher.finish_hex())
}

/// Start offsets of the sampled windows for a file of `size` bytes
pub fn sample_offsets(size: u64) -> Vec<u64> {
    if size > 2 * SAMPLE_WINDOW {
        vec![0, size / 2, size - SAMPLE_WINDOW]
    } else {
        vec![0]
    }
}

fn read_window<R: Read + Seek>(reader: &mut R, offset: u64) -> io::Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut buffer = Vec::with_capacity(SAMPLE_WINDOW as usize);
    reader.by_ref().take(SAMPLE_WINDOW).read_to_end(&mut buffer)?;
    Ok(buffer)
}
