//! Heuristic tempo discovery
//!
//! Formats without a fixed tempo offset are searched byte by byte. Each
//! strategy is a pure function over `(data, start)` so it can be exercised
//! against a crafted fixture on its own.

use crate::stream::i32_le_at;

/// How far past the start offset the strategies look for a candidate
pub const TEMPO_SCAN_WINDOW: usize = 1500;

/// A located tempo value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoHit {
    /// Beats per minute
    pub bpm: u32,
    /// Offset of the tempo value itself
    pub offset: usize,
}

impl TempoHit {
    /// First byte after the tempo value
    pub fn end(&self) -> usize {
        self.offset + 4
    }
}

/// Signature shared by every tempo heuristic
pub type TempoStrategy = fn(&[u8], usize) -> Option<TempoHit>;

/// Strategies tried, in order, for v5 files
pub const V5_STRATEGIES: [TempoStrategy; 3] =
    [scan_millitempo, scan_labelled_tempo, scan_block_labelled_tempo];

/// First strategy that yields a hit wins
pub fn find_tempo(data: &[u8], start: usize, strategies: &[TempoStrategy]) -> Option<TempoHit> {
    strategies.iter().find_map(|strategy| strategy(data, start))
}

fn window(data: &[u8], start: usize) -> std::ops::Range<usize> {
    let end = start.saturating_add(TEMPO_SCAN_WINDOW).min(data.len());
    start.min(end)..end
}

fn in_range(value: i32, min: i32, max: i32) -> Option<u32> {
    (min..=max).contains(&value).then_some(value as u32)
}

/// A bare 32-bit value in [30, 300]
pub fn scan_plain_tempo(data: &[u8], start: usize) -> Option<TempoHit> {
    window(data, start).find_map(|offset| {
        let bpm = in_range(i32_le_at(data, offset)?, 30, 300)?;
        Some(TempoHit { bpm, offset })
    })
}

/// Tempo stored in thousandths: a multiple of 1000 in [30000, 300000]
pub fn scan_millitempo(data: &[u8], start: usize) -> Option<TempoHit> {
    window(data, start).find_map(|offset| {
        let value = i32_le_at(data, offset)?;
        if !(30_000..=300_000).contains(&value) || value % 1000 != 0 {
            return None;
        }
        Some(TempoHit {
            bpm: (value / 1000) as u32,
            offset,
        })
    })
}

/// A byte-length label of 1..=12 characters directly followed by a tempo in [40, 300]
pub fn scan_labelled_tempo(data: &[u8], start: usize) -> Option<TempoHit> {
    window(data, start).find_map(|offset| {
        let len = usize::from(*data.get(offset)?);
        if !(1..=12).contains(&len) {
            return None;
        }
        let value_at = offset + 1 + len;
        let bpm = in_range(i32_le_at(data, value_at)?, 40, 300)?;
        Some(TempoHit {
            bpm,
            offset: value_at,
        })
    })
}

/// Block size, byte length and label (block == length + 1, length in 1..20),
/// followed by a tempo in [30, 500]
pub fn scan_block_labelled_tempo(data: &[u8], start: usize) -> Option<TempoHit> {
    window(data, start).find_map(|offset| {
        let block = i32_le_at(data, offset)?;
        let len = *data.get(offset + 4)?;
        if len == 0 || len >= 20 || block != i32::from(len) + 1 {
            return None;
        }
        let value_at = offset + 5 + usize::from(len);
        let bpm = in_range(i32_le_at(data, value_at)?, 30, 500)?;
        Some(TempoHit {
            bpm,
            offset: value_at,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_tempo_found_after_start() {
        let mut data = vec![0u8; 16];
        data.extend_from_slice(&140i32.to_le_bytes());
        data.extend_from_slice(&[0u8; 8]);

        let hit = scan_plain_tempo(&data, 0).unwrap();
        assert_eq!(hit.bpm, 140);
        assert_eq!(hit.offset, 16);
        assert_eq!(hit.end(), 20);
    }

    #[test]
    fn plain_tempo_ignores_values_out_of_range() {
        let mut data = Vec::new();
        data.extend_from_slice(&301i32.to_le_bytes());
        data.extend_from_slice(&29i32.to_le_bytes());
        assert_eq!(scan_plain_tempo(&data, 0), None);
    }

    #[test]
    fn millitempo_requires_whole_thousands() {
        let mut data = vec![0u8; 4];
        data.extend_from_slice(&120_500i32.to_le_bytes());
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(&96_000i32.to_le_bytes());

        let hit = scan_millitempo(&data, 0).unwrap();
        assert_eq!(hit.bpm, 96);
        assert_eq!(hit.offset, 12);
    }

    #[test]
    fn labelled_tempo_reads_after_label() {
        let mut data = vec![0u8; 3];
        data.push(6);
        data.extend_from_slice(b"Moder.");
        data.extend_from_slice(&132i32.to_le_bytes());
        data.extend_from_slice(&[0u8; 4]);

        let hit = scan_labelled_tempo(&data, 0).unwrap();
        assert_eq!(hit.bpm, 132);
        assert_eq!(hit.offset, 10);
    }

    #[test]
    fn block_labelled_tempo_checks_block_size() {
        let mut data = Vec::new();
        data.extend_from_slice(&6i32.to_le_bytes());
        data.push(5);
        data.extend_from_slice(b"Largo");
        data.extend_from_slice(&450i32.to_le_bytes());

        let hit = scan_block_labelled_tempo(&data, 0).unwrap();
        assert_eq!(hit.bpm, 450);
        assert_eq!(hit.offset, 10);

        data[0] = 9;
        assert_eq!(scan_block_labelled_tempo(&data, 0), None);
    }

    #[test]
    fn strategies_fall_through_in_order() {
        let mut data = Vec::new();
        data.extend_from_slice(&6i32.to_le_bytes());
        data.push(5);
        data.extend_from_slice(b"Largo");
        data.extend_from_slice(&450i32.to_le_bytes());

        // 450 is outside the labelled-tempo range, so only the third strategy matches.
        assert_eq!(scan_millitempo(&data, 0), None);
        assert_eq!(scan_labelled_tempo(&data, 0), None);
        let hit = find_tempo(&data, 0, &V5_STRATEGIES).unwrap();
        assert_eq!(hit.bpm, 450);
    }

    #[test]
    fn window_is_bounded() {
        let mut data = vec![0u8; TEMPO_SCAN_WINDOW + 8];
        data.extend_from_slice(&120i32.to_le_bytes());
        assert_eq!(scan_plain_tempo(&data, 0), None);
        assert!(scan_plain_tempo(&data, 10).is_some());
    }

    #[test]
    fn start_past_end_finds_nothing() {
        let data = 120i32.to_le_bytes();
        assert_eq!(find_tempo(&data, 100, &V5_STRATEGIES), None);
    }
}
