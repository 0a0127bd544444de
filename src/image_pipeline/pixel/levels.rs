//! Black/white level normalization tables.

use super::bit_unpack::{left_justify, max_sample};

/// 256-entry table mapping a raw 8-bit sample to a normalized 8-bit value.
#[derive(Clone)]
pub struct LevelTable8 {
    entries: [u8; 256],
}

impl LevelTable8 {
    /// Build the table for `[black, white]`. Samples at or below `black` map to
    /// zero, samples at or above `white` map to 255.
    pub fn new(black: u16, white: u16) -> Self {
        let mut entries = [0u8; 256];
        let black = black.min(255) as u32;
        let white = white.min(255) as u32;
        if black == 0 && white == 255 {
            for (i, e) in entries.iter_mut().enumerate() {
                *e = i as u8;
            }
            return Self { entries };
        }
        let range = white.saturating_sub(black).max(1);
        for (i, e) in entries.iter_mut().enumerate() {
            let v = i as u32;
            *e = if v <= black {
                0
            } else if v >= white {
                255
            } else {
                (((v - black) * 255 + range / 2) / range) as u8
            };
        }
        Self { entries }
    }

    pub fn identity() -> Self {
        Self::new(0, 255)
    }

    #[inline(always)]
    pub fn apply(&self, raw: u8) -> u8 {
        self.entries[raw as usize]
    }

    pub fn entries(&self) -> &[u8; 256] {
        &self.entries
    }
}

/// Level table over the raw domain of an N-bit sample (2^N entries).
///
/// Output stays at native depth; callers left-justify afterwards. The
/// full-range default `[0, 2^N - 1]` carries no table at all.
#[derive(Clone)]
pub struct LevelTable {
    bits: u8,
    entries: Option<Box<[u16]>>,
}

impl LevelTable {
    pub fn new(bits: u8, black: u16, white: u16) -> Self {
        let max = max_sample(bits) as u32;
        let black = (black as u32).min(max);
        let white = (white as u32).min(max);
        if black == 0 && white == max {
            return Self { bits, entries: None };
        }
        let range = white.saturating_sub(black).max(1);
        let entries = (0..=max)
            .map(|v| {
                if v <= black {
                    0
                } else if v >= white {
                    max as u16
                } else {
                    (((v - black) as u64 * max as u64 + range as u64 / 2) / range as u64) as u16
                }
            })
            .collect::<Vec<u16>>()
            .into_boxed_slice();
        Self { bits, entries: Some(entries) }
    }

    pub fn full_range(bits: u8) -> Self {
        Self { bits, entries: None }
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn is_identity(&self) -> bool {
        self.entries.is_none()
    }

    /// Normalize a native sample and left-justify it to 16 bits.
    #[inline(always)]
    pub fn apply(&self, native: u16) -> u16 {
        let v = match &self.entries {
            Some(table) => table[native as usize],
            None => native,
        };
        left_justify(v, self.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_table_8bit() {
        let table = LevelTable8::identity();
        assert!((0..=255u8).all(|v| table.apply(v) == v));
    }

    #[test]
    fn levels_clip_8bit() {
        let table = LevelTable8::new(16, 235);
        assert_eq!(table.apply(0), 0);
        assert_eq!(table.apply(16), 0);
        assert_eq!(table.apply(235), 255);
        assert_eq!(table.apply(255), 255);
        let mid = table.apply(125);
        assert!(mid > 120 && mid < 135, "mid={mid}");
    }

    #[test]
    fn levels_clip_nbit() {
        let table = LevelTable::new(12, 256, 3840);
        assert_eq!(table.apply(100), 0);
        assert_eq!(table.apply(256), 0);
        assert_eq!(table.apply(3840), left_justify(4095, 12));
        assert_eq!(table.apply(4095), left_justify(4095, 12));
    }

    #[test]
    fn full_range_is_plain_justification() {
        let table = LevelTable::new(10, 0, 1023);
        assert!(table.is_identity());
        assert_eq!(table.apply(1), 1 << 6);
    }
}
