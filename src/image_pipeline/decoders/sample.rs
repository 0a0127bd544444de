//! Per-plane sample extraction with level correction.

use crate::image_pipeline::format::ImagePlaneOptions;
use crate::image_pipeline::pixel::{ByteOrdering, LevelTable, LevelTable8, read_native, replicate_bits, unpack_nbit};

/// Reads one sample from a row and returns it normalized and left-justified
/// to 16 bits.
#[derive(Clone)]
pub(crate) enum SampleReader {
    Byte(LevelTable8),
    Word {
        bits: u8,
        order: ByteOrdering,
        levels: LevelTable,
    },
}

impl SampleReader {
    pub fn for_plane(plane: &ImagePlaneOptions, order: ByteOrdering) -> Self {
        let (black, white) = plane.levels();
        if plane.effective_bits <= 8 {
            Self::Byte(LevelTable8::new(black, white))
        } else {
            Self::Word {
                bits: plane.effective_bits,
                order,
                levels: LevelTable::new(plane.effective_bits, black, white),
            }
        }
    }

    /// Bytes the sample occupies in the row.
    pub fn size(&self) -> usize {
        match self {
            Self::Byte(_) => 1,
            Self::Word { .. } => 2,
        }
    }

    #[inline(always)]
    pub fn read(&self, row: &[u8], offset: usize) -> u16 {
        match self {
            Self::Byte(table) => (table.apply(row[offset]) as u16) << 8,
            Self::Word { bits, order, levels } if levels.is_identity() => {
                unpack_nbit(row[offset], row[offset + 1], *bits, *order)
            }
            Self::Word { bits, order, levels } => {
                levels.apply(read_native(row[offset], row[offset + 1], *bits, *order))
            }
        }
    }

    /// Alpha: no level correction, and the native maximum is fully opaque.
    #[inline(always)]
    pub fn read_alpha(&self, row: &[u8], offset: usize) -> u16 {
        match self {
            Self::Byte(_) => (row[offset] as u16) << 8,
            Self::Word { bits, order, .. } => {
                replicate_bits(read_native(row[offset], row[offset + 1], *bits, *order), *bits)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_and_word_samples() {
        let byte = SampleReader::for_plane(&ImagePlaneOptions::new(1, 4, 8), ByteOrdering::LittleEndian);
        assert_eq!(byte.size(), 1);
        assert_eq!(byte.read(&[0x7F], 0), 0x7F00);

        let word = SampleReader::for_plane(&ImagePlaneOptions::new(2, 8, 10), ByteOrdering::BigEndian);
        assert_eq!(word.size(), 2);
        assert_eq!(word.read(&[0x03, 0xFF], 0), 0x3FF << 6);
    }

    #[test]
    fn full_range_words_match_nbit_unpack() {
        let reader = SampleReader::for_plane(&ImagePlaneOptions::new(2, 8, 12), ByteOrdering::LittleEndian);
        for raw in [[0x00, 0x00], [0x34, 0x02], [0xFF, 0x0F], [0xFF, 0xFF]] {
            assert_eq!(reader.read(&raw, 0), unpack_nbit(raw[0], raw[1], 12, ByteOrdering::LittleEndian));
        }
    }

    #[test]
    fn narrow_alpha_reaches_opaque() {
        let reader = SampleReader::for_plane(&ImagePlaneOptions::new(2, 8, 10), ByteOrdering::BigEndian);
        assert_eq!(reader.read_alpha(&[0x03, 0xFF], 0), 0xFFFF);
        assert_eq!(reader.read_alpha(&[0x00, 0x00], 0), 0);
        assert_eq!(reader.read(&[0x03, 0xFF], 0), 0xFFC0);
    }

    #[test]
    fn levels_do_not_touch_alpha() {
        let plane = ImagePlaneOptions::new(1, 4, 8).with_levels(10, 20);
        let reader = SampleReader::for_plane(&plane, ByteOrdering::LittleEndian);
        assert_eq!(reader.read(&[15], 0), 128 << 8);
        assert_eq!(reader.read_alpha(&[15], 0), 15 << 8);
    }
}
