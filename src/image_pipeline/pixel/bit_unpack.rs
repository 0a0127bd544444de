//! Byte-order aware extraction of 9- to 16-bit samples stored in two bytes.

/// Order of bytes inside a multi-byte sample or packed word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrdering {
    #[default]
    LittleEndian,
    BigEndian,
}

impl ByteOrdering {
    /// Parse an ordering name as used in profiles and on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "le" | "little" | "littleendian" | "little-endian" => Some(Self::LittleEndian),
            "be" | "big" | "bigendian" | "big-endian" => Some(Self::BigEndian),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn read_u16(self, b0: u8, b1: u8) -> u16 {
        match self {
            Self::LittleEndian => u16::from_le_bytes([b0, b1]),
            Self::BigEndian => u16::from_be_bytes([b0, b1]),
        }
    }

    #[inline(always)]
    pub fn write_u16(self, value: u16) -> [u8; 2] {
        match self {
            Self::LittleEndian => value.to_le_bytes(),
            Self::BigEndian => value.to_be_bytes(),
        }
    }

    #[inline(always)]
    pub fn read_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::LittleEndian => u32::from_le_bytes(bytes),
            Self::BigEndian => u32::from_be_bytes(bytes),
        }
    }
}

/// Mask covering the low `bits` bits of a sample.
#[inline(always)]
pub const fn sample_mask(bits: u8) -> u16 {
    if bits >= 16 {
        u16::MAX
    } else {
        (1u16 << bits) - 1
    }
}

/// Largest value representable with `bits` effective bits.
#[inline(always)]
pub const fn max_sample(bits: u8) -> u16 {
    sample_mask(bits)
}

/// Move a native-depth sample into the top bits of a 16-bit word.
#[inline(always)]
pub const fn left_justify(value: u16, bits: u8) -> u16 {
    value << (16 - bits as u32)
}

/// Scale a native-depth sample to 16 bits by repeating its bit pattern, so
/// the maximum maps to `0xFFFF` and zero stays zero.
#[inline(always)]
pub fn replicate_bits(value: u16, bits: u8) -> u16 {
    let bits = bits.clamp(1, 16) as i32;
    let v = (value & sample_mask(bits as u8)) as u32;
    let mut out = 0u32;
    let mut shift = 16 - bits;
    while shift > -bits {
        out |= if shift >= 0 { v << shift } else { v >> -shift };
        shift -= bits;
    }
    out as u16
}

/// Reconstruct a sample of `bits` effective bits (9..=16) from two raw bytes,
/// left-justified to 16 bits. Bits above the effective depth are ignored.
#[inline(always)]
pub fn unpack_nbit(b0: u8, b1: u8, bits: u8, order: ByteOrdering) -> u16 {
    debug_assert!((9..=16).contains(&bits));
    left_justify(order.read_u16(b0, b1) & sample_mask(bits), bits)
}

/// Native-depth sample from two bytes, without justification.
#[inline(always)]
pub fn read_native(b0: u8, b1: u8, bits: u8, order: ByteOrdering) -> u16 {
    order.read_u16(b0, b1) & sample_mask(bits)
}

/// Inverse of [`unpack_nbit`] for a native-depth value.
#[inline(always)]
pub fn pack_nbit(value: u16, bits: u8, order: ByteOrdering) -> [u8; 2] {
    order.write_u16(value & sample_mask(bits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_is_lossless_at_native_depth() {
        for bits in 9..=16u8 {
            for order in [ByteOrdering::LittleEndian, ByteOrdering::BigEndian] {
                for value in 0..=max_sample(bits) {
                    let [b0, b1] = pack_nbit(value, bits, order);
                    let unpacked = unpack_nbit(b0, b1, bits, order);
                    assert_eq!(unpacked >> (16 - bits), value, "bits={bits} order={order:?}");
                }
            }
        }
    }

    #[test]
    fn stray_high_bits_are_masked() {
        // 10-bit sample with garbage in the unused top six bits.
        let unpacked = unpack_nbit(0xFF, 0xFF, 10, ByteOrdering::LittleEndian);
        assert_eq!(unpacked, 0x3FF << 6);
    }

    #[test]
    fn replication_reaches_full_scale() {
        assert_eq!(replicate_bits(0x3FF, 10), 0xFFFF);
        assert_eq!(replicate_bits(0x200, 10), 0x8020);
        assert_eq!(replicate_bits(0x1F, 5), 0xFFFF);
        assert_eq!(replicate_bits(0x3F, 6), 0xFFFF);
        assert_eq!(replicate_bits(0xABCD, 16), 0xABCD);
        assert_eq!(replicate_bits(1, 1), 0xFFFF);
        assert_eq!(replicate_bits(0, 12), 0);
    }

    #[test]
    fn byte_orderings_differ() {
        assert_eq!(unpack_nbit(0x01, 0x00, 16, ByteOrdering::LittleEndian), 0x0001);
        assert_eq!(unpack_nbit(0x01, 0x00, 16, ByteOrdering::BigEndian), 0x0100);
        assert_eq!(ByteOrdering::from_name("BE"), Some(ByteOrdering::BigEndian));
        assert_eq!(ByteOrdering::from_name("middle"), None);
    }
}
