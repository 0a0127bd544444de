//! MIPI CSI-2 style sub-byte packing (RAW10, RAW12, RAW14).
//!
//! A group of pixels stores each pixel's eight most significant bits in its own
//! byte, followed by one or more bytes carrying the remaining low-order bits of
//! every pixel in the group:
//!
//! ```text
//! RAW10: P0[9:2] P1[9:2] P2[9:2] P3[9:2] | P3[1:0] P2[1:0] P1[1:0] P0[1:0]
//! RAW12: P0[11:4] P1[11:4]               | P1[3:0] P0[3:0]
//! RAW14: P0[13:6] P1[13:6] P2[13:6] P3[13:6] | 24 bits of 6-bit fragments
//! ```
//!
//! The layout above is [`ByteOrdering::LittleEndian`]: the first pixel's
//! fragment sits in the least significant bits of the trailing bytes.
//! [`ByteOrdering::BigEndian`] places the first pixel's fragment in the most
//! significant bits instead.

use super::bit_unpack::ByteOrdering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MipiPacking {
    Raw10,
    Raw12,
    Raw14,
}

impl MipiPacking {
    pub const fn bits(self) -> u8 {
        match self {
            Self::Raw10 => 10,
            Self::Raw12 => 12,
            Self::Raw14 => 14,
        }
    }

    pub const fn pixels_per_group(self) -> usize {
        match self {
            Self::Raw10 | Self::Raw14 => 4,
            Self::Raw12 => 2,
        }
    }

    pub const fn bytes_per_group(self) -> usize {
        match self {
            Self::Raw10 => 5,
            Self::Raw12 => 3,
            Self::Raw14 => 7,
        }
    }

    const fn fragment_bits(self) -> u32 {
        self.bits() as u32 - 8
    }

    /// Bytes needed for one row of `width` pixels; partial groups are padded.
    pub fn row_bytes(self, width: usize) -> usize {
        width.div_ceil(self.pixels_per_group()) * self.bytes_per_group()
    }

    #[inline(always)]
    fn fragments(self, tail: &[u8], order: ByteOrdering) -> u32 {
        match (self, order) {
            (Self::Raw10 | Self::Raw12, _) => tail[0] as u32,
            (Self::Raw14, ByteOrdering::LittleEndian) => {
                tail[0] as u32 | (tail[1] as u32) << 8 | (tail[2] as u32) << 16
            }
            (Self::Raw14, ByteOrdering::BigEndian) => {
                (tail[0] as u32) << 16 | (tail[1] as u32) << 8 | tail[2] as u32
            }
        }
    }

    /// Unpack one complete group into native-depth samples.
    ///
    /// `group` must hold [`bytes_per_group`](Self::bytes_per_group) bytes and
    /// `out` at least [`pixels_per_group`](Self::pixels_per_group) entries.
    #[inline(always)]
    pub fn unpack_group(self, group: &[u8], order: ByteOrdering, out: &mut [u16]) {
        let n = self.pixels_per_group();
        let frag_bits = self.fragment_bits();
        let frag_mask = (1u32 << frag_bits) - 1;
        let packed = self.fragments(&group[n..], order);
        for (i, px) in out[..n].iter_mut().enumerate() {
            let slot = match order {
                ByteOrdering::LittleEndian => i,
                ByteOrdering::BigEndian => n - 1 - i,
            };
            let frag = (packed >> (slot as u32 * frag_bits)) & frag_mask;
            *px = ((group[i] as u32) << frag_bits | frag) as u16;
        }
    }

    /// Pack native-depth samples into one group. Used to synthesize frames.
    pub fn pack_group(self, values: &[u16], order: ByteOrdering, out: &mut [u8]) {
        let n = self.pixels_per_group();
        let frag_bits = self.fragment_bits();
        let frag_mask = (1u32 << frag_bits) - 1;
        let mut packed = 0u32;
        for (i, &v) in values[..n].iter().enumerate() {
            let v = v as u32;
            out[i] = (v >> frag_bits) as u8;
            let slot = match order {
                ByteOrdering::LittleEndian => i,
                ByteOrdering::BigEndian => n - 1 - i,
            };
            packed |= (v & frag_mask) << (slot as u32 * frag_bits);
        }
        let tail = &mut out[n..self.bytes_per_group()];
        match (self, order) {
            (Self::Raw10 | Self::Raw12, _) => tail[0] = packed as u8,
            (Self::Raw14, ByteOrdering::LittleEndian) => {
                tail.copy_from_slice(&[packed as u8, (packed >> 8) as u8, (packed >> 16) as u8]);
            }
            (Self::Raw14, ByteOrdering::BigEndian) => {
                tail.copy_from_slice(&[(packed >> 16) as u8, (packed >> 8) as u8, packed as u8]);
            }
        }
    }

    /// Pack a full row of native samples; the trailing partial group is zero padded.
    pub fn pack_row(self, values: &[u16], order: ByteOrdering) -> Vec<u8> {
        let n = self.pixels_per_group();
        let mut out = vec![0u8; self.row_bytes(values.len())];
        let mut group = vec![0u16; n];
        for (chunk, dst) in values.chunks(n).zip(out.chunks_exact_mut(self.bytes_per_group())) {
            group.fill(0);
            group[..chunk.len()].copy_from_slice(chunk);
            self.pack_group(&group, order, dst);
        }
        out
    }
}

/// Unpack up to `out.len()` pixels from a (possibly truncated) packed row.
///
/// Returns the number of pixels recovered. A trailing group that is not fully
/// present in `src` is not decoded.
pub fn unpack_row(packing: MipiPacking, src: &[u8], order: ByteOrdering, out: &mut [u16]) -> usize {
    let n = packing.pixels_per_group();
    let group_bytes = packing.bytes_per_group();
    let mut scratch = [0u16; 4];
    let mut x = 0usize;

    if packing == MipiPacking::Raw10 && order == ByteOrdering::LittleEndian {
        x = unpack_raw10_le_fast(src, out);
    }

    for group in src[(x / n) * group_bytes..].chunks_exact(group_bytes) {
        if x >= out.len() {
            break;
        }
        packing.unpack_group(group, order, &mut scratch);
        let take = n.min(out.len() - x);
        out[x..x + take].copy_from_slice(&scratch[..take]);
        x += take;
    }
    x
}

/// RAW10 little-endian fast path over whole groups. Returns pixels written,
/// always a multiple of four.
#[inline(always)]
fn unpack_raw10_le_fast(src: &[u8], out: &mut [u16]) -> usize {
    let groups = (src.len() / 5).min(out.len() / 4);
    assert!(groups * 5 <= src.len() && groups * 4 <= out.len());
    for g in 0..groups {
        let off = g * 5;
        let x = g * 4;
        // SAFETY: the assert above bounds off + 4 < src.len() and x + 3 < out.len().
        unsafe {
            let b4 = *src.get_unchecked(off + 4) as u16;
            *out.get_unchecked_mut(x) = (*src.get_unchecked(off) as u16) << 2 | (b4 & 0x03);
            *out.get_unchecked_mut(x + 1) =
                (*src.get_unchecked(off + 1) as u16) << 2 | ((b4 >> 2) & 0x03);
            *out.get_unchecked_mut(x + 2) =
                (*src.get_unchecked(off + 2) as u16) << 2 | ((b4 >> 4) & 0x03);
            *out.get_unchecked_mut(x + 3) =
                (*src.get_unchecked(off + 3) as u16) << 2 | ((b4 >> 6) & 0x03);
        }
    }
    groups * 4
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS: [ByteOrdering; 2] = [ByteOrdering::LittleEndian, ByteOrdering::BigEndian];

    #[test]
    fn raw10_group_roundtrip() {
        let values = [0x3FF, 0x000, 0x2A5, 0x15A];
        for order in ORDERS {
            let mut bytes = [0u8; 5];
            MipiPacking::Raw10.pack_group(&values, order, &mut bytes);
            let mut out = [0u16; 4];
            MipiPacking::Raw10.unpack_group(&bytes, order, &mut out);
            assert_eq!(out, values, "{order:?}");
        }
    }

    #[test]
    fn raw10_le_matches_csi2_layout() {
        // High bytes first, then P3..P0 low bits packed from the top down.
        let bytes = [0x80, 0x40, 0x20, 0x10, 0b11_10_01_00];
        let mut out = [0u16; 4];
        MipiPacking::Raw10.unpack_group(&bytes, ByteOrdering::LittleEndian, &mut out);
        assert_eq!(out, [0x200, 0x101, 0x082, 0x043]);
    }

    #[test]
    fn raw12_group_roundtrip() {
        let values = [0xABC, 0x123];
        for order in ORDERS {
            let mut bytes = [0u8; 3];
            MipiPacking::Raw12.pack_group(&values, order, &mut bytes);
            let mut out = [0u16; 2];
            MipiPacking::Raw12.unpack_group(&bytes, order, &mut out);
            assert_eq!(&out, &values, "{order:?}");
        }
    }

    #[test]
    fn raw14_group_roundtrip() {
        let values = [0x3FFF, 0x0001, 0x2AAA, 0x1555];
        for order in ORDERS {
            let mut bytes = [0u8; 7];
            MipiPacking::Raw14.pack_group(&values, order, &mut bytes);
            let mut out = [0u16; 4];
            MipiPacking::Raw14.unpack_group(&bytes, order, &mut out);
            assert_eq!(out, values, "{order:?}");
        }
    }

    #[test]
    fn unpack_row_handles_partial_groups() {
        let values: Vec<u16> = (0..10).map(|v| v * 97 % 1024).collect();
        for order in ORDERS {
            let packed = MipiPacking::Raw10.pack_row(&values, order);
            assert_eq!(packed.len(), 15);
            let mut out = vec![0u16; values.len()];
            assert_eq!(unpack_row(MipiPacking::Raw10, &packed, order, &mut out), 10);
            assert_eq!(out, values);

            // Stream cut inside the third group: only two groups decode.
            let mut out = vec![0u16; values.len()];
            assert_eq!(unpack_row(MipiPacking::Raw10, &packed[..12], order, &mut out), 8);
            assert_eq!(&out[..8], &values[..8]);
        }
    }

    #[test]
    fn row_bytes_pads_to_groups() {
        assert_eq!(MipiPacking::Raw10.row_bytes(6), 10);
        assert_eq!(MipiPacking::Raw12.row_bytes(3), 6);
        assert_eq!(MipiPacking::Raw14.row_bytes(4), 7);
    }
}
