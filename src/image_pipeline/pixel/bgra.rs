//! Packing of normalized channel samples into BGRA32 / BGRA64 pixels.

use crate::image_pipeline::bitmap::BitmapFormat;

/// One channel of a destination pixel: `u8` for BGRA32, `u16` for BGRA64.
///
/// Intermediate values are 16-bit left-justified samples; narrowing to 8 bits
/// keeps the high byte so 8-bit sources survive the round trip unchanged.
pub trait BgraSample: Copy + Default + PartialEq + Send + Sync + 'static {
    const FORMAT: BitmapFormat;
    const BYTES_PER_PIXEL: usize;
    const OPAQUE: Self;

    fn from_u16(v: u16) -> Self;
    fn to_u16(self) -> u16;
    fn to_u32(self) -> u32;
    fn saturate_u32(v: u32) -> Self;

    fn write_bgra(dst: &mut [u8], bgra: [Self; 4]);
    fn read_bgra(src: &[u8]) -> [Self; 4];
}

impl BgraSample for u8 {
    const FORMAT: BitmapFormat = BitmapFormat::Bgra32;
    const BYTES_PER_PIXEL: usize = 4;
    const OPAQUE: Self = u8::MAX;

    #[inline(always)]
    fn from_u16(v: u16) -> Self {
        (v >> 8) as u8
    }
    #[inline(always)]
    fn to_u16(self) -> u16 {
        (self as u16) << 8
    }
    #[inline(always)]
    fn to_u32(self) -> u32 {
        self as u32
    }
    #[inline(always)]
    fn saturate_u32(v: u32) -> Self {
        v.min(u8::MAX as u32) as u8
    }

    #[inline(always)]
    fn write_bgra(dst: &mut [u8], bgra: [Self; 4]) {
        dst[..4].copy_from_slice(&bgra);
    }

    #[inline(always)]
    fn read_bgra(src: &[u8]) -> [Self; 4] {
        [src[0], src[1], src[2], src[3]]
    }
}

impl BgraSample for u16 {
    const FORMAT: BitmapFormat = BitmapFormat::Bgra64;
    const BYTES_PER_PIXEL: usize = 8;
    const OPAQUE: Self = u16::MAX;

    #[inline(always)]
    fn from_u16(v: u16) -> Self {
        v
    }
    #[inline(always)]
    fn to_u16(self) -> u16 {
        self
    }
    #[inline(always)]
    fn to_u32(self) -> u32 {
        self as u32
    }
    #[inline(always)]
    fn saturate_u32(v: u32) -> Self {
        v.min(u16::MAX as u32) as u16
    }

    #[inline(always)]
    fn write_bgra(dst: &mut [u8], bgra: [Self; 4]) {
        for (chunk, v) in dst[..8].chunks_exact_mut(2).zip(bgra) {
            chunk.copy_from_slice(&v.to_ne_bytes());
        }
    }

    #[inline(always)]
    fn read_bgra(src: &[u8]) -> [Self; 4] {
        let mut out = [0u16; 4];
        for (v, chunk) in out.iter_mut().zip(src[..8].chunks_exact(2)) {
            *v = u16::from_ne_bytes([chunk[0], chunk[1]]);
        }
        out
    }
}

/// Write pixel `x` of a destination row.
#[inline(always)]
pub fn write_pixel<T: BgraSample>(row: &mut [u8], x: usize, b: T, g: T, r: T, a: T) {
    T::write_bgra(&mut row[x * T::BYTES_PER_PIXEL..], [b, g, r, a]);
}

/// Write pixel `x` from 16-bit left-justified channel values.
#[inline(always)]
pub fn write_pixel16<T: BgraSample>(row: &mut [u8], x: usize, b: u16, g: u16, r: u16, a: u16) {
    write_pixel(row, x, T::from_u16(b), T::from_u16(g), T::from_u16(r), T::from_u16(a));
}

#[inline(always)]
pub fn read_pixel<T: BgraSample>(row: &[u8], x: usize) -> [T; 4] {
    T::read_bgra(&row[x * T::BYTES_PER_PIXEL..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgra32_layout() {
        let mut row = [0u8; 8];
        write_pixel::<u8>(&mut row, 1, 1, 2, 3, 4);
        assert_eq!(row, [0, 0, 0, 0, 1, 2, 3, 4]);
        assert_eq!(read_pixel::<u8>(&row, 1), [1, 2, 3, 4]);
    }

    #[test]
    fn bgra64_roundtrip_and_narrowing() {
        let mut row = [0u8; 16];
        write_pixel16::<u16>(&mut row, 1, 0x1234, 0xFFFF, 0, 0x8000);
        assert_eq!(read_pixel::<u16>(&row, 1), [0x1234, 0xFFFF, 0, 0x8000]);
        assert_eq!(<u8 as BgraSample>::from_u16(0xAB00), 0xAB);
        assert_eq!(<u8 as BgraSample>::from_u16(<u8 as BgraSample>::to_u16(0x7F)), 0x7F);
    }
}
