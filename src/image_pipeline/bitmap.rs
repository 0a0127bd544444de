//! Destination surfaces for rendered frames.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::image_pipeline::common::error::{RenderError, Result};
use crate::image_pipeline::pixel::{BgraSample, read_pixel};

/// Pixel layout of a [`BitmapBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitmapFormat {
    /// 8 bits per channel, bytes ordered B, G, R, A.
    Bgra32,
    /// 16 bits per channel in native endianness, ordered B, G, R, A.
    Bgra64,
}

impl BitmapFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bgra32 => 4,
            Self::Bgra64 => 8,
        }
    }

    /// Largest channel value (full scale).
    pub const fn max_value(self) -> u32 {
        match self {
            Self::Bgra32 => u8::MAX as u32,
            Self::Bgra64 => u16::MAX as u32,
        }
    }
}

/// Render target. Pixel memory sits behind a mutex so the buffer can be shared
/// with a background decode; the decode holds the lock while it writes.
#[derive(Debug)]
pub struct BitmapBuffer {
    width: usize,
    height: usize,
    format: BitmapFormat,
    row_stride: usize,
    pixels: Mutex<Vec<u8>>,
}

pub type SharedBitmap = Arc<BitmapBuffer>;

impl BitmapBuffer {
    pub fn new(width: usize, height: usize, format: BitmapFormat) -> Result<Self> {
        Self::with_row_stride(width, height, format, width * format.bytes_per_pixel())
    }

    pub fn with_row_stride(
        width: usize,
        height: usize,
        format: BitmapFormat,
        row_stride: usize,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions(width, height));
        }
        let min_stride = width
            .checked_mul(format.bytes_per_pixel())
            .ok_or(RenderError::InvalidDimensions(width, height))?;
        if row_stride < min_stride {
            return Err(RenderError::invalid_argument(format!(
                "bitmap row stride {row_stride} is smaller than {min_stride} bytes for width {width}"
            )));
        }
        let len = row_stride
            .checked_mul(height)
            .ok_or(RenderError::InvalidDimensions(width, height))?;
        Ok(Self {
            width,
            height,
            format,
            row_stride,
            pixels: Mutex::new(vec![0u8; len]),
        })
    }

    pub fn into_shared(self) -> SharedBitmap {
        Arc::new(self)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> BitmapFormat {
        self.format
    }

    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Pin the pixel memory for direct access. Blocks while a decode is writing.
    pub fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.pixels.lock()
    }

    /// BGRA channels of one pixel of a [`BitmapFormat::Bgra32`] buffer.
    pub fn pixel_bgra32(&self, x: usize, y: usize) -> [u8; 4] {
        debug_assert_eq!(self.format, BitmapFormat::Bgra32);
        self.read_at::<u8>(x, y)
    }

    /// BGRA channels of one pixel of a [`BitmapFormat::Bgra64`] buffer.
    pub fn pixel_bgra64(&self, x: usize, y: usize) -> [u16; 4] {
        debug_assert_eq!(self.format, BitmapFormat::Bgra64);
        self.read_at::<u16>(x, y)
    }

    fn read_at<T: BgraSample>(&self, x: usize, y: usize) -> [T; 4] {
        let pixels = self.pixels.lock();
        read_pixel::<T>(&pixels[y * self.row_stride..], x)
    }

    /// Tightly packed RGBA8 copy of a BGRA32 buffer.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let pixels = self.pixels.lock();
        let mut out = Vec::with_capacity(self.width * self.height * 4);
        for row in pixels.chunks(self.row_stride).take(self.height) {
            for x in 0..self.width {
                let [b, g, r, a] = read_pixel::<u8>(row, x);
                out.extend_from_slice(&[r, g, b, a]);
            }
        }
        out
    }

    /// Tightly packed RGBA16 copy of a BGRA64 buffer.
    pub fn to_rgba16(&self) -> Vec<u16> {
        let pixels = self.pixels.lock();
        let mut out = Vec::with_capacity(self.width * self.height * 4);
        for row in pixels.chunks(self.row_stride).take(self.height) {
            for x in 0..self.width {
                let [b, g, r, a] = read_pixel::<u16>(row, x);
                out.extend_from_slice(&[r, g, b, a]);
            }
        }
        out
    }
}

/// Mutable window over a locked bitmap handed to decoders.
pub struct BitmapView<'a> {
    pub data: &'a mut [u8],
    pub width: usize,
    pub height: usize,
    pub row_stride: usize,
    pub format: BitmapFormat,
}

impl<'a> BitmapView<'a> {
    pub fn new(bitmap: &BitmapBuffer, data: &'a mut [u8]) -> Self {
        Self {
            data,
            width: bitmap.width,
            height: bitmap.height,
            row_stride: bitmap.row_stride,
            format: bitmap.format,
        }
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        &mut self.data[y * self.row_stride..(y + 1) * self.row_stride]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_stride() {
        let err = BitmapBuffer::with_row_stride(4, 4, BitmapFormat::Bgra64, 16).unwrap_err();
        assert!(matches!(err, RenderError::InvalidArgument(_)));
        assert!(BitmapBuffer::new(0, 4, BitmapFormat::Bgra32).is_err());
    }

    #[test]
    fn rgba_copy_swaps_channels() {
        let bitmap = BitmapBuffer::with_row_stride(1, 2, BitmapFormat::Bgra32, 8).unwrap();
        {
            let mut px = bitmap.lock();
            px[8..12].copy_from_slice(&[1, 2, 3, 4]);
        }
        assert_eq!(bitmap.to_rgba8(), vec![0, 0, 0, 0, 3, 2, 1, 4]);
        assert_eq!(bitmap.pixel_bgra32(0, 1), [1, 2, 3, 4]);
    }
}
