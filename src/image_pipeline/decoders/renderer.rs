//! The capability interface every format decoder implements.

use std::ops::RangeInclusive;

use enough::Stop;

use crate::image_pipeline::bitmap::{BitmapFormat, BitmapView};
use crate::image_pipeline::common::error::{RenderError, Result};
use crate::image_pipeline::debayer::BrightnessStatistics;
use crate::image_pipeline::format::{FormatCategory, ImageFormat, ImagePlaneOptions, ImageRenderingOptions};
use crate::image_pipeline::source::ImageDataSource;

/// Side-channel output of a decode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderingResult {
    /// Per-channel brightness, only produced by mosaic decodes.
    pub brightness: Option<BrightnessStatistics>,
    /// Rows that received pixel data; below the frame height when the
    /// source was truncated.
    pub rows_rendered: usize,
}

/// Shape of one plane for a concrete frame size and plane configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneGeometry {
    /// Pixels (or chroma samples) per row.
    pub width: usize,
    pub rows: usize,
    /// Smallest row stride that fits `width` pixels.
    pub min_row_bytes: usize,
    /// Effective depths the plane accepts.
    pub bits: RangeInclusive<u8>,
}

/// Everything a decode body needs. The harness builds it after validation.
pub struct DecodeContext<'a> {
    pub source: &'a dyn ImageDataSource,
    pub target: BitmapView<'a>,
    pub options: &'a ImageRenderingOptions,
    pub planes: &'a [ImagePlaneOptions],
    pub stop: &'a (dyn Stop + Sync),
}

pub trait ImageRenderer: Send + Sync {
    fn format(&self) -> &ImageFormat;

    /// Pixel format of the bitmaps this decoder writes.
    fn rendered_format(&self) -> BitmapFormat;

    fn create_default_plane_options(&self, width: usize, height: usize) -> Vec<ImagePlaneOptions>;

    /// Estimate how many pixels a source of `source_size` bytes holds.
    fn evaluate_pixel_count(&self, source_size: u64) -> u64;

    /// Per-plane geometry for `width` x `height` under `planes`.
    fn plane_geometry(&self, width: usize, height: usize, planes: &[ImagePlaneOptions]) -> Vec<PlaneGeometry>;

    /// Decode the frame into `ctx.target`. Called only after [`validate`](Self::validate).
    fn decode(&self, ctx: DecodeContext<'_>) -> Result<RenderingResult>;

    /// Format-specific layout checks beyond the per-plane invariants.
    fn validate_layout(&self, _planes: &[ImagePlaneOptions]) -> Result<()> {
        Ok(())
    }

    /// Bytes a complete frame occupies, excluding the stream start offset.
    fn evaluate_source_data_size(
        &self,
        width: usize,
        height: usize,
        _options: &ImageRenderingOptions,
        planes: &[ImagePlaneOptions],
    ) -> u64 {
        self.plane_geometry(width, height, planes)
            .iter()
            .zip(planes)
            .map(|(geometry, plane)| plane.row_stride as u64 * geometry.rows as u64)
            .sum()
    }

    /// Configuration checks run before any byte is decoded.
    fn validate(
        &self,
        width: usize,
        height: usize,
        options: &ImageRenderingOptions,
        planes: &[ImagePlaneOptions],
    ) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions(width, height));
        }
        let format = self.format();
        if format.category == FormatCategory::Compressed {
            return Err(RenderError::not_supported(format!(
                "{} is a compressed container, not a raw layout",
                format.name
            )));
        }
        if planes.len() != format.plane_count() {
            return Err(RenderError::invalid_argument(format!(
                "{} expects {} plane(s), got {}",
                format.name,
                format.plane_count(),
                planes.len()
            )));
        }
        options.validate()?;
        self.validate_layout(planes)?;
        for (index, (plane, geometry)) in planes.iter().zip(self.plane_geometry(width, height, planes)).enumerate() {
            plane.validate(index, geometry.width, geometry.min_row_bytes, geometry.bits)?;
        }
        Ok(())
    }
}

/// Read `rows` rows of `row_stride` bytes each and hand them to `f`.
///
/// A short final read is delivered once with whatever bytes arrived, then the
/// loop ends. Returns the number of rows delivered. Cancellation is checked
/// before every row.
pub(crate) fn for_each_row(
    reader: &mut crate::image_pipeline::source::RowReader,
    row_stride: usize,
    rows: usize,
    stop: &dyn Stop,
    mut f: impl FnMut(usize, &[u8]) -> Result<()>,
) -> Result<usize> {
    let mut buf = vec![0u8; row_stride];
    for y in 0..rows {
        stop.check()?;
        let n = reader.read_row(&mut buf)?;
        if n == 0 {
            tracing::warn!(row = y, expected = rows, "source ended before the last row");
            return Ok(y);
        }
        f(y, &buf[..n])?;
        if n < row_stride {
            tracing::warn!(row = y, bytes = n, row_stride, "source ended inside a row");
            return Ok(y + 1);
        }
    }
    Ok(rows)
}

/// Items recoverable from a row of `len` bytes where each item spans
/// `item_bytes` and items start every `stride` bytes, capped at `limit`.
#[inline]
pub(crate) fn items_in_row(len: usize, item_bytes: usize, stride: usize, limit: usize) -> usize {
    if len < item_bytes {
        0
    } else {
        ((len - item_bytes) / stride.max(1) + 1).min(limit)
    }
}

/// Bytes per sample container for an effective depth.
pub(crate) const fn container_bytes(bits: u8) -> usize {
    if bits > 8 { 2 } else { 1 }
}

/// Round `bytes` up to the next multiple of four.
pub(crate) const fn align4(bytes: usize) -> usize {
    (bytes + 3) & !3
}
