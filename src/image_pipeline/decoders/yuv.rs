//! Planar, semi-planar and packed 4:2:2 Y'CbCr decoders.
//!
//! Every plane is read into a resident 16-bit buffer first (the stream is
//! sequential and chroma for a row may come after all of luma), then rows
//! are converted in parallel through the configured
//! [`YuvToBgraConverter`](super::yuv_convert::YuvToBgraConverter).

use std::sync::Arc;

use enough::Stop;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::image_pipeline::bitmap::BitmapFormat;
use crate::image_pipeline::common::error::{RenderError, Result};
use crate::image_pipeline::decoders::renderer::{
    DecodeContext, ImageRenderer, PlaneGeometry, RenderingResult, for_each_row, items_in_row,
};
use crate::image_pipeline::decoders::sample::SampleReader;
use crate::image_pipeline::format::{
    FormatAlias, FormatCategory, ImageFormat, ImagePlaneDescriptor, ImagePlaneOptions,
};
use crate::image_pipeline::pixel::{BgraSample, ByteOrdering, write_pixel16};
use crate::image_pipeline::source::RowReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsampling {
    S420,
    S422,
    S444,
}

impl Subsampling {
    /// Horizontal and vertical chroma divisors.
    pub const fn factors(self) -> (usize, usize) {
        match self {
            Self::S420 => (2, 2),
            Self::S422 => (2, 1),
            Self::S444 => (1, 1),
        }
    }

    pub fn chroma_size(self, width: usize, height: usize) -> (usize, usize) {
        let (hx, vy) = self.factors();
        (width.div_ceil(hx), height.div_ceil(vy))
    }
}

/// Sample positions inside one packed 4:2:2 macropixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedOrder {
    pub y0: usize,
    pub u: usize,
    pub y1: usize,
    pub v: usize,
}

impl PackedOrder {
    pub const YUYV: Self = Self { y0: 0, u: 1, y1: 2, v: 3 };
    pub const UYVY: Self = Self { u: 0, y0: 1, v: 2, y1: 3 };
    pub const YVYU: Self = Self { y0: 0, v: 1, y1: 2, u: 3 };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YuvLayout {
    /// Three planes; the second carries V when `v_first`.
    Planar { v_first: bool },
    /// Luma plane plus one interleaved chroma plane.
    SemiPlanar { v_first: bool },
    /// One plane of 4:2:2 macropixels.
    Packed(PackedOrder),
}

/// A plane staged in memory, with the number of samples that actually
/// arrived on each row.
struct ResidentPlane {
    width: usize,
    samples: Vec<u16>,
    valid: Vec<usize>,
}

impl ResidentPlane {
    fn new(width: usize, rows: usize) -> Self {
        Self {
            width,
            samples: vec![0; width * rows],
            valid: vec![0; rows],
        }
    }

    #[inline(always)]
    fn row_mut(&mut self, y: usize) -> &mut [u16] {
        &mut self.samples[y * self.width..(y + 1) * self.width]
    }

    #[inline(always)]
    fn get(&self, x: usize, y: usize) -> u16 {
        self.samples[y * self.width + x]
    }
}

pub struct YuvRenderer {
    format: ImageFormat,
    layout: YuvLayout,
    subsampling: Subsampling,
    wide: bool,
}

impl YuvRenderer {
    pub fn new(
        name: &'static str,
        layout: YuvLayout,
        subsampling: Subsampling,
        wide: bool,
        aliases: Vec<FormatAlias>,
    ) -> Self {
        let s = if wide { 2 } else { 1 };
        let bits = if wide { 16 } else { 8 };
        let planes = match layout {
            YuvLayout::Planar { .. } => vec![ImagePlaneDescriptor::new(s, bits); 3],
            YuvLayout::SemiPlanar { .. } => {
                vec![ImagePlaneDescriptor::new(s, bits), ImagePlaneDescriptor::new(2 * s, bits)]
            }
            YuvLayout::Packed(_) => vec![ImagePlaneDescriptor::new(2 * s, bits)],
        };
        let mut format = ImageFormat::new(name, FormatCategory::Yuv, planes).with_aliases(aliases);
        if wide {
            format = format.with_byte_orderings();
        }
        Self { format, layout, subsampling, wide }
    }

    fn sample_bytes(&self) -> usize {
        if self.wide { 2 } else { 1 }
    }

    #[instrument(skip_all, fields(format = self.format.name))]
    fn decode_typed<T: BgraSample>(&self, ctx: DecodeContext<'_>) -> Result<RenderingResult> {
        let DecodeContext { source, target, options, planes, stop } = ctx;
        let (width, height) = (target.width, target.height);
        let (cw, ch) = self.subsampling.chroma_size(width, height);
        let order = options.byte_ordering;

        debug!(width, height, layout = ?self.layout, subsampling = ?self.subsampling, "staging YUV planes");

        let mut luma = ResidentPlane::new(width, height);
        let mut cb = ResidentPlane::new(cw, ch);
        let mut cr = ResidentPlane::new(cw, ch);

        let mut reader = RowReader::open(source, options.data_offset)?;
        match self.layout {
            YuvLayout::Planar { v_first } => {
                read_plane(&mut reader, &planes[0], order, stop, &mut luma)?;
                let (first, second) = if v_first { (&mut cr, &mut cb) } else { (&mut cb, &mut cr) };
                read_plane(&mut reader, &planes[1], order, stop, first)?;
                read_plane(&mut reader, &planes[2], order, stop, second)?;
            }
            YuvLayout::SemiPlanar { v_first } => {
                read_plane(&mut reader, &planes[0], order, stop, &mut luma)?;
                read_interleaved_chroma(&mut reader, &planes[1], order, v_first, stop, &mut cb, &mut cr)?;
            }
            YuvLayout::Packed(positions) => {
                read_packed(&mut reader, &planes[0], order, positions, stop, &mut luma, &mut cb, &mut cr)?;
            }
        }

        let rows = convert_rows::<T>(target, &luma, &cb, &cr, self.subsampling, options.yuv_converter.as_ref(), stop)?;
        Ok(RenderingResult { brightness: None, rows_rendered: rows })
    }
}

fn read_plane(
    reader: &mut RowReader,
    plane: &ImagePlaneOptions,
    order: ByteOrdering,
    stop: &dyn Stop,
    dest: &mut ResidentPlane,
) -> Result<usize> {
    let sample = SampleReader::for_plane(plane, order);
    let rows = dest.valid.len();
    let width = dest.width;
    for_each_row(reader, plane.row_stride, rows, stop, |y, src| {
        let available = items_in_row(src.len(), sample.size(), plane.pixel_stride, width);
        let row = dest.row_mut(y);
        for (x, out) in row.iter_mut().enumerate().take(available) {
            *out = sample.read(src, x * plane.pixel_stride);
        }
        dest.valid[y] = available;
        Ok(())
    })
}

fn read_interleaved_chroma(
    reader: &mut RowReader,
    plane: &ImagePlaneOptions,
    order: ByteOrdering,
    v_first: bool,
    stop: &dyn Stop,
    cb: &mut ResidentPlane,
    cr: &mut ResidentPlane,
) -> Result<usize> {
    let sample = SampleReader::for_plane(plane, order);
    let size = sample.size();
    let (u_at, v_at) = if v_first { (size, 0) } else { (0, size) };
    let rows = cb.valid.len();
    let width = cb.width;
    for_each_row(reader, plane.row_stride, rows, stop, |y, src| {
        let available = items_in_row(src.len(), 2 * size, plane.pixel_stride, width);
        for x in 0..available {
            let base = x * plane.pixel_stride;
            cb.row_mut(y)[x] = sample.read(src, base + u_at);
            cr.row_mut(y)[x] = sample.read(src, base + v_at);
        }
        cb.valid[y] = available;
        cr.valid[y] = available;
        Ok(())
    })
}

#[allow(clippy::too_many_arguments)]
fn read_packed(
    reader: &mut RowReader,
    plane: &ImagePlaneOptions,
    order: ByteOrdering,
    positions: PackedOrder,
    stop: &dyn Stop,
    luma: &mut ResidentPlane,
    cb: &mut ResidentPlane,
    cr: &mut ResidentPlane,
) -> Result<usize> {
    let sample = SampleReader::for_plane(plane, order);
    let size = sample.size();
    let width = luma.width;
    let pairs = cb.width;
    for_each_row(reader, plane.row_stride, luma.valid.len(), stop, |y, src| {
        let available = items_in_row(src.len(), 4 * size, 2 * plane.pixel_stride, pairs);
        for pair in 0..available {
            let base = pair * 2 * plane.pixel_stride;
            let x = pair * 2;
            luma.row_mut(y)[x] = sample.read(src, base + positions.y0 * size);
            if x + 1 < width {
                luma.row_mut(y)[x + 1] = sample.read(src, base + positions.y1 * size);
            }
            cb.row_mut(y)[pair] = sample.read(src, base + positions.u * size);
            cr.row_mut(y)[pair] = sample.read(src, base + positions.v * size);
        }
        luma.valid[y] = (available * 2).min(width);
        cb.valid[y] = available;
        cr.valid[y] = available;
        Ok(())
    })
}

/// Convert staged planes into the target, one parallel task per row.
///
/// Pixels without both luma and chroma stay untouched. Returns the number of
/// rows that received at least one pixel.
fn convert_rows<T: BgraSample>(
    target: crate::image_pipeline::bitmap::BitmapView<'_>,
    luma: &ResidentPlane,
    cb: &ResidentPlane,
    cr: &ResidentPlane,
    subsampling: Subsampling,
    converter: &dyn crate::image_pipeline::decoders::yuv_convert::YuvToBgraConverter,
    stop: &(dyn Stop + Sync),
) -> Result<usize> {
    let (hx, vy) = subsampling.factors();
    let (width, height, row_stride) = (target.width, target.height, target.row_stride);

    target
        .data
        .par_chunks_mut(row_stride)
        .take(height)
        .enumerate()
        .try_for_each(|(y, dst)| -> Result<()> {
            stop.check()?;
            let cy = y / vy;
            let chroma_valid = cb.valid[cy].min(cr.valid[cy]);
            let count = luma.valid[y].min(width).min(chroma_valid * hx);
            for x in 0..count {
                let cx = x / hx;
                let [b, g, r] = converter.convert(luma.get(x, y), cb.get(cx, cy), cr.get(cx, cy));
                write_pixel16::<T>(dst, x, b, g, r, u16::MAX);
            }
            Ok(())
        })?;

    Ok((0..height)
        .filter(|&y| luma.valid[y] > 0 && cb.valid[y / vy].min(cr.valid[y / vy]) > 0)
        .count())
}

impl ImageRenderer for YuvRenderer {
    fn format(&self) -> &ImageFormat {
        &self.format
    }

    fn rendered_format(&self) -> BitmapFormat {
        if self.wide { BitmapFormat::Bgra64 } else { BitmapFormat::Bgra32 }
    }

    fn create_default_plane_options(&self, width: usize, height: usize) -> Vec<ImagePlaneOptions> {
        let bits = if self.wide { 16 } else { 8 };
        let s = self.sample_bytes();
        let (cw, _) = self.subsampling.chroma_size(width, height);
        match self.layout {
            YuvLayout::Planar { .. } => vec![
                ImagePlaneOptions::new(s, width * s, bits),
                ImagePlaneOptions::new(s, cw * s, bits),
                ImagePlaneOptions::new(s, cw * s, bits),
            ],
            YuvLayout::SemiPlanar { .. } => vec![
                ImagePlaneOptions::new(s, width * s, bits),
                ImagePlaneOptions::new(2 * s, cw * 2 * s, bits),
            ],
            YuvLayout::Packed(_) => vec![ImagePlaneOptions::new(2 * s, width.div_ceil(2) * 4 * s, bits)],
        }
    }

    fn evaluate_pixel_count(&self, source_size: u64) -> u64 {
        let s = self.sample_bytes() as u64;
        match (self.layout, self.subsampling) {
            (YuvLayout::Packed(_), _) | (_, Subsampling::S422) => source_size / (2 * s),
            (_, Subsampling::S420) => source_size * 2 / (3 * s),
            (_, Subsampling::S444) => source_size / (3 * s),
        }
    }

    fn plane_geometry(&self, width: usize, height: usize, _planes: &[ImagePlaneOptions]) -> Vec<PlaneGeometry> {
        let s = self.sample_bytes();
        let bits = if self.wide { 9..=16 } else { 8..=8 };
        let (cw, ch) = self.subsampling.chroma_size(width, height);
        let luma = PlaneGeometry { width, rows: height, min_row_bytes: width * s, bits: bits.clone() };
        match self.layout {
            YuvLayout::Planar { .. } => {
                let chroma = PlaneGeometry { width: cw, rows: ch, min_row_bytes: cw * s, bits };
                vec![luma, chroma.clone(), chroma]
            }
            YuvLayout::SemiPlanar { .. } => {
                vec![luma, PlaneGeometry { width: cw, rows: ch, min_row_bytes: cw * 2 * s, bits }]
            }
            YuvLayout::Packed(_) => vec![PlaneGeometry {
                width,
                rows: height,
                min_row_bytes: width.div_ceil(2) * 4 * s,
                bits,
            }],
        }
    }

    fn validate_layout(&self, planes: &[ImagePlaneOptions]) -> Result<()> {
        let s = self.sample_bytes();
        let (luma_min, chroma_min) = match self.layout {
            YuvLayout::Planar { .. } => (s, s),
            YuvLayout::SemiPlanar { .. } => (s, 2 * s),
            YuvLayout::Packed(_) => (2 * s, 2 * s),
        };
        for (index, plane) in planes.iter().enumerate() {
            let min = if index == 0 { luma_min } else { chroma_min };
            if plane.pixel_stride < min {
                return Err(RenderError::invalid_argument(format!(
                    "{}: plane {index} pixel stride {} below {min}",
                    self.format.name, plane.pixel_stride
                )));
            }
        }
        Ok(())
    }

    fn decode(&self, ctx: DecodeContext<'_>) -> Result<RenderingResult> {
        match self.rendered_format() {
            BitmapFormat::Bgra32 => self.decode_typed::<u8>(ctx),
            BitmapFormat::Bgra64 => self.decode_typed::<u16>(ctx),
        }
    }
}

pub fn builtin() -> Vec<Arc<dyn ImageRenderer>> {
    use ByteOrdering::{BigEndian as BE, LittleEndian as LE};
    use Subsampling::*;
    use YuvLayout::*;

    let yuv = |name: &'static str, layout: YuvLayout, sub: Subsampling, wide: bool, aliases: Vec<FormatAlias>| -> Arc<dyn ImageRenderer> {
        Arc::new(YuvRenderer::new(name, layout, sub, wide, aliases))
    };
    let planar = Planar { v_first: false };
    let semi = SemiPlanar { v_first: false };
    let semi_vu = SemiPlanar { v_first: true };

    vec![
        yuv("YUV420P", planar, S420, false, vec![FormatAlias::synonym("I420")]),
        yuv("YVU420P", Planar { v_first: true }, S420, false, vec![FormatAlias::synonym("YV12")]),
        yuv("YUV422P", planar, S422, false, vec![FormatAlias::synonym("I422")]),
        yuv("YUV444P", planar, S444, false, vec![FormatAlias::synonym("I444")]),
        yuv("YUV420P16", planar, S420, true, Vec::new()),
        yuv("YUV422P16", planar, S422, true, Vec::new()),
        yuv("YUV444P16", planar, S444, true, Vec::new()),
        yuv("NV12", semi, S420, false, Vec::new()),
        yuv("NV21", semi_vu, S420, false, Vec::new()),
        yuv("NV16", semi, S422, false, Vec::new()),
        yuv("NV61", semi_vu, S422, false, Vec::new()),
        yuv("NV24", semi, S444, false, Vec::new()),
        yuv("NV42", semi_vu, S444, false, Vec::new()),
        yuv(
            "P016",
            semi,
            S420,
            true,
            vec![
                FormatAlias::ordered("P016_LE", LE),
                FormatAlias::ordered("P016_BE", BE),
                FormatAlias::synonym("P010"),
            ],
        ),
        yuv("P216", semi, S422, true, Vec::new()),
        yuv("P416", semi, S444, true, Vec::new()),
        yuv("YUYV", Packed(PackedOrder::YUYV), S422, false, vec![FormatAlias::synonym("YUY2")]),
        yuv("UYVY", Packed(PackedOrder::UYVY), S422, false, Vec::new()),
        yuv("YVYU", Packed(PackedOrder::YVYU), S422, false, Vec::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::bitmap::{BitmapBuffer, BitmapView};
    use crate::image_pipeline::format::ImageRenderingOptions;
    use crate::image_pipeline::source::MemoryDataSource;

    fn render(renderer: &YuvRenderer, width: usize, height: usize, bytes: Vec<u8>) -> (BitmapBuffer, RenderingResult) {
        let bitmap = BitmapBuffer::new(width, height, renderer.rendered_format()).unwrap();
        let options = ImageRenderingOptions::default();
        let planes = renderer.create_default_plane_options(width, height);
        renderer.validate(width, height, &options, &planes).unwrap();
        let source = MemoryDataSource::new(bytes);
        let result = {
            let mut guard = bitmap.lock();
            let ctx = DecodeContext {
                source: &source,
                target: BitmapView::new(&bitmap, &mut guard),
                options: &options,
                planes: &planes,
                stop: &enough::Unstoppable,
            };
            renderer.decode(ctx).unwrap()
        };
        (bitmap, result)
    }

    #[test]
    fn grey_i420_maps_to_grey() {
        let renderer = YuvRenderer::new("T", YuvLayout::Planar { v_first: false }, Subsampling::S420, false, Vec::new());
        let mut bytes = vec![10, 20, 30, 40];
        bytes.extend([128, 128]);
        let (bitmap, result) = render(&renderer, 2, 2, bytes);
        assert_eq!(result.rows_rendered, 2);
        assert_eq!(bitmap.pixel_bgra32(0, 0), [10, 10, 10, 255]);
        assert_eq!(bitmap.pixel_bgra32(1, 1), [40, 40, 40, 255]);
    }

    #[test]
    fn nv21_swaps_chroma() {
        let nv12 = YuvRenderer::new("A", YuvLayout::SemiPlanar { v_first: false }, Subsampling::S420, false, Vec::new());
        let nv21 = YuvRenderer::new("B", YuvLayout::SemiPlanar { v_first: true }, Subsampling::S420, false, Vec::new());
        let (a, _) = render(&nv12, 2, 2, vec![100, 100, 100, 100, 60, 200]);
        let (b, _) = render(&nv21, 2, 2, vec![100, 100, 100, 100, 200, 60]);
        assert_eq!(a.to_rgba8(), b.to_rgba8());
        // V well above neutral pushes red up.
        let [blue, _, red, _] = a.pixel_bgra32(0, 0);
        assert!(red > blue);
    }

    #[test]
    fn packed_orders_agree() {
        let yuyv = YuvRenderer::new("A", YuvLayout::Packed(PackedOrder::YUYV), Subsampling::S422, false, Vec::new());
        let uyvy = YuvRenderer::new("B", YuvLayout::Packed(PackedOrder::UYVY), Subsampling::S422, false, Vec::new());
        let (a, _) = render(&yuyv, 2, 1, vec![50, 90, 150, 170]);
        let (b, _) = render(&uyvy, 2, 1, vec![90, 50, 170, 150]);
        assert_eq!(a.to_rgba8(), b.to_rgba8());
    }

    #[test]
    fn missing_chroma_leaves_pixels_untouched() {
        let renderer = YuvRenderer::new("T", YuvLayout::Planar { v_first: false }, Subsampling::S420, false, Vec::new());
        // Luma only: chroma planes never arrive.
        let (bitmap, result) = render(&renderer, 2, 2, vec![1, 2, 3, 4]);
        assert_eq!(result.rows_rendered, 0);
        assert!(bitmap.to_rgba8().iter().all(|&b| b == 0));
    }

    #[test]
    fn pixel_count_estimates() {
        let i420 = YuvRenderer::new("T", YuvLayout::Planar { v_first: false }, Subsampling::S420, false, Vec::new());
        assert_eq!(i420.evaluate_pixel_count(6 * 4), 16);
        let p216 = YuvRenderer::new("T", YuvLayout::SemiPlanar { v_first: false }, Subsampling::S422, true, Vec::new());
        assert_eq!(p216.evaluate_pixel_count(64), 16);
        let nv24 = YuvRenderer::new("T", YuvLayout::SemiPlanar { v_first: false }, Subsampling::S444, false, Vec::new());
        assert_eq!(nv24.evaluate_pixel_count(48), 16);
    }
}
