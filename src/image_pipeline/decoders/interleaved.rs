//! Single-plane interleaved decoders: ARGB, RGB and luminance layouts with
//! 8-bit, 9..16-bit and half-float samples.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::image_pipeline::bitmap::BitmapFormat;
use crate::image_pipeline::common::error::{RenderError, Result};
use crate::image_pipeline::decoders::renderer::{
    DecodeContext, ImageRenderer, PlaneGeometry, RenderingResult, align4, for_each_row, items_in_row,
};
use crate::image_pipeline::decoders::sample::SampleReader;
use crate::image_pipeline::format::{
    FormatAlias, FormatCategory, ImageFormat, ImagePlaneDescriptor, ImagePlaneOptions,
};
use crate::image_pipeline::pixel::{BgraSample, ByteOrdering, write_pixel16};
use crate::image_pipeline::source::RowReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    U8,
    /// 9..=16 effective bits in a two-byte container.
    U16,
    /// IEEE half precision, clamped to `[0, 1]`.
    F16,
}

impl SampleKind {
    const fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 | Self::F16 => 2,
        }
    }

    const fn default_bits(self) -> u8 {
        match self {
            Self::U8 => 8,
            Self::U16 | Self::F16 => 16,
        }
    }

    const fn bits_range(self) -> std::ops::RangeInclusive<u8> {
        match self {
            Self::U8 => 8..=8,
            Self::U16 => 9..=16,
            Self::F16 => 16..=16,
        }
    }
}

/// Sample index of each component within one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentSelector {
    pub r: usize,
    pub g: usize,
    pub b: usize,
    pub a: Option<usize>,
    pub channels: usize,
}

impl ComponentSelector {
    pub const ARGB: Self = Self { a: Some(0), r: 1, g: 2, b: 3, channels: 4 };
    pub const ABGR: Self = Self { a: Some(0), b: 1, g: 2, r: 3, channels: 4 };
    pub const BGRA: Self = Self { b: 0, g: 1, r: 2, a: Some(3), channels: 4 };
    pub const RGBA: Self = Self { r: 0, g: 1, b: 2, a: Some(3), channels: 4 };
    pub const RGB: Self = Self { r: 0, g: 1, b: 2, a: None, channels: 3 };
    pub const BGR: Self = Self { b: 0, g: 1, r: 2, a: None, channels: 3 };
    pub const LUMA: Self = Self { r: 0, g: 0, b: 0, a: None, channels: 1 };
}

pub struct InterleavedRenderer {
    format: ImageFormat,
    kind: SampleKind,
    selector: ComponentSelector,
}

impl InterleavedRenderer {
    pub fn new(
        name: &'static str,
        kind: SampleKind,
        selector: ComponentSelector,
        aliases: Vec<FormatAlias>,
    ) -> Self {
        let category = match selector.channels {
            4 => FormatCategory::Argb,
            3 => FormatCategory::Rgb,
            _ => FormatCategory::Luminance,
        };
        let pixel_bytes = kind.bytes() * selector.channels;
        let mut format = ImageFormat::new(
            name,
            category,
            vec![ImagePlaneDescriptor::new(pixel_bytes, kind.default_bits())],
        )
        .with_aliases(aliases);
        if kind != SampleKind::U8 {
            format = format.with_byte_orderings();
        }
        Self { format, kind, selector }
    }

    fn pixel_bytes(&self) -> usize {
        self.kind.bytes() * self.selector.channels
    }

    #[instrument(skip_all, fields(format = self.format.name))]
    fn decode_typed<T: BgraSample>(&self, ctx: DecodeContext<'_>) -> Result<RenderingResult> {
        let DecodeContext { source, mut target, options, planes, stop } = ctx;
        let plane = &planes[0];
        let order = options.byte_ordering;
        let sample = SampleReader::for_plane(plane, order);
        let sample_bytes = self.kind.bytes();
        let pixel_bytes = self.pixel_bytes();
        let width = target.width;
        let sel = self.selector;

        debug!(
            width,
            height = target.height,
            pixel_stride = plane.pixel_stride,
            row_stride = plane.row_stride,
            "decoding interleaved frame"
        );

        let mut reader = RowReader::open(source, options.data_offset)?;
        let rows = for_each_row(&mut reader, plane.row_stride, target.height, stop, |y, src| {
            let dst = target.row_mut(y);
            let available = items_in_row(src.len(), pixel_bytes, plane.pixel_stride, width);
            for x in 0..available {
                let base = x * plane.pixel_stride;
                let at = |index: usize| base + index * sample_bytes;
                let [b, g, r, a] = match self.kind {
                    SampleKind::U8 | SampleKind::U16 => [
                        sample.read(src, at(sel.b)),
                        sample.read(src, at(sel.g)),
                        sample.read(src, at(sel.r)),
                        sel.a.map_or(u16::MAX, |i| sample.read_alpha(src, at(i))),
                    ],
                    SampleKind::F16 => [
                        half_to_u16(src, at(sel.b), order),
                        half_to_u16(src, at(sel.g), order),
                        half_to_u16(src, at(sel.r), order),
                        sel.a.map_or(u16::MAX, |i| half_to_u16(src, at(i), order)),
                    ],
                };
                write_pixel16::<T>(dst, x, b, g, r, a);
            }
            Ok(())
        })?;

        Ok(RenderingResult { brightness: None, rows_rendered: rows })
    }
}

#[inline(always)]
fn half_to_u16(src: &[u8], offset: usize, order: ByteOrdering) -> u16 {
    let v = half::f16::from_bits(order.read_u16(src[offset], src[offset + 1])).to_f32();
    (v.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16
}

impl ImageRenderer for InterleavedRenderer {
    fn format(&self) -> &ImageFormat {
        &self.format
    }

    fn rendered_format(&self) -> BitmapFormat {
        match self.kind {
            SampleKind::U8 => BitmapFormat::Bgra32,
            SampleKind::U16 | SampleKind::F16 => BitmapFormat::Bgra64,
        }
    }

    fn create_default_plane_options(&self, width: usize, _height: usize) -> Vec<ImagePlaneOptions> {
        let pixel_stride = self.pixel_bytes();
        let mut row_stride = width * pixel_stride;
        if self.selector.channels == 3 {
            row_stride = align4(row_stride);
        }
        vec![ImagePlaneOptions::new(pixel_stride, row_stride, self.kind.default_bits())]
    }

    fn evaluate_pixel_count(&self, source_size: u64) -> u64 {
        source_size / self.pixel_bytes() as u64
    }

    fn plane_geometry(&self, width: usize, height: usize, _planes: &[ImagePlaneOptions]) -> Vec<PlaneGeometry> {
        vec![PlaneGeometry {
            width,
            rows: height,
            min_row_bytes: width * self.pixel_bytes(),
            bits: self.kind.bits_range(),
        }]
    }

    fn validate_layout(&self, planes: &[ImagePlaneOptions]) -> Result<()> {
        if planes[0].pixel_stride < self.pixel_bytes() {
            return Err(RenderError::invalid_argument(format!(
                "{}: pixel stride {} is smaller than a {}-byte pixel",
                self.format.name,
                planes[0].pixel_stride,
                self.pixel_bytes()
            )));
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

/// Interleaved formats known to the registry.
pub fn builtin() -> Vec<Arc<dyn ImageRenderer>> {
    use ByteOrdering::{BigEndian as BE, LittleEndian as LE};
    use ComponentSelector as S;
    use SampleKind::{F16, U8, U16};

    vec![
        Arc::new(InterleavedRenderer::new("ARGB_8888", U8, S::ARGB, Vec::new())),
        Arc::new(InterleavedRenderer::new("ABGR_8888", U8, S::ABGR, Vec::new())),
        Arc::new(InterleavedRenderer::new("BGRA_8888", U8, S::BGRA, vec![FormatAlias::synonym("BGRA32")])),
        Arc::new(InterleavedRenderer::new("RGBA_8888", U8, S::RGBA, vec![FormatAlias::synonym("RGBA32")])),
        Arc::new(InterleavedRenderer::new("RGB_888", U8, S::RGB, vec![FormatAlias::synonym("RGB24")])),
        Arc::new(InterleavedRenderer::new("BGR_888", U8, S::BGR, vec![FormatAlias::synonym("BGR24")])),
        Arc::new(InterleavedRenderer::new("ARGB_16161616", U16, S::ARGB, Vec::new())),
        Arc::new(InterleavedRenderer::new("ABGR_16161616", U16, S::ABGR, Vec::new())),
        Arc::new(InterleavedRenderer::new("BGRA_16161616", U16, S::BGRA, Vec::new())),
        Arc::new(InterleavedRenderer::new(
            "RGBA_16161616",
            U16,
            S::RGBA,
            vec![
                FormatAlias::ordered("RGBA_16161616_LE", LE),
                FormatAlias::ordered("RGBA_16161616_BE", BE),
            ],
        )),
        Arc::new(InterleavedRenderer::new("RGB_161616", U16, S::RGB, vec![FormatAlias::synonym("RGB48")])),
        Arc::new(InterleavedRenderer::new("BGR_161616", U16, S::BGR, vec![FormatAlias::synonym("BGR48")])),
        Arc::new(InterleavedRenderer::new("RGBA_F16", F16, S::RGBA, vec![FormatAlias::synonym("RGBA_HALF")])),
        Arc::new(InterleavedRenderer::new("L8", U8, S::LUMA, vec![FormatAlias::synonym("GRAY8")])),
        Arc::new(InterleavedRenderer::new(
            "L16",
            U16,
            S::LUMA,
            vec![
                FormatAlias::synonym("GRAY16"),
                FormatAlias::ordered("L16_LE", LE),
                FormatAlias::ordered("L16_BE", BE),
            ],
        )),
    ]
}
