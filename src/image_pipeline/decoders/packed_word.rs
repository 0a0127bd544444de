//! Decoders for pixels packed into a single 16- or 32-bit word
//! (RGB565 and 10-bit ARGB2101010 variants).

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::image_pipeline::bitmap::BitmapFormat;
use crate::image_pipeline::common::error::{RenderError, Result};
use crate::image_pipeline::decoders::renderer::{
    DecodeContext, ImageRenderer, PlaneGeometry, RenderingResult, for_each_row, items_in_row,
};
use crate::image_pipeline::format::{
    FormatAlias, FormatCategory, ImageFormat, ImagePlaneDescriptor, ImagePlaneOptions,
};
use crate::image_pipeline::pixel::{BgraSample, ByteOrdering, LevelTable, replicate_bits, write_pixel16};
use crate::image_pipeline::source::RowReader;

/// 2-bit alpha expanded to the full 16-bit range.
const ALPHA2_TABLE: [u16; 4] = [0x0000, 0x5555, 0xAAAA, 0xFFFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordLayout {
    /// 5-6-5 bits, red in the top bits when `red_high`.
    Rgb565 { red_high: bool },
    /// 2-10-10-10 bits with alpha on top, red next to alpha when `red_high`.
    Argb2101010 { red_high: bool },
}

impl WordLayout {
    const fn word_bytes(self) -> usize {
        match self {
            Self::Rgb565 { .. } => 2,
            Self::Argb2101010 { .. } => 4,
        }
    }

    const fn channel_bits(self) -> u8 {
        match self {
            Self::Rgb565 { .. } => 16,
            Self::Argb2101010 { .. } => 10,
        }
    }
}

pub struct PackedWordRenderer {
    format: ImageFormat,
    layout: WordLayout,
}

impl PackedWordRenderer {
    pub fn new(name: &'static str, layout: WordLayout, aliases: Vec<FormatAlias>) -> Self {
        let category = match layout {
            WordLayout::Rgb565 { .. } => FormatCategory::Rgb,
            WordLayout::Argb2101010 { .. } => FormatCategory::Argb,
        };
        let format = ImageFormat::new(
            name,
            category,
            vec![ImagePlaneDescriptor::new(layout.word_bytes(), layout.channel_bits())],
        )
        .with_aliases(aliases)
        .with_byte_orderings();
        Self { format, layout }
    }

    #[inline(always)]
    fn unpack(&self, src: &[u8], offset: usize, order: ByteOrdering, levels: &LevelTable) -> [u16; 4] {
        match self.layout {
            WordLayout::Rgb565 { red_high } => {
                let w = order.read_u16(src[offset], src[offset + 1]);
                let (hi, mid, lo) = (replicate_bits(w >> 11, 5), replicate_bits(w >> 5, 6), replicate_bits(w, 5));
                let (r, b) = if red_high { (hi, lo) } else { (lo, hi) };
                [b, mid, r, u16::MAX]
            }
            WordLayout::Argb2101010 { red_high } => {
                let w = order.read_u32([src[offset], src[offset + 1], src[offset + 2], src[offset + 3]]);
                let hi = levels.apply(((w >> 20) & 0x3FF) as u16);
                let g = levels.apply(((w >> 10) & 0x3FF) as u16);
                let lo = levels.apply((w & 0x3FF) as u16);
                let a = ALPHA2_TABLE[(w >> 30) as usize];
                let (r, b) = if red_high { (hi, lo) } else { (lo, hi) };
                [b, g, r, a]
            }
        }
    }

    #[instrument(skip_all, fields(format = self.format.name))]
    fn decode_typed<T: BgraSample>(&self, ctx: DecodeContext<'_>) -> Result<RenderingResult> {
        let DecodeContext { source, mut target, options, planes, stop } = ctx;
        let plane = &planes[0];
        let order = options.byte_ordering;
        let word_bytes = self.layout.word_bytes();
        let width = target.width;
        let levels = match self.layout {
            WordLayout::Argb2101010 { .. } => {
                let (black, white) = plane.levels();
                LevelTable::new(10, black, white)
            }
            WordLayout::Rgb565 { .. } => LevelTable::full_range(16),
        };

        debug!(width, height = target.height, ?order, "decoding packed-word frame");

        let mut reader = RowReader::open(source, options.data_offset)?;
        let rows = for_each_row(&mut reader, plane.row_stride, target.height, stop, |y, src| {
            let dst = target.row_mut(y);
            let available = items_in_row(src.len(), word_bytes, plane.pixel_stride, width);
            for x in 0..available {
                let [b, g, r, a] = self.unpack(src, x * plane.pixel_stride, order, &levels);
                write_pixel16::<T>(dst, x, b, g, r, a);
            }
            Ok(())
        })?;

        Ok(RenderingResult { brightness: None, rows_rendered: rows })
    }
}

impl ImageRenderer for PackedWordRenderer {
    fn format(&self) -> &ImageFormat {
        &self.format
    }

    fn rendered_format(&self) -> BitmapFormat {
        match self.layout {
            WordLayout::Rgb565 { .. } => BitmapFormat::Bgra32,
            WordLayout::Argb2101010 { .. } => BitmapFormat::Bgra64,
        }
    }

    fn create_default_plane_options(&self, width: usize, _height: usize) -> Vec<ImagePlaneOptions> {
        let word = self.layout.word_bytes();
        vec![ImagePlaneOptions::new(word, width * word, self.layout.channel_bits())]
    }

    fn evaluate_pixel_count(&self, source_size: u64) -> u64 {
        source_size / self.layout.word_bytes() as u64
    }

    fn plane_geometry(&self, width: usize, height: usize, _planes: &[ImagePlaneOptions]) -> Vec<PlaneGeometry> {
        let bits = self.layout.channel_bits();
        vec![PlaneGeometry {
            width,
            rows: height,
            min_row_bytes: width * self.layout.word_bytes(),
            bits: bits..=bits,
        }]
    }

    fn validate_layout(&self, planes: &[ImagePlaneOptions]) -> Result<()> {
        if planes[0].pixel_stride < self.layout.word_bytes() {
            return Err(RenderError::invalid_argument(format!(
                "{}: pixel stride {} is smaller than the {}-byte word",
                self.format.name,
                planes[0].pixel_stride,
                self.layout.word_bytes()
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

pub fn builtin() -> Vec<Arc<dyn ImageRenderer>> {
    use ByteOrdering::{BigEndian as BE, LittleEndian as LE};

    vec![
        Arc::new(PackedWordRenderer::new(
            "RGB_565",
            WordLayout::Rgb565 { red_high: true },
            vec![FormatAlias::ordered("RGB_565_LE", LE), FormatAlias::ordered("RGB_565_BE", BE)],
        )),
        Arc::new(PackedWordRenderer::new("BGR_565", WordLayout::Rgb565 { red_high: false }, Vec::new())),
        Arc::new(PackedWordRenderer::new(
            "ARGB_2101010",
            WordLayout::Argb2101010 { red_high: true },
            vec![FormatAlias::synonym("A2R10G10B10")],
        )),
        Arc::new(PackedWordRenderer::new(
            "ABGR_2101010",
            WordLayout::Argb2101010 { red_high: false },
            vec![FormatAlias::synonym("A2B10G10R10"), FormatAlias::synonym("RGBA_1010102")],
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_replication() {
        // Narrowed to 8 bits this is the usual (v << 3) | (v >> 2).
        assert_eq!(replicate_bits(0x10, 5) >> 8, (0x10 << 3) | (0x10 >> 2));
        assert_eq!(replicate_bits(0x21, 6) >> 8, (0x21 << 2) | (0x21 >> 4));
    }

    #[test]
    fn argb2101010_fields() {
        let renderer = PackedWordRenderer::new("T", WordLayout::Argb2101010 { red_high: true }, Vec::new());
        let word: u32 = 0b10 << 30 | 0x3FF << 20 | 0x200 << 10 | 0x001;
        let bytes = word.to_be_bytes();
        let px = renderer.unpack(&bytes, 0, ByteOrdering::BigEndian, &LevelTable::full_range(10));
        assert_eq!(px, [1 << 6, 0x200 << 6, 0x3FF << 6, 0xAAAA]);
    }
}
