//! Bayer mosaic decoders: 8-bit, 16-bit and MIPI CSI-2 packed sensors.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::image_pipeline::bitmap::BitmapFormat;
use crate::image_pipeline::common::error::{RenderError, Result};
use crate::image_pipeline::debayer::{RawPass, demosaic};
use crate::image_pipeline::decoders::renderer::{
    DecodeContext, ImageRenderer, PlaneGeometry, RenderingResult, for_each_row, items_in_row,
};
use crate::image_pipeline::format::{
    BayerPattern, FormatAlias, FormatCategory, ImageFormat, ImagePlaneDescriptor, ImagePlaneOptions,
    ImageRenderingOptions,
};
use crate::image_pipeline::pixel::{
    BgraSample, ByteOrdering, GainTable, LevelTable, LevelTable8, MipiPacking, read_native, unpack_mipi_row,
};
use crate::image_pipeline::source::RowReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BayerLayout {
    Bits8,
    /// 9..=16 effective bits in two bytes.
    Bits16,
    Mipi(MipiPacking),
}

impl BayerLayout {
    const fn default_bits(self) -> u8 {
        match self {
            Self::Bits8 => 8,
            Self::Bits16 => 16,
            Self::Mipi(packing) => packing.bits(),
        }
    }

    /// Declared pixel stride; bit-packed rows have none.
    const fn pixel_stride(self) -> usize {
        match self {
            Self::Bits8 => 1,
            Self::Bits16 => 2,
            Self::Mipi(_) => 0,
        }
    }

    fn min_row_bytes(self, width: usize) -> usize {
        match self {
            Self::Mipi(packing) => packing.row_bytes(width),
            _ => width * self.pixel_stride(),
        }
    }
}

/// Level and gain correction for one decode, per channel in R, G, B order.
enum Correction {
    /// Levels and gain folded into one table per channel.
    Byte(Box<[[u8; 256]; 3]>),
    Word { levels: LevelTable, gains: [GainTable<u16>; 3] },
}

impl Correction {
    fn new(layout: BayerLayout, plane: &ImagePlaneOptions, options: &ImageRenderingOptions) -> Self {
        let (black, white) = plane.levels();
        let [r, g, b] = options.gains();
        match layout {
            BayerLayout::Bits8 => {
                let levels = LevelTable8::new(black, white);
                let mut tables = Box::new([[0u8; 256]; 3]);
                for (table, gain) in tables.iter_mut().zip([r, g, b]) {
                    let gain = GainTable::<u8>::new(gain);
                    for (out, &leveled) in table.iter_mut().zip(levels.entries()) {
                        *out = gain.apply(leveled);
                    }
                }
                Self::Byte(tables)
            }
            BayerLayout::Bits16 | BayerLayout::Mipi(_) => Self::Word {
                levels: LevelTable::new(plane.effective_bits, black, white),
                gains: [GainTable::new(r), GainTable::new(g), GainTable::new(b)],
            },
        }
    }

    /// Corrected, left-justified sample for channel `c`. `raw` is the byte
    /// itself for 8-bit layouts and the native-depth value otherwise.
    #[inline(always)]
    fn apply(&self, c: usize, raw: u16) -> u16 {
        match self {
            Self::Byte(tables) => (tables[c][raw as usize & 0xFF] as u16) << 8,
            Self::Word { levels, gains } => gains[c].apply(levels.apply(raw)),
        }
    }
}

pub struct BayerRenderer {
    format: ImageFormat,
    layout: BayerLayout,
}

impl BayerRenderer {
    pub fn new(name: &'static str, layout: BayerLayout, aliases: Vec<FormatAlias>) -> Self {
        let mut format = ImageFormat::new(
            name,
            FormatCategory::Bayer,
            vec![ImagePlaneDescriptor::new(layout.pixel_stride(), layout.default_bits())],
        )
        .with_aliases(aliases);
        if layout != BayerLayout::Bits8 {
            format = format.with_byte_orderings();
        }
        Self { format, layout }
    }

    pub fn layout(&self) -> BayerLayout {
        self.layout
    }

    #[instrument(skip_all, fields(format = self.format.name))]
    fn decode_typed<T: BgraSample>(&self, ctx: DecodeContext<'_>) -> Result<RenderingResult> {
        let DecodeContext { source, mut target, options, planes, stop } = ctx;
        let plane = &planes[0];
        let pattern: &'static BayerPattern = options.pattern()?;
        let order = options.byte_ordering;
        let (width, height) = (target.width, target.height);
        let correction = Correction::new(self.layout, plane, options);

        debug!(width, height, pattern = pattern.name, demosaic = options.demosaicing, "raw pass");

        let mut pass = RawPass::<T>::new(width, height, pattern);
        let mut native = vec![0u16; width];
        let mut samples = vec![T::default(); width];
        let mut reader = RowReader::open(source, options.data_offset)?;

        for_each_row(&mut reader, plane.row_stride, height, stop, |y, src| {
            let count = match self.layout {
                BayerLayout::Bits8 => {
                    let n = items_in_row(src.len(), 1, plane.pixel_stride, width);
                    for x in 0..n {
                        let c = pattern.color_at(x, y).index();
                        samples[x] = T::from_u16(correction.apply(c, src[x * plane.pixel_stride] as u16));
                    }
                    n
                }
                BayerLayout::Bits16 => {
                    let n = items_in_row(src.len(), 2, plane.pixel_stride, width);
                    for x in 0..n {
                        let at = x * plane.pixel_stride;
                        let raw = read_native(src[at], src[at + 1], plane.effective_bits, order);
                        samples[x] = T::from_u16(correction.apply(pattern.color_at(x, y).index(), raw));
                    }
                    n
                }
                BayerLayout::Mipi(packing) => {
                    let n = unpack_mipi_row(packing, src, order, &mut native);
                    for x in 0..n {
                        samples[x] = T::from_u16(correction.apply(pattern.color_at(x, y).index(), native[x]));
                    }
                    n
                }
            };
            pass.push_row(y, &samples[..count], target.row_mut(y));
            Ok(())
        })?;

        let (mosaic, brightness) = pass.finish();
        info!(
            mean_r = brightness.mean[0],
            mean_g = brightness.mean[1],
            mean_b = brightness.mean[2],
            "raw pass complete"
        );

        if options.demosaicing {
            demosaic(&mosaic, target, stop)?;
        }

        Ok(RenderingResult {
            brightness: Some(brightness),
            rows_rendered: mosaic.valid_rows(),
        })
    }
}

impl ImageRenderer for BayerRenderer {
    fn format(&self) -> &ImageFormat {
        &self.format
    }

    fn rendered_format(&self) -> BitmapFormat {
        match self.layout {
            BayerLayout::Bits8 => BitmapFormat::Bgra32,
            _ => BitmapFormat::Bgra64,
        }
    }

    fn create_default_plane_options(&self, width: usize, _height: usize) -> Vec<ImagePlaneOptions> {
        vec![ImagePlaneOptions::new(
            self.layout.pixel_stride(),
            self.layout.min_row_bytes(width),
            self.layout.default_bits(),
        )]
    }

    fn evaluate_pixel_count(&self, source_size: u64) -> u64 {
        match self.layout {
            BayerLayout::Bits8 => source_size,
            BayerLayout::Bits16 => source_size / 2,
            BayerLayout::Mipi(packing) => {
                source_size / packing.bytes_per_group() as u64 * packing.pixels_per_group() as u64
            }
        }
    }

    fn plane_geometry(&self, width: usize, height: usize, _planes: &[ImagePlaneOptions]) -> Vec<PlaneGeometry> {
        let bits = match self.layout {
            BayerLayout::Bits8 => 8..=8,
            BayerLayout::Bits16 => 9..=16,
            BayerLayout::Mipi(packing) => packing.bits()..=packing.bits(),
        };
        vec![PlaneGeometry {
            width,
            rows: height,
            min_row_bytes: self.layout.min_row_bytes(width),
            bits,
        }]
    }

    fn validate_layout(&self, planes: &[ImagePlaneOptions]) -> Result<()> {
        let min = self.layout.pixel_stride();
        if planes[0].pixel_stride < min {
            return Err(RenderError::invalid_argument(format!(
                "{}: pixel stride {} below {min}",
                self.format.name, planes[0].pixel_stride
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
        Arc::new(BayerRenderer::new("BAYER_8", BayerLayout::Bits8, vec![FormatAlias::synonym("RAW8")])),
        Arc::new(BayerRenderer::new(
            "BAYER_16",
            BayerLayout::Bits16,
            vec![FormatAlias::ordered("BAYER_16_LE", LE), FormatAlias::ordered("BAYER_16_BE", BE)],
        )),
        Arc::new(BayerRenderer::new(
            "BAYER_MIPI_10",
            BayerLayout::Mipi(MipiPacking::Raw10),
            vec![FormatAlias::synonym("RAW10")],
        )),
        Arc::new(BayerRenderer::new(
            "BAYER_MIPI_12",
            BayerLayout::Mipi(MipiPacking::Raw12),
            vec![FormatAlias::synonym("RAW12")],
        )),
        Arc::new(BayerRenderer::new(
            "BAYER_MIPI_14",
            BayerLayout::Mipi(MipiPacking::Raw14),
            vec![FormatAlias::synonym("RAW14")],
        )),
    ]
}

#[cfg(test)]
mod tests;
