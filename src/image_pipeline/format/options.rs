//! Runtime plane and rendering parameters.

use std::fmt;
use std::sync::Arc;

use crate::image_pipeline::common::error::{RenderError, Result};
use crate::image_pipeline::decoders::yuv_convert::{StandardYuvConverter, YuvToBgraConverter};
use crate::image_pipeline::format::bayer_pattern::BayerPattern;
use crate::image_pipeline::pixel::{ByteOrdering, max_sample};

/// Per-plane layout supplied by the caller (usually from a saved profile).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePlaneOptions {
    /// Bytes between consecutive pixels; 0 for bit-packed planes.
    pub pixel_stride: usize,
    /// Bytes between consecutive rows.
    pub row_stride: usize,
    /// Meaningful bits per sample, in `1..=16`.
    pub effective_bits: u8,
    pub black_level: Option<u16>,
    pub white_level: Option<u16>,
}

impl ImagePlaneOptions {
    pub fn new(pixel_stride: usize, row_stride: usize, effective_bits: u8) -> Self {
        Self {
            pixel_stride,
            row_stride,
            effective_bits,
            black_level: None,
            white_level: None,
        }
    }

    pub fn with_levels(mut self, black: u16, white: u16) -> Self {
        self.black_level = Some(black);
        self.white_level = Some(white);
        self
    }

    /// `(black, white)`, defaulting to the full range of the effective depth.
    pub fn levels(&self) -> (u16, u16) {
        let max = max_sample(self.effective_bits.clamp(1, 16));
        (self.black_level.unwrap_or(0), self.white_level.unwrap_or(max))
    }

    /// Check the invariants of one plane.
    ///
    /// `min_row_bytes` is the smallest row that can hold `plane_width` pixels
    /// for this plane's layout; `bits_range` is the depth the layout can carry.
    /// A depth outside `1..=16` is a configuration error, a valid depth the
    /// layout cannot carry is unsupported.
    pub fn validate(
        &self,
        plane: usize,
        plane_width: usize,
        min_row_bytes: usize,
        bits_range: std::ops::RangeInclusive<u8>,
    ) -> Result<()> {
        if !(1..=16).contains(&self.effective_bits) {
            return Err(RenderError::invalid_argument(format!(
                "plane {plane}: effective bits {} outside 1..=16",
                self.effective_bits
            )));
        }
        if !bits_range.contains(&self.effective_bits) {
            return Err(RenderError::not_supported(format!(
                "plane {plane}: {}-bit samples in a layout carrying {}..={} bits",
                self.effective_bits,
                bits_range.start(),
                bits_range.end()
            )));
        }
        if self.pixel_stride.saturating_mul(plane_width) > self.row_stride
            || self.row_stride < min_row_bytes
        {
            return Err(RenderError::invalid_argument(format!(
                "plane {plane}: row stride {} too small for {plane_width} pixels at pixel stride {} (need {})",
                self.row_stride,
                self.pixel_stride,
                min_row_bytes.max(self.pixel_stride.saturating_mul(plane_width))
            )));
        }
        let (black, white) = self.levels();
        if black >= white || white > max_sample(self.effective_bits) {
            return Err(RenderError::invalid_argument(format!(
                "plane {plane}: black level {black} must be below white level {white} <= {}",
                max_sample(self.effective_bits)
            )));
        }
        Ok(())
    }
}

/// Decode-time configuration.
#[derive(Clone)]
pub struct ImageRenderingOptions {
    pub byte_ordering: ByteOrdering,
    /// Index into the Bayer pattern table.
    pub bayer_pattern: usize,
    pub demosaicing: bool,
    pub red_gain: f32,
    pub green_gain: f32,
    pub blue_gain: f32,
    /// Bytes skipped at the start of the stream.
    pub data_offset: u64,
    pub yuv_converter: Arc<dyn YuvToBgraConverter>,
    /// Upper bound on worker threads for the parallel passes.
    pub max_parallelism: Option<usize>,
}

impl fmt::Debug for ImageRenderingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageRenderingOptions")
            .field("byte_ordering", &self.byte_ordering)
            .field("bayer_pattern", &self.bayer_pattern)
            .field("demosaicing", &self.demosaicing)
            .field("gains", &[self.red_gain, self.green_gain, self.blue_gain])
            .field("data_offset", &self.data_offset)
            .field("yuv_converter", &self.yuv_converter.name())
            .field("max_parallelism", &self.max_parallelism)
            .finish()
    }
}

impl Default for ImageRenderingOptions {
    fn default() -> Self {
        Self {
            byte_ordering: ByteOrdering::LittleEndian,
            bayer_pattern: 0,
            demosaicing: true,
            red_gain: 1.0,
            green_gain: 1.0,
            blue_gain: 1.0,
            data_offset: 0,
            yuv_converter: Arc::new(StandardYuvConverter::default()),
            max_parallelism: None,
        }
    }
}

impl ImageRenderingOptions {
    pub fn builder() -> ImageRenderingOptionsBuilder {
        ImageRenderingOptionsBuilder::default()
    }

    /// Gains in R, G, B order.
    pub fn gains(&self) -> [f32; 3] {
        [self.red_gain, self.green_gain, self.blue_gain]
    }

    pub fn pattern(&self) -> Result<&'static BayerPattern> {
        BayerPattern::from_id(self.bayer_pattern).ok_or_else(|| {
            RenderError::invalid_argument(format!("unknown Bayer pattern id {}", self.bayer_pattern))
        })
    }

    pub fn validate(&self) -> Result<()> {
        for (name, gain) in ["red", "green", "blue"].into_iter().zip(self.gains()) {
            if !(gain.is_finite() && gain > 0.0) {
                return Err(RenderError::invalid_argument(format!(
                    "{name} gain must be positive, got {gain}"
                )));
            }
        }
        self.pattern()?;
        if self.max_parallelism == Some(0) {
            return Err(RenderError::invalid_argument("max parallelism must be at least 1"));
        }
        Ok(())
    }
}

/// Builder for ImageRenderingOptions
#[derive(Default)]
pub struct ImageRenderingOptionsBuilder {
    byte_ordering: Option<ByteOrdering>,
    bayer_pattern: Option<usize>,
    demosaicing: Option<bool>,
    gains: Option<[f32; 3]>,
    data_offset: Option<u64>,
    yuv_converter: Option<Arc<dyn YuvToBgraConverter>>,
    max_parallelism: Option<Option<usize>>,
}

impl ImageRenderingOptionsBuilder {
    pub fn byte_ordering(mut self, ordering: ByteOrdering) -> Self {
        self.byte_ordering = Some(ordering);
        self
    }

    pub fn bayer_pattern(mut self, id: usize) -> Self {
        self.bayer_pattern = Some(id);
        self
    }

    pub fn demosaicing(mut self, enable: bool) -> Self {
        self.demosaicing = Some(enable);
        self
    }

    pub fn gains(mut self, red: f32, green: f32, blue: f32) -> Self {
        self.gains = Some([red, green, blue]);
        self
    }

    pub fn data_offset(mut self, offset: u64) -> Self {
        self.data_offset = Some(offset);
        self
    }

    pub fn yuv_converter(mut self, converter: Arc<dyn YuvToBgraConverter>) -> Self {
        self.yuv_converter = Some(converter);
        self
    }

    pub fn max_parallelism(mut self, threads: Option<usize>) -> Self {
        self.max_parallelism = Some(threads);
        self
    }

    pub fn build(self) -> ImageRenderingOptions {
        let default = ImageRenderingOptions::default();
        let [red_gain, green_gain, blue_gain] = self.gains.unwrap_or(default.gains());
        ImageRenderingOptions {
            byte_ordering: self.byte_ordering.unwrap_or(default.byte_ordering),
            bayer_pattern: self.bayer_pattern.unwrap_or(default.bayer_pattern),
            demosaicing: self.demosaicing.unwrap_or(default.demosaicing),
            red_gain,
            green_gain,
            blue_gain,
            data_offset: self.data_offset.unwrap_or(default.data_offset),
            yuv_converter: self.yuv_converter.unwrap_or(default.yuv_converter),
            max_parallelism: self.max_parallelism.unwrap_or(default.max_parallelism),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_defaults() {
        let options = ImageRenderingOptions::builder()
            .byte_ordering(ByteOrdering::BigEndian)
            .demosaicing(false)
            .build();
        assert_eq!(options.byte_ordering, ByteOrdering::BigEndian);
        assert!(!options.demosaicing);
        assert_eq!(options.gains(), [1.0, 1.0, 1.0]);
        assert_eq!(options.bayer_pattern, 0);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_gain() {
        let options = ImageRenderingOptions::builder().gains(1.0, 0.0, 1.0).build();
        assert!(matches!(options.validate(), Err(RenderError::InvalidArgument(_))));
        let options = ImageRenderingOptions::builder().gains(f32::NAN, 1.0, 1.0).build();
        assert!(options.validate().is_err());
    }

    #[test]
    fn plane_validation() {
        let plane = ImagePlaneOptions::new(2, 8, 12);
        assert!(plane.validate(0, 4, 8, 9..=16).is_ok());
        assert!(plane.validate(0, 5, 8, 9..=16).is_err());
        assert!(matches!(plane.validate(0, 4, 8, 13..=16), Err(RenderError::NotSupported(_))));
        assert!(matches!(
            ImagePlaneOptions::new(2, 8, 17).validate(0, 4, 8, 9..=16),
            Err(RenderError::InvalidArgument(_))
        ));
        assert!(plane.with_levels(100, 100).validate(0, 4, 8, 9..=16).is_err());
        assert!(plane.with_levels(0, 4096).validate(0, 4, 8, 9..=16).is_err());
        assert!(plane.with_levels(64, 4000).validate(0, 4, 8, 9..=16).is_ok());
    }
}
