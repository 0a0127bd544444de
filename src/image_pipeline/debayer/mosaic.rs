//! Staged single-channel samples from the raw pass.

use crate::image_pipeline::debayer::statistics::{BrightnessAccumulator, BrightnessStatistics};
use crate::image_pipeline::format::BayerPattern;
use crate::image_pipeline::pixel::{BgraSample, write_pixel};

/// Corrected sensor samples in raster order. Only the first `valid_len`
/// samples came from the source; the rest of a truncated frame is absent.
#[derive(Debug, Clone)]
pub struct Mosaic<T> {
    width: usize,
    height: usize,
    pattern: &'static BayerPattern,
    samples: Vec<T>,
    valid_len: usize,
}

impl<T: BgraSample> Mosaic<T> {
    pub fn new(width: usize, height: usize, pattern: &'static BayerPattern) -> Self {
        Self {
            width,
            height,
            pattern,
            samples: vec![T::default(); width * height],
            valid_len: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pattern(&self) -> &'static BayerPattern {
        self.pattern
    }

    pub fn valid_len(&self) -> usize {
        self.valid_len
    }

    /// Rows holding at least one decoded sample.
    pub fn valid_rows(&self) -> usize {
        self.valid_len.div_ceil(self.width)
    }

    /// Decoded samples on row `y`.
    pub fn valid_in_row(&self, y: usize) -> usize {
        self.valid_len.saturating_sub(y * self.width).min(self.width)
    }

    #[inline(always)]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.samples[y * self.width + x]
    }

    /// Sample at a signed position, `None` outside the frame or past the
    /// decoded region.
    #[inline(always)]
    pub fn sample(&self, x: isize, y: isize) -> Option<T> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        let index = y as usize * self.width + x as usize;
        (index < self.valid_len).then(|| self.samples[index])
    }

    /// Store `count` leading samples of row `y`. Rows must arrive in order.
    pub fn store_row(&mut self, y: usize, row: &[T]) {
        let count = row.len().min(self.width);
        let start = y * self.width;
        self.samples[start..start + count].copy_from_slice(&row[..count]);
        self.valid_len = start + count;
    }
}

/// Sequential half of the Bayer decode: each corrected row is staged in the
/// mosaic, counted in the statistics and written to the target with only
/// its own channel set.
pub struct RawPass<T> {
    mosaic: Mosaic<T>,
    stats: BrightnessAccumulator,
}

impl<T: BgraSample> RawPass<T> {
    pub fn new(width: usize, height: usize, pattern: &'static BayerPattern) -> Self {
        Self {
            mosaic: Mosaic::new(width, height, pattern),
            stats: BrightnessAccumulator::new(width, height),
        }
    }

    pub fn push_row(&mut self, y: usize, samples: &[T], target_row: &mut [u8]) {
        let pattern = self.mosaic.pattern;
        let samples = &samples[..samples.len().min(self.mosaic.width)];
        for (x, &v) in samples.iter().enumerate() {
            let mut bgra = [T::default(), T::default(), T::default(), T::OPAQUE];
            bgra[pattern.color_at(x, y).bgra_index()] = v;
            write_pixel(target_row, x, bgra[0], bgra[1], bgra[2], bgra[3]);
        }
        self.stats.add_row(pattern, y, samples);
        self.mosaic.store_row(y, samples);
    }

    pub fn finish(self) -> (Mosaic<T>, BrightnessStatistics) {
        (self.mosaic, self.stats.finish())
    }
}
