use crate::image_pipeline::format::{BayerPattern, ColorComponent};
use crate::image_pipeline::pixel::BgraSample;

/// Per-channel brightness of a decoded mosaic, in output sample units
/// (0..=255 for BGRA32, 0..=65535 for BGRA64). Arrays are in R, G, B order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BrightnessStatistics {
    pub mean: [f64; 3],
    /// Samples in the central third of both axes count twice.
    pub center_weighted_mean: [f64; 3],
}

impl BrightnessStatistics {
    pub fn mean_of(&self, color: ColorComponent) -> f64 {
        self.mean[color.index()]
    }

    pub fn center_weighted_mean_of(&self, color: ColorComponent) -> f64 {
        self.center_weighted_mean[color.index()]
    }
}

/// Running sums fed row by row during the raw pass.
#[derive(Debug, Clone)]
pub struct BrightnessAccumulator {
    center_x: std::ops::Range<usize>,
    center_y: std::ops::Range<usize>,
    sum: [u64; 3],
    count: [u64; 3],
    weighted_sum: [u64; 3],
    weighted_count: [u64; 3],
}

impl BrightnessAccumulator {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            center_x: width / 3..width - width / 3,
            center_y: height / 3..height - height / 3,
            sum: [0; 3],
            count: [0; 3],
            weighted_sum: [0; 3],
            weighted_count: [0; 3],
        }
    }

    pub fn add_row<T: BgraSample>(&mut self, pattern: &BayerPattern, y: usize, samples: &[T]) {
        let center_row = self.center_y.contains(&y);
        for (x, &sample) in samples.iter().enumerate() {
            let c = pattern.color_at(x, y).index();
            let v = sample.to_u32() as u64;
            let w = if center_row && self.center_x.contains(&x) { 2 } else { 1 };
            self.sum[c] += v;
            self.count[c] += 1;
            self.weighted_sum[c] += w * v;
            self.weighted_count[c] += w;
        }
    }

    pub fn finish(&self) -> BrightnessStatistics {
        let ratio = |sum: u64, count: u64| if count == 0 { 0.0 } else { sum as f64 / count as f64 };
        let mut stats = BrightnessStatistics::default();
        for c in 0..3 {
            stats.mean[c] = ratio(self.sum[c], self.count[c]);
            stats.center_weighted_mean[c] = ratio(self.weighted_sum[c], self.weighted_count[c]);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn center_counts_twice() {
        let pattern = BayerPattern::from_name("RGGB").unwrap();
        // 6x6 frame: the centre is x, y in 2..4.
        let mut acc = BrightnessAccumulator::new(6, 6);
        for y in 0..6 {
            let row: Vec<u8> = (0..6).map(|x| if (2..4).contains(&x) && (2..4).contains(&y) { 200 } else { 100 }).collect();
            acc.add_row(pattern, y, &row);
        }
        let stats = acc.finish();
        // Red sits on even x, even y: 9 samples, one of them (2, 2) central.
        assert_relative_eq!(stats.mean_of(ColorComponent::Red), (8.0 * 100.0 + 200.0) / 9.0);
        assert_relative_eq!(
            stats.center_weighted_mean_of(ColorComponent::Red),
            (8.0 * 100.0 + 2.0 * 200.0) / 10.0
        );
    }

    #[test]
    fn empty_channel_reports_zero() {
        let acc = BrightnessAccumulator::new(4, 4);
        assert_eq!(acc.finish(), BrightnessStatistics::default());
    }
}
