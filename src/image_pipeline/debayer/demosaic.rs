//! Neighbour-averaging demosaic.
//!
//! Each missing channel of a pixel is the mean of the same-channel samples
//! in its 3x3 neighbourhood, divided by the number actually found. Tiles
//! larger than 2x2 fall back to the 5x5 ring for channels the 3x3 pass left
//! empty. Out-of-frame and undecoded neighbours are skipped, never padded.

use enough::Stop;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::image_pipeline::bitmap::BitmapView;
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::debayer::mosaic::Mosaic;
use crate::image_pipeline::format::{BayerPattern, ColorComponent};
use crate::image_pipeline::pixel::{BgraSample, write_pixel};

type Offsets = Vec<(isize, isize)>;

/// Neighbour offsets per tile cell and channel, split into the inner 3x3
/// ring and the outer 5x5 ring.
#[derive(Debug, Clone)]
struct CellPlan {
    near: [Offsets; 3],
    far: [Offsets; 3],
}

#[derive(Debug, Clone)]
pub struct NeighborhoodPlan {
    pattern: &'static BayerPattern,
    cells: Vec<CellPlan>,
    wide_fallback: bool,
}

impl NeighborhoodPlan {
    pub fn for_pattern(pattern: &'static BayerPattern) -> Self {
        let (w, h) = (pattern.width(), pattern.height());
        let wide_fallback = !pattern.is_2x2();
        let mut cells = Vec::with_capacity(pattern.cell_count());
        for cy in 0..h {
            for cx in 0..w {
                let mut near: [Offsets; 3] = Default::default();
                let mut far: [Offsets; 3] = Default::default();
                for dy in -2isize..=2 {
                    for dx in -2isize..=2 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        // Shift by one tile so the wrapped coordinate stays positive.
                        let nx = (cx as isize + dx + w as isize) as usize;
                        let ny = (cy as isize + dy + h as isize) as usize;
                        let c = pattern.color_at(nx, ny).index();
                        if dx.abs() <= 1 && dy.abs() <= 1 {
                            near[c].push((dx, dy));
                        } else if wide_fallback {
                            far[c].push((dx, dy));
                        }
                    }
                }
                cells.push(CellPlan { near, far });
            }
        }
        Self { pattern, cells, wide_fallback }
    }

    /// Mean of `color` around `(x, y)`, or zero when no neighbour carries it.
    #[inline]
    fn average<T: BgraSample>(&self, mosaic: &Mosaic<T>, x: usize, y: usize, color: usize) -> T {
        let cell = &self.cells[self.pattern.tile_index(x, y)];
        let (sum, count) = gather(mosaic, x, y, &cell.near[color]);
        let (sum, count) = if count == 0 && self.wide_fallback {
            gather(mosaic, x, y, &cell.far[color])
        } else {
            (sum, count)
        };
        if count == 0 { T::default() } else { T::saturate_u32(sum / count) }
    }
}

#[inline(always)]
fn gather<T: BgraSample>(mosaic: &Mosaic<T>, x: usize, y: usize, offsets: &[(isize, isize)]) -> (u32, u32) {
    let (mut sum, mut count) = (0u32, 0u32);
    for &(dx, dy) in offsets {
        if let Some(v) = mosaic.sample(x as isize + dx, y as isize + dy) {
            sum += v.to_u32();
            count += 1;
        }
    }
    (sum, count)
}

/// Fill in the missing channels of every decoded pixel in `target`.
///
/// Rows run in parallel; each task reads the shared mosaic and writes only
/// its own row. Cancellation is checked once per row.
#[instrument(skip_all, fields(pattern = mosaic.pattern().name))]
pub fn demosaic<T: BgraSample>(
    mosaic: &Mosaic<T>,
    target: BitmapView<'_>,
    stop: &(dyn Stop + Sync),
) -> Result<()> {
    let plan = NeighborhoodPlan::for_pattern(mosaic.pattern());
    let pattern = mosaic.pattern();
    let rows = mosaic.valid_rows().min(target.height);
    debug!(rows, width = mosaic.width(), "demosaicing");

    target
        .data
        .par_chunks_mut(target.row_stride)
        .take(rows)
        .enumerate()
        .try_for_each(|(y, dst)| -> Result<()> {
            stop.check()?;
            for x in 0..mosaic.valid_in_row(y) {
                let own = pattern.color_at(x, y);
                let mut rgb = [T::default(); 3];
                for color in ColorComponent::ALL {
                    let c = color.index();
                    rgb[c] = if color == own { mosaic.get(x, y) } else { plan.average(mosaic, x, y, c) };
                }
                write_pixel(dst, x, rgb[2], rgb[1], rgb[0], T::OPAQUE);
            }
            Ok(())
        })
}
