//! Bayer mosaic engine: raw sample staging with brightness statistics,
//! followed by neighbour-averaging demosaic.

pub mod demosaic;
pub mod mosaic;
pub mod statistics;

pub use demosaic::{NeighborhoodPlan, demosaic};
pub use mosaic::{Mosaic, RawPass};
pub use statistics::{BrightnessAccumulator, BrightnessStatistics};
