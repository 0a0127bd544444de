//! TIFF export of rendered bitmaps.

mod standard_tiff_writer;
pub mod types;
mod writer;

pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{RenderConfig, RenderConfigBuilder, TiffCompression};
pub use writer::TiffWriter;
