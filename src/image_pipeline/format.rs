//! Format and plane metadata model

pub mod bayer_pattern;
pub mod options;
pub mod types;

pub use bayer_pattern::{BAYER_PATTERNS, BayerPattern, ColorComponent};
pub use options::{ImagePlaneOptions, ImageRenderingOptions, ImageRenderingOptionsBuilder};
pub use types::{FormatAlias, FormatCategory, ImageFormat, ImagePlaneDescriptor};
