//! Image processing pipeline module
//!
//! Raw frame decoding: pixel primitives, the format model, per-family
//! decoders, the Bayer engine, the format registry and the render harness,
//! plus TIFF export of rendered bitmaps.

pub mod bitmap;
pub mod common;
pub mod conversions;
pub mod debayer;
pub mod decoders;
pub mod format;
pub mod harness;
pub mod pixel;
pub mod registry;
pub mod source;
pub mod tiff;

pub use common::{CancellationToken, RenderError, Result};

pub use bitmap::{BitmapBuffer, BitmapFormat, SharedBitmap};

pub use format::{
    BayerPattern, ColorComponent, FormatAlias, FormatCategory, ImageFormat, ImagePlaneDescriptor,
    ImagePlaneOptions, ImageRenderingOptions,
};

pub use decoders::{
    ImageRenderer, RenderingResult, StandardYuvConverter, YuvMatrix, YuvRange, YuvToBgraConverter,
};

pub use debayer::BrightnessStatistics;

pub use source::{FileDataSource, ImageDataSource, MemoryDataSource, SharedDataSource};

pub use registry::{FormatRegistry, RendererMatch};

pub use harness::{RenderTask, render, render_blocking};

pub use pixel::ByteOrdering;

pub use self::tiff::{RenderConfig, RenderConfigBuilder, StandardTiffWriter, TiffCompression, TiffWriter};

pub use conversions::{RawRenderRequest, RawToTiffPipeline};
