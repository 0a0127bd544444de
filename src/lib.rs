//! Raw pixel rendering engine.
//!
//! Converts uncompressed sensor and frame-buffer dumps (interleaved RGB/ARGB,
//! planar and semi-planar YUV, Bayer mosaics) into BGRA32/BGRA64 bitmaps.

pub mod image_pipeline;
pub mod logger;
