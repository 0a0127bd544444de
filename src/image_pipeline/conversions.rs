//! Pipeline conversions module
//!
//! Orchestrates raw frame rendering and TIFF export.

mod raw_to_tiff;
#[cfg(test)]
mod tests;

pub use raw_to_tiff::{RawRenderRequest, RawToTiffPipeline};
