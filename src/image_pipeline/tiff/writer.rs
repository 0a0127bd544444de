use std::io::Write;

use crate::image_pipeline::bitmap::BitmapBuffer;
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::tiff::types::RenderConfig;

pub trait TiffWriter {
    /// Encode a rendered bitmap: BGRA32 as RGBA8, BGRA64 as RGBA16.
    fn write_bitmap(&self, bitmap: &BitmapBuffer, output: &mut dyn Write, config: &RenderConfig) -> Result<()>;
}
