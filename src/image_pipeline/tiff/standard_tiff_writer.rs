use std::io::Write;

use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder, colortype};
use tracing::debug;

use crate::image_pipeline::bitmap::{BitmapBuffer, BitmapFormat};
use crate::image_pipeline::common::error::{RenderError, Result};
use crate::image_pipeline::tiff::types::{RenderConfig, TiffCompression};
use crate::image_pipeline::tiff::writer::TiffWriter;

pub struct StandardTiffWriter;

fn encoder_compression(compression: TiffCompression) -> Compression {
    match compression {
        TiffCompression::None => Compression::Uncompressed,
        TiffCompression::Lzw => Compression::Lzw,
        TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
        TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
        TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
    }
}

fn encode_error(e: tiff::TiffError) -> RenderError {
    RenderError::EncodeError(e.to_string())
}

impl TiffWriter for StandardTiffWriter {
    fn write_bitmap(&self, bitmap: &BitmapBuffer, output: &mut dyn Write, config: &RenderConfig) -> Result<()> {
        let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
        debug!(width, height, format = ?bitmap.format(), "encoding TIFF");

        let mut buffer = Vec::new();
        let mut encoder = TiffEncoder::new(std::io::Cursor::new(&mut buffer))
            .map_err(encode_error)?
            .with_compression(encoder_compression(config.compression));

        if let Some(predictor_val) = config.predictor {
            let predictor = match predictor_val {
                2 => tiff::tags::Predictor::Horizontal,
                _ => tiff::tags::Predictor::None,
            };
            encoder = encoder.with_predictor(predictor);
        }

        match bitmap.format() {
            BitmapFormat::Bgra32 => encoder
                .write_image::<colortype::RGBA8>(width, height, &bitmap.to_rgba8())
                .map_err(encode_error)?,
            BitmapFormat::Bgra64 => encoder
                .write_image::<colortype::RGBA16>(width, height, &bitmap.to_rgba16())
                .map_err(encode_error)?,
        }

        output.write_all(&buffer)?;

        debug!(bytes = buffer.len(), "TIFF encoding complete");
        Ok(())
    }
}
