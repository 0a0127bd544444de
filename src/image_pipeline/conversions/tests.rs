use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use crate::image_pipeline::bitmap::{BitmapBuffer, BitmapFormat};
use crate::image_pipeline::common::{RenderError, Result};
use crate::image_pipeline::conversions::{RawRenderRequest, RawToTiffPipeline};
use crate::image_pipeline::format::{ImagePlaneOptions, ImageRenderingOptions};
use crate::image_pipeline::tiff::{RenderConfig, TiffCompression, TiffWriter};

/// Captures what the pipeline asked to encode.
struct MockWriter {
    should_fail: bool,
    written: Arc<Mutex<Vec<(usize, usize, BitmapFormat, Vec<u8>)>>>,
}

impl TiffWriter for MockWriter {
    fn write_bitmap(&self, bitmap: &BitmapBuffer, _output: &mut dyn Write, _config: &RenderConfig) -> Result<()> {
        if self.should_fail {
            return Err(RenderError::EncodeError("Mock encode error".to_string()));
        }
        let pixels = bitmap.lock().clone();
        self.written
            .lock()
            .unwrap()
            .push((bitmap.width(), bitmap.height(), bitmap.format(), pixels));
        Ok(())
    }
}

fn pipeline(should_fail: bool) -> (RawToTiffPipeline<MockWriter>, Arc<Mutex<Vec<(usize, usize, BitmapFormat, Vec<u8>)>>>) {
    let written = Arc::new(Mutex::new(Vec::new()));
    let writer = MockWriter { should_fail, written: written.clone() };
    (RawToTiffPipeline::with_custom(writer, RenderConfig::default()), written)
}

#[test]
fn test_config_builder() {
    let config = RenderConfig::builder()
        .compression(TiffCompression::DeflateBest)
        .predictor(Some(2))
        .validate_dimensions(false)
        .max_dimension(Some(10000))
        .build();

    assert_eq!(config.compression, TiffCompression::DeflateBest);
    assert_eq!(config.predictor, Some(2));
    assert!(!config.validate_dimensions);
    assert_eq!(config.max_dimension, Some(10000));
}

#[test]
fn test_successful_conversion() {
    let (pipeline, written) = pipeline(false);
    let request = RawRenderRequest::new("BGRA_8888", 2, 1);
    let mut output = Cursor::new(Vec::new());

    let result = pipeline.convert(&[1, 2, 3, 4, 5, 6, 7, 8], &request, &mut output).unwrap();

    assert_eq!(result.rows_rendered, 1);
    let written = written.lock().unwrap();
    assert_eq!(written.len(), 1);
    let (w, h, format, pixels) = &written[0];
    assert_eq!((*w, *h, *format), (2, 1, BitmapFormat::Bgra32));
    assert_eq!(pixels, &vec![1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn test_alias_sets_byte_ordering() {
    let (pipeline, written) = pipeline(false);
    let request = RawRenderRequest::new("L16_BE", 1, 1);
    let mut output = Cursor::new(Vec::new());

    pipeline.convert(&[0x12, 0x34], &request, &mut output).unwrap();

    let written = written.lock().unwrap();
    let pixels = &written[0].3;
    assert_eq!(u16::from_ne_bytes([pixels[0], pixels[1]]), 0x1234);
}

#[test]
fn test_unknown_format() {
    let (pipeline, written) = pipeline(false);
    let request = RawRenderRequest::new("JPEG", 4, 4);
    let mut output = Cursor::new(Vec::new());

    let result = pipeline.convert(&[0; 16], &request, &mut output);

    assert!(matches!(result.unwrap_err(), RenderError::FormatNotFound(_)));
    assert!(written.lock().unwrap().is_empty());
}

#[test]
fn test_writer_failure() {
    let (pipeline, _) = pipeline(true);
    let request = RawRenderRequest::new("L8", 2, 2);
    let mut output = Cursor::new(Vec::new());

    let result = pipeline.convert(&[0; 4], &request, &mut output);

    assert!(matches!(result.unwrap_err(), RenderError::EncodeError(_)));
}

#[test]
fn test_dimension_validation_failure() {
    let (pipeline, _) = pipeline(false);
    let mut output = Cursor::new(Vec::new());

    let zero = RawRenderRequest::new("L8", 0, 4);
    assert!(matches!(
        pipeline.convert(&[], &zero, &mut output).unwrap_err(),
        RenderError::InvalidDimensions(0, 4)
    ));

    let huge = RawRenderRequest::new("L8", 70_000, 1);
    assert!(matches!(
        pipeline.convert(&[], &huge, &mut output).unwrap_err(),
        RenderError::InvalidDimensions(70_000, 1)
    ));
}

#[test]
fn test_invalid_plane_configuration() {
    let (pipeline, written) = pipeline(false);
    // Row stride below width * pixel stride.
    let request = RawRenderRequest::new("RGB_888", 4, 1).with_planes(vec![ImagePlaneOptions::new(3, 8, 8)]);
    let mut output = Cursor::new(Vec::new());

    let result = pipeline.convert(&[0; 12], &request, &mut output);

    assert!(matches!(result.unwrap_err(), RenderError::InvalidArgument(_)));
    assert!(written.lock().unwrap().is_empty());
}

#[test]
fn test_bayer_conversion_reports_brightness() {
    let (pipeline, _) = pipeline(false);
    let options = ImageRenderingOptions::builder().bayer_pattern(3).build();
    let request = RawRenderRequest::new("BAYER_8", 2, 2).with_options(options);
    let mut output = Cursor::new(Vec::new());

    // BGGR: B G / G R
    let result = pipeline.convert(&[10, 20, 30, 40], &request, &mut output).unwrap();

    let stats = result.brightness.unwrap();
    assert_eq!(stats.mean, [40.0, 25.0, 10.0]);
}

#[test]
fn test_convert_file_writes_tiff() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("frame.raw");
    let output = dir.path().join("frame.tiff");
    std::fs::write(&input, [0u8, 64, 128, 255]).unwrap();

    let pipeline = RawToTiffPipeline::new(RenderConfig::default());
    pipeline
        .convert_file(&input, &output, &RawRenderRequest::new("GRAY8", 2, 2))
        .unwrap();

    let bytes = std::fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*"));
}
