use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::image_pipeline::bitmap::{BitmapBuffer, SharedBitmap};
use crate::image_pipeline::common::{CancellationToken, RenderError, Result};
use crate::image_pipeline::decoders::RenderingResult;
use crate::image_pipeline::format::{ImagePlaneOptions, ImageRenderingOptions};
use crate::image_pipeline::harness;
use crate::image_pipeline::registry::FormatRegistry;
use crate::image_pipeline::source::{FileDataSource, MemoryDataSource, SharedDataSource};
use crate::image_pipeline::tiff::{RenderConfig, StandardTiffWriter, TiffWriter};

/// What to decode: a format name (canonical or alias), frame geometry and
/// decode parameters. Planes default to the decoder's layout for the size.
#[derive(Debug, Clone)]
pub struct RawRenderRequest {
    pub format: String,
    pub width: usize,
    pub height: usize,
    pub options: ImageRenderingOptions,
    pub planes: Option<Vec<ImagePlaneOptions>>,
}

impl RawRenderRequest {
    pub fn new(format: impl Into<String>, width: usize, height: usize) -> Self {
        Self {
            format: format.into(),
            width,
            height,
            options: ImageRenderingOptions::default(),
            planes: None,
        }
    }

    pub fn with_options(mut self, options: ImageRenderingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_planes(mut self, planes: Vec<ImagePlaneOptions>) -> Self {
        self.planes = Some(planes);
        self
    }
}

pub struct RawToTiffPipeline<W: TiffWriter> {
    registry: &'static FormatRegistry,
    writer: W,
    config: RenderConfig,
}

impl RawToTiffPipeline<StandardTiffWriter> {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            registry: FormatRegistry::global(),
            writer: StandardTiffWriter,
            config,
        }
    }
}

impl<W: TiffWriter> RawToTiffPipeline<W> {
    pub fn with_custom(writer: W, config: RenderConfig) -> Self {
        Self {
            registry: FormatRegistry::global(),
            writer,
            config,
        }
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions(width, height));
        }

        if let Some(max) = self.config.max_dimension
            && (width > max || height > max)
        {
            return Err(RenderError::InvalidDimensions(width, height));
        }

        Ok(())
    }

    /// Decode `source` into a fresh bitmap of the decoder's output format.
    #[instrument(skip(self, source, request, cancel), fields(format = %request.format, width = request.width, height = request.height))]
    pub fn render(
        &self,
        source: SharedDataSource,
        request: &RawRenderRequest,
        cancel: CancellationToken,
    ) -> Result<(SharedBitmap, RenderingResult)> {
        self.validate_dimensions(request.width, request.height)?;

        let found = self
            .registry
            .find_by_name(&request.format)
            .ok_or_else(|| RenderError::FormatNotFound(request.format.clone()))?;
        let renderer = found.renderer;

        let mut options = request.options.clone();
        if let Some(ordering) = found.byte_ordering {
            options.byte_ordering = ordering;
        }
        let planes = request
            .planes
            .clone()
            .unwrap_or_else(|| renderer.create_default_plane_options(request.width, request.height));

        let expected = renderer.evaluate_source_data_size(request.width, request.height, &options, &planes)
            + options.data_offset;
        if source.size() < expected {
            warn!(
                available = source.size(),
                expected,
                "source is shorter than a full frame, output will be partial"
            );
        }

        let bitmap = BitmapBuffer::new(request.width, request.height, renderer.rendered_format())?.into_shared();
        let task = {
            let _span = tracing::info_span!("decode_raw").entered();
            harness::render(Arc::clone(&renderer), &source, &bitmap, options, planes, cancel)?
        };
        let result = task.wait()?;

        if let Some(stats) = &result.brightness {
            info!(mean = ?stats.mean, center_weighted = ?stats.center_weighted_mean, "brightness");
        }
        Ok((bitmap, result))
    }

    #[instrument(skip(self, input_data, request, output), fields(input_size = input_data.len()))]
    pub fn convert(
        &self,
        input_data: &[u8],
        request: &RawRenderRequest,
        output: &mut dyn Write,
    ) -> Result<RenderingResult> {
        info!("Starting raw to TIFF conversion");
        let source = MemoryDataSource::shared(input_data.to_vec());
        self.convert_source(source, request, output)
    }

    fn convert_source(
        &self,
        source: SharedDataSource,
        request: &RawRenderRequest,
        output: &mut dyn Write,
    ) -> Result<RenderingResult> {
        let (bitmap, result) = self.render(source, request, CancellationToken::new())?;

        {
            let _span = tracing::info_span!("encode_tiff").entered();
            self.writer.write_bitmap(&bitmap, output, &self.config)?;
        }

        info!(
            width = bitmap.width(),
            height = bitmap.height(),
            rows = result.rows_rendered,
            "Conversion complete"
        );
        Ok(result)
    }

    #[instrument(skip(self, input_path, output_path, request))]
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
        request: &RawRenderRequest,
    ) -> Result<RenderingResult> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            format = %request.format,
            "Converting file"
        );

        let source: SharedDataSource = Arc::new(FileDataSource::open(input_path)?);

        let mut output_file = {
            let _span = tracing::info_span!("create_output_file").entered();
            std::fs::File::create(output_path).map_err(|e| {
                RenderError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?
        };

        self.convert_source(source, request, &mut output_file)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RenderConfig) {
        self.config = config;
    }
}
