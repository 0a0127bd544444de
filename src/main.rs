//! rawframe - render raw sensor and frame-buffer dumps to TIFF

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing::{error, info};

use rawframe_rs::image_pipeline::{
    BayerPattern, ByteOrdering, FormatRegistry, ImageRenderingOptions, RawRenderRequest, RawToTiffPipeline,
    RenderConfig, StandardYuvConverter, TiffCompression, YuvMatrix, YuvRange,
};
use rawframe_rs::logger;

#[derive(Clone, Copy, ValueEnum)]
enum ByteOrderArg {
    Le,
    Be,
}

#[derive(Clone, Copy, ValueEnum)]
enum CompressionArg {
    None,
    Lzw,
    DeflateFast,
    Deflate,
    DeflateBest,
}

impl From<CompressionArg> for TiffCompression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => TiffCompression::None,
            CompressionArg::Lzw => TiffCompression::Lzw,
            CompressionArg::DeflateFast => TiffCompression::DeflateFast,
            CompressionArg::Deflate => TiffCompression::DeflateBalanced,
            CompressionArg::DeflateBest => TiffCompression::DeflateBest,
        }
    }
}

#[derive(Parser)]
#[command(name = "rawframe")]
#[command(author, version, about = "Render raw pixel dumps (RGB, YUV, Bayer) to TIFF")]
#[command(long_about = "
Decodes an uncompressed frame dump into a BGRA bitmap and writes it as an
RGBA TIFF (8-bit for BGRA32 formats, 16-bit for BGRA64 formats).

Examples:
  rawframe --list-formats
  rawframe frame.yuv out.tiff -f NV12 --width 1920 --height 1080
  rawframe sensor.raw out.tiff -f RAW10 --width 4056 --height 3040 --pattern BGGR
  rawframe dump.bin out.tiff -f BAYER_16_BE --width 640 --height 480 --bits 12 --black 64
")]
struct Cli {
    /// Raw input file
    #[arg(required_unless_present = "list_formats")]
    input: Option<PathBuf>,

    /// TIFF output file
    #[arg(required_unless_present = "list_formats")]
    output: Option<PathBuf>,

    /// Print every registered format and alias, then exit
    #[arg(long)]
    list_formats: bool,

    /// Pixel format name or alias (case-insensitive)
    #[arg(short, long, default_value = "BAYER_8")]
    format: String,

    #[arg(long, default_value = "0")]
    width: usize,

    #[arg(long, default_value = "0")]
    height: usize,

    /// Byte ordering of multi-byte samples
    #[arg(long, value_enum)]
    byte_order: Option<ByteOrderArg>,

    /// Bayer pattern name (RGGB, GRBG, GBRG, BGGR, QUAD_*, XTRANS) or id
    #[arg(long, default_value = "RGGB")]
    pattern: String,

    /// Leave Bayer frames as single-channel mosaics
    #[arg(long)]
    no_demosaic: bool,

    /// Red, green and blue gains for Bayer formats
    #[arg(long, value_delimiter = ',', default_values = ["1.0", "1.0", "1.0"])]
    gains: Vec<f32>,

    /// Bytes to skip before the first row
    #[arg(long, default_value = "0")]
    offset: u64,

    /// Effective bits per sample for the first plane
    #[arg(long)]
    bits: Option<u8>,

    /// Black level for the first plane
    #[arg(long)]
    black: Option<u16>,

    /// White level for the first plane
    #[arg(long)]
    white: Option<u16>,

    /// YUV matrix: bt601, bt709, bt2020
    #[arg(long, default_value = "bt601")]
    yuv_matrix: String,

    /// Treat YUV input as limited (studio) range
    #[arg(long)]
    limited_range: bool,

    /// TIFF compression
    #[arg(short, long, value_enum, default_value = "none")]
    compression: CompressionArg,

    /// TIFF predictor (2 = horizontal differencing)
    #[arg(long)]
    predictor: Option<u16>,

    /// Worker threads for row-parallel passes (0 = all cores)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,
}

fn list_formats() {
    for format in FormatRegistry::global().formats() {
        let aliases: Vec<&str> = format.aliases.iter().map(|a| a.name).collect();
        println!(
            "{:<16} {:<10} planes={} {}",
            format.name,
            format!("{:?}", format.category),
            format.plane_count(),
            aliases.join(", ")
        );
    }
}

fn build_request(cli: &Cli) -> Result<RawRenderRequest> {
    let pattern = BayerPattern::from_name(&cli.pattern)
        .or_else(|| cli.pattern.parse().ok().and_then(BayerPattern::from_id))
        .with_context(|| format!("unknown Bayer pattern '{}'", cli.pattern))?;
    let matrix = YuvMatrix::from_name(&cli.yuv_matrix)
        .with_context(|| format!("unknown YUV matrix '{}'", cli.yuv_matrix))?;
    let range = if cli.limited_range { YuvRange::Limited } else { YuvRange::Full };
    let [red, green, blue] = <[f32; 3]>::try_from(cli.gains.as_slice()).context("expected three gains")?;

    let mut builder = ImageRenderingOptions::builder()
        .bayer_pattern(pattern.id)
        .demosaicing(!cli.no_demosaic)
        .gains(red, green, blue)
        .data_offset(cli.offset)
        .yuv_converter(Arc::new(StandardYuvConverter::new(matrix, range)))
        .max_parallelism((cli.threads > 0).then_some(cli.threads));
    if let Some(order) = cli.byte_order {
        builder = builder.byte_ordering(match order {
            ByteOrderArg::Le => ByteOrdering::LittleEndian,
            ByteOrderArg::Be => ByteOrdering::BigEndian,
        });
    }

    let mut request = RawRenderRequest::new(cli.format.clone(), cli.width, cli.height).with_options(builder.build());

    if cli.bits.is_some() || cli.black.is_some() || cli.white.is_some() {
        let Some(found) = FormatRegistry::global().find_by_name(&cli.format) else {
            bail!("unknown format '{}'", cli.format);
        };
        let mut planes = found.renderer.create_default_plane_options(cli.width, cli.height);
        let first = &mut planes[0];
        if let Some(bits) = cli.bits {
            first.effective_bits = bits;
        }
        first.black_level = cli.black;
        first.white_level = cli.white;
        request = request.with_planes(planes);
    }

    Ok(request)
}

fn main() -> Result<()> {
    logger::init();
    let cli = Cli::parse();

    if cli.list_formats {
        list_formats();
        return Ok(());
    }

    let (Some(input), Some(output)) = (&cli.input, &cli.output) else {
        bail!("input and output paths are required");
    };

    let request = build_request(&cli)?;
    let config = RenderConfig::builder()
        .compression(cli.compression.into())
        .predictor(cli.predictor)
        .build();
    let pipeline = RawToTiffPipeline::new(config);

    info!(format = %request.format, width = request.width, height = request.height, "Starting rawframe");
    info!("Compression: {:?}", pipeline.config().compression);

    match pipeline.convert_file(input, output, &request) {
        Ok(result) => {
            info!(rows = result.rows_rendered, "Conversion successful!");
            Ok(())
        }
        Err(e) => {
            error!("Conversion failed: {}", e);
            Err(e).with_context(|| format!("converting {}", input.display()))
        }
    }
}
