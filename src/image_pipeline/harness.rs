//! Runs one decode off the calling thread.
//!
//! [`render`] takes its own share of the source and the bitmap before it
//! returns, so the caller may drop theirs at any point. The worker releases
//! both shares exactly once, whether the decode succeeds, fails, panics or is
//! cancelled.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use enough::Stop;
use tracing::{info, instrument, trace, warn};

use crate::image_pipeline::bitmap::{BitmapBuffer, BitmapView, SharedBitmap};
use crate::image_pipeline::common::{CancellationToken, RenderError, Result};
use crate::image_pipeline::decoders::{DecodeContext, ImageRenderer, RenderingResult};
use crate::image_pipeline::format::{ImagePlaneOptions, ImageRenderingOptions};
use crate::image_pipeline::source::{ImageDataSource, SharedDataSource};

/// Shares held by a running decode. Dropping it is the single release point.
struct RenderLease {
    format: &'static str,
    source: SharedDataSource,
    bitmap: SharedBitmap,
}

impl Drop for RenderLease {
    fn drop(&mut self) {
        trace!(format = self.format, "released source and bitmap shares");
    }
}

/// Handle to a background decode.
pub struct RenderTask {
    handle: JoinHandle<Result<RenderingResult>>,
    cancel: CancellationToken,
}

impl RenderTask {
    /// Ask the worker to stop at its next row or block boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the decode completes. By the time this returns the
    /// worker has released its shares.
    pub fn wait(self) -> Result<RenderingResult> {
        self.handle.join().unwrap_or_else(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "decode panicked".to_string());
            Err(RenderError::WorkerFailed(message))
        })
    }
}

/// Start decoding `source` into `buffer` on a background worker.
///
/// Fails immediately when the bitmap format differs from the decoder's
/// output format. Every other configuration error surfaces from
/// [`RenderTask::wait`] before any byte is decoded.
#[instrument(skip_all, fields(format = renderer.format().name))]
pub fn render(
    renderer: Arc<dyn ImageRenderer>,
    source: &SharedDataSource,
    buffer: &SharedBitmap,
    options: ImageRenderingOptions,
    planes: Vec<ImagePlaneOptions>,
    cancel: CancellationToken,
) -> Result<RenderTask> {
    check_target_format(renderer.as_ref(), buffer)?;

    let format = renderer.format().name;
    let lease = RenderLease {
        format,
        source: Arc::clone(source),
        bitmap: Arc::clone(buffer),
    };
    let stop = cancel.clone();

    let handle = thread::Builder::new()
        .name(format!("render-{}", format.to_ascii_lowercase()))
        .spawn(move || {
            let started = Instant::now();
            let outcome = render_blocking(
                renderer.as_ref(),
                lease.source.as_ref(),
                &lease.bitmap,
                &options,
                &planes,
                &stop,
            );
            drop(lease);
            match &outcome {
                Ok(result) => info!(
                    format,
                    rows = result.rows_rendered,
                    elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
                    "render complete"
                ),
                Err(e) if e.is_cancelled() => info!(format, "render cancelled"),
                Err(e) => warn!(format, error = %e, "render failed"),
            }
            outcome
        })?;

    Ok(RenderTask { handle, cancel })
}

/// Decode on the calling thread. Validates the whole configuration first.
///
/// With `options.max_parallelism` set, the row-parallel passes run on a
/// dedicated pool of that many threads; otherwise on the global pool.
pub fn render_blocking(
    renderer: &dyn ImageRenderer,
    source: &dyn ImageDataSource,
    bitmap: &BitmapBuffer,
    options: &ImageRenderingOptions,
    planes: &[ImagePlaneOptions],
    stop: &(dyn Stop + Sync),
) -> Result<RenderingResult> {
    check_target_format(renderer, bitmap)?;
    renderer.validate(bitmap.width(), bitmap.height(), options, planes)?;
    stop.check()?;

    let mut pixels = bitmap.lock();
    let ctx = DecodeContext {
        source,
        target: BitmapView::new(bitmap, &mut pixels),
        options,
        planes,
        stop,
    };

    match options.max_parallelism {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|index| format!("render-row-{index}"))
                .build()
                .map_err(|e| RenderError::WorkerFailed(e.to_string()))?;
            pool.install(|| renderer.decode(ctx))
        }
        None => renderer.decode(ctx),
    }
}

fn check_target_format(renderer: &dyn ImageRenderer, bitmap: &BitmapBuffer) -> Result<()> {
    if bitmap.format() != renderer.rendered_format() {
        return Err(RenderError::invalid_argument(format!(
            "{} renders {:?}, destination bitmap is {:?}",
            renderer.format().name,
            renderer.rendered_format(),
            bitmap.format()
        )));
    }
    Ok(())
}
