use std::sync::Arc;

use rawframe_rs::image_pipeline::{
    BitmapBuffer, BitmapFormat, CancellationToken, FormatRegistry, ImageRenderingOptions, MemoryDataSource,
    RenderError, SharedBitmap, SharedDataSource, render,
};

fn bayer8(width: usize, height: usize) -> (SharedDataSource, SharedBitmap) {
    let source = MemoryDataSource::shared(vec![90u8; width * height]);
    let bitmap = BitmapBuffer::new(width, height, BitmapFormat::Bgra32).unwrap().into_shared();
    (source, bitmap)
}

#[test]
fn worker_releases_shares_after_completion() {
    let renderer = FormatRegistry::global().find_by_name("BAYER_8").unwrap().renderer;
    let (source, bitmap) = bayer8(16, 16);
    let planes = renderer.create_default_plane_options(16, 16);

    let task = render(renderer, &source, &bitmap, ImageRenderingOptions::default(), planes, CancellationToken::new())
        .unwrap();
    let result = task.wait().unwrap();

    assert_eq!(result.rows_rendered, 16);
    assert_eq!(Arc::strong_count(&source), 1);
    assert_eq!(Arc::strong_count(&bitmap), 1);
}

#[test]
fn caller_may_drop_its_shares_early() {
    let renderer = FormatRegistry::global().find_by_name("NV12").unwrap().renderer;
    let source = MemoryDataSource::shared(vec![128u8; 32 * 32 * 3 / 2]);
    let bitmap = BitmapBuffer::new(32, 32, BitmapFormat::Bgra32).unwrap().into_shared();
    let planes = renderer.create_default_plane_options(32, 32);

    let task = render(renderer, &source, &bitmap, ImageRenderingOptions::default(), planes, CancellationToken::new())
        .unwrap();
    let weak = Arc::downgrade(&bitmap);
    drop(source);
    drop(bitmap);

    assert_eq!(task.wait().unwrap().rows_rendered, 32);
    assert!(weak.upgrade().is_none());
}

#[test]
fn cancelled_before_start_reports_cancellation() {
    let renderer = FormatRegistry::global().find_by_name("BAYER_8").unwrap().renderer;
    let (source, bitmap) = bayer8(8, 8);
    let planes = renderer.create_default_plane_options(8, 8);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let task = render(renderer, &source, &bitmap, ImageRenderingOptions::default(), planes, cancel).unwrap();
    let err = task.wait().unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(Arc::strong_count(&source), 1);
    assert!(bitmap.lock().iter().all(|&b| b == 0));
}

#[test]
fn mismatched_bitmap_format_fails_synchronously() {
    let renderer = FormatRegistry::global().find_by_name("BAYER_16").unwrap().renderer;
    let (source, bitmap) = bayer8(8, 8);
    let planes = renderer.create_default_plane_options(8, 8);

    let err = render(renderer, &source, &bitmap, ImageRenderingOptions::default(), planes, CancellationToken::new())
        .err()
        .unwrap();

    assert!(matches!(err, RenderError::InvalidArgument(_)));
    assert_eq!(Arc::strong_count(&source), 1);
}

#[test]
fn invalid_configuration_surfaces_from_wait() {
    let renderer = FormatRegistry::global().find_by_name("BAYER_8").unwrap().renderer;
    let (source, bitmap) = bayer8(8, 8);
    let options = ImageRenderingOptions::builder().bayer_pattern(42).build();
    let planes = renderer.create_default_plane_options(8, 8);

    let task = render(renderer, &source, &bitmap, options, planes, CancellationToken::new()).unwrap();

    assert!(matches!(task.wait(), Err(RenderError::InvalidArgument(_))));
    assert!(bitmap.lock().iter().all(|&b| b == 0));
}
