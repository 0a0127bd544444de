use super::*;
use crate::image_pipeline::bitmap::{BitmapBuffer, BitmapView};
use crate::image_pipeline::format::ColorComponent;
use crate::image_pipeline::pixel::{left_justify, pack_nbit};
use crate::image_pipeline::source::MemoryDataSource;
use enough::Unstoppable;

fn render(
    renderer: &BayerRenderer,
    width: usize,
    height: usize,
    options: &ImageRenderingOptions,
    planes: &[ImagePlaneOptions],
    bytes: Vec<u8>,
) -> (BitmapBuffer, RenderingResult) {
    renderer.validate(width, height, options, planes).unwrap();
    let bitmap = BitmapBuffer::new(width, height, renderer.rendered_format()).unwrap();
    let source = MemoryDataSource::new(bytes);
    let result = {
        let mut guard = bitmap.lock();
        renderer
            .decode(DecodeContext {
                source: &source,
                target: BitmapView::new(&bitmap, &mut guard),
                options,
                planes,
                stop: &Unstoppable,
            })
            .unwrap()
    };
    (bitmap, result)
}

fn no_demosaic() -> ImageRenderingOptions {
    ImageRenderingOptions::builder().demosaicing(false).build()
}

fn raw_4x4(x: usize, y: usize) -> u8 {
    (y * 4 + x) as u8 * 13 + 7
}

#[test]
fn rggb_8bit_without_demosaic_sets_one_channel() {
    let renderer = BayerRenderer::new("T", BayerLayout::Bits8, Vec::new());
    let bytes: Vec<u8> = (0..16).map(|i| raw_4x4(i % 4, i / 4)).collect();
    let options = no_demosaic();
    let planes = renderer.create_default_plane_options(4, 4);
    let (bitmap, result) = render(&renderer, 4, 4, &options, &planes, bytes);

    let pattern = BayerPattern::from_id(0).unwrap();
    for y in 0..4 {
        for x in 0..4 {
            let px = bitmap.pixel_bgra32(x, y);
            let own = pattern.color_at(x, y).bgra_index();
            for channel in 0..3 {
                let expected = if channel == own { raw_4x4(x, y) } else { 0 };
                assert_eq!(px[channel], expected, "({x}, {y}) channel {channel}");
            }
            assert_eq!(px[3], 255);
        }
    }
    assert_eq!(result.rows_rendered, 4);

    let stats = result.brightness.unwrap();
    let reds = [raw_4x4(0, 0), raw_4x4(2, 0), raw_4x4(0, 2), raw_4x4(2, 2)];
    let mean = reds.iter().map(|&v| v as f64).sum::<f64>() / 4.0;
    approx::assert_relative_eq!(stats.mean_of(ColorComponent::Red), mean);
}

#[test]
fn rggb_8bit_demosaic_averages_centre_neighbours() {
    let renderer = BayerRenderer::new("T", BayerLayout::Bits8, Vec::new());
    let bytes: Vec<u8> = (0..16).map(|i| raw_4x4(i % 4, i / 4)).collect();
    let options = ImageRenderingOptions::default();
    let planes = renderer.create_default_plane_options(4, 4);
    let (bitmap, _) = render(&renderer, 4, 4, &options, &planes, bytes);

    // (1, 2) is green on a red row: red left/right, blue above/below.
    let [b, g, r, _] = bitmap.pixel_bgra32(1, 2);
    assert_eq!(g, raw_4x4(1, 2));
    assert_eq!(r as u32, (raw_4x4(0, 2) as u32 + raw_4x4(2, 2) as u32) / 2);
    assert_eq!(b as u32, (raw_4x4(1, 1) as u32 + raw_4x4(1, 3) as u32) / 2);
}

#[test]
fn levels_clip_to_zero_and_full_scale() {
    let renderer = BayerRenderer::new("T", BayerLayout::Bits16, Vec::new());
    let planes = vec![ImagePlaneOptions::new(2, 8, 12).with_levels(256, 3840)];
    let options = no_demosaic();
    let values = [0u16, 256, 3840, 4095];
    let bytes: Vec<u8> = values.iter().flat_map(|&v| pack_nbit(v, 12, ByteOrdering::LittleEndian)).collect();
    let (bitmap, _) = render(&renderer, 4, 1, &options, &planes, bytes);

    let full = left_justify(4095, 12);
    // RGGB row 0 alternates red and green.
    assert_eq!(bitmap.pixel_bgra64(0, 0)[2], 0);
    assert_eq!(bitmap.pixel_bgra64(1, 0)[1], 0);
    assert_eq!(bitmap.pixel_bgra64(2, 0)[2], full);
    assert_eq!(bitmap.pixel_bgra64(3, 0)[1], full);
}

#[test]
fn mipi_frames_decode_to_their_samples() {
    let width = 6;
    for packing in [MipiPacking::Raw10, MipiPacking::Raw12, MipiPacking::Raw14] {
        for order in [ByteOrdering::LittleEndian, ByteOrdering::BigEndian] {
            let renderer = BayerRenderer::new("T", BayerLayout::Mipi(packing), Vec::new());
            let max = (1u32 << packing.bits()) - 1;
            let rows: Vec<Vec<u16>> = (0..2)
                .map(|y| (0..width).map(|x| ((x * 97 + y * 31) as u32 * 41 % (max + 1)) as u16).collect())
                .collect();
            let bytes: Vec<u8> = rows.iter().flat_map(|row| packing.pack_row(row, order)).collect();
            let options = ImageRenderingOptions::builder().demosaicing(false).byte_ordering(order).build();
            let planes = renderer.create_default_plane_options(width, 2);
            let (bitmap, _) = render(&renderer, width, 2, &options, &planes, bytes);

            let pattern = BayerPattern::from_id(0).unwrap();
            for (y, row) in rows.iter().enumerate() {
                for (x, &v) in row.iter().enumerate() {
                    let px = bitmap.pixel_bgra64(x, y);
                    assert_eq!(
                        px[pattern.color_at(x, y).bgra_index()],
                        left_justify(v, packing.bits()),
                        "{packing:?} {order:?} ({x}, {y})"
                    );
                }
            }
        }
    }
}

#[test]
fn red_gain_saturates() {
    let renderer = BayerRenderer::new("T", BayerLayout::Bits8, Vec::new());
    let options = ImageRenderingOptions::builder().demosaicing(false).gains(2.0, 1.0, 1.0).build();
    let planes = renderer.create_default_plane_options(2, 2);
    // R G / G B
    let (bitmap, _) = render(&renderer, 2, 2, &options, &planes, vec![100, 50, 60, 70]);
    assert_eq!(bitmap.pixel_bgra32(0, 0)[2], 200);
    assert_eq!(bitmap.pixel_bgra32(1, 0)[1], 50);

    let (bitmap, _) = render(&renderer, 2, 2, &options, &planes, vec![200, 50, 60, 70]);
    assert_eq!(bitmap.pixel_bgra32(0, 0)[2], 255);
}

#[test]
fn truncated_source_renders_partial_frame() {
    let renderer = BayerRenderer::new("T", BayerLayout::Bits8, Vec::new());
    let options = ImageRenderingOptions::default();
    let planes = renderer.create_default_plane_options(4, 4);
    let (bitmap, result) = render(&renderer, 4, 4, &options, &planes, vec![90; 6]);
    assert_eq!(result.rows_rendered, 2);
    assert_eq!(bitmap.pixel_bgra32(1, 1)[3], 255);
    assert_eq!(bitmap.pixel_bgra32(2, 1), [0, 0, 0, 0]);
    assert_eq!(bitmap.pixel_bgra32(0, 3), [0, 0, 0, 0]);
}

#[test]
fn pixel_count_for_packed_rows() {
    let renderer = BayerRenderer::new("T", BayerLayout::Mipi(MipiPacking::Raw12), Vec::new());
    assert_eq!(renderer.evaluate_pixel_count(30), 20);
    let planes = renderer.create_default_plane_options(5, 2);
    assert_eq!(planes[0].row_stride, 9);
    assert_eq!(renderer.evaluate_source_data_size(5, 2, &ImageRenderingOptions::default(), &planes), 18);
}
