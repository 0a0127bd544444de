//! Format decoders, one per layout family.

pub mod bayer;
pub mod interleaved;
pub mod packed_word;
pub mod renderer;
pub(crate) mod sample;
pub mod yuv;
pub mod yuv_convert;

use std::sync::Arc;

pub use bayer::{BayerLayout, BayerRenderer};
pub use interleaved::{ComponentSelector, InterleavedRenderer, SampleKind};
pub use packed_word::{PackedWordRenderer, WordLayout};
pub use renderer::{DecodeContext, ImageRenderer, PlaneGeometry, RenderingResult};
pub use yuv::{PackedOrder, Subsampling, YuvLayout, YuvRenderer};
pub use yuv_convert::{StandardYuvConverter, YuvMatrix, YuvRange, YuvToBgraConverter};

/// Every decoder shipped with the crate.
pub fn builtin_renderers() -> Vec<Arc<dyn ImageRenderer>> {
    let mut all = interleaved::builtin();
    all.extend(packed_word::builtin());
    all.extend(yuv::builtin());
    all.extend(bayer::builtin());
    all
}
