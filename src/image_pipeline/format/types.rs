//! Immutable description of decodable pixel layouts.

use crate::image_pipeline::pixel::ByteOrdering;

/// Broad family a format belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatCategory {
    Argb,
    Rgb,
    Yuv,
    Bayer,
    Luminance,
    /// Container codecs (JPEG, PNG, HEIF). Modelled but never rendered here.
    Compressed,
}

/// Alternative name for a format. Historic names that encoded the byte
/// ordering in the name carry that ordering as an override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatAlias {
    pub name: &'static str,
    pub byte_ordering: Option<ByteOrdering>,
}

impl FormatAlias {
    pub const fn synonym(name: &'static str) -> Self {
        Self { name, byte_ordering: None }
    }

    pub const fn ordered(name: &'static str, byte_ordering: ByteOrdering) -> Self {
        Self { name, byte_ordering: Some(byte_ordering) }
    }
}

/// Static shape of one plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePlaneDescriptor {
    /// Bytes between consecutive pixels (0 for bit-packed planes).
    pub pixel_stride: usize,
    /// Default meaningful bits per sample, in `1..=16`.
    pub effective_bits: u8,
}

impl ImagePlaneDescriptor {
    pub const fn new(pixel_stride: usize, effective_bits: u8) -> Self {
        Self { pixel_stride, effective_bits }
    }
}

#[derive(Debug, Clone)]
pub struct ImageFormat {
    pub name: &'static str,
    pub category: FormatCategory,
    pub aliases: Vec<FormatAlias>,
    pub planes: Vec<ImagePlaneDescriptor>,
    pub has_multiple_byte_orderings: bool,
}

impl ImageFormat {
    pub fn new(name: &'static str, category: FormatCategory, planes: Vec<ImagePlaneDescriptor>) -> Self {
        Self {
            name,
            category,
            aliases: Vec::new(),
            planes,
            has_multiple_byte_orderings: false,
        }
    }

    pub fn with_aliases(mut self, aliases: Vec<FormatAlias>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_byte_orderings(mut self) -> Self {
        self.has_multiple_byte_orderings = true;
        self
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Case-insensitive match against the canonical name and every alias.
    /// Returns the alias' ordering override when an alias matched.
    pub fn matches_name(&self, name: &str) -> Option<Option<ByteOrdering>> {
        if self.name.eq_ignore_ascii_case(name) {
            return Some(None);
        }
        self.aliases
            .iter()
            .find(|alias| alias.name.eq_ignore_ascii_case(name))
            .map(|alias| alias.byte_ordering)
    }
}

impl PartialEq for ImageFormat {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ImageFormat {}
