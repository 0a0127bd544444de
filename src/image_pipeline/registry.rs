//! Immutable table of every decoder, built once on first use.

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::image_pipeline::decoders::{ImageRenderer, builtin_renderers};
use crate::image_pipeline::format::ImageFormat;
use crate::image_pipeline::pixel::ByteOrdering;

/// A name lookup hit. Legacy split-ordering aliases carry the byte ordering
/// they imply.
#[derive(Clone)]
pub struct RendererMatch {
    pub renderer: Arc<dyn ImageRenderer>,
    pub byte_ordering: Option<ByteOrdering>,
}

pub struct FormatRegistry {
    renderers: Vec<Arc<dyn ImageRenderer>>,
}

static GLOBAL: OnceLock<FormatRegistry> = OnceLock::new();

impl FormatRegistry {
    /// Shared registry of the built-in decoders.
    pub fn global() -> &'static FormatRegistry {
        GLOBAL.get_or_init(Self::with_builtin_formats)
    }

    pub fn with_builtin_formats() -> Self {
        let renderers = builtin_renderers();
        debug!(count = renderers.len(), "format registry built");
        Self { renderers }
    }

    /// Decoder for exactly this format, if registered.
    pub fn find(&self, format: &ImageFormat) -> Option<Arc<dyn ImageRenderer>> {
        self.renderers.iter().find(|r| r.format() == format).cloned()
    }

    /// Decoder by canonical or alias name, case-insensitive.
    pub fn find_by_name(&self, name: &str) -> Option<RendererMatch> {
        self.renderers.iter().find_map(|renderer| {
            renderer.format().matches_name(name).map(|byte_ordering| RendererMatch {
                renderer: Arc::clone(renderer),
                byte_ordering,
            })
        })
    }

    pub fn renderers(&self) -> &[Arc<dyn ImageRenderer>] {
        &self.renderers
    }

    pub fn formats(&self) -> impl Iterator<Item = &ImageFormat> {
        self.renderers.iter().map(|r| r.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_and_aliases_are_unique() {
        let mut seen = HashSet::new();
        for format in FormatRegistry::global().formats() {
            assert!(seen.insert(format.name.to_ascii_uppercase()), "duplicate {}", format.name);
            for alias in &format.aliases {
                assert!(seen.insert(alias.name.to_ascii_uppercase()), "duplicate alias {}", alias.name);
            }
        }
    }

    #[test]
    fn lookup_by_alias_carries_ordering() {
        let registry = FormatRegistry::global();
        let hit = registry.find_by_name("bayer_16_be").unwrap();
        assert_eq!(hit.renderer.format().name, "BAYER_16");
        assert_eq!(hit.byte_ordering, Some(ByteOrdering::BigEndian));

        let hit = registry.find_by_name("I420").unwrap();
        assert_eq!(hit.renderer.format().name, "YUV420P");
        assert_eq!(hit.byte_ordering, None);

        assert!(registry.find_by_name("JPEG").is_none());
        assert!(registry.find_by_name("NV1").is_none());
    }

    #[test]
    fn lookup_by_format_object() {
        let registry = FormatRegistry::global();
        let nv12 = registry.find_by_name("NV12").unwrap().renderer;
        let again = registry.find(nv12.format()).unwrap();
        assert!(Arc::ptr_eq(&nv12, &again));
    }
}
