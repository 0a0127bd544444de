//! Color filter array layouts.

/// Color a sensor photosite records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorComponent {
    Red,
    Green,
    Blue,
}

impl ColorComponent {
    pub const ALL: [ColorComponent; 3] = [Self::Red, Self::Green, Self::Blue];

    /// Index into R, G, B ordered arrays.
    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }

    /// Channel index inside a BGRA pixel.
    pub const fn bgra_index(self) -> usize {
        match self {
            Self::Blue => 0,
            Self::Green => 1,
            Self::Red => 2,
        }
    }
}

use ColorComponent::{Blue as B, Green as G, Red as R};

/// Repeating tile of color labels. The color at `(x, y)` is
/// `cells[(y mod height) * width + (x mod width)]`.
#[derive(Debug)]
pub struct BayerPattern {
    pub id: usize,
    pub name: &'static str,
    width: usize,
    height: usize,
    cells: &'static [ColorComponent],
    // Power-of-two tiles up to 8 wrap with a mask instead of a division.
    masked: bool,
}

impl BayerPattern {
    const fn new(
        id: usize,
        name: &'static str,
        width: usize,
        height: usize,
        cells: &'static [ColorComponent],
    ) -> Self {
        let masked = matches!(width, 2 | 4 | 8) && matches!(height, 2 | 4 | 8);
        Self { id, name, width, height, cells, masked }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_2x2(&self) -> bool {
        self.width == 2 && self.height == 2
    }

    /// Position of `(x, y)` inside the tile, as a flat cell index.
    #[inline(always)]
    pub fn tile_index(&self, x: usize, y: usize) -> usize {
        let (cx, cy) = if self.masked {
            (x & (self.width - 1), y & (self.height - 1))
        } else {
            (x % self.width, y % self.height)
        };
        cy * self.width + cx
    }

    #[inline(always)]
    pub fn color_at(&self, x: usize, y: usize) -> ColorComponent {
        self.cells[self.tile_index(x, y)]
    }

    /// Number of cells in one tile.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn from_id(id: usize) -> Option<&'static BayerPattern> {
        BAYER_PATTERNS.get(id)
    }

    pub fn from_name(name: &str) -> Option<&'static BayerPattern> {
        BAYER_PATTERNS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

const RGGB: [ColorComponent; 4] = [R, G, G, B];
const GRBG: [ColorComponent; 4] = [G, R, B, G];
const GBRG: [ColorComponent; 4] = [G, B, R, G];
const BGGR: [ColorComponent; 4] = [B, G, G, R];

#[rustfmt::skip]
const QUAD_RGGB: [ColorComponent; 16] = [
    R, R, G, G,
    R, R, G, G,
    G, G, B, B,
    G, G, B, B,
];
#[rustfmt::skip]
const QUAD_GRBG: [ColorComponent; 16] = [
    G, G, R, R,
    G, G, R, R,
    B, B, G, G,
    B, B, G, G,
];
#[rustfmt::skip]
const QUAD_GBRG: [ColorComponent; 16] = [
    G, G, B, B,
    G, G, B, B,
    R, R, G, G,
    R, R, G, G,
];
#[rustfmt::skip]
const QUAD_BGGR: [ColorComponent; 16] = [
    B, B, G, G,
    B, B, G, G,
    G, G, R, R,
    G, G, R, R,
];
#[rustfmt::skip]
const XTRANS: [ColorComponent; 36] = [
    G, G, R, G, G, B,
    G, G, B, G, G, R,
    B, R, G, R, B, G,
    G, G, B, G, G, R,
    G, G, R, G, G, B,
    R, B, G, B, R, G,
];

/// Pattern table indexed by pattern id.
pub static BAYER_PATTERNS: [BayerPattern; 9] = [
    BayerPattern::new(0, "RGGB", 2, 2, &RGGB),
    BayerPattern::new(1, "GRBG", 2, 2, &GRBG),
    BayerPattern::new(2, "GBRG", 2, 2, &GBRG),
    BayerPattern::new(3, "BGGR", 2, 2, &BGGR),
    BayerPattern::new(4, "QUAD_RGGB", 4, 4, &QUAD_RGGB),
    BayerPattern::new(5, "QUAD_GRBG", 4, 4, &QUAD_GRBG),
    BayerPattern::new(6, "QUAD_GBRG", 4, 4, &QUAD_GBRG),
    BayerPattern::new(7, "QUAD_BGGR", 4, 4, &QUAD_BGGR),
    BayerPattern::new(8, "XTRANS", 6, 6, &XTRANS),
];
