//! Y'CbCr to BGR conversion.
//!
//! Converters take 16-bit left-justified samples (neutral chroma at 32768)
//! and return 16-bit B, G, R. Callers narrow to 8 bits by keeping the high
//! byte.

use std::fmt;

/// Pluggable colour conversion used by every YUV decoder.
pub trait YuvToBgraConverter: Send + Sync {
    fn name(&self) -> &str;

    /// Convert one sample triple to `[b, g, r]`.
    fn convert(&self, y: u16, u: u16, v: u16) -> [u16; 3];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YuvMatrix {
    #[default]
    Bt601,
    Bt709,
    Bt2020,
}

impl YuvMatrix {
    /// `(Kr, Kb)` luma coefficients.
    const fn coefficients(self) -> (f32, f32) {
        match self {
            Self::Bt601 => (0.299, 0.114),
            Self::Bt709 => (0.2126, 0.0722),
            Self::Bt2020 => (0.2627, 0.0593),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bt601" | "601" => Some(Self::Bt601),
            "bt709" | "709" => Some(Self::Bt709),
            "bt2020" | "2020" => Some(Self::Bt2020),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YuvRange {
    #[default]
    Full,
    /// Studio swing: luma 16..235, chroma 16..240 at 8 bits.
    Limited,
}

/// Matrix-and-range conversion covering the common broadcast standards.
#[derive(Clone, Copy, PartialEq)]
pub struct StandardYuvConverter {
    matrix: YuvMatrix,
    range: YuvRange,
    name: &'static str,
    // R = Y + cr_r * V, G = Y - cb_g * U - cr_g * V, B = Y + cb_b * U
    cr_r: f32,
    cb_g: f32,
    cr_g: f32,
    cb_b: f32,
}

impl StandardYuvConverter {
    pub fn new(matrix: YuvMatrix, range: YuvRange) -> Self {
        let (kr, kb) = matrix.coefficients();
        let kg = 1.0 - kr - kb;
        let name = match (matrix, range) {
            (YuvMatrix::Bt601, YuvRange::Full) => "BT.601 full",
            (YuvMatrix::Bt601, YuvRange::Limited) => "BT.601 limited",
            (YuvMatrix::Bt709, YuvRange::Full) => "BT.709 full",
            (YuvMatrix::Bt709, YuvRange::Limited) => "BT.709 limited",
            (YuvMatrix::Bt2020, YuvRange::Full) => "BT.2020 full",
            (YuvMatrix::Bt2020, YuvRange::Limited) => "BT.2020 limited",
        };
        Self {
            matrix,
            range,
            name,
            cr_r: 2.0 * (1.0 - kr),
            cb_g: 2.0 * kb * (1.0 - kb) / kg,
            cr_g: 2.0 * kr * (1.0 - kr) / kg,
            cb_b: 2.0 * (1.0 - kb),
        }
    }

    pub fn matrix(&self) -> YuvMatrix {
        self.matrix
    }

    pub fn range(&self) -> YuvRange {
        self.range
    }
}

impl Default for StandardYuvConverter {
    fn default() -> Self {
        Self::new(YuvMatrix::Bt601, YuvRange::Full)
    }
}

impl fmt::Debug for StandardYuvConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardYuvConverter")
            .field("matrix", &self.matrix)
            .field("range", &self.range)
            .finish()
    }
}

#[inline(always)]
fn to_u16(v: f32) -> u16 {
    v.round().clamp(0.0, 65535.0) as u16
}

impl YuvToBgraConverter for StandardYuvConverter {
    fn name(&self) -> &str {
        self.name
    }

    #[inline]
    fn convert(&self, y: u16, u: u16, v: u16) -> [u16; 3] {
        let (y, cb, cr) = match self.range {
            YuvRange::Full => (y as f32, u as f32 - 32768.0, v as f32 - 32768.0),
            YuvRange::Limited => (
                (y as f32 - 4096.0) * (255.0 / 219.0),
                (u as f32 - 32768.0) * (255.0 / 224.0),
                (v as f32 - 32768.0) * (255.0 / 224.0),
            ),
        };
        let r = y + self.cr_r * cr;
        let g = y - self.cb_g * cb - self.cr_g * cr;
        let b = y + self.cb_b * cb;
        [to_u16(b), to_u16(g), to_u16(r)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_chroma_is_grey() {
        for matrix in [YuvMatrix::Bt601, YuvMatrix::Bt709, YuvMatrix::Bt2020] {
            let conv = StandardYuvConverter::new(matrix, YuvRange::Full);
            for y in [0u16, 0x1234, 0x8000, 0xFFFF] {
                assert_eq!(conv.convert(y, 0x8000, 0x8000), [y, y, y], "{}", conv.name());
            }
        }
    }

    #[test]
    fn limited_range_endpoints() {
        let conv = StandardYuvConverter::new(YuvMatrix::Bt709, YuvRange::Limited);
        assert_eq!(conv.convert(16 << 8, 0x8000, 0x8000), [0, 0, 0]);
        let white = conv.convert(235 << 8, 0x8000, 0x8000);
        assert!(white.iter().all(|&c| c >> 8 == 255), "{white:?}");
    }

    #[test]
    fn saturated_red() {
        // BT.601 full-range pure red: Y=76, Cb=85, Cr=255.
        let conv = StandardYuvConverter::default();
        let [b, g, r] = conv.convert(76 << 8, 85 << 8, 255 << 8);
        assert!(r >> 8 >= 253, "r={r:#x}");
        assert!(g >> 8 <= 2, "g={g:#x}");
        assert!(b >> 8 <= 2, "b={b:#x}");
    }

    #[test]
    fn matrix_names() {
        assert_eq!(YuvMatrix::from_name("BT709"), Some(YuvMatrix::Bt709));
        assert_eq!(YuvMatrix::from_name("xyz"), None);
    }
}
