//! Pixel extraction primitives
//!
//! Bit-depth unpacking, MIPI sub-byte unpacking, level and gain tables and
//! BGRA packing. Every decoder family goes through these.

pub mod bgra;
pub mod bit_unpack;
pub mod gain;
pub mod levels;
pub mod mipi;

pub use bgra::{BgraSample, read_pixel, write_pixel, write_pixel16};
pub use bit_unpack::{ByteOrdering, left_justify, max_sample, pack_nbit, read_native, replicate_bits, unpack_nbit};
pub use gain::{GainSample, GainTable};
pub use levels::{LevelTable, LevelTable8};
pub use mipi::{MipiPacking, unpack_row as unpack_mipi_row};
