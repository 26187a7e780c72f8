//! Raster codec for 64x64 alpha layers
//!
//! A logical alpha layer is always a 64x64 grid of 8-bit intensities. It is
//! stored in one of four physical encodings:
//!
//! | Encoding | Bytes | Selected when |
//! |----------|-------|---------------|
//! | Compressed | variable | layer flag "compressed" set |
//! | High resolution | 4096 | tile "do-not-fix" set and >= 4096 bytes remain |
//! | Low resolution | 2048 | tile "do-not-fix" set, fewer bytes remain |
//! | Legacy low resolution | 2048 | tile "do-not-fix" clear |
//!
//! Low resolution stores two 4-bit cells per byte, low nibble first. The
//! legacy variant additionally duplicates the second-to-last column and row
//! into the last ones after unpacking.
//!
//! # RLE Format
//!
//! ```text
//! control byte:
//!   bit 7    = 1: fill - repeat the next byte (control & 0x7F) times
//!   bit 7    = 0: copy - copy the next (control & 0x7F) bytes
//! runs never cross a 64-cell row boundary on encode
//! ```

mod alpha;
pub mod packing;
pub mod rle;

#[cfg(test)]
mod tests;

pub use alpha::{AlphaEncoding, AlphaMap, decode_raster, encode_raster, fix_legacy_edges};

/// Side length of an alpha grid
pub const ALPHA_SIDE: usize = 64;

/// Cells in an alpha grid (64 x 64)
pub const ALPHA_CELLS: usize = ALPHA_SIDE * ALPHA_SIDE;

/// Bytes of a 4-bit low resolution layer
pub const LOW_RES_BYTES: usize = ALPHA_CELLS / 2;

/// Longest fill or copy run
pub const MAX_RUN: usize = 127;
