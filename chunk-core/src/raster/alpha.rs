//! Storage variant selection for alpha layers

use serde::{Deserialize, Serialize};

use super::packing::{pack_nibbles, unpack_nibbles};
use super::{ALPHA_CELLS, ALPHA_SIDE, LOW_RES_BYTES, rle};
use crate::error::{Error, Result};

/// Physical encoding of an alpha layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphaEncoding {
    /// Run-length compressed
    Compressed,
    /// One byte per cell
    HighRes,
    /// Two 4-bit cells per byte
    LowRes,
    /// Two 4-bit cells per byte with the last row and column duplicated
    LegacyLowRes,
}

impl AlphaEncoding {
    /// Whether the enclosing tile must have its do-not-fix flag set for this
    /// encoding to be selected on decode. `None` means either is fine.
    pub fn requires_do_not_fix(self) -> Option<bool> {
        match self {
            AlphaEncoding::Compressed => None,
            AlphaEncoding::HighRes | AlphaEncoding::LowRes => Some(true),
            AlphaEncoding::LegacyLowRes => Some(false),
        }
    }
}

/// Decoded alpha layer: 4096 row-major intensities plus how they were stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphaMap {
    pub encoding: AlphaEncoding,
    pub values: Vec<u8>,
}

/// Decode the layer stored at `offset` in a tile's raster blob.
pub fn decode_raster(
    blob: &[u8],
    offset: usize,
    compressed: bool,
    do_not_fix: bool,
) -> Result<AlphaMap> {
    if offset > blob.len() {
        return Err(Error::Reference {
            context: "alpha layer",
            offset,
            len: blob.len(),
        });
    }
    let data = &blob[offset..];

    if compressed {
        return Ok(AlphaMap {
            encoding: AlphaEncoding::Compressed,
            values: rle::decompress(data),
        });
    }

    if do_not_fix && data.len() >= ALPHA_CELLS {
        return Ok(AlphaMap {
            encoding: AlphaEncoding::HighRes,
            values: data[..ALPHA_CELLS].to_vec(),
        });
    }

    if data.len() < LOW_RES_BYTES {
        return Err(Error::UnexpectedEof {
            offset,
            need: LOW_RES_BYTES,
            have: data.len(),
        });
    }
    let mut values = unpack_nibbles(&data[..LOW_RES_BYTES], ALPHA_CELLS);
    if do_not_fix {
        return Ok(AlphaMap {
            encoding: AlphaEncoding::LowRes,
            values,
        });
    }
    fix_legacy_edges(&mut values);
    Ok(AlphaMap {
        encoding: AlphaEncoding::LegacyLowRes,
        values,
    })
}

/// Encode a layer in the given storage variant.
pub fn encode_raster(values: &[u8], encoding: AlphaEncoding) -> Result<Vec<u8>> {
    if values.len() != ALPHA_CELLS {
        return Err(Error::validation(
            "alpha layer",
            format!("expected {} cells, got {}", ALPHA_CELLS, values.len()),
        ));
    }
    Ok(match encoding {
        AlphaEncoding::Compressed => rle::compress(values),
        AlphaEncoding::HighRes => values.to_vec(),
        AlphaEncoding::LowRes | AlphaEncoding::LegacyLowRes => pack_nibbles(values),
    })
}

/// Copy column 62 into column 63 on every row, then row 62 into row 63.
///
/// Only defined for 64x64 grids; other sizes are left untouched.
pub fn fix_legacy_edges(values: &mut [u8]) {
    if values.len() != ALPHA_CELLS {
        return;
    }
    for row in values.chunks_exact_mut(ALPHA_SIDE) {
        row[ALPHA_SIDE - 1] = row[ALPHA_SIDE - 2];
    }
    let last = (ALPHA_SIDE - 1) * ALPHA_SIDE;
    let prev = (ALPHA_SIDE - 2) * ALPHA_SIDE;
    values.copy_within(prev..prev + ALPHA_SIDE, last);
}
