//! Packed cell grids (LSB-first)
//!
//! - 2 bits per cell, four cells per byte (low quality texturing map)
//! - 1 bit per cell, eight cells per byte (shadow map)
//! - 4 bits per cell, two cells per byte (low resolution alpha)
//!
//! Cell `i` of a byte occupies the lowest bits first.

pub fn pack_2bit(cells: &[u8]) -> Vec<u8> {
    pack_bits(cells, 2)
}

pub fn unpack_2bit(bytes: &[u8], cells: usize) -> Vec<u8> {
    unpack_bits(bytes, cells, 2)
}

pub fn pack_1bit(cells: &[u8]) -> Vec<u8> {
    pack_bits(cells, 1)
}

pub fn unpack_1bit(bytes: &[u8], cells: usize) -> Vec<u8> {
    unpack_bits(bytes, cells, 1)
}

/// Pack 8-bit intensities into 4-bit cells, rounding to the nearest step.
pub fn pack_nibbles(values: &[u8]) -> Vec<u8> {
    let cells: Vec<u8> = values
        .iter()
        .map(|&v| ((v as u32 * 15 + 127) / 255) as u8)
        .collect();
    pack_bits(&cells, 4)
}

/// Unpack 4-bit cells and scale them to 8-bit intensities (`n * 255 / 15`).
pub fn unpack_nibbles(bytes: &[u8], cells: usize) -> Vec<u8> {
    unpack_bits(bytes, cells, 4)
        .into_iter()
        .map(|n| (n as u32 * 255 / 15) as u8)
        .collect()
}

fn pack_bits(cells: &[u8], bits: usize) -> Vec<u8> {
    let per_byte = 8 / bits;
    let mask = (1u8 << bits) - 1;
    let mut out = vec![0u8; cells.len().div_ceil(per_byte)];
    for (i, &cell) in cells.iter().enumerate() {
        out[i / per_byte] |= (cell & mask) << ((i % per_byte) * bits);
    }
    out
}

fn unpack_bits(bytes: &[u8], cells: usize, bits: usize) -> Vec<u8> {
    let per_byte = 8 / bits;
    let mask = (1u8 << bits) - 1;
    (0..cells)
        .map(|i| {
            let byte = bytes.get(i / per_byte).copied().unwrap_or(0);
            (byte >> ((i % per_byte) * bits)) & mask
        })
        .collect()
}
