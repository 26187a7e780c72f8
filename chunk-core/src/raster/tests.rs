//! Tests for the raster codec

use super::packing::*;
use super::rle::{compress, decompress};
use super::*;
use crate::error::ErrorKind;

/// Deterministic byte generator (LCG) for grid fixtures
struct Lcg(u32);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0 >> 8
    }

    fn byte(&mut self, modulo: u32) -> u8 {
        (self.next() % modulo) as u8
    }
}

fn noisy_grid(seed: u32, modulo: u32) -> Vec<u8> {
    let mut rng = Lcg(seed);
    (0..ALPHA_CELLS).map(|_| rng.byte(modulo)).collect()
}

/// Grid mixing flat regions, short repeats, and noise
fn blended_grid(seed: u32) -> Vec<u8> {
    let mut rng = Lcg(seed);
    let mut grid = Vec::with_capacity(ALPHA_CELLS);
    while grid.len() < ALPHA_CELLS {
        let len = 1 + (rng.next() % 200) as usize;
        let value = rng.byte(256);
        match rng.next() % 3 {
            0 => grid.extend(std::iter::repeat_n(value, len)),
            1 => grid.extend((0..len).map(|_| rng.byte(256))),
            _ => grid.extend((0..len).map(|i| if i % 4 < 2 { value } else { !value })),
        }
    }
    grid.truncate(ALPHA_CELLS);
    grid
}

#[test]
fn test_uniform_rows_encode_as_row_fills() {
    let grid = vec![0x05u8; ALPHA_CELLS];
    let encoded = compress(&grid);
    assert_eq!(encoded.len(), 128);
    for run in encoded.chunks(2) {
        assert_eq!(run, [0xC0, 0x05]);
    }
}

#[test]
fn test_rle_roundtrip_exact() {
    for seed in 0..8 {
        let grid = blended_grid(seed);
        assert_eq!(decompress(&compress(&grid)), grid, "seed {}", seed);
    }
    for modulo in [1, 2, 3, 256] {
        let grid = noisy_grid(modulo * 31, modulo);
        assert_eq!(decompress(&compress(&grid)), grid, "modulo {}", modulo);
    }
}

#[test]
fn test_runs_never_cross_rows() {
    // Row 0 ends in ten 7s and row 1 starts with ten 7s
    let mut grid = noisy_grid(3, 5);
    for v in &mut grid[54..74] {
        *v = 7;
    }
    let encoded = compress(&grid);

    let mut pos = 0;
    let mut i = 0;
    while i < encoded.len() {
        let control = encoded[i];
        let count = (control & 0x7F) as usize;
        assert!(count >= 1);
        assert_eq!(
            pos / ALPHA_SIDE,
            (pos + count - 1) / ALPHA_SIDE,
            "run at cell {} crosses a row",
            pos
        );
        pos += count;
        i += if control & 0x80 != 0 { 2 } else { 1 + count };
    }
    assert_eq!(pos, ALPHA_CELLS);
}

#[test]
fn test_fill_of_two_and_copy_stops_before_triple() {
    let mut grid = vec![0u8; ALPHA_CELLS];
    grid[..ALPHA_SIDE].copy_from_slice(&[
        1, 1, 2, 3, 4, 4, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22,
        23, 24, 25, 26, 27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45,
        46, 47, 48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61,
    ]);
    let encoded = compress(&grid);
    // fill(2 x 1), copy(2, 3), fill(3 x 4), copy of the remaining 57 literals
    assert_eq!(&encoded[..2], &[0x82, 1]);
    assert_eq!(&encoded[2..5], &[2, 2, 3]);
    assert_eq!(&encoded[5..7], &[0x83, 4]);
    assert_eq!(encoded[7], 57);
    assert_eq!(&encoded[8..8 + 57], &grid[7..64]);
}

#[test]
fn test_decompress_tolerates_truncation() {
    // Copy run claiming 10 bytes with only 3 present
    let data = [0x0A, 9, 8, 7];
    let out = decompress(&data);
    assert_eq!(out.len(), ALPHA_CELLS);
    assert_eq!(&out[..3], &[9, 8, 7]);
    assert!(out[3..].iter().all(|&v| v == 0));

    // Fill control with no value byte
    let out = decompress(&[0x85]);
    assert!(out.iter().all(|&v| v == 0));
}

#[test]
fn test_decompress_stops_at_grid_size() {
    let mut data = Vec::new();
    for _ in 0..40 {
        data.extend_from_slice(&[0xFF, 3]);
    }
    let out = decompress(&data);
    assert_eq!(out.len(), ALPHA_CELLS);
    assert!(out.iter().all(|&v| v == 3));
}

#[test]
fn test_bit_packing_roundtrip() {
    let mut rng = Lcg(99);
    for _ in 0..16 {
        let quality: Vec<u8> = (0..32).map(|_| rng.byte(4)).collect();
        assert_eq!(unpack_2bit(&pack_2bit(&quality), 32), quality);

        let shadow: Vec<u8> = (0..64).map(|_| rng.byte(2)).collect();
        assert_eq!(unpack_1bit(&pack_1bit(&shadow), 64), shadow);
    }
}

#[test]
fn test_bit_packing_is_lsb_first() {
    assert_eq!(pack_2bit(&[1, 2, 3, 0]), vec![0b00_11_10_01]);
    assert_eq!(pack_1bit(&[1, 0, 0, 0, 0, 0, 0, 1]), vec![0b1000_0001]);
    assert_eq!(unpack_2bit(&[0b11_00_01_10], 4), vec![2, 1, 0, 3]);
}

#[test]
fn test_nibbles_scale_to_full_range() {
    // 0x0F low nibble first, then 0x00
    let unpacked = unpack_nibbles(&[0x0F, 0x8A], 4);
    assert_eq!(unpacked, vec![255, 0, 170, 136]);
    assert_eq!(pack_nibbles(&unpacked), vec![0x0F, 0x8A]);
}

#[test]
fn test_legacy_fixup() {
    let mut values: Vec<u8> = (0..ALPHA_CELLS).map(|i| (i % 251) as u8).collect();
    let original = values.clone();
    fix_legacy_edges(&mut values);
    for row in 0..ALPHA_SIDE - 1 {
        let base = row * ALPHA_SIDE;
        assert_eq!(values[base + 63], original[base + 62]);
        assert_eq!(values[base..base + 63], original[base..base + 63]);
    }
    assert_eq!(values[63 * 64..], values[62 * 64..63 * 64]);
}

fn low_res_blob(value_of: impl Fn(usize) -> u8) -> Vec<u8> {
    let cells: Vec<u8> = (0..ALPHA_CELLS).map(value_of).collect();
    pack_nibbles(&cells)
}

#[test]
fn test_variant_selection() {
    let grid = noisy_grid(5, 256);

    let compressed = compress(&grid);
    let map = decode_raster(&compressed, 0, true, false).unwrap();
    assert_eq!(map.encoding, AlphaEncoding::Compressed);
    assert_eq!(map.values, grid);

    let map = decode_raster(&grid, 0, false, true).unwrap();
    assert_eq!(map.encoding, AlphaEncoding::HighRes);
    assert_eq!(map.values, grid);

    let blob = low_res_blob(|i| ((i % 16) * 17) as u8);
    let map = decode_raster(&blob, 0, false, true).unwrap();
    assert_eq!(map.encoding, AlphaEncoding::LowRes);
    assert_eq!(map.values[..16], (0..16).map(|n| n * 17).collect::<Vec<u8>>()[..]);

    let map = decode_raster(&blob, 0, false, false).unwrap();
    assert_eq!(map.encoding, AlphaEncoding::LegacyLowRes);
    assert_eq!(map.values[63], map.values[62]);
}

#[test]
fn test_variant_roundtrip() {
    let steps: Vec<u8> = (0..ALPHA_CELLS).map(|i| (((i / 7) % 16) * 17) as u8).collect();
    let mut legacy = steps.clone();
    fix_legacy_edges(&mut legacy);

    for (encoding, values, do_not_fix) in [
        (AlphaEncoding::Compressed, blended_grid(11), false),
        (AlphaEncoding::HighRes, noisy_grid(12, 256), true),
        (AlphaEncoding::LowRes, steps, true),
        (AlphaEncoding::LegacyLowRes, legacy, false),
    ] {
        let blob = encode_raster(&values, encoding).unwrap();
        let map = decode_raster(&blob, 0, encoding == AlphaEncoding::Compressed, do_not_fix)
            .unwrap();
        assert_eq!(map.encoding, encoding);
        assert_eq!(map.values, values, "{:?}", encoding);
    }
}

#[test]
fn test_offset_outside_blob() {
    let err = decode_raster(&[0u8; 16], 17, true, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Reference);

    let err = decode_raster(&[0u8; 100], 0, false, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_encode_rejects_wrong_size() {
    let err = encode_raster(&[0u8; 10], AlphaEncoding::HighRes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
