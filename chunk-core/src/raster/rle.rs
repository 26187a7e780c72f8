//! Row-bounded run-length compression

use super::{ALPHA_CELLS, ALPHA_SIDE, MAX_RUN};

const FILL: u8 = 0x80;
const COUNT_MASK: u8 = 0x7F;

/// Compress a grid of 64-wide rows.
///
/// At each position a fill run of two or more equal bytes is preferred;
/// otherwise literal bytes are collected until the row ends, 127 bytes are
/// gathered, or three equal bytes lie ahead.
pub fn compress(grid: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(grid.len() / 2);
    let mut pos = 0;

    while pos < grid.len() {
        let row_end = ((pos / ALPHA_SIDE + 1) * ALPHA_SIDE).min(grid.len());
        let value = grid[pos];

        let mut run = 1;
        while pos + run < row_end && run < MAX_RUN && grid[pos + run] == value {
            run += 1;
        }
        if run >= 2 {
            out.push(FILL | run as u8);
            out.push(value);
            pos += run;
            continue;
        }

        let start = pos;
        while pos < row_end && pos - start < MAX_RUN && !fill_ahead(grid, pos, row_end) {
            pos += 1;
        }
        let count = pos - start;
        if count > 0 {
            out.push(count as u8);
            out.extend_from_slice(&grid[start..pos]);
        } else {
            out.push(1);
            out.push(grid[pos]);
            pos += 1;
        }
    }

    out
}

/// Three equal bytes starting at `pos` within the row.
fn fill_ahead(grid: &[u8], pos: usize, row_end: usize) -> bool {
    pos + 2 < row_end && grid[pos] == grid[pos + 1] && grid[pos + 1] == grid[pos + 2]
}

/// Decompress into a 4096-cell grid.
///
/// Stops after 4096 cells or at the end of input. Truncated runs leave the
/// remainder zero-filled.
pub fn decompress(data: &[u8]) -> Vec<u8> {
    decompress_to(data, ALPHA_CELLS)
}

/// Decompress into exactly `cells` bytes.
pub fn decompress_to(data: &[u8], cells: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(cells);
    let mut i = 0;

    while out.len() < cells && i < data.len() {
        let control = data[i];
        i += 1;
        let count = (control & COUNT_MASK) as usize;

        if control & FILL != 0 {
            let Some(&value) = data.get(i) else {
                break;
            };
            i += 1;
            let n = count.min(cells - out.len());
            out.resize(out.len() + n, value);
        } else {
            let available = data.len() - i;
            let n = count.min(cells - out.len()).min(available);
            out.extend_from_slice(&data[i..i + n]);
            i += count.min(available);
        }
    }

    out.resize(cells, 0);
    out
}
