//! Fixed-width record arrays
//!
//! Many chunks are plain arrays of fixed-width records whose count is
//! `length / SIZE`. A length that is not an exact multiple is a format defect
//! and is reported as a range error rather than silently truncated.

use crate::chunk::ChunkHeader;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::tag::Tag;
use crate::writer::ChunkWriter;

/// A fixed-width binary record.
///
/// # Example
///
/// ```
/// use chunk_core::{ChunkWriter, Cursor, Record, Result};
///
/// struct Pair(u16, u16);
///
/// impl Record for Pair {
///     const SIZE: usize = 4;
///
///     fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
///         Ok(Pair(cursor.read_u16()?, cursor.read_u16()?))
///     }
///
///     fn write(&self, writer: &mut ChunkWriter) {
///         writer.write_u16(self.0);
///         writer.write_u16(self.1);
///     }
/// }
/// ```
pub trait Record: Sized {
    /// Serialized width in bytes.
    const SIZE: usize;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self>;

    fn write(&self, writer: &mut ChunkWriter);
}

/// Read a chunk payload as an array of `T`.
pub fn read_records<T: Record>(header: &ChunkHeader, mut payload: Cursor<'_>) -> Result<Vec<T>> {
    let length = payload.remaining();
    check_width(header.tag, length, T::SIZE)?;
    let count = length / T::SIZE;
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(T::read(&mut payload)?);
    }
    Ok(records)
}

/// Write `records` as a single chunk tagged `tag`.
pub fn write_records<T: Record>(writer: &mut ChunkWriter, tag: Tag, records: &[T]) -> Result<()> {
    writer.write_chunk_with(tag, |w| {
        for record in records {
            record.write(w);
        }
        Ok(())
    })?;
    Ok(())
}

/// Require `length` to be a whole number of `width`-byte records.
pub fn check_width(tag: Tag, length: usize, width: usize) -> Result<()> {
    if width == 0 || length % width != 0 {
        return Err(Error::RecordSize { tag, length, width });
    }
    Ok(())
}

impl Record for u16 {
    const SIZE: usize = 2;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.read_u16()
    }

    fn write(&self, writer: &mut ChunkWriter) {
        writer.write_u16(*self);
    }
}

impl Record for u32 {
    const SIZE: usize = 4;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.read_u32()
    }

    fn write(&self, writer: &mut ChunkWriter) {
        writer.write_u32(*self);
    }
}

impl Record for f32 {
    const SIZE: usize = 4;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.read_f32()
    }

    fn write(&self, writer: &mut ChunkWriter) {
        writer.write_f32(*self);
    }
}

impl<const N: usize> Record for [f32; N] {
    const SIZE: usize = 4 * N;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        let mut out = [0.0; N];
        for v in &mut out {
            *v = cursor.read_f32()?;
        }
        Ok(out)
    }

    fn write(&self, writer: &mut ChunkWriter) {
        for &v in self {
            writer.write_f32(v);
        }
    }
}

impl<const N: usize> Record for [u8; N] {
    const SIZE: usize = N;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.read_array()
    }

    fn write(&self, writer: &mut ChunkWriter) {
        writer.write_bytes(self);
    }
}

impl<const N: usize> Record for [i8; N] {
    const SIZE: usize = N;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        let bytes: [u8; N] = cursor.read_array()?;
        Ok(bytes.map(|b| b as i8))
    }

    fn write(&self, writer: &mut ChunkWriter) {
        for &v in self {
            writer.write_i8(v);
        }
    }
}
