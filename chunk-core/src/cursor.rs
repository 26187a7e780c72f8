//! Little-endian read cursor

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::tag::Tag;

/// Read cursor over a byte slice. All reads are little-endian.
///
/// A cursor remembers the absolute file offset of its first byte, so errors
/// raised inside a payload sub-cursor still point at file positions.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
    sanitize_floats: bool,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
            sanitize_floats: false,
        }
    }

    /// Replace NaN and infinite floats with `0.0` on every `read_f32`.
    ///
    /// Sub-cursors created from this cursor inherit the setting.
    pub fn sanitizing_floats(mut self, enabled: bool) -> Self {
        self.sanitize_floats = enabled;
        self
    }

    /// Current position relative to the start of this cursor's data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Current position in the original file.
    pub fn absolute_position(&self) -> usize {
        self.base + self.pos
    }

    /// Absolute file offset of this cursor's first byte.
    pub fn base(&self) -> usize {
        self.base
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Seek to a position relative to this cursor's start.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(Error::UnexpectedEof {
                offset: self.base + pos,
                need: pos - self.data.len(),
                have: 0,
            });
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Read a slice of `n` bytes without copying.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Consume and return everything left.
    pub fn rest(&mut self) -> &'a [u8] {
        let start = self.pos.min(self.data.len());
        self.pos = self.data.len();
        &self.data[start..]
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a tag, undoing the on-disk byte reversal.
    pub fn read_tag(&mut self) -> Result<Tag> {
        Ok(Tag::from_disk(self.read_array()?))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let v = LittleEndian::read_f32(self.read_bytes(4)?);
        if self.sanitize_floats && !v.is_finite() {
            return Ok(0.0);
        }
        Ok(v)
    }

    pub fn read_vec3(&mut self) -> Result<[f32; 3]> {
        Ok([self.read_f32()?, self.read_f32()?, self.read_f32()?])
    }

    /// Access the full underlying data.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Cursor over the same data, positioned at `pos`.
    pub fn at(&self, pos: usize) -> Result<Self> {
        let mut cursor = self.clone();
        cursor.seek(pos)?;
        Ok(cursor)
    }

    /// Consume `n` bytes and return a cursor bounded to exactly those bytes.
    pub fn sub_cursor(&mut self, n: usize) -> Result<Self> {
        let base = self.absolute_position();
        let data = self.read_bytes(n)?;
        Ok(Self {
            data,
            pos: 0,
            base,
            sanitize_floats: self.sanitize_floats,
        })
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if self.pos + n > self.data.len() {
            return Err(Error::UnexpectedEof {
                offset: self.absolute_position(),
                need: n,
                have: self.remaining(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_little_endian_reads() {
        let data = [0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xFF];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_u16().unwrap(), 0x1234);
        assert_eq!(cursor.read_u32().unwrap(), 0x1234_5678);
        assert_eq!(cursor.read_i8().unwrap(), -1);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_read_past_end_is_format_error() {
        let data = [1, 2, 3];
        let mut cursor = Cursor::new(&data);
        let err = cursor.read_u32().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(matches!(
            err,
            Error::UnexpectedEof {
                offset: 0,
                need: 4,
                have: 3
            }
        ));
    }

    #[test]
    fn test_float_sanitizing() {
        let mut data = Vec::new();
        data.extend_from_slice(&f32::NAN.to_le_bytes());
        data.extend_from_slice(&f32::INFINITY.to_le_bytes());
        data.extend_from_slice(&1.5f32.to_le_bytes());

        let mut raw = Cursor::new(&data);
        assert!(raw.read_f32().unwrap().is_nan());

        let mut cursor = Cursor::new(&data).sanitizing_floats(true);
        assert_eq!(cursor.read_vec3().unwrap(), [0.0, 0.0, 1.5]);
    }

    #[test]
    fn test_sub_cursor_reports_absolute_offsets() {
        let data = [0u8; 16];
        let mut cursor = Cursor::new(&data);
        cursor.skip(8).unwrap();
        let mut sub = cursor.sub_cursor(4).unwrap();
        assert_eq!(sub.base(), 8);
        sub.read_u16().unwrap();
        let err = sub.read_u32().unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { offset: 10, .. }));
        assert_eq!(cursor.position(), 12);
    }
}
