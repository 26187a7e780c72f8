//! Little-endian writer with reserve-then-patch support

use byteorder::{ByteOrder, LittleEndian};

use crate::chunk::CHUNK_HEADER_SIZE;
use crate::error::{Error, Result};
use crate::tag::Tag;

/// Writer that builds a byte buffer. All writes are little-endian.
///
/// Values that depend on content written later (chunk lengths, forward
/// offsets) are handled by reserving a zero-filled region first and patching
/// it once the content is in place.
#[derive(Debug, Clone, Default)]
pub struct ChunkWriter {
    buf: Vec<u8>,
}

/// Pending chunk whose length field is still a placeholder.
#[derive(Debug)]
#[must_use = "a chunk mark must be closed with ChunkWriter::end_chunk"]
pub struct ChunkMark {
    tag: Tag,
    header_pos: usize,
}

impl ChunkMark {
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Position of the chunk's tag in the writer.
    pub fn header_position(&self) -> usize {
        self.header_pos
    }

    /// Position of the first payload byte in the writer.
    pub fn payload_position(&self) -> usize {
        self.header_pos + CHUNK_HEADER_SIZE
    }
}

impl ChunkWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_zeros(&mut self, n: usize) {
        self.buf.resize(self.buf.len() + n, 0);
    }

    /// Write a tag in on-disk (reversed) byte order.
    pub fn write_tag(&mut self, tag: Tag) {
        self.buf.extend_from_slice(&tag.to_disk());
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.buf.push(v as u8);
    }

    pub fn write_u16(&mut self, v: u16) {
        LittleEndian::write_u16(self.extend(2), v);
    }

    pub fn write_i16(&mut self, v: i16) {
        LittleEndian::write_i16(self.extend(2), v);
    }

    pub fn write_u32(&mut self, v: u32) {
        LittleEndian::write_u32(self.extend(4), v);
    }

    pub fn write_i32(&mut self, v: i32) {
        LittleEndian::write_i32(self.extend(4), v);
    }

    pub fn write_f32(&mut self, v: f32) {
        LittleEndian::write_f32(self.extend(4), v);
    }

    pub fn write_vec3(&mut self, v: [f32; 3]) {
        for c in v {
            self.write_f32(c);
        }
    }

    /// Grow the buffer by `n` zero bytes and return them for filling.
    fn extend(&mut self, n: usize) -> &mut [u8] {
        let pos = self.buf.len();
        self.buf.resize(pos + n, 0);
        &mut self.buf[pos..]
    }

    /// Reserve `n` zero bytes and return their starting position.
    pub fn reserve(&mut self, n: usize) -> usize {
        let pos = self.buf.len();
        self.write_zeros(n);
        pos
    }

    /// Patch a u32 at a position previously written or reserved.
    pub fn patch_u32(&mut self, pos: usize, v: u32) {
        LittleEndian::write_u32(&mut self.buf[pos..pos + 4], v);
    }

    /// Overwrite already-written bytes starting at `pos`.
    pub fn patch_bytes(&mut self, pos: usize, bytes: &[u8]) {
        self.buf[pos..pos + bytes.len()].copy_from_slice(bytes);
    }

    /// Start a chunk with a placeholder length.
    pub fn begin_chunk(&mut self, tag: Tag) -> ChunkMark {
        let header_pos = self.buf.len();
        self.write_tag(tag);
        self.write_u32(0);
        ChunkMark { tag, header_pos }
    }

    /// Close a chunk, patching its length to everything written since
    /// `begin_chunk`. Returns the payload length.
    pub fn end_chunk(&mut self, mark: ChunkMark) -> Result<u32> {
        let payload_len = self.buf.len() - mark.payload_position();
        let length = u32::try_from(payload_len).map_err(|_| {
            Error::validation(
                "chunk length",
                format!("chunk {} payload of {} bytes exceeds u32", mark.tag, payload_len),
            )
        })?;
        self.patch_u32(mark.header_pos + 4, length);
        Ok(length)
    }

    /// Write a complete chunk whose payload is already materialized.
    pub fn write_chunk(&mut self, tag: Tag, payload: &[u8]) -> Result<()> {
        let mark = self.begin_chunk(tag);
        self.write_bytes(payload);
        self.end_chunk(mark)?;
        Ok(())
    }

    /// Write a chunk whose payload is produced by `body`.
    pub fn write_chunk_with<F>(&mut self, tag: Tag, body: F) -> Result<u32>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let mark = self.begin_chunk(tag);
        body(self)?;
        self.end_chunk(mark)
    }
}

/// Convert a buffer position or size to the u32 stored in an offset field.
pub fn offset_u32(value: usize, context: &'static str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::validation(context, format!("value {} exceeds u32", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_chunk_patches_length() {
        let mut writer = ChunkWriter::new();
        let mark = writer.begin_chunk(Tag::new(b"MTEX"));
        writer.write_bytes(b"abc\0");
        assert_eq!(writer.end_chunk(mark).unwrap(), 4);
        assert_eq!(
            writer.as_bytes(),
            &[b'X', b'E', b'T', b'M', 4, 0, 0, 0, b'a', b'b', b'c', 0]
        );
    }

    #[test]
    fn test_nested_chunks() {
        let mut writer = ChunkWriter::new();
        let outer = writer.begin_chunk(Tag::new(b"MOGP"));
        writer.write_u32(7);
        writer
            .write_chunk(Tag::new(b"MOVI"), &[1, 0, 2, 0])
            .unwrap();
        assert_eq!(writer.end_chunk(outer).unwrap(), 4 + 8 + 4);
    }

    #[test]
    fn test_reserve_then_patch() {
        let mut writer = ChunkWriter::new();
        writer.write_u8(0xAA);
        let slot = writer.reserve(4);
        writer.write_u8(0xBB);
        writer.patch_u32(slot, 0x0403_0201);
        assert_eq!(writer.as_bytes(), &[0xAA, 1, 2, 3, 4, 0xBB]);
    }
}
