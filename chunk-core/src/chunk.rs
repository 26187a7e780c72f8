//! Chunk framing: tag + length + payload

use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::tag::Tag;

/// Size of the tag + length framing preceding every chunk payload.
pub const CHUNK_HEADER_SIZE: usize = 8;

/// Framing of a single chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Logical tag
    pub tag: Tag,
    /// Payload length (framing excluded)
    pub length: u32,
    /// Absolute offset of the tag in the file
    pub offset: usize,
}

impl ChunkHeader {
    /// Absolute offset of the first payload byte.
    pub fn payload_offset(&self) -> usize {
        self.offset + CHUNK_HEADER_SIZE
    }

    /// Absolute offset one past the last payload byte.
    pub fn end_offset(&self) -> usize {
        self.payload_offset() + self.length as usize
    }

    /// Total size of the chunk including framing.
    pub fn total_size(&self) -> usize {
        CHUNK_HEADER_SIZE + self.length as usize
    }
}

/// Chunk preserved verbatim because no parser claims its tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChunk {
    pub tag: Tag,
    pub data: Vec<u8>,
}

/// Read a chunk header at the cursor.
///
/// Returns `Ok(None)` when the cursor is exactly at the end of its stream.
pub fn read_chunk_header(cursor: &mut Cursor<'_>) -> Result<Option<ChunkHeader>> {
    if cursor.is_empty() {
        return Ok(None);
    }
    let offset = cursor.absolute_position();
    let tag = cursor.read_tag()?;
    let length = cursor.read_u32()?;
    Ok(Some(ChunkHeader {
        tag,
        length,
        offset,
    }))
}

impl<'a> Cursor<'a> {
    /// Read the next chunk and return its header with a cursor bounded to its
    /// payload. The outer cursor moves past the payload.
    pub fn next_chunk(&mut self) -> Result<Option<(ChunkHeader, Cursor<'a>)>> {
        let Some(header) = read_chunk_header(self)? else {
            return Ok(None);
        };
        let length = header.length as usize;
        if length > self.remaining() {
            return Err(Error::ChunkOverrun {
                tag: header.tag,
                offset: header.offset,
                length,
                available: self.remaining(),
            });
        }
        let payload = self.sub_cursor(length)?;
        Ok(Some((header, payload)))
    }
}

/// Read the next chunk and require it to carry `tag`.
pub fn expect_chunk<'a>(cursor: &mut Cursor<'a>, tag: Tag) -> Result<(ChunkHeader, Cursor<'a>)> {
    let offset = cursor.absolute_position();
    let Some((header, payload)) = cursor.next_chunk()? else {
        return Err(Error::UnexpectedEof {
            offset,
            need: CHUNK_HEADER_SIZE,
            have: 0,
        });
    };
    if header.tag != tag {
        return Err(Error::TagMismatch {
            offset: header.offset,
            expected: tag,
            found: header.tag,
        });
    }
    Ok((header, payload))
}
