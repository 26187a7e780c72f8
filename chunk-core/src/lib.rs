//! chunk-core: building blocks for chunk-framed game asset files
//!
//! This crate holds the format-independent leaves of the asset codec. It knows
//! nothing about terrain tiles or object models; the `asset-codec` crate
//! composes these pieces into full documents.
//!
//! # Components
//!
//! - [`Cursor`] / [`ChunkWriter`] - little-endian reading and writing, with
//!   placeholder reservation and back-patching on the write side
//! - [`chunk`] - tag + length framing, opaque chunks, fixed-width record arrays
//! - [`strings`] - null-terminated string blobs addressed by byte offset
//! - [`raster`] - the run-length alpha codec and packed bit grids
//!
//! # Chunk Format
//!
//! ```text
//! 0x00: tag    (4 bytes, stored reversed: logical "MVER" is "REVM" on disk)
//! 0x04: length (u32, payload bytes only - framing excluded)
//! 0x08: payload
//! ```
//!
//! # Usage
//!
//! ```
//! use chunk_core::{ChunkWriter, Cursor, Tag};
//!
//! let mut writer = ChunkWriter::new();
//! let mark = writer.begin_chunk(Tag::new(b"MVER"));
//! writer.write_u32(18);
//! writer.end_chunk(mark).unwrap();
//!
//! let bytes = writer.into_bytes();
//! assert_eq!(&bytes[..4], b"REVM");
//!
//! let mut cursor = Cursor::new(&bytes);
//! let (header, mut payload) = cursor.next_chunk().unwrap().unwrap();
//! assert_eq!(header.tag, Tag::new(b"MVER"));
//! assert_eq!(payload.read_u32().unwrap(), 18);
//! ```

pub mod chunk;
pub mod cursor;
pub mod error;
pub mod raster;
pub mod record;
pub mod strings;
pub mod tag;
pub mod writer;

pub use chunk::{CHUNK_HEADER_SIZE, ChunkHeader, RawChunk, expect_chunk, read_chunk_header};
pub use cursor::Cursor;
pub use error::{Error, ErrorKind, Result};
pub use raster::{AlphaEncoding, AlphaMap, decode_raster, encode_raster};
pub use record::{Record, read_records, write_records};
pub use strings::{StringEntry, StringTable, build_offset_index};
pub use tag::Tag;
pub use writer::{ChunkMark, ChunkWriter};
