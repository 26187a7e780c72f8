//! asset-codec: terrain tile and object model document codec
//!
//! Converts chunk-framed binary game assets into a structured, serde-friendly
//! form and back. Three document kinds are supported:
//!
//! - **Terrain tile files** (ADT-style): a 16x16 grid of tiles, each carrying
//!   heights, normals, texture layers with 64x64 alpha rasters, and more
//! - **Object model roots** (WMO root): materials, group infos, portals,
//!   lights, doodad placements and fogs
//! - **Object model groups** (WMO group): one piece of renderable geometry
//!   with batches and a BSP tree, nested inside a container chunk
//!
//! # Key Features
//!
//! - **Lossless round trip**: unknown chunks are preserved verbatim and kept
//!   in their original position
//! - **Offset fidelity**: string tables keep the byte offset of every entry,
//!   header offsets are recomputed on encode
//! - **Self-contained calls**: no global state, decode and encode are safe to
//!   run in parallel across documents
//!
//! # Usage
//!
//! ```ignore
//! use asset_codec::{Document, decode_document, encode_document};
//!
//! let bytes = std::fs::read("Azeroth_32_48.adt").unwrap();
//! let document = decode_document(&bytes).unwrap();
//! if let Document::Terrain(terrain) = &document {
//!     println!("{} tiles", terrain.tiles.len());
//! }
//! let rebuilt = encode_document(&document).unwrap();
//! ```

mod document;
mod options;
pub mod tags;
pub mod terrain;
pub mod wmo;

pub use chunk_core::{
    AlphaEncoding, AlphaMap, Error, ErrorKind, RawChunk, Result, StringEntry, StringTable, Tag,
};
pub use document::{
    Document, DocumentKind, decode_document, decode_document_with, detect_kind, encode_document,
    encode_document_with,
};
pub use options::CodecOptions;
