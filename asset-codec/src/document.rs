//! Document detection and the boundary operations

use chunk_core::{Cursor, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::options::CodecOptions;
use crate::tags::{MCIN, MHDR, MOGP, MOHD};
use crate::terrain::{self, TerrainDocument};
use crate::wmo::{self, GroupDocument, RootDocument};

/// Structured form of any supported asset.
///
/// Serializes with a `kind` discriminant so the text form is self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Document {
    Terrain(TerrainDocument),
    WmoRoot(RootDocument),
    WmoGroup(GroupDocument),
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Terrain(_) => DocumentKind::Terrain,
            Document::WmoRoot(_) => DocumentKind::WmoRoot,
            Document::WmoGroup(_) => DocumentKind::WmoGroup,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Terrain,
    WmoRoot,
    WmoGroup,
}

impl DocumentKind {
    pub fn name(self) -> &'static str {
        match self {
            DocumentKind::Terrain => "terrain",
            DocumentKind::WmoRoot => "wmo_root",
            DocumentKind::WmoGroup => "wmo_group",
        }
    }
}

/// Identify a document by the first discriminant chunk among its top-level
/// chunks.
pub fn detect_kind(data: &[u8]) -> Result<DocumentKind> {
    let mut cursor = Cursor::new(data);
    while let Some((header, _)) = cursor.next_chunk()? {
        let kind = match header.tag {
            MHDR | MCIN => DocumentKind::Terrain,
            MOHD => DocumentKind::WmoRoot,
            MOGP => DocumentKind::WmoGroup,
            _ => continue,
        };
        debug!(kind = kind.name(), tag = %header.tag, offset = header.offset, "detected document");
        return Ok(kind);
    }
    Err(Error::UnrecognizedDocument)
}

/// Decode with default options.
pub fn decode_document(data: &[u8]) -> Result<Document> {
    decode_document_with(data, &CodecOptions::default())
}

pub fn decode_document_with(data: &[u8], options: &CodecOptions) -> Result<Document> {
    Ok(match detect_kind(data)? {
        DocumentKind::Terrain => Document::Terrain(terrain::decode(data, options)?),
        DocumentKind::WmoRoot => Document::WmoRoot(wmo::decode_root(data, options)?),
        DocumentKind::WmoGroup => Document::WmoGroup(wmo::decode_group(data, options)?),
    })
}

/// Encode with default options.
pub fn encode_document(document: &Document) -> Result<Vec<u8>> {
    encode_document_with(document, &CodecOptions::default())
}

pub fn encode_document_with(document: &Document, options: &CodecOptions) -> Result<Vec<u8>> {
    match document {
        Document::Terrain(doc) => terrain::encode(doc, options),
        Document::WmoRoot(doc) => wmo::encode_root(doc, options),
        Document::WmoGroup(doc) => wmo::encode_group(doc, options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{MVER, MOTX};
    use chunk_core::{ChunkWriter, ErrorKind};

    #[test]
    fn test_detect_skips_leading_chunks() {
        let mut writer = ChunkWriter::new();
        writer.write_chunk(MVER, &17u32.to_le_bytes()).unwrap();
        writer.write_chunk(MOTX, b"a.blp\0").unwrap();
        writer.write_chunk(MOHD, &[0u8; 64]).unwrap();
        assert_eq!(detect_kind(writer.as_bytes()).unwrap(), DocumentKind::WmoRoot);
    }

    #[test]
    fn test_no_discriminant_is_format_error() {
        let mut writer = ChunkWriter::new();
        writer.write_chunk(MVER, &18u32.to_le_bytes()).unwrap();
        let err = decode_document(writer.as_bytes()).unwrap_err();
        assert_eq!(err, Error::UnrecognizedDocument);
        assert_eq!(err.kind(), ErrorKind::Format);

        assert_eq!(decode_document(&[]).unwrap_err(), Error::UnrecognizedDocument);
    }
}
