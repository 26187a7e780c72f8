//! Terrain tile files (ADT-style, version 18)
//!
//! A terrain file is a flat sequence of top-level chunks. `MHDR` holds
//! offsets to the other top-level chunks and `MCIN` holds the absolute
//! position and size of each of the 256 `MCNK` tiles; both are recomputed on
//! encode by reserving their payloads and patching them once every chunk has
//! been written.

mod records;
mod tile;


use chunk_core::writer::offset_u32;
use chunk_core::{
    ChunkHeader, ChunkWriter, Cursor, Error, RawChunk, Record, Result, StringTable, Tag,
    read_records, write_records,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use records::{
    DoodadPlacement, FlightBounds, HEADER_TARGETS, MapHeader, SoundEmitter, TileIndexEntry,
    WmoPlacement,
};
pub use tile::{
    LayerFlags, QUALITY_CELLS, SHADOW_BYTES, TILE_HEADER_SIZE, TextureLayer, Tile, TileFlags,
    TileHeader, TileReferences, VERTEX_COUNT,
};

use crate::options::CodecOptions;
use crate::tags::{
    MCIN, MCNK, MDDF, MFBO, MH2O, MHDR, MMDX, MMID, MODF, MTEX, MTXF, MVER, MWID, MWMO,
};

/// Tiles per file (16 x 16, row-major)
pub const TILE_COUNT: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainDocument {
    /// Top-level chunks in file order
    pub chunks: Vec<TerrainChunk>,
    /// Exactly [`TILE_COUNT`] tiles, row-major
    pub tiles: Vec<Tile>,
}

/// One top-level chunk of a terrain file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainChunk {
    Version(u32),
    Header(MapHeader),
    /// `MCIN`, rebuilt from the tiles on encode
    TileIndex,
    Textures(StringTable),
    Models(StringTable),
    /// Offsets into `MMDX`
    ModelOffsets(Vec<u32>),
    Wmos(StringTable),
    /// Offsets into `MWMO`
    WmoOffsets(Vec<u32>),
    DoodadPlacements(Vec<DoodadPlacement>),
    WmoPlacements(Vec<WmoPlacement>),
    /// `MH2O`, opaque
    Liquid(Vec<u8>),
    FlightBounds(FlightBounds),
    TextureFlags(Vec<u32>),
    /// Position of the `MCNK` block; tile contents live in
    /// [`TerrainDocument::tiles`]
    Tiles,
    Unknown(RawChunk),
}

impl TerrainChunk {
    pub fn tag(&self) -> Tag {
        match self {
            TerrainChunk::Version(_) => MVER,
            TerrainChunk::Header(_) => MHDR,
            TerrainChunk::TileIndex => MCIN,
            TerrainChunk::Textures(_) => MTEX,
            TerrainChunk::Models(_) => MMDX,
            TerrainChunk::ModelOffsets(_) => MMID,
            TerrainChunk::Wmos(_) => MWMO,
            TerrainChunk::WmoOffsets(_) => MWID,
            TerrainChunk::DoodadPlacements(_) => MDDF,
            TerrainChunk::WmoPlacements(_) => MODF,
            TerrainChunk::Liquid(_) => MH2O,
            TerrainChunk::FlightBounds(_) => MFBO,
            TerrainChunk::TextureFlags(_) => MTXF,
            TerrainChunk::Tiles => MCNK,
            TerrainChunk::Unknown(raw) => raw.tag,
        }
    }
}

impl TerrainDocument {
    /// Document with the usual chunk order and 256 empty tiles.
    pub fn empty() -> Self {
        let chunks = vec![
            TerrainChunk::Version(18),
            TerrainChunk::Header(MapHeader::default()),
            TerrainChunk::TileIndex,
            TerrainChunk::Textures(StringTable::default()),
            TerrainChunk::Models(StringTable::default()),
            TerrainChunk::ModelOffsets(Vec::new()),
            TerrainChunk::Wmos(StringTable::default()),
            TerrainChunk::WmoOffsets(Vec::new()),
            TerrainChunk::DoodadPlacements(Vec::new()),
            TerrainChunk::WmoPlacements(Vec::new()),
            TerrainChunk::Tiles,
        ];
        let tiles = (0..TILE_COUNT as u32)
            .map(|i| Tile::new(i % 16, i / 16))
            .collect();
        Self { chunks, tiles }
    }

    fn string_table(&self, tag: Tag) -> Option<&StringTable> {
        self.chunks.iter().find_map(|chunk| match chunk {
            TerrainChunk::Textures(t) | TerrainChunk::Models(t) | TerrainChunk::Wmos(t)
                if chunk.tag() == tag =>
            {
                Some(t)
            }
            _ => None,
        })
    }

    /// Every `MMID` / `MWID` entry must point inside its name table.
    fn check_name_offsets(&self) -> Result<()> {
        for chunk in &self.chunks {
            let (offsets, table, context) = match chunk {
                TerrainChunk::ModelOffsets(o) => (o, self.string_table(MMDX), "model name offset"),
                TerrainChunk::WmoOffsets(o) => (o, self.string_table(MWMO), "wmo name offset"),
                _ => continue,
            };
            let len = table.map_or(0, StringTable::byte_len);
            for &offset in offsets {
                if offset as usize >= len && !(offset == 0 && len == 0) {
                    return Err(Error::Reference {
                        context,
                        offset: offset as usize,
                        len,
                    });
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Decode
// =============================================================================

pub fn decode(data: &[u8], options: &CodecOptions) -> Result<TerrainDocument> {
    let root = Cursor::new(data).sanitizing_floats(options.sanitize_floats);
    let mut cursor = root.clone();
    let mut chunks = Vec::new();
    let mut index: Option<Vec<TileIndexEntry>> = None;
    let mut tiles_seen = false;

    while let Some((header, payload)) = cursor.next_chunk()? {
        match header.tag {
            // Tiles are reached through MCIN; only the block position is kept
            MCNK => {
                if !tiles_seen {
                    tiles_seen = true;
                    chunks.push(TerrainChunk::Tiles);
                }
            }
            MCIN => {
                index = Some(read_records(&header, payload)?);
                chunks.push(TerrainChunk::TileIndex);
            }
            _ => chunks.push(decode_chunk(&header, payload)?),
        }
    }

    let index = index.ok_or(Error::MissingChunk { tag: MCIN })?;
    if index.len() != TILE_COUNT {
        return Err(Error::malformed(
            "tile index",
            format!("expected {} entries, found {}", TILE_COUNT, index.len()),
        ));
    }
    let tiles = index
        .iter()
        .map(|entry| tile::decode_tile(&root, entry))
        .collect::<Result<Vec<_>>>()?;

    let document = TerrainDocument { chunks, tiles };
    document.check_name_offsets()?;
    debug!(
        chunks = document.chunks.len(),
        tiles = document.tiles.len(),
        "decoded terrain document"
    );
    Ok(document)
}

fn decode_chunk(header: &ChunkHeader, mut payload: Cursor<'_>) -> Result<TerrainChunk> {
    debug!(tag = %header.tag, offset = header.offset, length = header.length, "terrain chunk");
    Ok(match header.tag {
        MVER => TerrainChunk::Version(payload.read_u32()?),
        MHDR => TerrainChunk::Header(MapHeader::read(&mut payload)?),
        MTEX => TerrainChunk::Textures(StringTable::parse(payload.rest())),
        MMDX => TerrainChunk::Models(StringTable::parse(payload.rest())),
        MMID => TerrainChunk::ModelOffsets(read_records(header, payload)?),
        MWMO => TerrainChunk::Wmos(StringTable::parse(payload.rest())),
        MWID => TerrainChunk::WmoOffsets(read_records(header, payload)?),
        MDDF => TerrainChunk::DoodadPlacements(read_records(header, payload)?),
        MODF => TerrainChunk::WmoPlacements(read_records(header, payload)?),
        MH2O => TerrainChunk::Liquid(payload.rest().to_vec()),
        MFBO => TerrainChunk::FlightBounds(FlightBounds::read(&mut payload)?),
        MTXF => TerrainChunk::TextureFlags(read_records(header, payload)?),
        tag => {
            warn!(%tag, offset = header.offset, "preserving unknown terrain chunk");
            TerrainChunk::Unknown(RawChunk {
                tag,
                data: payload.rest().to_vec(),
            })
        }
    })
}

// =============================================================================
// Encode
// =============================================================================

/// Serialize a terrain document.
///
/// Every count and offset in `MHDR`, `MCIN` and the tile headers is derived
/// from the document itself, so `validate_counts` has nothing to compare
/// against here and `options` is unused.
pub fn encode(document: &TerrainDocument, _options: &CodecOptions) -> Result<Vec<u8>> {
    if document.tiles.len() != TILE_COUNT {
        return Err(Error::validation(
            "terrain document",
            format!("expected {} tiles, got {}", TILE_COUNT, document.tiles.len()),
        ));
    }

    let mut w = ChunkWriter::new();
    let mut header_slot: Option<(usize, &MapHeader)> = None;
    let mut index_slot: Option<usize> = None;
    let mut tile_spans: Vec<(usize, usize)> = Vec::with_capacity(TILE_COUNT);
    let mut targets: [Option<usize>; 11] = [None; 11];

    for chunk in &document.chunks {
        let start = w.position();
        if let Some(i) = HEADER_TARGETS.iter().position(|&t| t == chunk.tag()) {
            targets[i].get_or_insert(start);
        }

        match chunk {
            TerrainChunk::Version(version) => {
                write_records(&mut w, MVER, std::slice::from_ref(version))?
            }
            TerrainChunk::Header(header) => {
                if header_slot.is_some() {
                    return Err(Error::validation("terrain document", "more than one MHDR"));
                }
                let mark = w.begin_chunk(MHDR);
                header_slot = Some((w.reserve(MapHeader::SIZE), header));
                w.end_chunk(mark)?;
            }
            TerrainChunk::TileIndex => {
                if index_slot.is_some() {
                    return Err(Error::validation("terrain document", "more than one MCIN"));
                }
                let mark = w.begin_chunk(MCIN);
                index_slot = Some(w.reserve(TILE_COUNT * TileIndexEntry::SIZE));
                w.end_chunk(mark)?;
            }
            TerrainChunk::Textures(table) | TerrainChunk::Models(table) | TerrainChunk::Wmos(table) => {
                w.write_chunk(chunk.tag(), &table.to_bytes()?)?
            }
            TerrainChunk::ModelOffsets(values)
            | TerrainChunk::WmoOffsets(values)
            | TerrainChunk::TextureFlags(values) => write_records(&mut w, chunk.tag(), values)?,
            TerrainChunk::DoodadPlacements(placements) => write_records(&mut w, MDDF, placements)?,
            TerrainChunk::WmoPlacements(placements) => write_records(&mut w, MODF, placements)?,
            TerrainChunk::Liquid(data) => w.write_chunk(MH2O, data)?,
            TerrainChunk::FlightBounds(bounds) => {
                write_records(&mut w, MFBO, std::slice::from_ref(bounds))?
            }
            TerrainChunk::Tiles => {
                if !tile_spans.is_empty() {
                    return Err(Error::validation("terrain document", "tile block listed twice"));
                }
                for tile in &document.tiles {
                    let offset = w.position();
                    let bytes = tile::encode_tile(tile)?;
                    w.write_bytes(&bytes);
                    tile_spans.push((offset, bytes.len()));
                }
            }
            TerrainChunk::Unknown(raw) => w.write_chunk(raw.tag, &raw.data)?,
        }
    }

    let index_slot =
        index_slot.ok_or_else(|| Error::validation("terrain document", "no MCIN chunk"))?;
    if tile_spans.is_empty() {
        return Err(Error::validation("terrain document", "no tile block"));
    }

    for (i, (&(offset, size), tile)) in tile_spans.iter().zip(&document.tiles).enumerate() {
        let entry = TileIndexEntry {
            offset: offset_u32(offset, "tile offset")?,
            size: offset_u32(size, "tile size")?,
            flags: tile.index_flags,
            async_id: tile.async_id,
        };
        let mut record = ChunkWriter::with_capacity(TileIndexEntry::SIZE);
        entry.write(&mut record);
        w.patch_bytes(index_slot + i * TileIndexEntry::SIZE, record.as_bytes());
    }

    if let Some((slot, header)) = header_slot {
        let mut offsets = [0u32; 11];
        for ((out, target), tag) in offsets.iter_mut().zip(targets).zip(HEADER_TARGETS) {
            let Some(position) = target else {
                continue;
            };
            let relative = position.checked_sub(slot).ok_or_else(|| {
                Error::validation("terrain document", format!("{} precedes MHDR", tag))
            })?;
            *out = offset_u32(relative, "header offset")?;
        }
        w.patch_bytes(slot, &header.to_bytes(&offsets));
    }

    debug!(bytes = w.position(), "encoded terrain document");
    Ok(w.into_bytes())
}
