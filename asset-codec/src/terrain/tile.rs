//! Terrain tiles (`MCNK`)
//!
//! # Layout
//!
//! ```text
//! MCNK tag + length
//! 0x008: tile header (128 bytes)
//! 0x088: sub-chunks in canonical order
//!        MCVT MCNR(+13 pad) MCLY MCRF MCSH MCAL MCSE MCLQ MCCV
//! ```
//!
//! Header offsets are relative to the tile's tag, zero meaning absent.
//! Alpha offsets in `MCLY` are relative to the `MCAL` payload.

use chunk_core::raster::ALPHA_CELLS;
use chunk_core::raster::packing::{pack_1bit, pack_2bit, unpack_1bit, unpack_2bit};
use chunk_core::writer::offset_u32;
use chunk_core::{
    AlphaEncoding, AlphaMap, CHUNK_HEADER_SIZE, ChunkHeader, ChunkWriter, Cursor, Error, Record,
    Result, Tag, decode_raster, encode_raster, expect_chunk, read_records, write_records,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, warn};

use super::records::{SoundEmitter, TileIndexEntry};
use crate::tags::{MCAL, MCCV, MCLQ, MCLY, MCNK, MCNR, MCRF, MCSE, MCSH, MCVT};

// =============================================================================
// Constants
// =============================================================================

pub const TILE_HEADER_SIZE: usize = 128;

/// Height, normal and color samples per tile (9x9 outer + 8x8 inner)
pub const VERTEX_COUNT: usize = 145;

/// Cells in the 8x8 low quality texturing map
pub const QUALITY_CELLS: usize = 64;

/// Packed 64x64 shadow bitmap
pub const SHADOW_BYTES: usize = ALPHA_CELLS / 8;

/// Bytes following `MCNR` that its length does not cover
const NORMAL_PADDING: usize = 13;

/// Offset of the first sub-chunk relative to the tile's tag
const BODY_START: usize = CHUNK_HEADER_SIZE + TILE_HEADER_SIZE;

// =============================================================================
// Flags
// =============================================================================

bitflags::bitflags! {
    /// `MCNK` header flags. Unknown bits are carried through unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TileFlags: u32 {
        const HAS_SHADOW = 0x1;
        const IMPASSABLE = 0x2;
        const LIQUID_RIVER = 0x4;
        const LIQUID_OCEAN = 0x8;
        const LIQUID_MAGMA = 0x10;
        const LIQUID_SLIME = 0x20;
        const HAS_VERTEX_COLORS = 0x40;
        /// Alpha layers are stored at full resolution or unfixed 4-bit
        const DO_NOT_FIX_ALPHA = 0x8000;
        const HIGH_RES_HOLES = 0x10000;
    }
}

bitflags::bitflags! {
    /// `MCLY` layer flags. Unknown bits are carried through unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LayerFlags: u32 {
        /// Texture rotation, in 45 degree steps
        const ANIMATION_ROTATION = 0x7;
        const ANIMATION_FAST = 0x8;
        const ANIMATION_FASTER = 0x10;
        const ANIMATION_FASTEST = 0x20;
        const ANIMATION_ENABLED = 0x40;
        const OVERBRIGHT = 0x80;
        const USE_ALPHA = 0x100;
        const ALPHA_COMPRESSED = 0x200;
        const USE_CUBE_MAP_REFLECTION = 0x400;
    }
}

// Flags serialize as their raw word
impl Serialize for TileFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TileFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(TileFlags::from_bits_retain(u32::deserialize(deserializer)?))
    }
}

impl Serialize for LayerFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LayerFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(LayerFlags::from_bits_retain(u32::deserialize(deserializer)?))
    }
}

// =============================================================================
// Structured form
// =============================================================================

/// Stored fields of the tile header. Offsets, sizes and counts are derived
/// from the sub-chunks on encode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileHeader {
    pub flags: TileFlags,
    pub index_x: u32,
    pub index_y: u32,
    pub area_id: u32,
    pub holes: u16,
    /// 8x8 cells in `0..=3`, row-major
    pub low_quality_map: Vec<u8>,
    pub pred_tex: u32,
    pub no_effect_doodad: u32,
    pub position: [f32; 3],
}

impl Default for TileHeader {
    fn default() -> Self {
        Self {
            flags: TileFlags::empty(),
            index_x: 0,
            index_y: 0,
            area_id: 0,
            holes: 0,
            low_quality_map: vec![0; QUALITY_CELLS],
            pred_tex: 0,
            no_effect_doodad: 0,
            position: [0.0; 3],
        }
    }
}

impl TileHeader {
    pub fn do_not_fix_alpha(&self) -> bool {
        self.flags.contains(TileFlags::DO_NOT_FIX_ALPHA)
    }
}

/// One texture layer and its optional alpha raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureLayer {
    /// Index into `MTEX`
    pub texture_id: u32,
    /// Stored flags. The alpha bits are rewritten from `alpha` on encode.
    pub flags: LayerFlags,
    /// Byte offset into the tile's `MCAL` payload. Kept on encode while the
    /// tile's rasters still fit at their offsets; all-zero means pack them
    /// back to back.
    pub alpha_offset: u32,
    pub effect_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<AlphaMap>,
}

impl TextureLayer {
    fn encoded_flags(&self) -> LayerFlags {
        let mut flags = self.flags;
        flags.set(LayerFlags::USE_ALPHA, self.alpha.is_some());
        if let Some(alpha) = &self.alpha {
            flags.set(
                LayerFlags::ALPHA_COMPRESSED,
                alpha.encoding == AlphaEncoding::Compressed,
            );
        }
        flags
    }
}

/// `MCRF` split by the header counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileReferences {
    /// Indices into `MDDF`
    pub doodads: Vec<u32>,
    /// Indices into `MODF`
    pub objects: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// `MCIN` flags for this tile
    #[serde(default)]
    pub index_flags: u32,
    #[serde(default)]
    pub async_id: u32,
    pub header: TileHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heights: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals: Option<Vec<[i8; 3]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<TextureLayer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<TileReferences>,
    /// 64x64 cells in `0..=1`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Vec<u8>>,
    /// Write `MCAL` even when no layer carries alpha
    #[serde(default)]
    pub has_alpha_chunk: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_emitters: Option<Vec<SoundEmitter>>,
    /// Legacy `MCLQ` payload, opaque
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquid: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_colors: Option<Vec<[u8; 4]>>,
}

impl Tile {
    /// Empty tile at grid position `(x, y)`.
    pub fn new(index_x: u32, index_y: u32) -> Self {
        Self {
            index_flags: 0,
            async_id: 0,
            header: TileHeader {
                index_x,
                index_y,
                ..TileHeader::default()
            },
            heights: None,
            normals: None,
            layers: None,
            references: None,
            shadow: None,
            has_alpha_chunk: false,
            sound_emitters: None,
            liquid: None,
            vertex_colors: None,
        }
    }
}

// =============================================================================
// Header record
// =============================================================================

/// Derived header fields: sub-chunk offsets, sizes and counts.
#[derive(Debug, Default)]
struct SubChunkLayout {
    n_layers: u32,
    n_doodad_refs: u32,
    ofs_height: u32,
    ofs_normal: u32,
    ofs_layer: u32,
    ofs_refs: u32,
    ofs_alpha: u32,
    size_alpha: u32,
    ofs_shadow: u32,
    size_shadow: u32,
    n_map_obj_refs: u32,
    ofs_sound_emitters: u32,
    n_sound_emitters: u32,
    ofs_liquid: u32,
    size_liquid: u32,
    ofs_vertex_colors: u32,
}

fn read_tile_header(cursor: &mut Cursor<'_>) -> Result<(TileHeader, SubChunkLayout)> {
    let mut layout = SubChunkLayout::default();
    let flags = TileFlags::from_bits_retain(cursor.read_u32()?);
    let index_x = cursor.read_u32()?;
    let index_y = cursor.read_u32()?;
    layout.n_layers = cursor.read_u32()?;
    layout.n_doodad_refs = cursor.read_u32()?;
    layout.ofs_height = cursor.read_u32()?;
    layout.ofs_normal = cursor.read_u32()?;
    layout.ofs_layer = cursor.read_u32()?;
    layout.ofs_refs = cursor.read_u32()?;
    layout.ofs_alpha = cursor.read_u32()?;
    layout.size_alpha = cursor.read_u32()?;
    layout.ofs_shadow = cursor.read_u32()?;
    layout.size_shadow = cursor.read_u32()?;
    let area_id = cursor.read_u32()?;
    layout.n_map_obj_refs = cursor.read_u32()?;
    let holes = cursor.read_u16()?;
    cursor.skip(2)?;
    let low_quality_map = unpack_2bit(cursor.read_bytes(QUALITY_CELLS / 4)?, QUALITY_CELLS);
    let pred_tex = cursor.read_u32()?;
    let no_effect_doodad = cursor.read_u32()?;
    layout.ofs_sound_emitters = cursor.read_u32()?;
    layout.n_sound_emitters = cursor.read_u32()?;
    layout.ofs_liquid = cursor.read_u32()?;
    layout.size_liquid = cursor.read_u32()?;
    let position = cursor.read_vec3()?;
    layout.ofs_vertex_colors = cursor.read_u32()?;
    // ofs_lod, reserved
    cursor.skip(8)?;

    let header = TileHeader {
        flags,
        index_x,
        index_y,
        area_id,
        holes,
        low_quality_map,
        pred_tex,
        no_effect_doodad,
        position,
    };
    Ok((header, layout))
}

fn write_tile_header(w: &mut ChunkWriter, header: &TileHeader, layout: &SubChunkLayout) -> Result<()> {
    check_len("tile low quality map", header.low_quality_map.len(), QUALITY_CELLS)?;
    check_cells("tile low quality map", &header.low_quality_map, 3)?;

    w.write_u32(header.flags.bits());
    w.write_u32(header.index_x);
    w.write_u32(header.index_y);
    w.write_u32(layout.n_layers);
    w.write_u32(layout.n_doodad_refs);
    w.write_u32(layout.ofs_height);
    w.write_u32(layout.ofs_normal);
    w.write_u32(layout.ofs_layer);
    w.write_u32(layout.ofs_refs);
    w.write_u32(layout.ofs_alpha);
    w.write_u32(layout.size_alpha);
    w.write_u32(layout.ofs_shadow);
    w.write_u32(layout.size_shadow);
    w.write_u32(header.area_id);
    w.write_u32(layout.n_map_obj_refs);
    w.write_u16(header.holes);
    w.write_u16(0);
    w.write_bytes(&pack_2bit(&header.low_quality_map));
    w.write_u32(header.pred_tex);
    w.write_u32(header.no_effect_doodad);
    w.write_u32(layout.ofs_sound_emitters);
    w.write_u32(layout.n_sound_emitters);
    w.write_u32(layout.ofs_liquid);
    w.write_u32(layout.size_liquid);
    w.write_vec3(header.position);
    w.write_u32(layout.ofs_vertex_colors);
    w.write_u32(0);
    w.write_u32(0);
    Ok(())
}

/// `MCLY` entry as stored.
struct LayerRecord {
    texture_id: u32,
    flags: LayerFlags,
    alpha_offset: u32,
    effect_id: u32,
}

impl Record for LayerRecord {
    const SIZE: usize = 16;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            texture_id: cursor.read_u32()?,
            flags: LayerFlags::from_bits_retain(cursor.read_u32()?),
            alpha_offset: cursor.read_u32()?,
            effect_id: cursor.read_u32()?,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        w.write_u32(self.texture_id);
        w.write_u32(self.flags.bits());
        w.write_u32(self.alpha_offset);
        w.write_u32(self.effect_id);
    }
}

impl LayerRecord {
    fn into_layer(self, alpha_blob: Option<&[u8]>, do_not_fix: bool) -> Result<TextureLayer> {
        let alpha = if self.flags.contains(LayerFlags::USE_ALPHA) {
            let blob = alpha_blob.ok_or(Error::MissingChunk { tag: MCAL })?;
            Some(decode_raster(
                blob,
                self.alpha_offset as usize,
                self.flags.contains(LayerFlags::ALPHA_COMPRESSED),
                do_not_fix,
            )?)
        } else {
            None
        };
        Ok(TextureLayer {
            texture_id: self.texture_id,
            flags: self.flags,
            alpha_offset: self.alpha_offset,
            effect_id: self.effect_id,
            alpha,
        })
    }
}

// =============================================================================
// Decode
// =============================================================================

/// Byte range of one tile within the file.
struct TileSpan<'a> {
    root: Cursor<'a>,
    start: usize,
    len: usize,
}

impl<'a> TileSpan<'a> {
    /// Follow a header offset and verify the tag found there. The sub-chunk
    /// must lie entirely inside the tile.
    fn sub_chunk(&self, offset: u32, tag: Tag) -> Result<Option<(ChunkHeader, Cursor<'a>)>> {
        if offset == 0 {
            return Ok(None);
        }
        let offset = offset as usize;
        if offset >= self.len {
            return Err(Error::Reference {
                context: "tile sub-chunk offset",
                offset,
                len: self.len,
            });
        }
        let mut cursor = self.root.at(self.start + offset)?;
        let (header, payload) = expect_chunk(&mut cursor, tag)?;
        let tile_end = self.start + self.len;
        if header.end_offset() > tile_end {
            return Err(Error::ChunkOverrun {
                tag,
                offset: header.offset,
                length: header.length as usize,
                available: tile_end.saturating_sub(header.payload_offset()),
            });
        }
        Ok(Some((header, payload)))
    }
}

/// Read exactly `count` records, ignoring trailing payload bytes.
fn read_fixed<T: Record>(header: &ChunkHeader, mut payload: Cursor<'_>, count: usize) -> Result<Vec<T>> {
    let need = count * T::SIZE;
    if payload.remaining() < need {
        return Err(Error::UnexpectedEof {
            offset: header.payload_offset(),
            need,
            have: payload.remaining(),
        });
    }
    (0..count).map(|_| T::read(&mut payload)).collect()
}

/// Decode the tile an index entry points at.
pub(crate) fn decode_tile(root: &Cursor<'_>, entry: &TileIndexEntry) -> Result<Tile> {
    let start = entry.offset as usize;
    let mut cursor = root.at(start)?;
    let (chunk, mut payload) = expect_chunk(&mut cursor, MCNK)?;
    let (header, layout) = read_tile_header(&mut payload)?;
    let span = TileSpan {
        root: root.clone(),
        start,
        len: chunk.total_size(),
    };

    let heights = match span.sub_chunk(layout.ofs_height, MCVT)? {
        Some((h, p)) => Some(read_fixed::<f32>(&h, p, VERTEX_COUNT)?),
        None => None,
    };
    let normals = match span.sub_chunk(layout.ofs_normal, MCNR)? {
        Some((h, p)) => Some(read_fixed::<[i8; 3]>(&h, p, VERTEX_COUNT)?),
        None => None,
    };

    let alpha_chunk = span.sub_chunk(layout.ofs_alpha, MCAL)?;
    let has_alpha_chunk = alpha_chunk.is_some();
    let alpha_blob = alpha_chunk.map(|(_, mut p)| p.rest());
    let layers = match span.sub_chunk(layout.ofs_layer, MCLY)? {
        Some((h, p)) => {
            let records: Vec<LayerRecord> = read_records(&h, p)?;
            if records.len() != layout.n_layers as usize {
                warn!(
                    tile = ?(header.index_x, header.index_y),
                    declared = layout.n_layers,
                    found = records.len(),
                    "layer count disagrees with MCLY"
                );
            }
            let layers = records
                .into_iter()
                .map(|r| r.into_layer(alpha_blob, header.do_not_fix_alpha()))
                .collect::<Result<Vec<_>>>()?;
            Some(layers)
        }
        None => None,
    };

    let references = match span.sub_chunk(layout.ofs_refs, MCRF)? {
        Some((h, p)) => {
            let mut doodads: Vec<u32> = read_records(&h, p)?;
            let split = layout.n_doodad_refs as usize;
            if split > doodads.len() {
                return Err(Error::malformed(
                    "tile references",
                    format!("{} doodad refs declared, {} present", split, doodads.len()),
                ));
            }
            let objects = doodads.split_off(split);
            if objects.len() != layout.n_map_obj_refs as usize {
                warn!(
                    tile = ?(header.index_x, header.index_y),
                    declared = layout.n_map_obj_refs,
                    found = objects.len(),
                    "object reference count disagrees with MCRF"
                );
            }
            Some(TileReferences { doodads, objects })
        }
        None => None,
    };

    let shadow = match span.sub_chunk(layout.ofs_shadow, MCSH)? {
        Some((_, mut p)) => Some(unpack_1bit(p.read_bytes(SHADOW_BYTES)?, ALPHA_CELLS)),
        None => None,
    };
    let sound_emitters = match span.sub_chunk(layout.ofs_sound_emitters, MCSE)? {
        Some((h, p)) => Some(read_records::<SoundEmitter>(&h, p)?),
        None => None,
    };
    let liquid = span
        .sub_chunk(layout.ofs_liquid, MCLQ)?
        .map(|(_, mut p)| p.rest().to_vec());
    let vertex_colors = match span.sub_chunk(layout.ofs_vertex_colors, MCCV)? {
        Some((h, p)) => Some(read_fixed::<[u8; 4]>(&h, p, VERTEX_COUNT)?),
        None => None,
    };

    Ok(Tile {
        index_flags: entry.flags,
        async_id: entry.async_id,
        header,
        heights,
        normals,
        layers,
        references,
        shadow,
        has_alpha_chunk,
        sound_emitters,
        liquid,
        vertex_colors,
    })
}

// =============================================================================
// Encode
// =============================================================================

fn check_len(context: &'static str, len: usize, expected: usize) -> Result<()> {
    if len != expected {
        return Err(Error::validation(
            context,
            format!("expected {} entries, got {}", expected, len),
        ));
    }
    Ok(())
}

fn check_cells(context: &'static str, cells: &[u8], max: u8) -> Result<()> {
    if let Some(i) = cells.iter().position(|&c| c > max) {
        return Err(Error::validation(
            context,
            format!("cell {} holds {} (max {})", i, cells[i], max),
        ));
    }
    Ok(())
}

fn check_encoding(alpha: &AlphaMap, do_not_fix: bool) -> Result<()> {
    if let Some(required) = alpha.encoding.requires_do_not_fix() {
        if required != do_not_fix {
            return Err(Error::validation(
                "alpha layer",
                format!(
                    "{:?} encoding requires the do-not-fix flag to be {}",
                    alpha.encoding,
                    if required { "set" } else { "clear" }
                ),
            ));
        }
    }
    Ok(())
}

/// Lay out the `MCAL` payload and return it with each layer's offset.
///
/// Layers go back at their recorded offsets when any offset is non-zero and
/// the encoded rasters still fit there. Otherwise they are packed back to back.
fn build_alpha_blob(layers: &[(u32, &AlphaMap)]) -> Result<(Vec<u8>, Vec<u32>)> {
    let rasters = layers
        .iter()
        .map(|&(offset, alpha)| {
            let bytes = encode_raster(&alpha.values, alpha.encoding)?;
            Ok((offset as usize, bytes))
        })
        .collect::<Result<Vec<_>>>()?;

    if rasters.iter().any(|(offset, _)| *offset != 0) {
        if let Some(blob) = place_at_recorded(&rasters) {
            let offsets = layers.iter().map(|&(offset, _)| offset).collect();
            return Ok((blob, offsets));
        }
        debug!("alpha layers no longer fit their recorded offsets, packing sequentially");
    }

    let mut blob = Vec::new();
    let mut offsets = Vec::with_capacity(rasters.len());
    for (_, bytes) in &rasters {
        offsets.push(offset_u32(blob.len(), "alpha offset")?);
        blob.extend_from_slice(bytes);
    }
    Ok((blob, offsets))
}

/// Write each raster at its offset, zero-filling gaps. Rasters may overlap
/// only where their bytes agree.
fn place_at_recorded(rasters: &[(usize, Vec<u8>)]) -> Option<Vec<u8>> {
    let len = rasters.iter().map(|(offset, bytes)| offset + bytes.len()).max()?;
    let mut blob = vec![0u8; len];
    let mut claimed = vec![false; len];
    for (offset, bytes) in rasters {
        let range = *offset..offset + bytes.len();
        let slots = blob[range.clone()].iter_mut().zip(&mut claimed[range]);
        for ((out, taken), &byte) in slots.zip(bytes) {
            if *taken && *out != byte {
                return None;
            }
            *out = byte;
            *taken = true;
        }
    }
    Some(blob)
}

/// Tile-relative offset of the next sub-chunk written to `body`.
fn body_offset(body: &ChunkWriter) -> Result<u32> {
    offset_u32(BODY_START + body.position(), "tile sub-chunk offset")
}

/// Serialize one tile, `MCNK` framing included.
///
/// Sub-chunks are rendered first so the header can be written with final
/// offsets; alpha offsets are patched into `MCLY` once `MCAL` is laid out.
pub(crate) fn encode_tile(tile: &Tile) -> Result<Vec<u8>> {
    let do_not_fix = tile.header.do_not_fix_alpha();
    let mut layout = SubChunkLayout::default();
    let mut body = ChunkWriter::new();

    if let Some(heights) = &tile.heights {
        check_len("tile heights", heights.len(), VERTEX_COUNT)?;
        layout.ofs_height = body_offset(&body)?;
        write_records(&mut body, MCVT, heights)?;
    }

    if let Some(normals) = &tile.normals {
        check_len("tile normals", normals.len(), VERTEX_COUNT)?;
        layout.ofs_normal = body_offset(&body)?;
        write_records(&mut body, MCNR, normals)?;
        body.write_zeros(NORMAL_PADDING);
    }

    // (slot in body, recorded offset, raster) for every layer carrying alpha
    let mut alpha_slots: Vec<(usize, u32, &AlphaMap)> = Vec::new();
    if let Some(layers) = &tile.layers {
        layout.n_layers = offset_u32(layers.len(), "tile layer count")?;
        layout.ofs_layer = body_offset(&body)?;
        body.write_chunk_with(MCLY, |w| {
            for layer in layers {
                // alpha_offset sits 8 bytes into the record
                let slot = w.position() + 8;
                let alpha_offset = match &layer.alpha {
                    Some(alpha) => {
                        check_encoding(alpha, do_not_fix)?;
                        alpha_slots.push((slot, layer.alpha_offset, alpha));
                        0
                    }
                    None => layer.alpha_offset,
                };
                LayerRecord {
                    texture_id: layer.texture_id,
                    flags: layer.encoded_flags(),
                    alpha_offset,
                    effect_id: layer.effect_id,
                }
                .write(w);
            }
            Ok(())
        })?;
    }

    if let Some(refs) = &tile.references {
        layout.n_doodad_refs = offset_u32(refs.doodads.len(), "tile doodad reference count")?;
        layout.n_map_obj_refs = offset_u32(refs.objects.len(), "tile object reference count")?;
        layout.ofs_refs = body_offset(&body)?;
        body.write_chunk_with(MCRF, |w| {
            for &index in refs.doodads.iter().chain(&refs.objects) {
                w.write_u32(index);
            }
            Ok(())
        })?;
    }

    if let Some(shadow) = &tile.shadow {
        check_len("tile shadow map", shadow.len(), ALPHA_CELLS)?;
        check_cells("tile shadow map", shadow, 1)?;
        let start = body.position();
        layout.ofs_shadow = body_offset(&body)?;
        body.write_chunk(MCSH, &pack_1bit(shadow))?;
        layout.size_shadow = offset_u32(body.position() - start, "tile shadow size")?;
    }

    if tile.has_alpha_chunk || !alpha_slots.is_empty() {
        let rasters: Vec<(u32, &AlphaMap)> = alpha_slots
            .iter()
            .map(|&(_, offset, alpha)| (offset, alpha))
            .collect();
        let (blob, offsets) = build_alpha_blob(&rasters)?;

        for (&(slot, _, alpha), &offset) in alpha_slots.iter().zip(&offsets) {
            body.patch_u32(slot, offset);
            // A low resolution layer followed by 4096 or more bytes reads back as high resolution
            let following = blob.len() - offset as usize;
            if alpha.encoding == AlphaEncoding::LowRes && following >= ALPHA_CELLS {
                return Err(Error::validation(
                    "alpha layer",
                    format!(
                        "low resolution layer at offset {} is followed by {} bytes and would decode as high resolution",
                        offset, following
                    ),
                ));
            }
        }

        let start = body.position();
        layout.ofs_alpha = body_offset(&body)?;
        body.write_chunk(MCAL, &blob)?;
        layout.size_alpha = offset_u32(body.position() - start, "tile alpha size")?;
    }

    if let Some(emitters) = &tile.sound_emitters {
        layout.n_sound_emitters = offset_u32(emitters.len(), "tile sound emitter count")?;
        layout.ofs_sound_emitters = body_offset(&body)?;
        write_records(&mut body, MCSE, emitters)?;
    }

    if let Some(liquid) = &tile.liquid {
        let start = body.position();
        layout.ofs_liquid = body_offset(&body)?;
        body.write_chunk(MCLQ, liquid)?;
        layout.size_liquid = offset_u32(body.position() - start, "tile liquid size")?;
    }

    if let Some(colors) = &tile.vertex_colors {
        check_len("tile vertex colors", colors.len(), VERTEX_COUNT)?;
        layout.ofs_vertex_colors = body_offset(&body)?;
        write_records(&mut body, MCCV, colors)?;
    }

    let mut out = ChunkWriter::with_capacity(BODY_START + body.position());
    out.write_chunk_with(MCNK, |w| {
        write_tile_header(w, &tile.header, &layout)?;
        w.write_bytes(body.as_bytes());
        Ok(())
    })?;
    Ok(out.into_bytes())
}
