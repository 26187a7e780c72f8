//! Object model group documents
//!
//! ```text
//! MVER
//! MOGP tag + length (covers header and embedded stream)
//!      group header (68 bytes)
//!      MOPY MOVI MOVT MONR MOTV ... MOBA ... MOCV MLIQ
//! ```
//!
//! The embedded stream is an ordinary chunk sequence bounded by the `MOGP`
//! length. Tags may repeat (a second `MOTV` or `MOCV` layer), so it is kept as
//! an ordered list rather than keyed by tag.

use chunk_core::writer::offset_u32;
use chunk_core::{
    ChunkHeader, ChunkWriter, Cursor, Error, RawChunk, Record, Result, Tag, read_records,
    write_records,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::options::CodecOptions;
use crate::tags::{
    MLIQ, MOBA, MOBN, MOBR, MOCV, MODR, MOGP, MOLR, MONR, MOPY, MOTV, MOVI, MOVT, MVER,
};

// =============================================================================
// Records
// =============================================================================

/// Fixed header at the start of the `MOGP` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupHeader {
    /// Byte offset into the root's `MOGN`
    pub group_name: u32,
    pub descriptive_name: u32,
    pub flags: u32,
    pub bbox_min: [f32; 3],
    pub bbox_max: [f32; 3],
    /// First entry in the root's `MOPR`
    pub portal_start: u16,
    pub portal_count: u16,
    pub trans_batches: u16,
    pub int_batches: u16,
    pub ext_batches: u16,
    #[serde(default)]
    pub padding: u16,
    pub fog_ids: [u8; 4],
    pub liquid_type: u32,
    pub group_id: u32,
    pub flags_2: u32,
    #[serde(default)]
    pub reserved: u32,
}

impl Record for GroupHeader {
    const SIZE: usize = 68;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            group_name: cursor.read_u32()?,
            descriptive_name: cursor.read_u32()?,
            flags: cursor.read_u32()?,
            bbox_min: cursor.read_vec3()?,
            bbox_max: cursor.read_vec3()?,
            portal_start: cursor.read_u16()?,
            portal_count: cursor.read_u16()?,
            trans_batches: cursor.read_u16()?,
            int_batches: cursor.read_u16()?,
            ext_batches: cursor.read_u16()?,
            padding: cursor.read_u16()?,
            fog_ids: cursor.read_array()?,
            liquid_type: cursor.read_u32()?,
            group_id: cursor.read_u32()?,
            flags_2: cursor.read_u32()?,
            reserved: cursor.read_u32()?,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        w.write_u32(self.group_name);
        w.write_u32(self.descriptive_name);
        w.write_u32(self.flags);
        w.write_vec3(self.bbox_min);
        w.write_vec3(self.bbox_max);
        w.write_u16(self.portal_start);
        w.write_u16(self.portal_count);
        w.write_u16(self.trans_batches);
        w.write_u16(self.int_batches);
        w.write_u16(self.ext_batches);
        w.write_u16(self.padding);
        w.write_bytes(&self.fog_ids);
        w.write_u32(self.liquid_type);
        w.write_u32(self.group_id);
        w.write_u32(self.flags_2);
        w.write_u32(self.reserved);
    }
}

/// `MOPY` entry: per-triangle material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriangleMaterial {
    pub flags: u8,
    /// 0xFF for collision-only triangles
    pub material_id: u8,
}

impl Record for TriangleMaterial {
    const SIZE: usize = 2;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            flags: cursor.read_u8()?,
            material_id: cursor.read_u8()?,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        w.write_u8(self.flags);
        w.write_u8(self.material_id);
    }
}

/// `MOBA` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Min then max corner, for culling
    pub bbox: [i16; 6],
    pub start_index: u32,
    pub count: u16,
    pub min_index: u16,
    pub max_index: u16,
    pub flags: u8,
    pub material_id: u8,
}

impl Record for Batch {
    const SIZE: usize = 24;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        let mut bbox = [0i16; 6];
        for v in &mut bbox {
            *v = cursor.read_i16()?;
        }
        Ok(Self {
            bbox,
            start_index: cursor.read_u32()?,
            count: cursor.read_u16()?,
            min_index: cursor.read_u16()?,
            max_index: cursor.read_u16()?,
            flags: cursor.read_u8()?,
            material_id: cursor.read_u8()?,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        for &v in &self.bbox {
            w.write_i16(v);
        }
        w.write_u32(self.start_index);
        w.write_u16(self.count);
        w.write_u16(self.min_index);
        w.write_u16(self.max_index);
        w.write_u8(self.flags);
        w.write_u8(self.material_id);
    }
}

/// `MOBN` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BspNode {
    pub flags: u16,
    /// -1 for none
    pub neg_child: i16,
    pub pos_child: i16,
    pub n_faces: u16,
    /// First entry in `MOBR`
    pub face_start: u32,
    pub plane_distance: f32,
}

impl Record for BspNode {
    const SIZE: usize = 16;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            flags: cursor.read_u16()?,
            neg_child: cursor.read_i16()?,
            pos_child: cursor.read_i16()?,
            n_faces: cursor.read_u16()?,
            face_start: cursor.read_u32()?,
            plane_distance: cursor.read_f32()?,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        w.write_u16(self.flags);
        w.write_i16(self.neg_child);
        w.write_i16(self.pos_child);
        w.write_u16(self.n_faces);
        w.write_u32(self.face_start);
        w.write_f32(self.plane_distance);
    }
}

// =============================================================================
// Structured form
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupDocument {
    /// Top-level chunks in file order
    pub chunks: Vec<GroupFileChunk>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupFileChunk {
    Version(u32),
    Group(GroupBody),
    Unknown(RawChunk),
}

/// Decoded `MOGP` container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupBody {
    pub header: GroupHeader,
    /// Embedded sub-chunks in stream order, repeats included
    pub chunks: Vec<GroupChunk>,
}

/// One sub-chunk of the embedded group stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupChunk {
    Triangles(Vec<TriangleMaterial>),
    Indices(Vec<u16>),
    Vertices(Vec<[f32; 3]>),
    Normals(Vec<[f32; 3]>),
    TexCoords(Vec<[f32; 2]>),
    Batches(Vec<Batch>),
    LightRefs(Vec<u16>),
    DoodadRefs(Vec<u16>),
    BspNodes(Vec<BspNode>),
    BspFaces(Vec<u16>),
    VertexColors(Vec<[u8; 4]>),
    /// `MLIQ`, opaque
    Liquid(Vec<u8>),
    Unknown(RawChunk),
}

impl GroupChunk {
    pub fn tag(&self) -> Tag {
        match self {
            GroupChunk::Triangles(_) => MOPY,
            GroupChunk::Indices(_) => MOVI,
            GroupChunk::Vertices(_) => MOVT,
            GroupChunk::Normals(_) => MONR,
            GroupChunk::TexCoords(_) => MOTV,
            GroupChunk::Batches(_) => MOBA,
            GroupChunk::LightRefs(_) => MOLR,
            GroupChunk::DoodadRefs(_) => MODR,
            GroupChunk::BspNodes(_) => MOBN,
            GroupChunk::BspFaces(_) => MOBR,
            GroupChunk::VertexColors(_) => MOCV,
            GroupChunk::Liquid(_) => MLIQ,
            GroupChunk::Unknown(raw) => raw.tag,
        }
    }
}

impl GroupBody {
    /// The three batch counts must add up to the `MOBA` length.
    fn check_batch_counts(&self) -> Result<()> {
        let declared = self.header.trans_batches as usize
            + self.header.int_batches as usize
            + self.header.ext_batches as usize;
        for chunk in &self.chunks {
            if let GroupChunk::Batches(batches) = chunk {
                if batches.len() != declared {
                    return Err(Error::validation(
                        "group batch counts",
                        format!(
                            "header declares {} batches, MOBA holds {}",
                            declared,
                            batches.len()
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Decode
// =============================================================================

pub fn decode_group(data: &[u8], options: &CodecOptions) -> Result<GroupDocument> {
    let mut cursor = Cursor::new(data).sanitizing_floats(options.sanitize_floats);
    let mut chunks = Vec::new();
    while let Some((header, mut payload)) = cursor.next_chunk()? {
        chunks.push(match header.tag {
            MVER => GroupFileChunk::Version(payload.read_u32()?),
            MOGP => GroupFileChunk::Group(decode_body(payload)?),
            tag => {
                warn!(%tag, offset = header.offset, "preserving unknown group file chunk");
                GroupFileChunk::Unknown(RawChunk {
                    tag,
                    data: payload.rest().to_vec(),
                })
            }
        });
    }
    debug!(chunks = chunks.len(), "decoded object model group");
    Ok(GroupDocument { chunks })
}

/// Decode a `MOGP` payload. The cursor is bounded to the container, so the
/// embedded stream ends exactly at its end and an overlong sub-chunk is an
/// overrun.
fn decode_body(mut payload: Cursor<'_>) -> Result<GroupBody> {
    let header = GroupHeader::read(&mut payload)?;
    let mut chunks = Vec::new();
    while let Some((sub, sub_payload)) = payload.next_chunk()? {
        chunks.push(decode_sub_chunk(&sub, sub_payload)?);
    }
    Ok(GroupBody { header, chunks })
}

fn decode_sub_chunk(header: &ChunkHeader, mut payload: Cursor<'_>) -> Result<GroupChunk> {
    debug!(tag = %header.tag, offset = header.offset, length = header.length, "group sub-chunk");
    Ok(match header.tag {
        MOPY => GroupChunk::Triangles(read_records(header, payload)?),
        MOVI => GroupChunk::Indices(read_records(header, payload)?),
        MOVT => GroupChunk::Vertices(read_records(header, payload)?),
        MONR => GroupChunk::Normals(read_records(header, payload)?),
        MOTV => GroupChunk::TexCoords(read_records(header, payload)?),
        MOBA => GroupChunk::Batches(read_records(header, payload)?),
        MOLR => GroupChunk::LightRefs(read_records(header, payload)?),
        MODR => GroupChunk::DoodadRefs(read_records(header, payload)?),
        MOBN => GroupChunk::BspNodes(read_records(header, payload)?),
        MOBR => GroupChunk::BspFaces(read_records(header, payload)?),
        MOCV => GroupChunk::VertexColors(read_records(header, payload)?),
        MLIQ => GroupChunk::Liquid(payload.rest().to_vec()),
        tag => {
            warn!(%tag, offset = header.offset, "preserving unknown group sub-chunk");
            GroupChunk::Unknown(RawChunk {
                tag,
                data: payload.rest().to_vec(),
            })
        }
    })
}

// =============================================================================
// Encode
// =============================================================================

pub fn encode_group(document: &GroupDocument, options: &CodecOptions) -> Result<Vec<u8>> {
    let mut w = ChunkWriter::new();
    for chunk in &document.chunks {
        match chunk {
            GroupFileChunk::Version(version) => {
                write_records(&mut w, MVER, std::slice::from_ref(version))?
            }
            GroupFileChunk::Group(body) => {
                if options.validate_counts {
                    body.check_batch_counts()?;
                }
                encode_body(&mut w, body)?;
            }
            GroupFileChunk::Unknown(raw) => w.write_chunk(raw.tag, &raw.data)?,
        }
    }
    debug!(bytes = w.position(), "encoded object model group");
    Ok(w.into_bytes())
}

/// Render the embedded stream first, then frame it behind the header with
/// its now known length.
fn encode_body(w: &mut ChunkWriter, body: &GroupBody) -> Result<()> {
    let mut stream = ChunkWriter::new();
    for chunk in &body.chunks {
        encode_sub_chunk(&mut stream, chunk)?;
    }

    let length = offset_u32(GroupHeader::SIZE + stream.position(), "group length")?;
    w.write_tag(MOGP);
    w.write_u32(length);
    body.header.write(w);
    w.write_bytes(stream.as_bytes());
    Ok(())
}

fn encode_sub_chunk(w: &mut ChunkWriter, chunk: &GroupChunk) -> Result<()> {
    let tag = chunk.tag();
    match chunk {
        GroupChunk::Triangles(v) => write_records(w, tag, v),
        GroupChunk::Indices(v)
        | GroupChunk::LightRefs(v)
        | GroupChunk::DoodadRefs(v)
        | GroupChunk::BspFaces(v) => write_records(w, tag, v),
        GroupChunk::Vertices(v) | GroupChunk::Normals(v) => write_records(w, tag, v),
        GroupChunk::TexCoords(v) => write_records(w, tag, v),
        GroupChunk::Batches(v) => write_records(w, tag, v),
        GroupChunk::BspNodes(v) => write_records(w, tag, v),
        GroupChunk::VertexColors(v) => write_records(w, tag, v),
        GroupChunk::Liquid(data) => w.write_chunk(tag, data),
        GroupChunk::Unknown(raw) => w.write_chunk(tag, &raw.data),
    }
}
