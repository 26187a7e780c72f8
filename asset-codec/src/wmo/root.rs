//! Object model root documents

use chunk_core::{
    ChunkHeader, ChunkWriter, Cursor, Error, RawChunk, Record, Result, StringTable, Tag,
    read_records, write_records,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::records::{
    DOODAD_SET_NAME_LEN, DoodadDef, DoodadSet, Fog, GroupInfo, Light, MAX_DOODAD_NAME_OFFSET,
    Material, Portal, PortalRef, RootHeader, VisibleBlock,
};
use crate::options::CodecOptions;
use crate::tags::{
    MCVP, MFOG, MODD, MODN, MODS, MOGI, MOGN, MOHD, MOLT, MOMT, MOPR, MOPT, MOPV, MOSB, MOTX,
    MOVB, MOVV, MVER,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootDocument {
    /// Top-level chunks in file order
    pub chunks: Vec<RootChunk>,
}

/// One top-level chunk of a root document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootChunk {
    Version(u32),
    Header(RootHeader),
    Textures(StringTable),
    Materials(Vec<Material>),
    GroupNames(StringTable),
    GroupInfo(Vec<GroupInfo>),
    Skybox(StringTable),
    PortalVertices(Vec<[f32; 3]>),
    Portals(Vec<Portal>),
    PortalRefs(Vec<PortalRef>),
    VisibleVertices(Vec<[f32; 3]>),
    VisibleBlocks(Vec<VisibleBlock>),
    Lights(Vec<Light>),
    DoodadSets(Vec<DoodadSet>),
    DoodadNames(StringTable),
    Doodads(Vec<DoodadDef>),
    Fogs(Vec<Fog>),
    ConvexPlanes(Vec<[f32; 4]>),
    Unknown(RawChunk),
}

impl RootChunk {
    pub fn tag(&self) -> Tag {
        match self {
            RootChunk::Version(_) => MVER,
            RootChunk::Header(_) => MOHD,
            RootChunk::Textures(_) => MOTX,
            RootChunk::Materials(_) => MOMT,
            RootChunk::GroupNames(_) => MOGN,
            RootChunk::GroupInfo(_) => MOGI,
            RootChunk::Skybox(_) => MOSB,
            RootChunk::PortalVertices(_) => MOPV,
            RootChunk::Portals(_) => MOPT,
            RootChunk::PortalRefs(_) => MOPR,
            RootChunk::VisibleVertices(_) => MOVV,
            RootChunk::VisibleBlocks(_) => MOVB,
            RootChunk::Lights(_) => MOLT,
            RootChunk::DoodadSets(_) => MODS,
            RootChunk::DoodadNames(_) => MODN,
            RootChunk::Doodads(_) => MODD,
            RootChunk::Fogs(_) => MFOG,
            RootChunk::ConvexPlanes(_) => MCVP,
            RootChunk::Unknown(raw) => raw.tag,
        }
    }
}

impl RootDocument {
    pub fn header(&self) -> Option<&RootHeader> {
        self.chunks.iter().find_map(|chunk| match chunk {
            RootChunk::Header(header) => Some(header),
            _ => None,
        })
    }

    fn string_table(&self, tag: Tag) -> Option<&StringTable> {
        self.chunks.iter().find_map(|chunk| match chunk {
            RootChunk::Textures(t) | RootChunk::GroupNames(t) | RootChunk::DoodadNames(t)
                if chunk.tag() == tag =>
            {
                Some(t)
            }
            _ => None,
        })
    }

    /// Fill the informational name fields from the string tables.
    ///
    /// Fails with a reference error when an offset lies outside its table.
    pub fn resolve_names(&mut self) -> Result<()> {
        let textures = self.string_table(MOTX).cloned();
        let group_names = self.string_table(MOGN).cloned();
        let doodad_names = self.string_table(MODN).cloned();

        for chunk in &mut self.chunks {
            match chunk {
                RootChunk::Materials(materials) => {
                    for m in materials {
                        let table = textures.as_ref();
                        m.texture_1_name = lookup(table, m.texture_1, "material texture 1")?;
                        m.texture_2_name = lookup(table, m.texture_2, "material texture 2")?;
                        m.texture_3_name = lookup(table, m.texture_3, "material texture 3")?;
                    }
                }
                RootChunk::GroupInfo(infos) => {
                    for info in infos {
                        info.name = match u32::try_from(info.name_offset) {
                            Ok(offset) => lookup(group_names.as_ref(), offset, "group name")?,
                            Err(_) => None,
                        };
                    }
                }
                RootChunk::Doodads(defs) => {
                    for def in defs {
                        def.name = lookup(doodad_names.as_ref(), def.name_offset, "doodad name")?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Header counts must match the arrays they describe.
    fn check_counts(&self) -> Result<()> {
        let Some(header) = self.header() else {
            return Ok(());
        };
        for chunk in &self.chunks {
            let (declared, actual, context) = match chunk {
                RootChunk::Materials(v) => (header.n_materials, v.len(), "material count"),
                RootChunk::GroupInfo(v) => (header.n_groups, v.len(), "group count"),
                RootChunk::Portals(v) => (header.n_portals, v.len(), "portal count"),
                RootChunk::Lights(v) => (header.n_lights, v.len(), "light count"),
                RootChunk::Doodads(v) => (header.n_doodad_defs, v.len(), "doodad count"),
                RootChunk::DoodadSets(v) => (header.n_doodad_sets, v.len(), "doodad set count"),
                _ => continue,
            };
            if declared as usize != actual {
                return Err(Error::validation(
                    context,
                    format!("header declares {}, {} holds {}", declared, chunk.tag(), actual),
                ));
            }
        }
        Ok(())
    }

    /// Fields whose on-disk width is narrower than their structured type.
    fn check_field_widths(&self) -> Result<()> {
        for chunk in &self.chunks {
            match chunk {
                RootChunk::DoodadSets(sets) => {
                    if let Some(set) = sets.iter().find(|s| s.name.len() > DOODAD_SET_NAME_LEN) {
                        return Err(Error::validation(
                            "doodad set name",
                            format!("{:?} exceeds {} bytes", set.name, DOODAD_SET_NAME_LEN),
                        ));
                    }
                }
                RootChunk::Doodads(defs) => {
                    if let Some(def) = defs.iter().find(|d| d.name_offset > MAX_DOODAD_NAME_OFFSET) {
                        return Err(Error::validation(
                            "doodad name offset",
                            format!("{:#x} does not fit in 24 bits", def.name_offset),
                        ));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Resolve `offset` in `table`. A zero offset into an empty or absent table
/// means no name.
fn lookup(table: Option<&StringTable>, offset: u32, context: &'static str) -> Result<Option<String>> {
    let Some(table) = table.filter(|t| t.byte_len() > 0) else {
        if offset == 0 {
            return Ok(None);
        }
        return Err(Error::Reference {
            context,
            offset: offset as usize,
            len: 0,
        });
    };
    Ok(Some(table.resolve(offset, context)?.to_owned()))
}

pub fn decode_root(data: &[u8], options: &CodecOptions) -> Result<RootDocument> {
    let mut cursor = Cursor::new(data).sanitizing_floats(options.sanitize_floats);
    let mut chunks = Vec::new();
    while let Some((header, payload)) = cursor.next_chunk()? {
        chunks.push(decode_chunk(&header, payload)?);
    }

    let mut document = RootDocument { chunks };
    if options.resolve_names {
        document.resolve_names()?;
    }
    debug!(chunks = document.chunks.len(), "decoded object model root");
    Ok(document)
}

fn decode_chunk(header: &ChunkHeader, mut payload: Cursor<'_>) -> Result<RootChunk> {
    debug!(tag = %header.tag, offset = header.offset, length = header.length, "root chunk");
    Ok(match header.tag {
        MVER => RootChunk::Version(payload.read_u32()?),
        MOHD => RootChunk::Header(RootHeader::read(&mut payload)?),
        MOTX => RootChunk::Textures(StringTable::parse(payload.rest())),
        MOMT => RootChunk::Materials(read_records(header, payload)?),
        MOGN => RootChunk::GroupNames(StringTable::parse(payload.rest())),
        MOGI => RootChunk::GroupInfo(read_records(header, payload)?),
        MOSB => RootChunk::Skybox(StringTable::parse(payload.rest())),
        MOPV => RootChunk::PortalVertices(read_records(header, payload)?),
        MOPT => RootChunk::Portals(read_records(header, payload)?),
        MOPR => RootChunk::PortalRefs(read_records(header, payload)?),
        MOVV => RootChunk::VisibleVertices(read_records(header, payload)?),
        MOVB => RootChunk::VisibleBlocks(read_records(header, payload)?),
        MOLT => RootChunk::Lights(read_records(header, payload)?),
        MODS => RootChunk::DoodadSets(read_records(header, payload)?),
        MODN => RootChunk::DoodadNames(StringTable::parse(payload.rest())),
        MODD => RootChunk::Doodads(read_records(header, payload)?),
        MFOG => RootChunk::Fogs(read_records(header, payload)?),
        MCVP => RootChunk::ConvexPlanes(read_records(header, payload)?),
        tag => {
            warn!(%tag, offset = header.offset, "preserving unknown root chunk");
            RootChunk::Unknown(RawChunk {
                tag,
                data: payload.rest().to_vec(),
            })
        }
    })
}

pub fn encode_root(document: &RootDocument, options: &CodecOptions) -> Result<Vec<u8>> {
    if options.validate_counts {
        document.check_counts()?;
    }
    document.check_field_widths()?;

    let mut w = ChunkWriter::new();
    for chunk in &document.chunks {
        let tag = chunk.tag();
        match chunk {
            RootChunk::Version(version) => write_records(&mut w, tag, std::slice::from_ref(version))?,
            RootChunk::Header(header) => write_records(&mut w, tag, std::slice::from_ref(header))?,
            RootChunk::Textures(table)
            | RootChunk::GroupNames(table)
            | RootChunk::Skybox(table)
            | RootChunk::DoodadNames(table) => w.write_chunk(tag, &table.to_bytes()?)?,
            RootChunk::Materials(v) => write_records(&mut w, tag, v)?,
            RootChunk::GroupInfo(v) => write_records(&mut w, tag, v)?,
            RootChunk::PortalVertices(v) | RootChunk::VisibleVertices(v) => {
                write_records(&mut w, tag, v)?
            }
            RootChunk::Portals(v) => write_records(&mut w, tag, v)?,
            RootChunk::PortalRefs(v) => write_records(&mut w, tag, v)?,
            RootChunk::VisibleBlocks(v) => write_records(&mut w, tag, v)?,
            RootChunk::Lights(v) => write_records(&mut w, tag, v)?,
            RootChunk::DoodadSets(v) => write_records(&mut w, tag, v)?,
            RootChunk::Doodads(v) => write_records(&mut w, tag, v)?,
            RootChunk::Fogs(v) => write_records(&mut w, tag, v)?,
            RootChunk::ConvexPlanes(v) => write_records(&mut w, tag, v)?,
            RootChunk::Unknown(raw) => w.write_chunk(tag, &raw.data)?,
        }
    }
    debug!(bytes = w.position(), "encoded object model root");
    Ok(w.into_bytes())
}
