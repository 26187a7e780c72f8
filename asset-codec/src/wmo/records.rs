//! Fixed-width records of object model roots

use chunk_core::{ChunkWriter, Cursor, Record, Result};
use serde::{Deserialize, Serialize};

/// `MOHD` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootHeader {
    pub n_materials: u32,
    pub n_groups: u32,
    pub n_portals: u32,
    pub n_lights: u32,
    pub n_doodad_names: u32,
    pub n_doodad_defs: u32,
    pub n_doodad_sets: u32,
    /// BGRA
    pub ambient_color: u32,
    pub wmo_id: u32,
    pub bbox_min: [f32; 3],
    pub bbox_max: [f32; 3],
    pub flags: u16,
    pub lod_count: u16,
}

impl Record for RootHeader {
    const SIZE: usize = 64;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            n_materials: cursor.read_u32()?,
            n_groups: cursor.read_u32()?,
            n_portals: cursor.read_u32()?,
            n_lights: cursor.read_u32()?,
            n_doodad_names: cursor.read_u32()?,
            n_doodad_defs: cursor.read_u32()?,
            n_doodad_sets: cursor.read_u32()?,
            ambient_color: cursor.read_u32()?,
            wmo_id: cursor.read_u32()?,
            bbox_min: cursor.read_vec3()?,
            bbox_max: cursor.read_vec3()?,
            flags: cursor.read_u16()?,
            lod_count: cursor.read_u16()?,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        w.write_u32(self.n_materials);
        w.write_u32(self.n_groups);
        w.write_u32(self.n_portals);
        w.write_u32(self.n_lights);
        w.write_u32(self.n_doodad_names);
        w.write_u32(self.n_doodad_defs);
        w.write_u32(self.n_doodad_sets);
        w.write_u32(self.ambient_color);
        w.write_u32(self.wmo_id);
        w.write_vec3(self.bbox_min);
        w.write_vec3(self.bbox_max);
        w.write_u16(self.flags);
        w.write_u16(self.lod_count);
    }
}

/// `MOMT` entry.
///
/// `texture_*` are byte offsets into `MOTX`. The `*_name` fields are filled
/// by name resolution and ignored on encode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub flags: u32,
    pub shader: u32,
    pub blend_mode: u32,
    pub texture_1: u32,
    pub sidn_color: u32,
    pub frame_sidn_color: u32,
    pub texture_2: u32,
    pub diff_color: u32,
    pub ground_type: u32,
    pub texture_3: u32,
    pub color_2: u32,
    pub flags_2: u32,
    pub runtime_data: [u32; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_1_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_2_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_3_name: Option<String>,
}

impl Record for Material {
    const SIZE: usize = 64;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        let mut material = Self {
            flags: cursor.read_u32()?,
            shader: cursor.read_u32()?,
            blend_mode: cursor.read_u32()?,
            texture_1: cursor.read_u32()?,
            sidn_color: cursor.read_u32()?,
            frame_sidn_color: cursor.read_u32()?,
            texture_2: cursor.read_u32()?,
            diff_color: cursor.read_u32()?,
            ground_type: cursor.read_u32()?,
            texture_3: cursor.read_u32()?,
            color_2: cursor.read_u32()?,
            flags_2: cursor.read_u32()?,
            ..Self::default()
        };
        for word in &mut material.runtime_data {
            *word = cursor.read_u32()?;
        }
        Ok(material)
    }

    fn write(&self, w: &mut ChunkWriter) {
        for v in [
            self.flags,
            self.shader,
            self.blend_mode,
            self.texture_1,
            self.sidn_color,
            self.frame_sidn_color,
            self.texture_2,
            self.diff_color,
            self.ground_type,
            self.texture_3,
            self.color_2,
            self.flags_2,
        ] {
            w.write_u32(v);
        }
        for &v in &self.runtime_data {
            w.write_u32(v);
        }
    }
}

/// `MOGI` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub flags: u32,
    pub bbox_min: [f32; 3],
    pub bbox_max: [f32; 3],
    /// Byte offset into `MOGN`, -1 for none
    pub name_offset: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Record for GroupInfo {
    const SIZE: usize = 32;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            flags: cursor.read_u32()?,
            bbox_min: cursor.read_vec3()?,
            bbox_max: cursor.read_vec3()?,
            name_offset: cursor.read_i32()?,
            name: None,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        w.write_u32(self.flags);
        w.write_vec3(self.bbox_min);
        w.write_vec3(self.bbox_max);
        w.write_i32(self.name_offset);
    }
}

/// `MOPT` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    /// First vertex in `MOPV`
    pub start_vertex: u16,
    pub vertex_count: u16,
    /// Normal then distance
    pub plane: [f32; 4],
}

impl Record for Portal {
    const SIZE: usize = 20;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            start_vertex: cursor.read_u16()?,
            vertex_count: cursor.read_u16()?,
            plane: <[f32; 4]>::read(cursor)?,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        w.write_u16(self.start_vertex);
        w.write_u16(self.vertex_count);
        self.plane.write(w);
    }
}

/// `MOPR` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalRef {
    pub portal_index: u16,
    pub group_index: u16,
    /// Which side of the portal plane the group is on
    pub side: i16,
    #[serde(default)]
    pub padding: u16,
}

impl Record for PortalRef {
    const SIZE: usize = 8;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            portal_index: cursor.read_u16()?,
            group_index: cursor.read_u16()?,
            side: cursor.read_i16()?,
            padding: cursor.read_u16()?,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        w.write_u16(self.portal_index);
        w.write_u16(self.group_index);
        w.write_i16(self.side);
        w.write_u16(self.padding);
    }
}

/// `MOVB` entry: a run of `MOVV` vertices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleBlock {
    pub first_vertex: u16,
    pub count: u16,
}

impl Record for VisibleBlock {
    const SIZE: usize = 4;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            first_vertex: cursor.read_u16()?,
            count: cursor.read_u16()?,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        w.write_u16(self.first_vertex);
        w.write_u16(self.count);
    }
}

/// `MOLT` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub kind: u8,
    pub use_attenuation: u8,
    #[serde(default)]
    pub padding: u16,
    /// BGRA
    pub color: u32,
    pub position: [f32; 3],
    pub intensity: f32,
    pub attenuation_start: f32,
    pub attenuation_end: f32,
    pub unknown: [f32; 4],
}

impl Record for Light {
    const SIZE: usize = 48;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            kind: cursor.read_u8()?,
            use_attenuation: cursor.read_u8()?,
            padding: cursor.read_u16()?,
            color: cursor.read_u32()?,
            position: cursor.read_vec3()?,
            intensity: cursor.read_f32()?,
            attenuation_start: cursor.read_f32()?,
            attenuation_end: cursor.read_f32()?,
            unknown: <[f32; 4]>::read(cursor)?,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        w.write_u8(self.kind);
        w.write_u8(self.use_attenuation);
        w.write_u16(self.padding);
        w.write_u32(self.color);
        w.write_vec3(self.position);
        w.write_f32(self.intensity);
        w.write_f32(self.attenuation_start);
        w.write_f32(self.attenuation_end);
        self.unknown.write(w);
    }
}

/// Width of the fixed name field of a doodad set
pub const DOODAD_SET_NAME_LEN: usize = 20;

/// `MODS` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoodadSet {
    /// Null-padded to 20 bytes on disk
    pub name: String,
    /// First entry in `MODD`
    pub first_instance: u32,
    pub count: u32,
    #[serde(default)]
    pub padding: u32,
}

impl Record for DoodadSet {
    const SIZE: usize = 32;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        let raw = cursor.read_bytes(DOODAD_SET_NAME_LEN)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Ok(Self {
            name: String::from_utf8_lossy(&raw[..end]).into_owned(),
            first_instance: cursor.read_u32()?,
            count: cursor.read_u32()?,
            padding: cursor.read_u32()?,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        let name = self.name.as_bytes();
        let len = name.len().min(DOODAD_SET_NAME_LEN);
        w.write_bytes(&name[..len]);
        w.write_zeros(DOODAD_SET_NAME_LEN - len);
        w.write_u32(self.first_instance);
        w.write_u32(self.count);
        w.write_u32(self.padding);
    }
}

/// Largest value of the 24-bit doodad name offset
pub const MAX_DOODAD_NAME_OFFSET: u32 = 0x00FF_FFFF;

/// `MODD` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoodadDef {
    /// Byte offset into `MODN` (low 24 bits on disk)
    pub name_offset: u32,
    /// High 8 bits on disk
    pub flags: u8,
    pub position: [f32; 3],
    /// Quaternion
    pub rotation: [f32; 4],
    pub scale: f32,
    /// BGRA
    pub color: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Record for DoodadDef {
    const SIZE: usize = 40;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        let packed = cursor.read_u32()?;
        Ok(Self {
            name_offset: packed & MAX_DOODAD_NAME_OFFSET,
            flags: (packed >> 24) as u8,
            position: cursor.read_vec3()?,
            rotation: <[f32; 4]>::read(cursor)?,
            scale: cursor.read_f32()?,
            color: cursor.read_u32()?,
            name: None,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        w.write_u32((self.name_offset & MAX_DOODAD_NAME_OFFSET) | ((self.flags as u32) << 24));
        w.write_vec3(self.position);
        self.rotation.write(w);
        w.write_f32(self.scale);
        w.write_u32(self.color);
    }
}

/// `MFOG` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    pub flags: u32,
    pub position: [f32; 3],
    pub small_radius: f32,
    pub large_radius: f32,
    pub fog_end: f32,
    pub fog_start_multiplier: f32,
    pub color: u32,
    pub underwater_end: f32,
    pub underwater_start_multiplier: f32,
    pub underwater_color: u32,
}

impl Record for Fog {
    const SIZE: usize = 48;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            flags: cursor.read_u32()?,
            position: cursor.read_vec3()?,
            small_radius: cursor.read_f32()?,
            large_radius: cursor.read_f32()?,
            fog_end: cursor.read_f32()?,
            fog_start_multiplier: cursor.read_f32()?,
            color: cursor.read_u32()?,
            underwater_end: cursor.read_f32()?,
            underwater_start_multiplier: cursor.read_f32()?,
            underwater_color: cursor.read_u32()?,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        w.write_u32(self.flags);
        w.write_vec3(self.position);
        w.write_f32(self.small_radius);
        w.write_f32(self.large_radius);
        w.write_f32(self.fog_end);
        w.write_f32(self.fog_start_multiplier);
        w.write_u32(self.color);
        w.write_f32(self.underwater_end);
        w.write_f32(self.underwater_start_multiplier);
        w.write_u32(self.underwater_color);
    }
}
