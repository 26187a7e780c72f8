//! Fixed-width records of terrain tile files

use chunk_core::{ChunkWriter, Cursor, Record, Result, Tag};
use serde::{Deserialize, Serialize};

use crate::tags::{MCIN, MDDF, MFBO, MH2O, MMDX, MMID, MODF, MTEX, MTXF, MWID, MWMO};

/// Chunks addressed by the file header, in header field order.
pub const HEADER_TARGETS: [Tag; 11] = [
    MCIN, MTEX, MMDX, MMID, MWMO, MWID, MDDF, MODF, MFBO, MH2O, MTXF,
];

/// `MHDR` payload.
///
/// Offset fields are not stored: they are recomputed from the actual chunk
/// positions on every encode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapHeader {
    pub flags: u32,
    #[serde(default)]
    pub reserved: [u32; 4],
}

impl MapHeader {
    pub const SIZE: usize = 64;

    pub fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        let flags = cursor.read_u32()?;
        cursor.skip(HEADER_TARGETS.len() * 4)?;
        let mut reserved = [0u32; 4];
        for word in &mut reserved {
            *word = cursor.read_u32()?;
        }
        Ok(Self { flags, reserved })
    }

    /// Serialize with offsets relative to the header payload start.
    pub fn to_bytes(&self, offsets: &[u32; 11]) -> Vec<u8> {
        let mut w = ChunkWriter::with_capacity(Self::SIZE);
        w.write_u32(self.flags);
        for &offset in offsets {
            w.write_u32(offset);
        }
        for &word in &self.reserved {
            w.write_u32(word);
        }
        w.into_bytes()
    }
}

/// One `MCIN` entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileIndexEntry {
    /// Absolute offset of the tile's tag
    pub offset: u32,
    /// Whole tile chunk including framing
    pub size: u32,
    pub flags: u32,
    pub async_id: u32,
}

impl Record for TileIndexEntry {
    const SIZE: usize = 16;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            offset: cursor.read_u32()?,
            size: cursor.read_u32()?,
            flags: cursor.read_u32()?,
            async_id: cursor.read_u32()?,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        w.write_u32(self.offset);
        w.write_u32(self.size);
        w.write_u32(self.flags);
        w.write_u32(self.async_id);
    }
}

/// `MDDF` entry: one placed doodad model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoodadPlacement {
    /// Index into `MMID`
    pub name_id: u32,
    pub unique_id: u32,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    /// Fixed point, 1024 = 1.0
    pub scale: u16,
    pub flags: u16,
}

impl Record for DoodadPlacement {
    const SIZE: usize = 36;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            name_id: cursor.read_u32()?,
            unique_id: cursor.read_u32()?,
            position: cursor.read_vec3()?,
            rotation: cursor.read_vec3()?,
            scale: cursor.read_u16()?,
            flags: cursor.read_u16()?,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        w.write_u32(self.name_id);
        w.write_u32(self.unique_id);
        w.write_vec3(self.position);
        w.write_vec3(self.rotation);
        w.write_u16(self.scale);
        w.write_u16(self.flags);
    }
}

/// `MODF` entry: one placed object model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WmoPlacement {
    /// Index into `MWID`
    pub name_id: u32,
    pub unique_id: u32,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub extents_min: [f32; 3],
    pub extents_max: [f32; 3],
    pub flags: u16,
    pub doodad_set: u16,
    pub name_set: u16,
    pub scale: u16,
}

impl Record for WmoPlacement {
    const SIZE: usize = 64;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            name_id: cursor.read_u32()?,
            unique_id: cursor.read_u32()?,
            position: cursor.read_vec3()?,
            rotation: cursor.read_vec3()?,
            extents_min: cursor.read_vec3()?,
            extents_max: cursor.read_vec3()?,
            flags: cursor.read_u16()?,
            doodad_set: cursor.read_u16()?,
            name_set: cursor.read_u16()?,
            scale: cursor.read_u16()?,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        w.write_u32(self.name_id);
        w.write_u32(self.unique_id);
        w.write_vec3(self.position);
        w.write_vec3(self.rotation);
        w.write_vec3(self.extents_min);
        w.write_vec3(self.extents_max);
        w.write_u16(self.flags);
        w.write_u16(self.doodad_set);
        w.write_u16(self.name_set);
        w.write_u16(self.scale);
    }
}

/// `MFBO` payload: flight ceiling and floor planes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightBounds {
    pub maximum: [i16; 9],
    pub minimum: [i16; 9],
}

impl Record for FlightBounds {
    const SIZE: usize = 36;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        let mut bounds = Self::default();
        for v in bounds.maximum.iter_mut().chain(bounds.minimum.iter_mut()) {
            *v = cursor.read_i16()?;
        }
        Ok(bounds)
    }

    fn write(&self, w: &mut ChunkWriter) {
        for &v in self.maximum.iter().chain(&self.minimum) {
            w.write_i16(v);
        }
    }
}

/// `MCSE` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundEmitter {
    pub sound_point_id: u32,
    pub sound_name_id: u32,
    pub position: [f32; 3],
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Record for SoundEmitter {
    const SIZE: usize = 28;

    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            sound_point_id: cursor.read_u32()?,
            sound_name_id: cursor.read_u32()?,
            position: cursor.read_vec3()?,
            min_distance: cursor.read_f32()?,
            max_distance: cursor.read_f32()?,
        })
    }

    fn write(&self, w: &mut ChunkWriter) {
        w.write_u32(self.sound_point_id);
        w.write_u32(self.sound_name_id);
        w.write_vec3(self.position);
        w.write_f32(self.min_distance);
        w.write_f32(self.max_distance);
    }
}
