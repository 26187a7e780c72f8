//! Object model documents (WMO-style, version 17)
//!
//! An object model is split across files: one root holding materials, group
//! infos, portals, lights, doodads and fogs, plus one file per group holding
//! that group's geometry inside a single `MOGP` container. Each file is
//! decoded on its own; the root's name tables resolve only references made
//! from within the root.

mod group;
mod records;
mod root;


pub use group::{
    Batch, BspNode, GroupBody, GroupChunk, GroupDocument, GroupFileChunk, GroupHeader,
    TriangleMaterial, decode_group, encode_group,
};
pub use records::{
    DOODAD_SET_NAME_LEN, DoodadDef, DoodadSet, Fog, GroupInfo, Light, MAX_DOODAD_NAME_OFFSET,
    Material, Portal, PortalRef, RootHeader, VisibleBlock,
};
pub use root::{RootChunk, RootDocument, decode_root, encode_root};
