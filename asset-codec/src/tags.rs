//! Logical chunk tags

use chunk_core::Tag;

pub const MVER: Tag = Tag::new(b"MVER");

// =============================================================================
// Terrain tile file
// =============================================================================

pub const MHDR: Tag = Tag::new(b"MHDR");
pub const MCIN: Tag = Tag::new(b"MCIN");
pub const MTEX: Tag = Tag::new(b"MTEX");
pub const MMDX: Tag = Tag::new(b"MMDX");
pub const MMID: Tag = Tag::new(b"MMID");
pub const MWMO: Tag = Tag::new(b"MWMO");
pub const MWID: Tag = Tag::new(b"MWID");
pub const MDDF: Tag = Tag::new(b"MDDF");
pub const MODF: Tag = Tag::new(b"MODF");
pub const MH2O: Tag = Tag::new(b"MH2O");
pub const MFBO: Tag = Tag::new(b"MFBO");
pub const MTXF: Tag = Tag::new(b"MTXF");
pub const MCNK: Tag = Tag::new(b"MCNK");

// Tile sub-chunks
pub const MCVT: Tag = Tag::new(b"MCVT");
pub const MCNR: Tag = Tag::new(b"MCNR");
pub const MCLY: Tag = Tag::new(b"MCLY");
pub const MCRF: Tag = Tag::new(b"MCRF");
pub const MCSH: Tag = Tag::new(b"MCSH");
pub const MCAL: Tag = Tag::new(b"MCAL");
pub const MCSE: Tag = Tag::new(b"MCSE");
pub const MCLQ: Tag = Tag::new(b"MCLQ");
pub const MCCV: Tag = Tag::new(b"MCCV");

// =============================================================================
// Object model root
// =============================================================================

pub const MOHD: Tag = Tag::new(b"MOHD");
pub const MOTX: Tag = Tag::new(b"MOTX");
pub const MOMT: Tag = Tag::new(b"MOMT");
pub const MOGN: Tag = Tag::new(b"MOGN");
pub const MOGI: Tag = Tag::new(b"MOGI");
pub const MOSB: Tag = Tag::new(b"MOSB");
pub const MOPV: Tag = Tag::new(b"MOPV");
pub const MOPT: Tag = Tag::new(b"MOPT");
pub const MOPR: Tag = Tag::new(b"MOPR");
pub const MOVV: Tag = Tag::new(b"MOVV");
pub const MOVB: Tag = Tag::new(b"MOVB");
pub const MOLT: Tag = Tag::new(b"MOLT");
pub const MODS: Tag = Tag::new(b"MODS");
pub const MODN: Tag = Tag::new(b"MODN");
pub const MODD: Tag = Tag::new(b"MODD");
pub const MFOG: Tag = Tag::new(b"MFOG");
pub const MCVP: Tag = Tag::new(b"MCVP");

// =============================================================================
// Object model group
// =============================================================================

pub const MOGP: Tag = Tag::new(b"MOGP");
pub const MOPY: Tag = Tag::new(b"MOPY");
pub const MOVI: Tag = Tag::new(b"MOVI");
pub const MOVT: Tag = Tag::new(b"MOVT");
pub const MONR: Tag = Tag::new(b"MONR");
pub const MOTV: Tag = Tag::new(b"MOTV");
pub const MOBA: Tag = Tag::new(b"MOBA");
pub const MOLR: Tag = Tag::new(b"MOLR");
pub const MODR: Tag = Tag::new(b"MODR");
pub const MOBN: Tag = Tag::new(b"MOBN");
pub const MOBR: Tag = Tag::new(b"MOBR");
pub const MOCV: Tag = Tag::new(b"MOCV");
pub const MLIQ: Tag = Tag::new(b"MLIQ");
