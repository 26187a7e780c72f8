//! Document-level round trips through the boundary operations

use asset_codec::terrain::{
    LayerFlags, TILE_COUNT, TerrainChunk, TerrainDocument, TextureLayer, Tile, TileFlags,
    TileReferences, VERTEX_COUNT,
};
use asset_codec::wmo::{
    GroupBody, GroupChunk, GroupDocument, GroupFileChunk, GroupHeader, RootChunk, RootDocument,
    RootHeader,
};
use asset_codec::{
    AlphaEncoding, AlphaMap, CodecOptions, Document, DocumentKind, Error, ErrorKind, StringTable,
    Tag, decode_document, decode_document_with, detect_kind, encode_document,
};
use chunk_core::Cursor;

/// Tiles of varying shape so every tile has a different size.
fn terrain() -> TerrainDocument {
    let mut document = TerrainDocument::empty();
    document.chunks[3] = TerrainChunk::Textures(StringTable::from_strings([
        "tileset\\dirt.blp",
        "tileset\\grass.blp",
        "tileset\\rock.blp",
    ]));

    for (i, tile) in document.tiles.iter_mut().enumerate() {
        let i = i as u32;
        tile.index_flags = i % 3;
        tile.async_id = i * 2;
        tile.header.area_id = 40 + i % 7;
        tile.header.position = [i as f32 * -33.25, i as f32 * 33.25, (i % 11) as f32];
        if i % 2 == 0 {
            tile.header.flags.insert(TileFlags::DO_NOT_FIX_ALPHA);
        }
        tile.heights = Some((0..VERTEX_COUNT).map(|v| (v as u32 + i) as f32 * 0.125).collect());
        tile.normals = Some(vec![[0, 0, 127]; VERTEX_COUNT]);

        let layers = (i % 4) as usize;
        let mut list = vec![TextureLayer {
            texture_id: 0,
            flags: LayerFlags::empty(),
            alpha_offset: 0,
            effect_id: 0,
            alpha: None,
        }];
        for l in 1..=layers {
            let values: Vec<u8> = (0..4096u32).map(|c| ((c / 64) * (l as u32 + i)) as u8).collect();
            list.push(TextureLayer {
                texture_id: (l % 3) as u32,
                flags: LayerFlags::empty(),
                alpha_offset: 0,
                effect_id: 0,
                alpha: Some(AlphaMap {
                    encoding: AlphaEncoding::Compressed,
                    values,
                }),
            });
        }
        tile.layers = Some(list);
        tile.has_alpha_chunk = layers > 0;
        if i % 5 == 0 {
            tile.references = Some(TileReferences {
                doodads: (0..i % 4).collect(),
                objects: vec![i],
            });
        }
        if i % 7 == 0 {
            tile.liquid = Some(vec![i as u8; 16]);
        }
    }
    document
}

/// Every `MCNK` in the file as (offset, total size), in file order.
fn tile_chunks(bytes: &[u8]) -> Vec<(u32, u32)> {
    let mut cursor = Cursor::new(bytes);
    let mut tiles = Vec::new();
    while let Some((header, _)) = cursor.next_chunk().unwrap() {
        if header.tag == Tag::new(b"MCNK") {
            tiles.push((header.offset as u32, header.total_size() as u32));
        }
    }
    tiles
}

/// (offset of the `MCIN` payload, entries)
fn tile_index(bytes: &[u8]) -> (usize, Vec<(u32, u32)>) {
    let mut cursor = Cursor::new(bytes);
    while let Some((header, mut payload)) = cursor.next_chunk().unwrap() {
        if header.tag != Tag::new(b"MCIN") {
            continue;
        }
        let mut entries = Vec::new();
        for _ in 0..TILE_COUNT {
            let offset = payload.read_u32().unwrap();
            let size = payload.read_u32().unwrap();
            payload.skip(8).unwrap();
            entries.push((offset, size));
        }
        return (header.payload_offset(), entries);
    }
    panic!("no MCIN");
}

#[test]
fn test_index_matches_tile_positions() {
    let document = Document::Terrain(terrain());
    let bytes = encode_document(&document).unwrap();

    let (_, index) = tile_index(&bytes);
    let actual = tile_chunks(&bytes);
    assert_eq!(index.len(), TILE_COUNT);
    assert_eq!(index, actual);

    for (offset, size) in index {
        let tag_end = offset as usize + 4;
        assert_eq!(&bytes[offset as usize..tag_end], b"KNCM");
        let length = u32::from_le_bytes(bytes[tag_end..tag_end + 4].try_into().unwrap());
        assert_eq!(size, length + 8);
    }
}

#[test]
fn test_index_pointing_at_wrong_tag_fails() {
    let bytes = encode_document(&Document::Terrain(terrain())).unwrap();
    let (index_at, entries) = tile_index(&bytes);

    // Point entry 5 at tile 4's height sub-chunk
    let wrong = entries[4].0 + 8 + 128;
    assert_eq!(&bytes[wrong as usize..wrong as usize + 4], b"TVCM");
    let mut corrupt = bytes.clone();
    let slot = index_at + 5 * 16;
    corrupt[slot..slot + 4].copy_from_slice(&wrong.to_le_bytes());

    let err = decode_document(&corrupt).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(matches!(err, Error::TagMismatch { .. }));
}

#[test]
fn test_terrain_roundtrip() {
    let bytes = encode_document(&Document::Terrain(terrain())).unwrap();
    let first = decode_document(&bytes).unwrap();
    assert_eq!(first.kind(), DocumentKind::Terrain);

    let again = decode_document(&encode_document(&first).unwrap()).unwrap();
    assert_eq!(again, first);
    assert_eq!(encode_document(&first).unwrap(), bytes);
}

#[test]
fn test_text_interchange_roundtrip() {
    let bytes = encode_document(&Document::Terrain(terrain())).unwrap();
    let document = decode_document(&bytes).unwrap();

    let json = serde_json::to_string(&document).unwrap();
    assert!(json.starts_with(r#"{"kind":"terrain""#));
    let parsed: Document = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, document);
    assert_eq!(encode_document(&parsed).unwrap(), bytes);
}

fn root() -> RootDocument {
    RootDocument {
        chunks: vec![
            RootChunk::Version(17),
            RootChunk::Header(RootHeader {
                n_groups: 0,
                wmo_id: 9,
                ..RootHeader::default()
            }),
            RootChunk::Textures(StringTable::from_strings(["a.blp", "b.blp"])),
            RootChunk::GroupNames(StringTable::default()),
        ],
    }
}

fn group() -> GroupDocument {
    GroupDocument {
        chunks: vec![
            GroupFileChunk::Version(17),
            GroupFileChunk::Group(GroupBody {
                header: GroupHeader {
                    group_id: 3,
                    ..GroupHeader::default()
                },
                chunks: vec![
                    GroupChunk::Vertices(vec![[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]]),
                    GroupChunk::TexCoords(vec![[0.0, 0.0], [1.0, 1.0]]),
                    GroupChunk::TexCoords(vec![[0.5, 0.5], [0.0, 1.0]]),
                ],
            }),
        ],
    }
}

#[test]
fn test_object_model_documents_roundtrip() {
    for document in [Document::WmoRoot(root()), Document::WmoGroup(group())] {
        let bytes = encode_document(&document).unwrap();
        let decoded = decode_document(&bytes).unwrap();
        assert_eq!(decoded.kind(), document.kind());
        assert_eq!(encode_document(&decoded).unwrap(), bytes);

        let json = serde_json::to_string_pretty(&decoded).unwrap();
        let parsed: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, decoded);
    }
}

#[test]
fn test_detection() {
    let terrain = encode_document(&Document::Terrain(TerrainDocument::empty())).unwrap();
    assert_eq!(detect_kind(&terrain).unwrap(), DocumentKind::Terrain);
    let root = encode_document(&Document::WmoRoot(root())).unwrap();
    assert_eq!(detect_kind(&root).unwrap(), DocumentKind::WmoRoot);
    let group = encode_document(&Document::WmoGroup(group())).unwrap();
    assert_eq!(detect_kind(&group).unwrap(), DocumentKind::WmoGroup);

    // Only the version chunk
    let err = decode_document_with(&root[..12], &CodecOptions::default()).unwrap_err();
    assert_eq!(err, Error::UnrecognizedDocument);

    // Truncated mid-chunk
    let err = decode_document(&root[..root.len() - 3]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}
