//! Integration tests for asset-convert
//!
//! Tests the full pipeline: encode a document -> run the tool -> check output

use asset_codec::terrain::TerrainDocument;
use asset_codec::wmo::{GroupBody, GroupChunk, GroupDocument, GroupFileChunk, GroupHeader};
use asset_codec::{Document, decode_document, encode_document};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn group() -> Document {
    Document::WmoGroup(GroupDocument {
        chunks: vec![
            GroupFileChunk::Version(17),
            GroupFileChunk::Group(GroupBody {
                header: GroupHeader {
                    group_id: 7,
                    ..GroupHeader::default()
                },
                chunks: vec![
                    GroupChunk::Vertices(vec![[0.0, 0.0, 0.0], [4.0, 0.0, 2.5]]),
                    GroupChunk::TexCoords(vec![[0.0, 0.0], [1.0, 0.5]]),
                    GroupChunk::TexCoords(vec![[0.25, 0.25], [0.0, 1.0]]),
                ],
            }),
        ],
    })
}

fn write_document(path: &Path, document: &Document) -> Vec<u8> {
    let bytes = encode_document(document).expect("Failed to encode");
    std::fs::write(path, &bytes).expect("Failed to write asset");
    bytes
}

// Helper to run asset-convert inside `dir`
fn asset_convert(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_asset-convert"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("Failed to run asset-convert")
}

#[test]
fn test_decode_then_encode_restores_bytes() {
    let dir = tempdir().expect("Failed to create temp dir");
    let wmo = dir.path().join("keep_000.wmo");
    let original = write_document(&wmo, &group());

    let out = asset_convert(dir.path(), &["decode", "keep_000.wmo"]);
    assert!(out.status.success(), "decode failed: {}", String::from_utf8_lossy(&out.stderr));
    let json_path = dir.path().join("keep_000.wmo.json");
    let json = std::fs::read_to_string(&json_path).expect("Failed to read JSON");
    assert!(json.contains("\"kind\": \"wmo_group\""));

    std::fs::remove_file(&wmo).unwrap();
    let out = asset_convert(dir.path(), &["encode", "keep_000.wmo.json"]);
    assert!(out.status.success(), "encode failed: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(std::fs::read(&wmo).unwrap(), original);
}

#[test]
fn test_explicit_output_paths() {
    let dir = tempdir().expect("Failed to create temp dir");
    let adt = dir.path().join("tile.adt");
    let original = write_document(&adt, &Document::Terrain(TerrainDocument::empty()));

    let out = asset_convert(dir.path(), &["decode", "tile.adt", "-o", "tile.txt"]);
    assert!(out.status.success());
    let out = asset_convert(dir.path(), &["encode", "tile.txt", "-o", "copy.bin"]);
    assert!(out.status.success());

    let copy = std::fs::read(dir.path().join("copy.bin")).unwrap();
    assert_eq!(copy, original);
    assert_eq!(decode_document(&copy).unwrap(), decode_document(&original).unwrap());
}

#[test]
fn test_verify() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_document(&dir.path().join("tile.adt"), &Document::Terrain(TerrainDocument::empty()));
    std::fs::write(dir.path().join("broken.adt"), b"REVM\x04\x00\x00\x00").unwrap();

    assert!(asset_convert(dir.path(), &["verify", "tile.adt"]).status.success());
    assert!(!asset_convert(dir.path(), &["verify", "broken.adt"]).status.success());
}

#[test]
fn test_batch_continues_past_failures() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("world");
    std::fs::create_dir_all(input.join("maps")).unwrap();
    write_document(&input.join("maps/tile.adt"), &Document::Terrain(TerrainDocument::empty()));
    write_document(&input.join("keep_000.wmo"), &group());
    std::fs::write(input.join("truncated.wmo"), b"REVM\x04\x00\x00").unwrap();
    std::fs::write(input.join("readme.txt"), b"not an asset").unwrap();

    let out = asset_convert(dir.path(), &["batch", "world", "--to", "json", "-o", "json"]);
    assert!(!out.status.success(), "a failed file must fail the batch");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("1 of 3 files failed"), "missing failure summary: {stderr}");

    let json = dir.path().join("json");
    assert!(json.join("maps/tile.adt.json").is_file());
    assert!(json.join("keep_000.wmo.json").is_file());
    assert!(!json.join("truncated.wmo.json").exists());
    assert!(!json.join("readme.txt.json").exists());

    // And back again
    let out = asset_convert(dir.path(), &["batch", "json", "--to", "binary", "-o", "binary"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(
        std::fs::read(dir.path().join("binary/keep_000.wmo")).unwrap(),
        std::fs::read(input.join("keep_000.wmo")).unwrap()
    );
    assert!(dir.path().join("binary/maps/tile.adt").is_file());
}

#[test]
fn test_config_file_is_read() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_document(&dir.path().join("keep_000.wmo"), &group());
    std::fs::write(dir.path().join("asset-convert.toml"), "[batch]\npretty = false\n").unwrap();

    let out = asset_convert(dir.path(), &["decode", "keep_000.wmo"]);
    assert!(out.status.success());
    let json = std::fs::read_to_string(dir.path().join("keep_000.wmo.json")).unwrap();
    assert!(json.starts_with(r#"{"kind":"wmo_group""#));

    std::fs::write(dir.path().join("bad.toml"), "[batch]\nthreads = 2\n").unwrap();
    let out = asset_convert(dir.path(), &["--config", "bad.toml", "verify", "keep_000.wmo"]);
    assert!(!out.status.success());
}
