//! Single-file conversions between binary assets and JSON

use anyhow::{Context, Result};
use asset_codec::{CodecOptions, Document, DocumentKind, decode_document_with, encode_document_with};
use std::path::{Path, PathBuf};

/// Binary extension for a document kind
pub fn binary_extension(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Terrain => "adt",
        DocumentKind::WmoRoot | DocumentKind::WmoGroup => "wmo",
    }
}

/// `terrain.adt` -> `terrain.adt.json`
pub fn json_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

/// `terrain.adt.json` -> `terrain.adt`; a bare `terrain.json` takes the
/// document's binary extension.
pub fn binary_path(input: &Path, kind: DocumentKind) -> PathBuf {
    let stem = input.with_extension("");
    if stem.extension().is_some() {
        stem
    } else {
        stem.with_extension(binary_extension(kind))
    }
}

pub fn read_binary(path: &Path, options: &CodecOptions) -> Result<Document> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    decode_document_with(&data, options)
        .with_context(|| format!("Failed to decode {}", path.display()))
}

pub fn read_json(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn write_json(document: &Document, path: &Path, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn write_binary(document: &Document, path: &Path, options: &CodecOptions) -> Result<()> {
    let bytes = encode_document_with(document, options)
        .with_context(|| format!("Failed to encode {}", path.display()))?;
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

/// Binary file -> JSON file. Returns the output path.
pub fn decode_file(
    input: &Path,
    output: Option<&Path>,
    options: &CodecOptions,
    pretty: bool,
) -> Result<PathBuf> {
    let output = output.map_or_else(|| json_path(input), Path::to_path_buf);
    let document = read_binary(input, options)?;
    write_json(&document, &output, pretty)?;
    tracing::debug!("{} document {:?} -> {:?}", document.kind().name(), input, output);
    Ok(output)
}

/// JSON file -> binary file. Returns the output path.
pub fn encode_file(input: &Path, output: Option<&Path>, options: &CodecOptions) -> Result<PathBuf> {
    let document = read_json(input)?;
    let output = output.map_or_else(|| binary_path(input, document.kind()), Path::to_path_buf);
    write_binary(&document, &output, options)?;
    tracing::debug!("{} document {:?} -> {:?}", document.kind().name(), input, output);
    Ok(output)
}

/// Decode, re-encode and decode again; the two structured forms must agree.
pub fn verify_file(input: &Path, options: &CodecOptions) -> Result<DocumentKind> {
    let first = read_binary(input, options)?;
    let bytes = encode_document_with(&first, options)
        .with_context(|| format!("Failed to re-encode {}", input.display()))?;
    let second = decode_document_with(&bytes, options)
        .with_context(|| format!("Failed to decode re-encoded {}", input.display()))?;
    if first != second {
        anyhow::bail!("{} does not survive a round trip", input.display());
    }
    Ok(first.kind())
}
