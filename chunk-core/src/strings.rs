//! Null-terminated string tables addressed by byte offset
//!
//! Name chunks (`MTEX`, `MOTX`, `MODN`, ...) are blobs of null-terminated
//! strings. Other records point into them by *byte offset*, never by list
//! index, so a rebuilt blob must place every string at exactly the offset it
//! was decoded from. Padding between strings is zero-filled.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One string and the byte offset it occupies in its blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringEntry {
    pub offset: u32,
    pub text: String,
}

/// Ordered set of strings backing one chunk payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StringTable {
    pub entries: Vec<StringEntry>,
    /// Total blob size including trailing padding. Zero means tightly packed.
    #[serde(default)]
    pub size: u32,
}

impl StringTable {
    /// Parse a blob, recording every run of non-null bytes with its start.
    ///
    /// A trailing run with no terminator is kept as well.
    pub fn parse(bytes: &[u8]) -> Self {
        let mut entries = Vec::new();
        let mut start = None;
        for (i, &b) in bytes.iter().enumerate() {
            match (b, start) {
                (0, Some(s)) => {
                    entries.push(entry_at(bytes, s, i));
                    start = None;
                }
                (0, None) => {}
                (_, None) => start = Some(i),
                (_, Some(_)) => {}
            }
        }
        if let Some(s) = start {
            entries.push(entry_at(bytes, s, bytes.len()));
        }
        Self {
            entries,
            size: bytes.len() as u32,
        }
    }

    /// Build a fresh table with sequentially assigned offsets.
    pub fn from_strings<I, S>(strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut offset = 0u32;
        let entries: Vec<StringEntry> = strings
            .into_iter()
            .map(|s| {
                let text = s.into();
                let entry = StringEntry { offset, text };
                offset += entry.text.len() as u32 + 1;
                entry
            })
            .collect();
        Self {
            entries,
            size: offset,
        }
    }

    /// Serialize the blob, placing each string at its recorded offset.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.size as usize);
        for entry in &self.entries {
            let offset = entry.offset as usize;
            if offset < out.len() {
                return Err(Error::validation(
                    "string table",
                    format!(
                        "entry {:?} at offset {} overlaps previous entry ending at {}",
                        entry.text,
                        offset,
                        out.len()
                    ),
                ));
            }
            out.resize(offset, 0);
            out.extend_from_slice(entry.text.as_bytes());
            out.push(0);
        }
        if out.len() < self.size as usize {
            out.resize(self.size as usize, 0);
        }
        Ok(out)
    }

    /// Length of the serialized blob.
    pub fn byte_len(&self) -> usize {
        let packed_end = self
            .entries
            .last()
            .map(|e| e.offset as usize + e.text.len() + 1)
            .unwrap_or(0);
        packed_end.max(self.size as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn offsets(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.offset).collect()
    }

    /// String starting exactly at `offset`.
    pub fn get(&self, offset: u32) -> Option<&str> {
        self.entries
            .binary_search_by_key(&offset, |e| e.offset)
            .ok()
            .map(|i| self.entries[i].text.as_str())
    }

    /// Resolve a byte offset the way the client does: read from `offset` up to
    /// the next terminator. Offsets into padding resolve to an empty string.
    pub fn resolve(&self, offset: u32, context: &'static str) -> Result<&str> {
        let len = self.byte_len();
        if offset as usize >= len {
            return Err(Error::Reference {
                context,
                offset: offset as usize,
                len,
            });
        }
        let idx = self.entries.partition_point(|e| e.offset <= offset);
        let Some(entry) = idx.checked_sub(1).map(|i| &self.entries[i]) else {
            return Ok("");
        };
        let rel = (offset - entry.offset) as usize;
        if rel >= entry.text.len() {
            return Ok("");
        }
        entry.text.get(rel..).ok_or_else(|| Error::Reference {
            context,
            offset: offset as usize,
            len,
        })
    }
}

fn entry_at(bytes: &[u8], start: usize, end: usize) -> StringEntry {
    StringEntry {
        offset: start as u32,
        text: String::from_utf8_lossy(&bytes[start..end]).into_owned(),
    }
}

/// Sequential offsets of `strings` in a tightly packed blob.
///
/// `offset[i] = offset[i - 1] + len(strings[i - 1]) + 1`
pub fn build_offset_index<S: AsRef<str>>(strings: &[S]) -> Vec<u32> {
    let mut offset = 0u32;
    strings
        .iter()
        .map(|s| {
            let current = offset;
            offset += s.as_ref().len() as u32 + 1;
            current
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_fresh_table_layout() {
        let table = StringTable::from_strings(["a", "bb"]);
        assert_eq!(table.to_bytes().unwrap(), vec![0x61, 0x00, 0x62, 0x62, 0x00]);
        assert_eq!(table.offsets(), vec![0, 2]);
        assert_eq!(build_offset_index(&["a", "bb"]), vec![0, 2]);
    }

    #[test]
    fn test_parse_records_offsets_and_padding() {
        let blob = b"tex\\a.blp\0\0\0\0tex\\b.blp\0\0\0";
        let table = StringTable::parse(blob);
        assert_eq!(table.offsets(), vec![0, 13]);
        assert_eq!(table.get(13), Some("tex\\b.blp"));
        assert_eq!(table.size as usize, blob.len());
        assert_eq!(table.to_bytes().unwrap(), blob.to_vec());
    }

    #[test]
    fn test_explicit_offsets_survive_rebuild() {
        let table = StringTable {
            entries: vec![
                StringEntry {
                    offset: 0,
                    text: "first".into(),
                },
                StringEntry {
                    offset: 16,
                    text: "second".into(),
                },
                StringEntry {
                    offset: 40,
                    text: "third".into(),
                },
            ],
            size: 0,
        };
        let bytes = table.to_bytes().unwrap();
        assert_eq!(bytes.len(), 46);
        let reparsed = StringTable::parse(&bytes);
        assert_eq!(reparsed.offsets(), vec![0, 16, 40]);
        assert_eq!(reparsed.entries, table.entries);
    }

    #[test]
    fn test_trailing_unterminated_run() {
        let table = StringTable::parse(b"abc\0de");
        assert_eq!(table.offsets(), vec![0, 4]);
        assert_eq!(table.get(4), Some("de"));
        assert_eq!(table.to_bytes().unwrap(), b"abc\0de\0".to_vec());
    }

    #[test]
    fn test_overlapping_offsets_rejected() {
        let table = StringTable {
            entries: vec![
                StringEntry {
                    offset: 0,
                    text: "long name".into(),
                },
                StringEntry {
                    offset: 3,
                    text: "x".into(),
                },
            ],
            size: 0,
        };
        assert_eq!(table.to_bytes().unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_resolve() {
        let table = StringTable::parse(b"world\\a.wmo\0\0\0\0\0");
        assert_eq!(table.resolve(0, "MODN").unwrap(), "world\\a.wmo");
        assert_eq!(table.resolve(6, "MODN").unwrap(), "a.wmo");
        assert_eq!(table.resolve(13, "MODN").unwrap(), "");
        let err = table.resolve(16, "MODN").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reference);
    }
}
