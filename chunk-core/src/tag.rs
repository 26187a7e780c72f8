//! Four-character chunk tags

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Logical four-character chunk tag (`MVER`, `MCNK`, ...).
///
/// Files store tags byte-reversed: logical `MVER` is written as `REVM`. The
/// reversal happens only in [`Tag::from_disk`] and [`Tag::to_disk`]; the rest
/// of the codec works with logical tags exclusively.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const fn new(bytes: &[u8; 4]) -> Self {
        Self(*bytes)
    }

    /// Build a logical tag from the four bytes found on disk.
    pub const fn from_disk(bytes: [u8; 4]) -> Self {
        Self([bytes[3], bytes[2], bytes[1], bytes[0]])
    }

    /// Bytes to write on disk for this tag.
    pub const fn to_disk(self) -> [u8; 4] {
        let b = self.0;
        [b[3], b[2], b[1], b[0]]
    }

    pub const fn bytes(self) -> [u8; 4] {
        self.0
    }

    fn is_printable(self) -> bool {
        self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ')
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_printable() {
            for &b in &self.0 {
                write!(f, "{}", b as char)?;
            }
            Ok(())
        } else {
            let [a, b, c, d] = self.0;
            write!(f, "0x{:02X}{:02X}{:02X}{:02X}", a, b, c, d)
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self)
    }
}

/// Text when printable, raw bytes otherwise
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TagRepr {
    Text(String),
    Bytes([u8; 4]),
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_printable() {
            serializer.serialize_str(&self.to_string())
        } else {
            TagRepr::Bytes(self.0).serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match TagRepr::deserialize(deserializer)? {
            TagRepr::Text(text) => {
                let bytes: [u8; 4] = text.as_bytes().try_into().map_err(|_| {
                    serde::de::Error::custom(format!("chunk tag must be 4 bytes, got {:?}", text))
                })?;
                Ok(Tag(bytes))
            }
            TagRepr::Bytes(bytes) => Ok(Tag(bytes)),
        }
    }
}
