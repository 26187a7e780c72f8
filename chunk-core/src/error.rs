//! Codec error types

use crate::tag::Tag;

/// Error raised while decoding or encoding a chunked document.
///
/// Any error aborts the conversion of the document it was raised for; the
/// codec never hands back a partially decoded structure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Stream ended before a read was satisfied
    #[error("unexpected end of data at offset {offset:#x} (need {need} bytes, have {have})")]
    UnexpectedEof {
        offset: usize,
        need: usize,
        have: usize,
    },

    /// A discriminant tag did not match at an expected position
    #[error("expected chunk {expected} at offset {offset:#x}, found {found}")]
    TagMismatch {
        offset: usize,
        expected: Tag,
        found: Tag,
    },

    /// A chunk declares more payload than the enclosing stream holds
    #[error("chunk {tag} at offset {offset:#x} declares {length} bytes but only {available} remain")]
    ChunkOverrun {
        tag: Tag,
        offset: usize,
        length: usize,
        available: usize,
    },

    /// A chunk required to interpret the document is absent
    #[error("required chunk {tag} not found")]
    MissingChunk { tag: Tag },

    /// No discriminant chunk identified the document type
    #[error("unrecognized document: no discriminant chunk found before end of stream")]
    UnrecognizedDocument,

    /// Structurally malformed content not covered by a more specific variant
    #[error("{context}: {message}")]
    Malformed {
        context: &'static str,
        message: String,
    },

    /// Chunk length is not a whole number of fixed-width records
    #[error("chunk {tag}: length {length} is not a multiple of record width {width}")]
    RecordSize { tag: Tag, length: usize, width: usize },

    /// An offset field points outside its target table or blob
    #[error("{context}: offset {offset:#x} is outside target of {len} bytes")]
    Reference {
        context: &'static str,
        offset: usize,
        len: usize,
    },

    /// Structured input is inconsistent and cannot be encoded
    #[error("invalid {context}: {message}")]
    Validation {
        context: &'static str,
        message: String,
    },
}

/// Error taxonomy used by callers that only care about the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Tag mismatch, truncation, undetectable document type
    Format,
    /// Record array length not a multiple of the record width
    Range,
    /// Offset outside its string table or raster blob
    Reference,
    /// Encode-time inconsistency in the structured form
    Validation,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnexpectedEof { .. }
            | Error::TagMismatch { .. }
            | Error::ChunkOverrun { .. }
            | Error::MissingChunk { .. }
            | Error::UnrecognizedDocument
            | Error::Malformed { .. } => ErrorKind::Format,
            Error::RecordSize { .. } => ErrorKind::Range,
            Error::Reference { .. } => ErrorKind::Reference,
            Error::Validation { .. } => ErrorKind::Validation,
        }
    }

    pub fn validation(context: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            context,
            message: message.into(),
        }
    }

    pub fn malformed(context: &'static str, message: impl Into<String>) -> Self {
        Error::Malformed {
            context,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TagMismatch {
            offset: 0x1234,
            expected: Tag::new(b"MCNK"),
            found: Tag::new(b"MCVT"),
        };
        assert_eq!(
            err.to_string(),
            "expected chunk MCNK at offset 0x1234, found MCVT"
        );

        let err = Error::RecordSize {
            tag: Tag::new(b"MDDF"),
            length: 37,
            width: 36,
        };
        assert_eq!(
            err.to_string(),
            "chunk MDDF: length 37 is not a multiple of record width 36"
        );
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::UnrecognizedDocument.kind(), ErrorKind::Format);
        assert_eq!(
            Error::RecordSize {
                tag: Tag::new(b"MOMT"),
                length: 10,
                width: 64
            }
            .kind(),
            ErrorKind::Range
        );
        assert_eq!(
            Error::Reference {
                context: "MOTX",
                offset: 99,
                len: 4
            }
            .kind(),
            ErrorKind::Reference
        );
        assert_eq!(
            Error::validation("tile", "bad").kind(),
            ErrorKind::Validation
        );
    }
}
