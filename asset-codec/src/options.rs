//! Codec behaviour switches

use serde::{Deserialize, Serialize};

/// Options shared by every decode and encode entry point.
///
/// Deserializes from a partial table; missing keys keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecOptions {
    /// Replace NaN and infinite floats with `0.0` on decode
    #[serde(default = "default_true")]
    pub sanitize_floats: bool,

    /// Reject encodes whose header counts disagree with their arrays
    #[serde(default = "default_true")]
    pub validate_counts: bool,

    /// Fill informational name fields of root documents after decode
    #[serde(default = "default_true")]
    pub resolve_names: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            sanitize_floats: true,
            validate_counts: true,
            resolve_names: true,
        }
    }
}
