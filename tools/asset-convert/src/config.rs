//! asset-convert.toml parsing

use anyhow::{Context, Result};
use asset_codec::CodecOptions;
use serde::Deserialize;
use std::path::Path;

/// Config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG: &str = "asset-convert.toml";

/// asset-convert.toml structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub codec: CodecOptions,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Batch conversion section
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    /// Worker threads (0 = one per core)
    #[serde(default)]
    pub jobs: usize,

    /// Binary file extensions picked up when converting to JSON
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Pretty-print JSON output
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jobs: 0,
            extensions: default_extensions(),
            pretty: default_pretty(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["adt".to_string(), "wmo".to_string()]
}

fn default_pretty() -> bool {
    true
}

impl BatchConfig {
    /// Whether `path` carries one of the configured binary extensions.
    pub fn matches_binary(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

/// Load the config at `path`, or the default file if present, or defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).is_file() => Path::new(DEFAULT_CONFIG),
        None => return Ok(Config::default()),
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    tracing::debug!("Loaded config from {}: {:?}", path.display(), config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.codec, CodecOptions::default());
        assert_eq!(config.batch.jobs, 0);
        assert_eq!(config.batch.extensions, ["adt", "wmo"]);
        assert!(config.batch.pretty);
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
[codec]
sanitize_floats = false

[batch]
jobs = 4
extensions = ["adt"]
"#,
        )
        .unwrap();
        assert!(!config.codec.sanitize_floats);
        assert!(config.codec.validate_counts);
        assert_eq!(config.batch.jobs, 4);
        assert!(config.batch.matches_binary(Path::new("maps/azeroth_32_48.ADT")));
        assert!(!config.batch.matches_binary(Path::new("world/stormwind.wmo")));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<Config>("[batch]\nthreads = 2\n").is_err());
    }
}
