//! Directory-wide conversion
//!
//! Every matching file is converted on a rayon pool. A file that fails to
//! convert is logged and counted; the rest of the batch still runs.

use anyhow::{Context, Result};
use clap::ValueEnum;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::convert;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// Binary assets -> JSON
    Json,
    /// JSON -> binary assets
    Binary,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub converted: usize,
    pub failed: Vec<PathBuf>,
}

/// Files under `dir` that the batch picks up for `target`, sorted.
pub fn collect_inputs(dir: &Path, target: Target, config: &Config) -> Vec<PathBuf> {
    let mut inputs: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| match target {
            Target::Json => config.batch.matches_binary(path),
            Target::Binary => path.extension().and_then(|e| e.to_str()) == Some("json"),
        })
        .collect();
    inputs.sort();
    inputs
}

/// Where `input` lands: next to itself, or mirrored under `out_dir`.
fn output_path(input: &Path, dir: &Path, out_dir: Option<&Path>, target: Target) -> Option<PathBuf> {
    let out_dir = out_dir?;
    let relative = input.strip_prefix(dir).unwrap_or(input);
    let mirrored = out_dir.join(relative);
    Some(match target {
        Target::Json => convert::json_path(&mirrored),
        // Binary extension depends on the document; resolved after parsing
        Target::Binary => mirrored,
    })
}

fn convert_one(
    input: &Path,
    dir: &Path,
    out_dir: Option<&Path>,
    target: Target,
    config: &Config,
) -> Result<PathBuf> {
    let output = output_path(input, dir, out_dir, target);
    if let Some(parent) = output.as_deref().and_then(Path::parent) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    match target {
        Target::Json => {
            convert::decode_file(input, output.as_deref(), &config.codec, config.batch.pretty)
        }
        Target::Binary => {
            let document = convert::read_json(input)?;
            let output = match output {
                Some(mirrored) => convert::binary_path(&mirrored, document.kind()),
                None => convert::binary_path(input, document.kind()),
            };
            convert::write_binary(&document, &output, &config.codec)?;
            Ok(output)
        }
    }
}

/// Convert everything under `dir`. Per-file failures end up in the report.
pub fn run_batch(
    dir: &Path,
    target: Target,
    out_dir: Option<&Path>,
    config: &Config,
) -> Result<BatchReport> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }

    let inputs = collect_inputs(dir, target, config);
    tracing::info!("Converting {} files under {:?} to {:?}", inputs.len(), dir, target);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.batch.jobs)
        .build()
        .context("Failed to start worker pool")?;

    let results: Vec<(&PathBuf, Result<PathBuf>)> = pool.install(|| {
        inputs
            .par_iter()
            .map(|input| (input, convert_one(input, dir, out_dir, target, config)))
            .collect()
    });

    let mut report = BatchReport::default();
    for (input, result) in results {
        match result {
            Ok(output) => {
                tracing::debug!("{:?} -> {:?}", input, output);
                report.converted += 1;
            }
            Err(e) => {
                tracing::error!("{:?}: {:#}", input, e);
                report.failed.push(input.clone());
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mirrors_tree() {
        let out = output_path(
            Path::new("in/maps/a.adt"),
            Path::new("in"),
            Some(Path::new("out")),
            Target::Json,
        );
        assert_eq!(out.as_deref(), Some(Path::new("out/maps/a.adt.json")));
        assert_eq!(output_path(Path::new("in/a.adt"), Path::new("in"), None, Target::Json), None);
    }
}
