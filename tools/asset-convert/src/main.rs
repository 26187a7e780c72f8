//! asset-convert - terrain and object model asset converter
//!
//! Converts binary terrain tiles (.adt) and object model root/group files
//! (.wmo) to JSON and back, one file at a time or a whole directory.

mod batch;
mod config;
mod convert;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use batch::Target;

#[derive(Parser)]
#[command(name = "asset-convert")]
#[command(about = "Terrain and object model asset converter")]
#[command(version)]
struct Cli {
    /// Path to asset-convert.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Binary asset -> JSON
    Decode {
        /// Input .adt/.wmo file
        input: PathBuf,

        /// Output JSON file (default: <input>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// JSON -> binary asset
    Encode {
        /// Input JSON file
        input: PathBuf,

        /// Output binary file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that a binary asset survives decode, encode, decode
    Verify {
        /// Input .adt/.wmo file
        input: PathBuf,
    },

    /// Convert every matching file under a directory
    Batch {
        /// Directory to walk
        dir: PathBuf,

        /// Conversion direction
        #[arg(long, value_enum)]
        to: Target,

        /// Output directory (default: next to each input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Decode { input, output } => {
            tracing::info!("Decoding {:?}", input);
            let output =
                convert::decode_file(&input, output.as_deref(), &config.codec, config.batch.pretty)?;
            tracing::info!("Wrote {:?}", output);
        }

        Commands::Encode { input, output } => {
            tracing::info!("Encoding {:?}", input);
            let output = convert::encode_file(&input, output.as_deref(), &config.codec)?;
            tracing::info!("Wrote {:?}", output);
        }

        Commands::Verify { input } => {
            let kind = convert::verify_file(&input, &config.codec)?;
            tracing::info!("{:?}: {} document round-trips", input, kind.name());
        }

        Commands::Batch { dir, to, output } => {
            let report = batch::run_batch(&dir, to, output.as_deref(), &config)?;
            if !report.failed.is_empty() {
                anyhow::bail!(
                    "{} of {} files failed to convert",
                    report.failed.len(),
                    report.converted + report.failed.len()
                );
            }
            tracing::info!("Converted {} files", report.converted);
        }
    }

    Ok(())
}
