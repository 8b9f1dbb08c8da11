//! CLI entrypoint wiring for the snipbox binary.
//!
//! Thin inspection surface over the engine: screen a source file, and
//! poke the codecs the way an operator debugging a rejected submission
//! would. The service itself links the library; this binary exists for
//! operations, not for hosting guests.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use crate::buffer::encoding::{self, Encoding};
use crate::config::limits::EngineConfig;
use crate::config::types::{EngineError, ExecutionOutcome};
use crate::config::validator;
use crate::screen::{Screener, SecurityVerdict};
use crate::wire::ResultCodec;

#[derive(Parser)]
#[command(author, version, about = "snipbox engine utilities", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen a source file and print the wire-shaped verdict
    Scan {
        /// Path to the submitted source text
        file: PathBuf,
    },
    /// Byte length of text under an encoding, without conversion
    ByteLength {
        /// Encoding name (aliases accepted, e.g. "UTF-8", "ucs2")
        encoding: String,
        /// The text to measure
        text: String,
    },
    /// Transcode hex-encoded bytes between two encodings
    Transcode {
        /// Source encoding
        from: String,
        /// Target encoding
        to: String,
        /// Input bytes as hex
        hex: String,
    },
    /// Validate the default engine configuration and print findings
    CheckConfig,
}

fn resolve_encoding(name: &str) -> Result<Encoding> {
    Encoding::resolve(name).ok_or_else(|| anyhow!("unknown encoding: {}", name))
}

pub fn run() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scan { file } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            match Screener::new().scan(&source) {
                SecurityVerdict::Allowed => {
                    println!("{}", serde_json::json!({"result": "allowed"}));
                }
                SecurityVerdict::Rejected(violation) => {
                    let outcome =
                        ExecutionOutcome::from_engine_error(&EngineError::Security(violation));
                    println!("{}", ResultCodec::encode_json(&outcome));
                    std::process::exit(1);
                }
            }
        }
        Commands::ByteLength { encoding, text } => {
            let enc = resolve_encoding(&encoding)?;
            println!("{}", encoding::byte_length(&text, enc));
        }
        Commands::Transcode { from, to, hex } => {
            let from = resolve_encoding(&from)?;
            let to = resolve_encoding(&to)?;
            let bytes = encoding::encode(&hex, Encoding::Hex);
            let out = encoding::transcode(&bytes, from, to)
                .map_err(|e| anyhow!(e.guest_message()))?;
            println!("{}", encoding::decode(&out, Encoding::Hex));
        }
        Commands::CheckConfig => {
            let result = validator::validate_config(&EngineConfig::default());
            for warning in &result.warnings {
                println!("warning: {}", warning);
            }
            for error in &result.errors {
                println!("error: {}", error);
            }
            if !result.is_valid() {
                std::process::exit(1);
            }
            println!("config ok");
        }
    }
    Ok(())
}
