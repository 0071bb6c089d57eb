use async_trait::async_trait;
use clap::Subcommand;
use std::error::Error;
use std::path::Path;
use suture_core::CodeUnit;

pub mod decode;
pub mod insert;

use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// File read/write error.
    #[error("file error: {0}")]
    File(#[from] std::io::Error),
    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Insertion failed.
    #[error("insertion failed: {0}")]
    Transform(#[from] suture_transform::Error),
}

/// CLI subcommands for Suture.
#[derive(Subcommand)]
pub enum Cmd {
    /// Print an annotated disassembly of a code unit.
    Decode(decode::DecodeArgs),
    /// Insert a snippet into a code unit before a source line.
    Insert(insert::InsertArgs),
}

/// Trait for executing CLI subcommands.
///
/// Implementors read code units from disk, run the engine and report the result.
#[async_trait]
pub trait Command {
    /// Executes the subcommand.
    async fn execute(self) -> Result<(), Box<dyn Error>>;
}

#[async_trait]
impl Command for Cmd {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        match self {
            Cmd::Decode(args) => args.execute().await,
            Cmd::Insert(args) => args.execute().await,
        }
    }
}

/// Reads a JSON-encoded code unit from `path`.
pub(crate) async fn read_unit(path: impl AsRef<Path>) -> Result<CodeUnit, CliError> {
    let content = tokio::fs::read_to_string(path.as_ref()).await?;
    let unit = serde_json::from_str(&content)?;
    tracing::debug!("Read code unit from {}", path.as_ref().display());
    Ok(unit)
}
