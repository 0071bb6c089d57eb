//! Module for the `insert` subcommand, which splices a snippet unit into a target unit.

use super::{CliError, read_unit};
use async_trait::async_trait;
use clap::Args;
use std::error::Error;
use std::path::PathBuf;
use suture_transform::{InsertConfig, Outcome, insert_code};

/// Arguments for the `insert` subcommand.
#[derive(Args, Debug)]
pub struct InsertArgs {
    /// JSON file holding the code unit to instrument.
    pub target: PathBuf,
    /// JSON file holding the compiled snippet.
    pub snippet: PathBuf,
    /// Source line to insert the snippet before.
    #[arg(long)]
    pub line: u32,
    /// Length in bytes of the epilogue the snippet ends with.
    #[arg(long)]
    pub epilogue_len: Option<usize>,
    /// Skip validation of the rewritten unit.
    #[arg(long)]
    pub no_validate: bool,
    /// Write the rewritten unit here instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
    /// Path to emit the insertion map (offset -> inserted length) as JSON.
    #[arg(long, value_name = "PATH")]
    pub emit_map: Option<PathBuf>,
}

impl InsertArgs {
    /// Builds the engine configuration from the command line flags.
    pub fn config(&self) -> InsertConfig {
        let defaults = InsertConfig::default();
        InsertConfig {
            epilogue_len: self.epilogue_len.unwrap_or(defaults.epilogue_len),
            validate: !self.no_validate,
        }
    }
}

/// Executes the `insert` subcommand.
#[async_trait]
impl super::Command for InsertArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        // Step 1: Read both units
        let target = read_unit(&self.target).await?;
        let snippet = read_unit(&self.snippet).await?;

        // Step 2: Run the engine
        let outcome =
            insert_code(&target, &snippet, self.line, &self.config()).map_err(CliError::from)?;

        let rewrite = match outcome {
            Outcome::Unchanged => {
                eprintln!(
                    "No instruction starts line {} in {}; nothing inserted",
                    self.line,
                    self.target.display()
                );
                return Ok(());
            }
            Outcome::Rewritten(rewrite) => rewrite,
        };

        // Step 3: Write the insertion map if requested
        if let Some(path) = self.emit_map.as_ref() {
            let map = serde_json::to_string_pretty(&rewrite.insertions).map_err(CliError::from)?;
            tokio::fs::write(path, map).await.map_err(CliError::from)?;
            eprintln!("Wrote insertion map to {}", path.display());
        }

        // Step 4: Output the new unit
        let unit = serde_json::to_string_pretty(&rewrite.unit).map_err(CliError::from)?;
        match self.output.as_ref() {
            Some(path) => {
                tokio::fs::write(path, unit).await.map_err(CliError::from)?;
                eprintln!("Wrote rewritten unit to {}", path.display());
            }
            None => println!("{unit}"),
        }

        Ok(())
    }
}
