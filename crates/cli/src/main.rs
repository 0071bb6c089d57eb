use clap::Parser;
use suture_cli::commands::{Cmd, Command};

/// Suture CLI
///
/// Suture splices compiled snippets into wordcode units at a source line, keeping symbol
/// tables, jump targets and line tables consistent
#[derive(Parser)]
#[command(name = "suture")]
#[command(about = "Suture: wordcode snippet insertion")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

/// Runs the Suture CLI with the provided arguments.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli.command.execute().await
}
