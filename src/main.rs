mod classifier;
mod cli;
mod engine;
mod error;
mod loader;
mod metrics;
mod model;
#[cfg(feature = "tui")]
mod orchestrator;
mod storage;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::init_logging(&args)?;
    // Reading the local offset is only sound while the process is single-threaded.
    engine::capture_local_offset();

    match run(args) {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn run(args: cli::Cli) -> Result<()> {
    cli::run(args).await
}
