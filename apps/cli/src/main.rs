//! protomerge CLI: build a deduplicated protocol directory.
//!
//! Fetches the protocol feed, merges it with curated entries, collapses
//! records by root domain, and writes combined and per-category JSON files.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
