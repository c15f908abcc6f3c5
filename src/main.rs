mod cli;
mod compose;
mod model;
#[cfg(feature = "tui")]
mod orchestrator;
mod storage;
mod toggle;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::run(args).await
}
