mod auth;
mod cli;
mod error;
mod insights;
mod providers;
mod records;
mod report;
mod stats;
mod summarizer;
mod transform;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting BuildLens - CI build distribution tool");
    cli.execute().await?;

    Ok(())
}
