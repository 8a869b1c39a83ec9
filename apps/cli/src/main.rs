#![allow(clippy::print_stdout)]

use anyhow::Result;
use clap::Parser;
use sbox_cli::args::Cli;
use sbox_cli::{commands, init_logger, load};
use sbox_gateway::FileGateway;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load(cli.config.as_deref())?;
    let _log = init_logger(&config.log)?;

    let gateway = FileGateway::connect(&config).await?;
    let output = commands::dispatch(&gateway, cli.command).await?;

    println!("{output}");
    Ok(())
}
