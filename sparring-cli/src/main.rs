//! ## sparring-cli
//! **Command-line entry point**
//!
//! `sparring run` executes the suite described by a scenario file against a
//! live server, `sparring init` writes the stock scenario file and
//! `sparring validate` reports which test cases would load.

use clap::Parser;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::run_command(cli).await
}
