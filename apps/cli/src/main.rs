//! threadkb CLI: turn saved conversation summaries into maintained
//! knowledge-base articles.
//!
//! Reconciles a generated article against the existing corpus, deciding
//! between creating a new article and extending an existing one.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
