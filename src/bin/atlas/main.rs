//! Atlas: voxel star-map pipeline CLI
//!
//! Fetches catalog rows (remote archive or local extract), resolves names,
//! temperatures and categories, bins stars into a voxel grid, and writes
//! the payload plus its gzip copy. `validate` re-reads a written payload
//! and reports structural issues.

mod archive;
mod check;
mod cli;
mod generate;
mod simbad;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        eprintln!("Verbose mode enabled");
    }

    match &cli.command {
        Commands::Generate(args) => generate::run(args, &cli),
        Commands::Validate(args) => check::run(args, &cli),
    }
}
