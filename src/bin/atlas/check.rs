//! Payload validation command

use crate::cli::{Cli, ValidateArgs};
use anyhow::Context;
use stellar_atlas::validate;

pub fn run(args: &ValidateArgs, cli: &Cli) -> anyhow::Result<()> {
    let issues = validate::validate_file(&args.payload)
        .with_context(|| format!("Failed to read payload: {:?}", args.payload))?;

    if cli.verbose {
        eprintln!("Checked {:?}", args.payload);
    }

    if issues.is_empty() {
        println!("OK: {:?} passed validation", args.payload);
        return Ok(());
    }

    for issue in &issues {
        eprintln!("ISSUE: {}", issue);
    }
    anyhow::bail!("{} validation issues in {:?}", issues.len(), args.payload);
}
