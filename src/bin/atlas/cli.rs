//! CLI argument definitions for atlas

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "atlas")]
#[command(about = "Voxel star-map pipeline")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a voxel star-map payload from archive rows
    Generate(GenerateArgs),

    /// Validate a written payload and report structural issues
    Validate(ValidateArgs),
}

#[derive(Parser)]
pub struct GenerateArgs {
    /// Output payload path (a .gz copy is written alongside)
    #[arg(long, default_value = "atlas.json")]
    pub output: PathBuf,

    /// Search radius in light-years
    #[arg(long, default_value = "50.0")]
    pub radius: f64,

    /// Minimum parallax signal-to-noise ratio
    #[arg(long, default_value = "10.0")]
    pub min_parallax_snr: f64,

    /// Maximum RUWE (astrometric-quality ceiling)
    #[arg(long, default_value = "1.4")]
    pub max_ruwe: f64,

    /// Only keep stars whose measured temperature is at least this (Kelvin)
    #[arg(long)]
    pub min_teff: Option<f64>,

    /// Cap the number of retrieved rows
    #[arg(long)]
    pub limit: Option<usize>,

    /// Cube edge length in light-years
    #[arg(long, default_value = "10.0")]
    pub grid_edge: f64,

    /// Grid half-extent in light-years
    #[arg(long, default_value = "60.0")]
    pub half_extent: f64,

    /// Read rows from a local CSV extract instead of the remote archive
    #[arg(long)]
    pub rows: Option<PathBuf>,

    /// Skip the cross-match service (names fall back to identifiers)
    #[arg(long)]
    pub offline: bool,
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// Payload file to validate
    pub payload: PathBuf,
}
