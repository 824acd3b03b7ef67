//! Payload generation

use crate::archive;
use crate::cli::{Cli, GenerateArgs};
use crate::simbad::SimbadTapProvider;
use anyhow::Context;
use indicatif::ProgressBar;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;
use stellar_atlas::crossmatch::CrossmatchProvider;
use stellar_atlas::pipeline::{self, RunStats};
use stellar_atlas::row::{RawRow, RowReader};
use stellar_atlas::{output, GridConfig, QueryConfig};

pub fn run(args: &GenerateArgs, cli: &Cli) -> anyhow::Result<()> {
    let query = build_query_config(args)?;
    let grid = GridConfig::new(args.grid_edge, args.half_extent)?;

    print_plan(args, &query);

    let rows = load_rows(args, &query)?;
    println!("Rows retrieved: {}", rows.len());

    let provider = if args.offline {
        None
    } else {
        Some(SimbadTapProvider::new()?)
    };
    let provider_ref = provider
        .as_ref()
        .map(|p| p as &dyn CrossmatchProvider);

    let result = pipeline::run(rows, &query, &grid, provider_ref, chrono::Utc::now());
    print_summary(&result.stats, cli);

    let gz_path = output::write_payload(&result.payload, &args.output)?;
    println!("Written payload to {:?} (+ {:?})", args.output, gz_path);
    Ok(())
}

fn build_query_config(args: &GenerateArgs) -> anyhow::Result<QueryConfig> {
    let mut query = QueryConfig::new(args.radius, args.min_parallax_snr, args.max_ruwe)?;
    if let Some(min_teff) = args.min_teff {
        query = query.with_min_teff(min_teff);
    }
    if let Some(limit) = args.limit {
        query = query.with_row_limit(limit);
    }
    Ok(query)
}

fn print_plan(args: &GenerateArgs, query: &QueryConfig) {
    println!("=== Atlas Generation ===");
    println!("Search radius: {:.1} ly", query.radius_ly());
    println!("Minimum parallax: {:.3} mas", query.min_parallax_mas());
    println!("Parallax SNR floor: {:.1}", query.min_parallax_snr());
    println!("RUWE ceiling: {:.2}", query.max_ruwe());
    if let Some(floor) = query.min_teff_k() {
        println!("Temperature floor: {:.0} K", floor);
    }
    if let Some(limit) = query.row_limit() {
        println!("Row limit: {}", limit);
    }
    println!("Grid: {:.1} ly cubes, +/-{:.1} ly", args.grid_edge, args.half_extent);
    match &args.rows {
        Some(path) => println!("Rows from local extract: {:?}", path),
        None => println!("Rows from remote archive"),
    }
    if args.offline {
        println!("Cross-match disabled (--offline)");
    }
    println!();
}

fn load_rows(args: &GenerateArgs, query: &QueryConfig) -> anyhow::Result<Vec<RawRow>> {
    match &args.rows {
        Some(path) => {
            let rows = read_local_extract(path)?;
            // Local extracts have not been through the archive query, so the
            // selection predicates apply here.
            Ok(pipeline::apply_selection(rows, query))
        }
        None => {
            let spinner = ProgressBar::new_spinner();
            spinner.set_message("Querying archive...");
            spinner.enable_steady_tick(Duration::from_millis(120));
            let rows = archive::fetch_rows(query);
            spinner.finish_and_clear();
            rows
        }
    }
}

fn read_local_extract(path: &Path) -> anyhow::Result<Vec<RawRow>> {
    let file = File::open(path).with_context(|| format!("Failed to open extract: {:?}", path))?;
    let reader = RowReader::new(BufReader::new(file))
        .with_context(|| format!("Failed to parse extract header: {:?}", path))?;
    let mut rows = Vec::new();
    for row in reader {
        rows.push(row?);
    }
    Ok(rows)
}

fn print_summary(stats: &RunStats, cli: &Cli) {
    println!();
    println!("=== Summary ===");
    println!("Rows retrieved: {}", stats.retrieved_rows);
    println!("Rows rejected (structural): {}", stats.rejected_rows);
    println!("Stars outside the grid: {}", stats.out_of_bounds);
    println!("Stars binned: {}", stats.binned_stars);
    println!(
        "Cross-match: {} matched, {} batches failed",
        stats.crossmatch_matched, stats.crossmatch_failed_batches
    );
    println!("Names resolved: {}", stats.names_resolved);
    let t = &stats.temperature;
    println!(
        "Temperatures: {} missing -> {} metadata, {} colour, {} spectral, {} default",
        t.missing, t.from_metadata, t.from_colour, t.from_spectral, t.defaulted
    );
    if cli.verbose {
        eprintln!("{:?}", stats);
    }
}
