//! End-to-end pipeline: raw rows to the final payload.
//!
//! The stages run sequentially: rows are (optionally) filtered to the
//! selection, the cross-match is consulted once for names and metadata, the
//! temperature cascade fills every gap, then each row is adapted, classified
//! and binned. All external-lookup failures degrade to "unresolved"; a star
//! is only ever dropped by the row adapter's structural checks.

use crate::classify::classify;
use crate::config::{GridConfig, QueryConfig};
use crate::crossmatch::{self, CrossmatchOutcome, CrossmatchProvider, DEFAULT_BATCH_SIZE};
use crate::grid::VoxelGrid;
use crate::naming;
use crate::output::{self, Payload};
use crate::row::{adapt_row, finite, RawRow};
use crate::temperature::{self, CascadeStats};
use chrono::{DateTime, Utc};

/// Counters describing one pipeline run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunStats {
    /// Rows handed to the pipeline.
    pub retrieved_rows: usize,
    /// Rows dropped by the row adapter's structural checks.
    pub rejected_rows: usize,
    /// Stars rejected by the spatial binner (outside the grid).
    pub out_of_bounds: usize,
    /// Stars that landed in a cube.
    pub binned_stars: usize,
    /// Stars with a cross-match answer.
    pub crossmatch_matched: usize,
    /// Batches the cross-match provider failed to answer.
    pub crossmatch_failed_batches: usize,
    /// Stars whose display name came from the resolver.
    pub names_resolved: usize,
    pub temperature: CascadeStats,
}

pub struct PipelineOutput {
    pub payload: Payload,
    pub stats: RunStats,
}

/// Applies the archive selection predicates to locally supplied rows.
///
/// Mirrors what the remote query does server-side: the parallax floor
/// derived from the radius, the parallax SNR floor, the RUWE ceiling
/// (quality fields must be present to pass), and the optional temperature
/// floor, which only constrains rows that carry a measured temperature.
pub fn apply_selection(rows: Vec<RawRow>, query: &QueryConfig) -> Vec<RawRow> {
    let min_parallax = query.min_parallax_mas();
    rows.into_iter()
        .filter(|row| passes_selection(row, query, min_parallax))
        .collect()
}

fn passes_selection(row: &RawRow, query: &QueryConfig, min_parallax: f64) -> bool {
    let Some(parallax) = finite(row.parallax_mas) else {
        return false;
    };
    if parallax < min_parallax {
        return false;
    }
    let Some(snr) = finite(row.parallax_over_error) else {
        return false;
    };
    if snr < query.min_parallax_snr() {
        return false;
    }
    let Some(ruwe) = finite(row.ruwe) else {
        return false;
    };
    if ruwe > query.max_ruwe() {
        return false;
    }
    if let (Some(floor), Some(teff)) = (query.min_teff_k(), finite(row.teff_k)) {
        if teff < floor {
            return false;
        }
    }
    true
}

/// Runs the full pipeline over pre-selected rows.
///
/// `provider` is the optional cross-match collaborator; without one, every
/// star keeps its query identifier as its name and the temperature cascade
/// runs on colour and defaults alone.
pub fn run(
    mut rows: Vec<RawRow>,
    query: &QueryConfig,
    grid_config: &GridConfig,
    provider: Option<&dyn CrossmatchProvider>,
    generated_at: DateTime<Utc>,
) -> PipelineOutput {
    if let Some(limit) = query.row_limit() {
        rows.truncate(limit);
    }

    let mut stats = RunStats {
        retrieved_rows: rows.len(),
        ..Default::default()
    };

    let targets: Vec<(i64, String)> = rows
        .iter()
        .filter_map(|row| Some((row.source_id?, row.query_identifier()?)))
        .collect();

    let outcome = match provider {
        Some(provider) => crossmatch::lookup_all(provider, &targets, DEFAULT_BATCH_SIZE),
        None => CrossmatchOutcome::default(),
    };
    stats.crossmatch_matched = outcome.matched();
    stats.crossmatch_failed_batches = outcome.failed_batches;

    let names = naming::resolve_names(&targets, &outcome.records);
    stats.names_resolved = names.len();

    let metadata = outcome.metadata_map();
    let cascade = temperature::resolve_overrides(&rows, &metadata);
    stats.temperature = cascade.stats;

    let mut grid = VoxelGrid::new(grid_config);
    for row in &rows {
        let meta = row.source_id.and_then(|sid| metadata.get(&sid));
        let nature = classify(
            meta.and_then(|m| m.object_type.as_deref()),
            meta.and_then(|m| m.spectral_type.as_deref()),
        );
        let name_override = row
            .source_id
            .and_then(|sid| names.get(&sid))
            .map(String::as_str);
        let teff_override = row
            .source_id
            .and_then(|sid| cascade.overrides.get(&sid))
            .copied();

        let Some(star) = adapt_row(row, name_override, teff_override, nature) else {
            stats.rejected_rows += 1;
            continue;
        };
        if grid.add(&star) {
            stats.binned_stars += 1;
        } else {
            stats.out_of_bounds += 1;
        }
    }

    let payload = output::assemble(query, grid_config, &grid, stats.retrieved_rows, generated_at);
    PipelineOutput { payload, stats }
}
