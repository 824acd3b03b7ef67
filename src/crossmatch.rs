//! Cross-match collaborator interface and batch machinery.
//!
//! The pipeline never talks to a cross-match service directly; it goes
//! through [`CrossmatchProvider`], handing over bounded batches of
//! identifier strings. Batches are independent, so [`lookup_all`] fans them
//! out in parallel and folds the partial results back deterministically: a
//! star answered by an earlier batch is never overwritten, and a failed
//! batch is skipped rather than aborting the run.

use crate::error::AtlasResult;
use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Upper bound on identifiers per provider call.
pub const DEFAULT_BATCH_SIZE: usize = 400;

/// Read-only per-star fields from the cross-match service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuxMetadata {
    pub spectral_type: Option<String>,
    pub object_type: Option<String>,
    /// Directly measured effective temperature, Kelvin.
    pub teff_k: Option<f64>,
}

/// One record answering a batch query.
#[derive(Debug, Clone, Default)]
pub struct CrossmatchRecord {
    /// Zero-based index of the query identifier this record answers.
    /// When absent, records correlate with the batch by row order.
    pub query_index: Option<usize>,
    /// The service's primary designation for the object.
    pub main_id: Option<String>,
    /// "|"-delimited alias list.
    pub aliases: Option<String>,
    pub spectral_type: Option<String>,
    pub object_type: Option<String>,
    pub teff_k: Option<f64>,
}

impl CrossmatchRecord {
    pub fn metadata(&self) -> AuxMetadata {
        AuxMetadata {
            spectral_type: self.spectral_type.clone(),
            object_type: self.object_type.clone(),
            teff_k: self.teff_k.filter(|t| t.is_finite()),
        }
    }
}

/// A batched identifier lookup service.
///
/// Implementations resolve each identifier in `identifiers` to at most one
/// record. Missing objects are simply not returned. A batch-level failure
/// is an `Err`; the caller treats it as "no result for this batch".
pub trait CrossmatchProvider: Sync {
    fn lookup(&self, identifiers: &[String]) -> AtlasResult<Vec<CrossmatchRecord>>;
}

/// Outcome of a chunked lookup over the full target set.
#[derive(Debug, Default)]
pub struct CrossmatchOutcome {
    /// Best record per source id, first writer wins.
    pub records: HashMap<i64, CrossmatchRecord>,
    pub queried: usize,
    pub failed_batches: usize,
}

impl CrossmatchOutcome {
    pub fn matched(&self) -> usize {
        self.records.len()
    }

    /// Extracts the auxiliary metadata view of every matched record.
    pub fn metadata_map(&self) -> HashMap<i64, AuxMetadata> {
        self.records
            .iter()
            .map(|(sid, rec)| (*sid, rec.metadata()))
            .collect()
    }
}

/// Resolves every `(source_id, identifier)` target through the provider in
/// chunks of `batch_size`.
///
/// Chunks run in parallel; results are folded back in chunk order so the
/// outcome does not depend on completion order. A chunk whose lookup fails
/// contributes nothing; its stars stay unmatched.
pub fn lookup_all(
    provider: &dyn CrossmatchProvider,
    targets: &[(i64, String)],
    batch_size: usize,
) -> CrossmatchOutcome {
    let batch_size = batch_size.max(1);
    let chunks: Vec<&[(i64, String)]> = targets.chunks(batch_size).collect();

    let partials: Vec<Option<HashMap<i64, CrossmatchRecord>>> = chunks
        .par_iter()
        .map(|chunk| lookup_chunk(provider, chunk))
        .collect();

    let mut outcome = CrossmatchOutcome {
        queried: targets.len(),
        ..Default::default()
    };
    for partial in partials {
        match partial {
            Some(records) => merge_records(&mut outcome.records, records),
            None => outcome.failed_batches += 1,
        }
    }
    outcome
}

fn lookup_chunk(
    provider: &dyn CrossmatchProvider,
    chunk: &[(i64, String)],
) -> Option<HashMap<i64, CrossmatchRecord>> {
    let identifiers: Vec<String> = chunk.iter().map(|(_, id)| id.clone()).collect();
    let records = provider.lookup(&identifiers).ok()?;
    Some(correlate(chunk, records))
}

/// Associates returned records with the chunk's source ids. An explicit
/// echo-back index wins; otherwise rows correlate by order, ignoring any
/// overflow beyond the chunk length.
fn correlate(
    chunk: &[(i64, String)],
    records: Vec<CrossmatchRecord>,
) -> HashMap<i64, CrossmatchRecord> {
    let mut by_sid = HashMap::new();
    for (row_order, record) in records.into_iter().enumerate() {
        let idx = record.query_index.unwrap_or(row_order);
        if idx >= chunk.len() {
            continue;
        }
        let sid = chunk[idx].0;
        if let Entry::Vacant(e) = by_sid.entry(sid) {
            e.insert(record);
        }
    }
    by_sid
}

fn merge_records(
    into: &mut HashMap<i64, CrossmatchRecord>,
    records: HashMap<i64, CrossmatchRecord>,
) {
    for (sid, record) in records {
        if let Entry::Vacant(e) = into.entry(sid) {
            e.insert(record);
        }
    }
}
