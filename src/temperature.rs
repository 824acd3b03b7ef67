//! Effective-temperature fallbacks for stars without a measured value.
//!
//! [`resolve_overrides`] runs a strict four-stage cascade over every star
//! whose primary temperature is absent: measured cross-match temperatures,
//! then a colour-index estimate, then spectral-type heuristics, then a
//! constant last resort. Each stage sees only the ids the previous stages
//! left unresolved and returns only newly resolved entries; a pure merge
//! folds them in without overwriting, so coverage is total and the result
//! is independent of evaluation order.

use crate::crossmatch::AuxMetadata;
use crate::row::{finite, RawRow};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// Last-resort temperature: a cool dwarf.
pub const DEFAULT_FALLBACK_TEFF_K: f64 = 3500.0;
pub const WHITE_DWARF_FALLBACK_K: f64 = 12_000.0;
pub const NEUTRON_STAR_FALLBACK_K: f64 = 600_000.0;
pub const BLACK_HOLE_FALLBACK_K: f64 = 100_000.0;

// Jordi et al. (2010) BP-RP to B-V conversion for dwarfs.
const BV_CONVERSION_OFFSET: f64 = 0.020;
const BV_CONVERSION_SCALE: f64 = 1.289;

// Ballesteros (2012) colour-temperature approximation domain.
const BALLESTEROS_MIN_BV: f64 = -0.4;
const BALLESTEROS_MAX_BV: f64 = 2.0;

/// Output clamp for the colour estimate, 600 K to 40 000 K.
const COLOUR_MIN_TEFF_K: f64 = 600.0;
const COLOUR_MAX_TEFF_K: f64 = 40_000.0;

/// Main/brown-dwarf spectral sequence with per-letter base temperatures.
const SPECTRAL_SEQUENCE: &[(char, f64)] = &[
    ('O', 30_000.0),
    ('B', 20_000.0),
    ('A', 8_500.0),
    ('F', 6_500.0),
    ('G', 5_600.0),
    ('K', 4_400.0),
    ('M', 3_300.0),
    ('L', 2_100.0),
    ('T', 1_300.0),
    ('Y', 600.0),
];

/// How many stars each cascade stage resolved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CascadeStats {
    /// Stars that entered the cascade (no primary temperature).
    pub missing: usize,
    pub from_metadata: usize,
    pub from_colour: usize,
    pub from_spectral: usize,
    pub defaulted: usize,
}

#[derive(Debug, Default)]
pub struct CascadeOutcome {
    /// Temperature override per source id; covers every id that entered.
    pub overrides: HashMap<i64, f64>,
    pub stats: CascadeStats,
}

/// Resolves a temperature for every row lacking a primary measurement.
pub fn resolve_overrides(
    rows: &[RawRow],
    metadata: &HashMap<i64, AuxMetadata>,
) -> CascadeOutcome {
    let missing = collect_missing_ids(rows);
    let mut stats = CascadeStats {
        missing: missing.len(),
        ..Default::default()
    };
    let mut overrides: HashMap<i64, f64> = HashMap::new();

    // Stage 1: measured temperature from the cross-match, verbatim.
    let newly = stage_metadata(&unresolved(&missing, &overrides), metadata);
    stats.from_metadata = merge_overrides(&mut overrides, newly);

    // Stage 2: colour-index estimate.
    let newly = stage_colour(rows, &unresolved(&missing, &overrides));
    stats.from_colour = merge_overrides(&mut overrides, newly);

    // Stage 3: spectral-type heuristic, with object-type defaults.
    let newly = stage_spectral(&unresolved(&missing, &overrides), metadata);
    stats.from_spectral = merge_overrides(&mut overrides, newly);

    // Stage 4: constant fallback. Guarantees total coverage.
    for sid in unresolved(&missing, &overrides) {
        overrides.insert(sid, DEFAULT_FALLBACK_TEFF_K);
        stats.defaulted += 1;
    }

    CascadeOutcome { overrides, stats }
}

fn collect_missing_ids(rows: &[RawRow]) -> HashSet<i64> {
    rows.iter()
        .filter(|row| finite(row.teff_k).filter(|t| *t > 0.0).is_none())
        .filter_map(|row| row.source_id)
        .collect()
}

fn unresolved(missing: &HashSet<i64>, overrides: &HashMap<i64, f64>) -> HashSet<i64> {
    missing
        .iter()
        .copied()
        .filter(|sid| !overrides.contains_key(sid))
        .collect()
}

/// Inserts only entries whose key is still vacant; returns how many landed.
fn merge_overrides(into: &mut HashMap<i64, f64>, newly: HashMap<i64, f64>) -> usize {
    let mut added = 0;
    for (sid, teff) in newly {
        if let Entry::Vacant(e) = into.entry(sid) {
            e.insert(teff);
            added += 1;
        }
    }
    added
}

fn stage_metadata(
    unresolved: &HashSet<i64>,
    metadata: &HashMap<i64, AuxMetadata>,
) -> HashMap<i64, f64> {
    unresolved
        .iter()
        .filter_map(|sid| {
            let teff = metadata.get(sid)?.teff_k?;
            Some((*sid, teff))
        })
        .collect()
}

fn stage_colour(rows: &[RawRow], unresolved: &HashSet<i64>) -> HashMap<i64, f64> {
    rows.iter()
        .filter_map(|row| {
            let sid = row.source_id.filter(|sid| unresolved.contains(sid))?;
            let teff = estimate_from_bp_rp(row.bp_rp)?;
            Some((sid, teff))
        })
        .collect()
}

fn stage_spectral(
    unresolved: &HashSet<i64>,
    metadata: &HashMap<i64, AuxMetadata>,
) -> HashMap<i64, f64> {
    unresolved
        .iter()
        .filter_map(|sid| {
            let meta = metadata.get(sid)?;
            let teff = estimate_from_spectral_type(meta.spectral_type.as_deref())
                .or_else(|| default_for_object_type(meta.object_type.as_deref()))?;
            Some((*sid, teff))
        })
        .collect()
}

/// Estimates an effective temperature from a blue-minus-red colour index.
///
/// The index converts to B-V through the Jordi et al. linear fit, clamps to
/// the Ballesteros approximation domain, and runs through the two-term
/// reciprocal calibration. Results clamp to 600-40 000 K.
pub fn estimate_from_bp_rp(bp_rp: Option<f64>) -> Option<f64> {
    let bp_rp = finite(bp_rp)?;

    let b_minus_v = ((bp_rp + BV_CONVERSION_OFFSET) / BV_CONVERSION_SCALE)
        .clamp(BALLESTEROS_MIN_BV, BALLESTEROS_MAX_BV);

    let denominator1 = 0.92 * b_minus_v + 1.7;
    let denominator2 = 0.92 * b_minus_v + 0.62;
    if denominator1 <= 0.0 || denominator2 <= 0.0 {
        return None;
    }

    let temperature = 4600.0 * (1.0 / denominator1 + 1.0 / denominator2);
    Some(temperature.clamp(COLOUR_MIN_TEFF_K, COLOUR_MAX_TEFF_K))
}

/// Estimates a temperature from a spectral-type string.
///
/// White-dwarf notation ("DA", "DB5", ...) maps the numeric subclass to
/// `subclass x 1000 K` clamped to 5000-40 000 K, defaulting to 12 000 K
/// when no digits are present. A leading "sd" subdwarf marker is stripped.
/// Otherwise the first letter found in the O..Y sequence sets the base
/// temperature, and a numeric subclass interpolates linearly toward the
/// next letter's base.
pub fn estimate_from_spectral_type(spectral_type: Option<&str>) -> Option<f64> {
    let s = spectral_type?.trim();
    if s.is_empty() {
        return None;
    }

    let mut upper = s.to_uppercase();

    if upper.starts_with('D') {
        return Some(match extract_numeric_component(&upper) {
            Some(subclass) => (subclass * 1000.0).clamp(5000.0, 40_000.0),
            None => WHITE_DWARF_FALLBACK_K,
        });
    }

    if let Some(rest) = upper.strip_prefix("SD") {
        upper = rest.to_string();
    }

    let (index, base_temp) = upper
        .chars()
        .find_map(|ch| sequence_position(ch))?;

    let subclass = match extract_numeric_component(&upper) {
        Some(subclass) => subclass,
        None => return Some(base_temp),
    };

    let next_index = (index + 1).min(SPECTRAL_SEQUENCE.len() - 1);
    let next_temp = SPECTRAL_SEQUENCE[next_index].1;
    let fraction = (subclass / 10.0).clamp(0.0, 1.0);
    Some(base_temp - fraction * (base_temp - next_temp))
}

/// Fixed defaults for compact objects identified by object type alone.
pub fn default_for_object_type(object_type: Option<&str>) -> Option<f64> {
    let upper = object_type?.to_uppercase();
    if upper.contains("WD") {
        return Some(WHITE_DWARF_FALLBACK_K);
    }
    if upper.contains("NS") || upper.contains("PSR") {
        return Some(NEUTRON_STAR_FALLBACK_K);
    }
    if upper.contains("BH") {
        return Some(BLACK_HOLE_FALLBACK_K);
    }
    None
}

fn sequence_position(letter: char) -> Option<(usize, f64)> {
    SPECTRAL_SEQUENCE
        .iter()
        .position(|(ch, _)| *ch == letter)
        .map(|index| (index, SPECTRAL_SEQUENCE[index].1))
}

/// First run of digits (with an optional decimal point) in the string.
fn extract_numeric_component(text: &str) -> Option<f64> {
    let mut digits = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            digits.push(ch);
        } else if !digits.is_empty() {
            break;
        }
    }
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sid: i64, teff: Option<f64>, bp_rp: Option<f64>) -> RawRow {
        RawRow {
            source_id: Some(sid),
            teff_k: teff,
            bp_rp,
            ..Default::default()
        }
    }

    fn meta(spectral: Option<&str>, object: Option<&str>, teff: Option<f64>) -> AuxMetadata {
        AuxMetadata {
            spectral_type: spectral.map(String::from),
            object_type: object.map(String::from),
            teff_k: teff,
        }
    }

    #[test]
    fn test_solar_colour_estimate() {
        // Sun-like BP-RP ~= 0.82 should land near 5700-5900 K.
        let teff = estimate_from_bp_rp(Some(0.82)).unwrap();
        assert!((5400.0..6200.0).contains(&teff), "got {}", teff);
    }

    #[test]
    fn test_colour_estimate_monotonically_decreasing() {
        let mut previous = f64::INFINITY;
        let mut index = -0.3;
        while index < 2.4 {
            let teff = estimate_from_bp_rp(Some(index)).unwrap();
            assert!(
                teff <= previous,
                "temperature rose at bp_rp={}: {} > {}",
                index,
                teff,
                previous
            );
            previous = teff;
            index += 0.1;
        }
    }

    #[test]
    fn test_colour_estimate_rejects_bad_input() {
        assert_eq!(estimate_from_bp_rp(None), None);
        assert_eq!(estimate_from_bp_rp(Some(f64::NAN)), None);
        assert_eq!(estimate_from_bp_rp(Some(f64::INFINITY)), None);
    }

    #[test]
    fn test_colour_estimate_clamps_extremes() {
        // Indices beyond the domain clamp to the B-V limits, so the output
        // stays inside the documented band.
        let hot = estimate_from_bp_rp(Some(-5.0)).unwrap();
        let cool = estimate_from_bp_rp(Some(9.0)).unwrap();
        assert!(hot <= COLOUR_MAX_TEFF_K);
        assert!(cool >= COLOUR_MIN_TEFF_K);
        assert!(hot > cool);
    }

    #[test]
    fn test_white_dwarf_subclass() {
        assert_eq!(estimate_from_spectral_type(Some("DA5")), Some(5000.0));
        assert_eq!(estimate_from_spectral_type(Some("DA2")), Some(5000.0)); // clamped up
        assert_eq!(estimate_from_spectral_type(Some("DB")), Some(12_000.0));
        assert_eq!(estimate_from_spectral_type(Some("DQ9")), Some(9000.0));
    }

    #[test]
    fn test_spectral_base_letters() {
        assert_eq!(estimate_from_spectral_type(Some("G")), Some(5600.0));
        assert_eq!(estimate_from_spectral_type(Some("M")), Some(3300.0));
        assert_eq!(estimate_from_spectral_type(Some("Y")), Some(600.0));
    }

    #[test]
    fn test_spectral_subclass_interpolates() {
        // G5 lies halfway between G (5600) and K (4400).
        assert_eq!(estimate_from_spectral_type(Some("G5V")), Some(5000.0));
        // Fractional subclasses interpolate too.
        let m55 = estimate_from_spectral_type(Some("M5.5")).unwrap();
        assert!((m55 - (3300.0 - 0.55 * (3300.0 - 2100.0))).abs() < 1e-9);
        // Strictly between the letter bases.
        let g2 = estimate_from_spectral_type(Some("G2V")).unwrap();
        assert!(g2 < 5600.0 && g2 > 4400.0);
    }

    #[test]
    fn test_spectral_last_letter_has_no_successor() {
        // Y5 interpolates toward itself: stays at the base.
        assert_eq!(estimate_from_spectral_type(Some("Y5")), Some(600.0));
    }

    #[test]
    fn test_subdwarf_prefix_stripped() {
        assert_eq!(
            estimate_from_spectral_type(Some("sdM1")),
            estimate_from_spectral_type(Some("M1"))
        );
    }

    #[test]
    fn test_spectral_unknown_yields_nothing() {
        assert_eq!(estimate_from_spectral_type(Some("XYZ")), None);
        assert_eq!(estimate_from_spectral_type(Some("")), None);
        assert_eq!(estimate_from_spectral_type(None), None);
    }

    #[test]
    fn test_object_type_defaults() {
        assert_eq!(default_for_object_type(Some("WD*")), Some(12_000.0));
        assert_eq!(default_for_object_type(Some("PSR")), Some(600_000.0));
        assert_eq!(default_for_object_type(Some("BH")), Some(100_000.0));
        assert_eq!(default_for_object_type(Some("Star")), None);
        assert_eq!(default_for_object_type(None), None);
    }

    #[test]
    fn test_cascade_metadata_beats_colour() {
        let rows = vec![row(1, None, Some(0.8))];
        let metadata = HashMap::from([(1i64, meta(None, None, Some(4321.0)))]);
        let outcome = resolve_overrides(&rows, &metadata);
        assert_eq!(outcome.overrides[&1], 4321.0);
        assert_eq!(outcome.stats.from_metadata, 1);
        assert_eq!(outcome.stats.from_colour, 0);
    }

    #[test]
    fn test_cascade_colour_beats_spectral() {
        let rows = vec![row(1, None, Some(0.8))];
        let metadata = HashMap::from([(1i64, meta(Some("M5"), None, None))]);
        let outcome = resolve_overrides(&rows, &metadata);
        assert_eq!(outcome.stats.from_colour, 1);
        assert_eq!(outcome.stats.from_spectral, 0);
        assert!(outcome.overrides[&1] > 4000.0);
    }

    #[test]
    fn test_cascade_spectral_then_default() {
        let rows = vec![row(1, None, None), row(2, None, None)];
        let metadata = HashMap::from([(1i64, meta(Some("K3"), None, None))]);
        let outcome = resolve_overrides(&rows, &metadata);
        assert_eq!(outcome.stats.from_spectral, 1);
        assert_eq!(outcome.stats.defaulted, 1);
        assert_eq!(outcome.overrides[&2], DEFAULT_FALLBACK_TEFF_K);
    }

    #[test]
    fn test_cascade_skips_rows_with_primary_temperature() {
        let rows = vec![row(1, Some(5777.0), Some(0.8)), row(2, None, None)];
        let outcome = resolve_overrides(&rows, &HashMap::new());
        assert!(!outcome.overrides.contains_key(&1));
        assert_eq!(outcome.stats.missing, 1);
    }

    #[test]
    fn test_cascade_covers_every_missing_id() {
        let rows: Vec<RawRow> = (0..25).map(|i| row(i, None, None)).collect();
        let outcome = resolve_overrides(&rows, &HashMap::new());
        assert_eq!(outcome.overrides.len(), 25);
        assert!(outcome.overrides.values().all(|t| *t == DEFAULT_FALLBACK_TEFF_K));
        assert_eq!(outcome.stats.defaulted, 25);
    }

    #[test]
    fn test_object_type_supplies_default_when_spectral_fails() {
        let rows = vec![row(1, None, None)];
        let metadata = HashMap::from([(1i64, meta(Some("??"), Some("PSR"), None))]);
        let outcome = resolve_overrides(&rows, &metadata);
        assert_eq!(outcome.overrides[&1], NEUTRON_STAR_FALLBACK_K);
    }
}
