//! Raw catalog rows and the adapter that turns them into star records.
//!
//! A [`RawRow`] is the per-record input contract: every field is optional,
//! and absent, sentinel, or non-finite values are treated as missing rather
//! than as errors. [`adapt_row`] applies the structural checks (positive
//! parallax, usable coordinates, a name seed), converts the spherical
//! position to Cartesian light-years, and merges in any resolved overrides.
//!
//! [`RowReader`] parses locally saved archive extracts (CSV with optional
//! `#` comment lines) so the pipeline can run without the remote archive.

use crate::classify::Nature;
use crate::config::LY_PER_PARSEC;
use crate::error::{AtlasError, AtlasResult};
use crate::temperature::DEFAULT_FALLBACK_TEFF_K;
use std::collections::HashMap;
use std::io::BufRead;

/// One raw catalog row. Absent or invalid fields are `None`, never errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    /// Stable integer identifier (Gaia DR3 source_id).
    pub source_id: Option<i64>,
    /// Display designation, e.g. "Gaia DR3 12345".
    pub designation: Option<String>,
    /// Right ascension, degrees.
    pub ra_deg: Option<f64>,
    /// Declination, degrees.
    pub dec_deg: Option<f64>,
    /// Trigonometric parallax, milliarcseconds.
    pub parallax_mas: Option<f64>,
    /// Parallax signal-to-noise ratio.
    pub parallax_over_error: Option<f64>,
    /// Astrometric goodness-of-fit (RUWE). High values are unreliable.
    pub ruwe: Option<f64>,
    /// Blue-minus-red photometric colour index.
    pub bp_rp: Option<f64>,
    /// Directly measured effective temperature, Kelvin.
    pub teff_k: Option<f64>,
}

impl RawRow {
    /// Identifier string used to query the cross-match collaborator:
    /// the designation when present, else one built from the source id.
    pub fn query_identifier(&self) -> Option<String> {
        if let Some(designation) = &self.designation {
            let trimmed = designation.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        self.source_id.map(|sid| format!("Gaia DR3 {}", sid))
    }
}

/// A star's Cartesian position, light-years from the Sun.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// A fully resolved star: named, positioned, temperated, classified.
/// Immutable once built; consumed exactly once by the spatial binner.
#[derive(Debug, Clone)]
pub struct StarRecord {
    pub source_id: Option<i64>,
    pub name: String,
    pub position: Position,
    pub teff_k: f64,
    pub nature: Nature,
}

/// Returns the value only when present and finite.
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Turns one sanitized row plus resolved overrides into a [`StarRecord`],
/// or `None` if the row is structurally unusable.
///
/// A row is rejected when its parallax is absent or non-positive, either
/// coordinate is absent, or no name seed exists (no override, no
/// designation, no identifier). The temperature is the row's own
/// measurement when present, else the cascade override; a row that could
/// never be keyed into the cascade (no stable identifier) falls back to the
/// cascade's own default so the coverage invariant holds.
pub fn adapt_row(
    row: &RawRow,
    name_override: Option<&str>,
    teff_override: Option<f64>,
    nature: Nature,
) -> Option<StarRecord> {
    let parallax_mas = finite(row.parallax_mas).filter(|p| *p > 0.0)?;
    let ra_deg = finite(row.ra_deg)?;
    let dec_deg = finite(row.dec_deg)?;

    let name = match name_override {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => row.query_identifier()?,
    };

    let distance_ly = (1000.0 / parallax_mas) * LY_PER_PARSEC;
    let position = cartesian_from_spherical(ra_deg, dec_deg, distance_ly);

    let teff_k = finite(row.teff_k)
        .filter(|t| *t > 0.0)
        .or(teff_override)
        .unwrap_or(DEFAULT_FALLBACK_TEFF_K);

    Some(StarRecord {
        source_id: row.source_id,
        name,
        position,
        teff_k,
        nature,
    })
}

/// Standard spherical-to-Cartesian conversion, angles in degrees.
fn cartesian_from_spherical(ra_deg: f64, dec_deg: f64, distance_ly: f64) -> Position {
    let ra = ra_deg.to_radians();
    let dec = dec_deg.to_radians();
    Position {
        x: distance_ly * dec.cos() * ra.cos(),
        y: distance_ly * dec.cos() * ra.sin(),
        z: distance_ly * dec.sin(),
    }
}

struct ColumnIndices {
    source_id: usize,
    ra: usize,
    dec: usize,
    parallax: usize,
    designation: Option<usize>,
    parallax_over_error: Option<usize>,
    ruwe: Option<usize>,
    bp_rp: Option<usize>,
    teff_gspphot: Option<usize>,
}

/// Streaming CSV reader for archive extracts.
///
/// The first non-`#` line is the header; `source_id`, `ra`, `dec` and
/// `parallax` columns are required, everything else is optional. Empty and
/// unparseable fields become `None`.
pub struct RowReader<R: BufRead> {
    reader: R,
    indices: ColumnIndices,
    line_buf: String,
}

impl<R: BufRead> RowReader<R> {
    pub fn new(mut reader: R) -> AtlasResult<Self> {
        let indices = Self::parse_header(&mut reader)?;
        Ok(Self {
            reader,
            indices,
            line_buf: String::with_capacity(1024),
        })
    }

    fn parse_header(reader: &mut R) -> AtlasResult<ColumnIndices> {
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(AtlasError::parsing_error("EOF before finding header"));
            }
            if !line.trim().is_empty() && !line.starts_with('#') {
                break;
            }
        }
        Self::build_column_indices(&line)
    }

    fn build_column_indices(header_line: &str) -> AtlasResult<ColumnIndices> {
        let mut col_map: HashMap<&str, usize> = HashMap::new();
        for (idx, col) in header_line.trim().split(',').enumerate() {
            col_map.insert(col.trim(), idx);
        }
        Ok(ColumnIndices {
            source_id: Self::require_column(&col_map, "source_id")?,
            ra: Self::require_column(&col_map, "ra")?,
            dec: Self::require_column(&col_map, "dec")?,
            parallax: Self::require_column(&col_map, "parallax")?,
            designation: col_map.get("designation").copied(),
            parallax_over_error: col_map.get("parallax_over_error").copied(),
            ruwe: col_map.get("ruwe").copied(),
            bp_rp: col_map.get("bp_rp").copied(),
            teff_gspphot: col_map.get("teff_gspphot").copied(),
        })
    }

    fn require_column(col_map: &HashMap<&str, usize>, name: &str) -> AtlasResult<usize> {
        col_map
            .get(name)
            .copied()
            .ok_or_else(|| AtlasError::parsing_error(format!("Missing column: {}", name)))
    }

    fn parse_row(&self) -> RawRow {
        let fields: Vec<&str> = self.line_buf.trim().split(',').collect();
        let idx = &self.indices;
        RawRow {
            source_id: parse_i64(fields.get(idx.source_id).copied()),
            designation: idx
                .designation
                .and_then(|i| fields.get(i).copied())
                .and_then(parse_string),
            ra_deg: parse_f64(fields.get(idx.ra).copied()),
            dec_deg: parse_f64(fields.get(idx.dec).copied()),
            parallax_mas: parse_f64(fields.get(idx.parallax).copied()),
            parallax_over_error: idx
                .parallax_over_error
                .and_then(|i| parse_f64(fields.get(i).copied())),
            ruwe: idx.ruwe.and_then(|i| parse_f64(fields.get(i).copied())),
            bp_rp: idx.bp_rp.and_then(|i| parse_f64(fields.get(i).copied())),
            teff_k: idx
                .teff_gspphot
                .and_then(|i| parse_f64(fields.get(i).copied())),
        }
    }
}

impl<R: BufRead> Iterator for RowReader<R> {
    type Item = AtlasResult<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line_buf.clear();
            match self.reader.read_line(&mut self.line_buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            if self.line_buf.starts_with('#') || self.line_buf.trim().is_empty() {
                continue;
            }
            return Some(Ok(self.parse_row()));
        }
    }
}

fn parse_string(s: &str) -> Option<String> {
    let trimmed = s.trim().trim_matches('"').trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return None;
    }
    Some(trimmed.to_string())
}

fn parse_i64(s: Option<&str>) -> Option<i64> {
    s.and_then(|v| {
        let v = v.trim();
        if v.is_empty() {
            None
        } else {
            v.parse().ok()
        }
    })
}

fn parse_f64(s: Option<&str>) -> Option<f64> {
    s.and_then(|v| {
        let v = v.trim();
        if v.is_empty() || v.eq_ignore_ascii_case("null") {
            None
        } else {
            v.parse::<f64>().ok().filter(|p| p.is_finite())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn basic_row(parallax_mas: f64, ra_deg: f64, dec_deg: f64) -> RawRow {
        RawRow {
            source_id: Some(42),
            designation: Some("Gaia DR3 42".to_string()),
            ra_deg: Some(ra_deg),
            dec_deg: Some(dec_deg),
            parallax_mas: Some(parallax_mas),
            ..Default::default()
        }
    }

    #[test]
    fn test_adapt_converts_parallax_to_light_years() {
        // 200 mas -> 5 pc -> 16.3078 ly on the +x axis.
        let star = adapt_row(&basic_row(200.0, 0.0, 0.0), None, None, Nature::MainSequence)
            .expect("row should adapt");
        assert!((star.position.x - 16.3078).abs() < 1e-3);
        assert!(star.position.y.abs() < 1e-9);
        assert!(star.position.z.abs() < 1e-9);
    }

    #[test]
    fn test_adapt_polar_star_lands_on_z_axis() {
        let star = adapt_row(&basic_row(100.0, 120.0, 90.0), None, None, Nature::MainSequence)
            .expect("row should adapt");
        let d = 10.0 * LY_PER_PARSEC;
        assert!((star.position.z - d).abs() < 1e-9);
        assert!(star.position.x.abs() < 1e-9);
        assert!(star.position.y.abs() < 1e-9);
    }

    #[test]
    fn test_adapt_rejects_nonpositive_parallax() {
        assert!(adapt_row(&basic_row(0.0, 10.0, 10.0), None, None, Nature::MainSequence).is_none());
        assert!(
            adapt_row(&basic_row(-5.0, 10.0, 10.0), None, None, Nature::MainSequence).is_none()
        );
    }

    #[test]
    fn test_adapt_rejects_missing_coordinates() {
        let mut row = basic_row(100.0, 10.0, 10.0);
        row.dec_deg = None;
        assert!(adapt_row(&row, None, None, Nature::MainSequence).is_none());

        let mut row = basic_row(100.0, 10.0, 10.0);
        row.ra_deg = Some(f64::NAN);
        assert!(adapt_row(&row, None, None, Nature::MainSequence).is_none());
    }

    #[test]
    fn test_adapt_rejects_row_without_name_seed() {
        let mut row = basic_row(100.0, 10.0, 10.0);
        row.designation = None;
        row.source_id = None;
        assert!(adapt_row(&row, None, None, Nature::MainSequence).is_none());

        // An override name alone is a usable seed.
        let star = adapt_row(&row, Some("Wolf 359"), None, Nature::MainSequence);
        assert_eq!(star.unwrap().name, "Wolf 359");
    }

    #[test]
    fn test_adapt_name_precedence() {
        let row = basic_row(100.0, 10.0, 10.0);
        let star = adapt_row(&row, Some("Sirius"), None, Nature::MainSequence).unwrap();
        assert_eq!(star.name, "Sirius");

        let star = adapt_row(&row, None, None, Nature::MainSequence).unwrap();
        assert_eq!(star.name, "Gaia DR3 42");
    }

    #[test]
    fn test_adapt_prefers_measured_temperature() {
        let mut row = basic_row(100.0, 10.0, 10.0);
        row.teff_k = Some(5777.0);
        let star = adapt_row(&row, None, Some(4000.0), Nature::MainSequence).unwrap();
        assert_eq!(star.teff_k, 5777.0);
    }

    #[test]
    fn test_adapt_substitutes_override_temperature() {
        let row = basic_row(100.0, 10.0, 10.0);
        let star = adapt_row(&row, None, Some(4000.0), Nature::MainSequence).unwrap();
        assert_eq!(star.teff_k, 4000.0);
    }

    #[test]
    fn test_adapt_never_leaves_temperature_unset() {
        let mut row = basic_row(100.0, 10.0, 10.0);
        row.source_id = None;
        let star = adapt_row(&row, None, None, Nature::MainSequence).unwrap();
        assert_eq!(star.teff_k, DEFAULT_FALLBACK_TEFF_K);
    }

    #[test]
    fn test_query_identifier_fallback_chain() {
        let row = basic_row(100.0, 0.0, 0.0);
        assert_eq!(row.query_identifier().unwrap(), "Gaia DR3 42");

        let mut row = row;
        row.designation = Some("  ".to_string());
        assert_eq!(row.query_identifier().unwrap(), "Gaia DR3 42");
        row.source_id = None;
        assert!(row.query_identifier().is_none());
    }

    const CSV: &str = "\
# Archive extract, J2016.0
source_id,designation,ra,dec,parallax,parallax_over_error,ruwe,bp_rp,teff_gspphot
100,Gaia DR3 100,10.5,-45.0,250.0,80.0,1.01,0.82,5700.0
101,,200.0,30.0,120.0,55.2,0.98,2.4,
102,Gaia DR3 102,5.0,5.0,,12.0,1.2,,4100.0
";

    #[test]
    fn test_row_reader_parses_extract() {
        let reader = RowReader::new(Cursor::new(CSV)).unwrap();
        let rows: Vec<RawRow> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].source_id, Some(100));
        assert_eq!(rows[0].designation.as_deref(), Some("Gaia DR3 100"));
        assert_eq!(rows[0].teff_k, Some(5700.0));

        assert_eq!(rows[1].designation, None);
        assert_eq!(rows[1].teff_k, None);
        assert_eq!(rows[1].bp_rp, Some(2.4));

        assert_eq!(rows[2].parallax_mas, None);
    }

    #[test]
    fn test_row_reader_requires_core_columns() {
        let result = RowReader::new(Cursor::new("source_id,ra,dec\n1,2,3\n"));
        let msg = result.err().expect("expected error").to_string();
        assert!(msg.contains("parallax"), "unexpected error: {}", msg);
    }

    #[test]
    fn test_row_reader_treats_sentinels_as_absent() {
        let csv = "source_id,ra,dec,parallax\n7,NULL,1.0,NaN\n";
        let reader = RowReader::new(Cursor::new(csv)).unwrap();
        let rows: Vec<RawRow> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(rows[0].source_id, Some(7));
        assert_eq!(rows[0].ra_deg, None);
        assert_eq!(rows[0].parallax_mas, None);
    }
}
