//! Remote archive query
//!
//! Builds an ADQL selection from the query configuration and fetches
//! matching rows from the archive's synchronous TAP endpoint. The JSON
//! result (column metadata + row arrays) maps onto [`RawRow`] with every
//! absent or non-finite field treated as missing.

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use stellar_atlas::row::RawRow;
use stellar_atlas::QueryConfig;
use std::time::Duration;

const TAP_SYNC_URL: &str = "https://gea.esac.esa.int/tap-server/tap/sync";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

const COLUMNS: &str =
    "source_id, designation, ra, dec, parallax, parallax_over_error, ruwe, bp_rp, teff_gspphot";

#[derive(Debug, Deserialize)]
struct TapResponse {
    metadata: Vec<TapColumn>,
    data: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct TapColumn {
    name: String,
}

/// Renders the selection as ADQL.
pub fn build_query(query: &QueryConfig) -> String {
    let mut adql = String::from("SELECT ");
    if let Some(limit) = query.row_limit() {
        adql.push_str(&format!("TOP {} ", limit));
    }
    adql.push_str(COLUMNS);
    adql.push_str(" FROM gaiadr3.gaia_source WHERE ");
    adql.push_str(&format!(
        "parallax >= {:.6} AND parallax_over_error >= {:.3} AND ruwe <= {:.3}",
        query.min_parallax_mas(),
        query.min_parallax_snr(),
        query.max_ruwe()
    ));
    if let Some(floor) = query.min_teff_k() {
        // The floor constrains measured temperatures only; rows without one
        // stay in and go through the fallback cascade.
        adql.push_str(&format!(
            " AND (teff_gspphot >= {:.1} OR teff_gspphot IS NULL)",
            floor
        ));
    }
    adql
}

/// Runs the selection against the archive and parses the rows.
pub fn fetch_rows(query: &QueryConfig) -> anyhow::Result<Vec<RawRow>> {
    let adql = build_query(query);
    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .post(TAP_SYNC_URL)
        .form(&[
            ("REQUEST", "doQuery"),
            ("LANG", "ADQL"),
            ("FORMAT", "json"),
            ("QUERY", adql.as_str()),
        ])
        .send()
        .context("Failed to reach the archive TAP endpoint")?;

    if !response.status().is_success() {
        anyhow::bail!("Archive query failed: HTTP {}", response.status());
    }

    let body: TapResponse = response
        .json()
        .context("Failed to parse the archive TAP response")?;
    Ok(parse_rows(&body))
}

fn parse_rows(body: &TapResponse) -> Vec<RawRow> {
    let col = |name: &str| {
        body.metadata
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    };
    let source_id = col("source_id");
    let designation = col("designation");
    let ra = col("ra");
    let dec = col("dec");
    let parallax = col("parallax");
    let parallax_over_error = col("parallax_over_error");
    let ruwe = col("ruwe");
    let bp_rp = col("bp_rp");
    let teff_gspphot = col("teff_gspphot");

    body.data
        .iter()
        .map(|row| RawRow {
            source_id: value_i64(row, source_id),
            designation: value_string(row, designation),
            ra_deg: value_f64(row, ra),
            dec_deg: value_f64(row, dec),
            parallax_mas: value_f64(row, parallax),
            parallax_over_error: value_f64(row, parallax_over_error),
            ruwe: value_f64(row, ruwe),
            bp_rp: value_f64(row, bp_rp),
            teff_k: value_f64(row, teff_gspphot),
        })
        .collect()
}

fn cell<'a>(row: &'a [Value], index: Option<usize>) -> Option<&'a Value> {
    row.get(index?)
}

fn value_i64(row: &[Value], index: Option<usize>) -> Option<i64> {
    cell(row, index)?.as_i64()
}

fn value_f64(row: &[Value], index: Option<usize>) -> Option<f64> {
    cell(row, index)?.as_f64().filter(|v| v.is_finite())
}

fn value_string(row: &[Value], index: Option<usize>) -> Option<String> {
    let s = cell(row, index)?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> QueryConfig {
        QueryConfig::new(50.0, 10.0, 1.4).unwrap()
    }

    #[test]
    fn test_build_query_encodes_thresholds() {
        let adql = build_query(&query());
        assert!(adql.contains("parallax >= 65.23"));
        assert!(adql.contains("parallax_over_error >= 10.000"));
        assert!(adql.contains("ruwe <= 1.400"));
        assert!(!adql.contains("TOP"));
        assert!(!adql.contains("teff_gspphot >="));
    }

    #[test]
    fn test_build_query_with_limit_and_floor() {
        let adql = build_query(&query().with_min_teff(2500.0).with_row_limit(1000));
        assert!(adql.starts_with("SELECT TOP 1000 "));
        assert!(adql.contains("(teff_gspphot >= 2500.0 OR teff_gspphot IS NULL)"));
    }

    #[test]
    fn test_parse_rows_maps_columns_by_name() {
        let body = TapResponse {
            metadata: ["designation", "source_id", "ra", "dec", "parallax"]
                .iter()
                .map(|n| TapColumn {
                    name: n.to_string(),
                })
                .collect(),
            data: vec![vec![
                Value::from("Gaia DR3 42"),
                Value::from(42i64),
                Value::from(10.5),
                Value::from(-45.0),
                Value::from(250.0),
            ]],
        };
        let rows = parse_rows(&body);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source_id, Some(42));
        assert_eq!(rows[0].designation.as_deref(), Some("Gaia DR3 42"));
        assert_eq!(rows[0].parallax_mas, Some(250.0));
        assert_eq!(rows[0].bp_rp, None);
    }

    #[test]
    fn test_parse_rows_treats_nulls_as_absent() {
        let body = TapResponse {
            metadata: ["source_id", "ra", "dec", "parallax"]
                .iter()
                .map(|n| TapColumn {
                    name: n.to_string(),
                })
                .collect(),
            data: vec![vec![
                Value::from(7i64),
                Value::Null,
                Value::from(1.0),
                Value::Null,
            ]],
        };
        let rows = parse_rows(&body);
        assert_eq!(rows[0].ra_deg, None);
        assert_eq!(rows[0].parallax_mas, None);
        assert_eq!(rows[0].dec_deg, Some(1.0));
    }
}
