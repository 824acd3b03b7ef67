//! SIMBAD TAP cross-match provider
//!
//! Resolves identifier batches against SIMBAD's synchronous TAP endpoint:
//! one ADQL query per batch joining `ident` (for the echoed query
//! identifier), `basic` (main id, spectral type, object type), `ids` (the
//! "|"-delimited alias list) and `mesFe_h` (measured effective
//! temperatures). The echoed identifier correlates each returned row back
//! to its position in the batch, so out-of-order results are harmless.

use serde::Deserialize;
use serde_json::Value;
use stellar_atlas::crossmatch::{CrossmatchProvider, CrossmatchRecord};
use stellar_atlas::{AtlasError, AtlasResult};
use std::time::Duration;

const TAP_SYNC_URL: &str = "https://simbad.cds.unistra.fr/simbad/sim-tap/sync";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct TapResponse {
    metadata: Vec<TapColumn>,
    data: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct TapColumn {
    name: String,
}

pub struct SimbadTapProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl SimbadTapProvider {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: TAP_SYNC_URL.to_string(),
        })
    }

    fn query(&self, adql: &str) -> AtlasResult<TapResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[
                ("REQUEST", "doQuery"),
                ("LANG", "ADQL"),
                ("FORMAT", "json"),
                ("QUERY", adql),
            ])
            .send()
            .map_err(|e| AtlasError::crossmatch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AtlasError::crossmatch(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .map_err(|e| AtlasError::crossmatch(e.to_string()))
    }
}

impl CrossmatchProvider for SimbadTapProvider {
    fn lookup(&self, identifiers: &[String]) -> AtlasResult<Vec<CrossmatchRecord>> {
        if identifiers.is_empty() {
            return Ok(Vec::new());
        }
        let adql = build_lookup_query(identifiers);
        let body = self.query(&adql)?;
        Ok(parse_records(&body, identifiers))
    }
}

fn build_lookup_query(identifiers: &[String]) -> String {
    let id_list = identifiers
        .iter()
        .map(|id| format!("'{}'", escape_adql(id)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT i.id, b.main_id, ids.ids, b.sp_type, b.otype_txt, m.teff \
         FROM ident AS i \
         JOIN basic AS b ON b.oid = i.oidref \
         LEFT JOIN ids ON ids.oidref = i.oidref \
         LEFT JOIN mesFe_h AS m ON m.oidref = i.oidref \
         WHERE i.id IN ({})",
        id_list
    )
}

fn escape_adql(s: &str) -> String {
    s.replace('\'', "''")
}

fn parse_records(body: &TapResponse, identifiers: &[String]) -> Vec<CrossmatchRecord> {
    let col = |name: &str| {
        body.metadata
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    };
    let id = col("id");
    let main_id = col("main_id");
    let ids = col("ids");
    let sp_type = col("sp_type");
    let otype = col("otype_txt");
    let teff = col("teff");

    body.data
        .iter()
        .map(|row| CrossmatchRecord {
            // The echoed identifier pins the row to its batch position.
            query_index: value_string(row, id)
                .and_then(|echoed| identifiers.iter().position(|q| *q == echoed)),
            main_id: value_string(row, main_id),
            aliases: value_string(row, ids),
            spectral_type: value_string(row, sp_type),
            object_type: value_string(row, otype),
            teff_k: value_f64(row, teff),
        })
        .collect()
}

fn cell<'a>(row: &'a [Value], index: Option<usize>) -> Option<&'a Value> {
    row.get(index?)
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
