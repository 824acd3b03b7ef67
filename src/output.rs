//! Final payload assembly and writing.
//!
//! [`assemble`] combines grid and query metadata with the cube map into the
//! serializable payload. [`write_payload`] serializes once and writes the
//! JSON file plus a byte-identical gzip copy alongside it, each through a
//! temp-then-rename so readers never observe a partial file.

use crate::classify::Nature;
use crate::config::{GridConfig, QueryConfig};
use crate::error::AtlasResult;
use crate::grid::{cube_key, VoxelGrid};
use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct Payload {
    pub metadata: PayloadMetadata,
    pub selection: SelectionEcho,
    pub cubes: BTreeMap<String, CubeEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PayloadMetadata {
    pub grid_edge_ly: f64,
    pub half_extent_ly: f64,
    pub query_radius_ly: f64,
    /// Rows retrieved from the archive before adaptation.
    pub retrieved_rows: usize,
    /// Stars that survived adaptation and landed in a cube.
    pub retained_stars: usize,
    /// Non-empty cubes.
    pub cube_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// Echo of the resolved selection parameters.
#[derive(Debug, Serialize, Deserialize)]
pub struct SelectionEcho {
    pub min_parallax_mas: f64,
    pub min_parallax_snr: f64,
    pub max_ruwe: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_teff_k: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CubeEntry {
    pub index: [i64; 3],
    pub origin: [f64; 3],
    pub stars: Vec<StarEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StarEntry {
    pub name: String,
    pub relative_position: [f64; 3],
    pub temperature: f64,
    pub nature: Nature,
}

/// Builds the payload from the populated grid and the run's parameters.
pub fn assemble(
    query: &QueryConfig,
    grid_config: &GridConfig,
    grid: &VoxelGrid,
    retrieved_rows: usize,
    generated_at: DateTime<Utc>,
) -> Payload {
    let cubes: BTreeMap<String, CubeEntry> = grid
        .cubes()
        .map(|cube| {
            let stars = cube
                .stars
                .iter()
                .map(|star| StarEntry {
                    name: star.name.clone(),
                    relative_position: star.relative_position,
                    temperature: star.teff_k,
                    nature: star.nature,
                })
                .collect();
            (
                cube_key(cube.index),
                CubeEntry {
                    index: cube.index,
                    origin: cube.origin,
                    stars,
                },
            )
        })
        .collect();

    Payload {
        metadata: PayloadMetadata {
            grid_edge_ly: grid_config.edge_ly(),
            half_extent_ly: grid_config.half_extent_ly(),
            query_radius_ly: query.radius_ly(),
            retrieved_rows,
            retained_stars: grid.star_count(),
            cube_count: grid.cube_count(),
            generated_at,
        },
        selection: SelectionEcho {
            min_parallax_mas: query.min_parallax_mas(),
            min_parallax_snr: query.min_parallax_snr(),
            max_ruwe: query.max_ruwe(),
            min_teff_k: query.min_teff_k(),
            row_limit: query.row_limit(),
        },
        cubes,
    }
}

/// Writes the payload to `path` and a gzip copy of the same bytes to
/// `path` + `.gz`. Returns the gzip path.
pub fn write_payload(payload: &Payload, path: &Path) -> AtlasResult<PathBuf> {
    let bytes = serde_json::to_vec_pretty(payload)?;

    write_atomically(path, &bytes)?;

    let gz_path = gzip_sibling(path);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&bytes)?;
    let compressed = encoder.finish()?;
    write_atomically(&gz_path, &compressed)?;

    Ok(gz_path)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn gzip_sibling(path: &Path) -> PathBuf {
    with_suffix(path, ".gz")
}

fn write_atomically(path: &Path, bytes: &[u8]) -> AtlasResult<()> {
    let tmp_path = with_suffix(path, ".tmp");
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{Position, StarRecord};
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn sample_payload() -> Payload {
        let query = QueryConfig::new(50.0, 10.0, 1.4).unwrap().with_row_limit(100);
        let grid_config = GridConfig::new(10.0, 20.0).unwrap();
        let mut grid = VoxelGrid::new(&grid_config);
        grid.add(&StarRecord {
            source_id: Some(1),
            name: "Tau Ceti".to_string(),
            position: Position {
                x: 5.0,
                y: -5.0,
                z: 5.0,
            },
            teff_k: 5344.0,
            nature: Nature::MainSequence,
        });
        let generated_at = DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assemble(&query, &grid_config, &grid, 7, generated_at)
    }

    #[test]
    fn test_assemble_counts_and_keys() {
        let payload = sample_payload();
        assert_eq!(payload.metadata.retrieved_rows, 7);
        assert_eq!(payload.metadata.retained_stars, 1);
        assert_eq!(payload.metadata.cube_count, 1);
        assert!(payload.cubes.contains_key("0:-1:0"));

        let cube = &payload.cubes["0:-1:0"];
        assert_eq!(cube.index, [0, -1, 0]);
        assert_eq!(cube.origin, [0.0, -10.0, 0.0]);
        assert_eq!(cube.stars[0].name, "Tau Ceti");
    }

    #[test]
    fn test_selection_echo() {
        let payload = sample_payload();
        assert!((payload.selection.min_parallax_mas - 65.2312).abs() < 0.001);
        assert_eq!(payload.selection.row_limit, Some(100));
        assert_eq!(payload.selection.min_teff_k, None);
    }

    #[test]
    fn test_optional_selection_fields_are_omitted() {
        let payload = sample_payload();
        let json = serde_json::to_string(&payload.selection).unwrap();
        assert!(json.contains("row_limit"));
        assert!(!json.contains("min_teff_k"));
    }

    #[test]
    fn test_write_payload_and_gzip_copy_match() {
        let payload = sample_payload();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.json");

        let gz_path = write_payload(&payload, &path).unwrap();
        assert_eq!(gz_path, dir.path().join("atlas.json.gz"));

        let plain = fs::read(&path).unwrap();
        let mut decoder = GzDecoder::new(fs::File::open(&gz_path).unwrap());
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).unwrap();
        assert_eq!(plain, decompressed);

        let round_trip: Payload = serde_json::from_slice(&plain).unwrap();
        assert_eq!(round_trip.metadata.retained_stars, 1);
        assert_eq!(round_trip.cubes["0:-1:0"].stars[0].temperature, 5344.0);
    }
}
