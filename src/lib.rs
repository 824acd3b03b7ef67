//! Voxel star-map pipeline.
//!
//! Ingests raw stellar-catalog rows (position, parallax, photometry,
//! optional temperature) and produces a spatially indexed, enriched
//! payload: every star gets a canonical display name, a best-effort
//! effective temperature, a coarse physical category, and a position inside
//! a fixed-size 3D voxel grid.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | [`QueryConfig`], [`GridConfig`], derived minimum parallax |
//! | [`row`] | Input row contract, sanitization, CSV reading, Cartesian conversion |
//! | [`crossmatch`] | Cross-match collaborator trait and batch machinery |
//! | [`naming`] | Scored candidate ranking for canonical display names |
//! | [`temperature`] | Four-stage effective-temperature cascade |
//! | [`classify`] | [`Nature`] categories from object/spectral types |
//! | [`grid`] | Voxel accumulator with per-cube normalized positions |
//! | [`output`] | Payload assembly, JSON + gzip writing |
//! | [`validate`] | Post-hoc structural validation of written payloads |
//! | [`pipeline`] | End-to-end orchestration and run statistics |
//!
//! # Quick Start
//!
//! ```ignore
//! use stellar_atlas::{pipeline, GridConfig, QueryConfig};
//!
//! let query = QueryConfig::new(50.0, 10.0, 1.4)?.with_row_limit(50_000);
//! let grid = GridConfig::new(10.0, 60.0)?;
//!
//! let rows = /* archive rows, remote or from a local extract */;
//! let output = pipeline::run(rows, &query, &grid, None, chrono::Utc::now());
//! stellar_atlas::output::write_payload(&output.payload, "atlas.json".as_ref())?;
//! ```
//!
//! # Features
//!
//! - **`cli`** — Enables the `atlas` binary (payload generation against the
//!   remote archive, offline extracts, and payload validation).

pub mod classify;
pub mod config;
pub mod crossmatch;
pub mod error;
pub mod grid;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod row;
pub mod temperature;
pub mod validate;

pub use classify::Nature;
pub use config::{GridConfig, QueryConfig};
pub use error::{AtlasError, AtlasResult};
