//! Fixed-size voxel grid accumulator.
//!
//! Stars are bucketed into cubes of `edge_ly` side length covering
//! `[-half_extent, +half_extent]` per axis. Cubes are created lazily on
//! first use and never removed; each cube records its integer index, its
//! Cartesian origin, and its stars in append order. The cube map is a
//! `BTreeMap` keyed by the integer triple, so iteration order (and with it
//! the serialized payload) is reproducible across runs.

use crate::classify::Nature;
use crate::config::GridConfig;
use crate::row::StarRecord;
use std::collections::BTreeMap;

/// Signed, unbounded per-axis cube indices.
pub type CubeIndex = [i64; 3];

/// Renders a cube index as the payload key, e.g. `"0:-1:3"`.
pub fn cube_key(index: CubeIndex) -> String {
    format!("{}:{}:{}", index[0], index[1], index[2])
}

/// One star as stored inside a cube.
#[derive(Debug, Clone)]
pub struct CubeStar {
    pub name: String,
    /// Position inside the cube, each component in [0, 1].
    pub relative_position: [f64; 3],
    pub teff_k: f64,
    pub nature: Nature,
}

/// A voxel with the stars assigned to it.
#[derive(Debug, Clone)]
pub struct Cube {
    pub index: CubeIndex,
    /// Cartesian corner of the cube: `index * edge` per axis.
    pub origin: [f64; 3],
    pub stars: Vec<CubeStar>,
}

/// Accumulates stars into cubes.
pub struct VoxelGrid {
    edge_ly: f64,
    half_extent_ly: f64,
    cubes: BTreeMap<CubeIndex, Cube>,
}

impl VoxelGrid {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            edge_ly: config.edge_ly(),
            half_extent_ly: config.half_extent_ly(),
            cubes: BTreeMap::new(),
        }
    }

    /// Assigns a star to its cube.
    ///
    /// Returns `false` without touching any state when a coordinate falls
    /// outside `[-half_extent, +half_extent]` (inclusive, per axis).
    pub fn add(&mut self, star: &StarRecord) -> bool {
        let coords = star.position.to_array();
        if coords.iter().any(|c| c.abs() > self.half_extent_ly) {
            return false;
        }

        let edge = self.edge_ly;
        let index = coords.map(|c| (c / edge).floor() as i64);
        let origin = index.map(|i| i as f64 * edge);
        let relative_position = [
            ((coords[0] - origin[0]) / edge).clamp(0.0, 1.0),
            ((coords[1] - origin[1]) / edge).clamp(0.0, 1.0),
            ((coords[2] - origin[2]) / edge).clamp(0.0, 1.0),
        ];

        let cube = self.cubes.entry(index).or_insert_with(|| Cube {
            index,
            origin,
            stars: Vec::new(),
        });
        cube.stars.push(CubeStar {
            name: star.name.clone(),
            relative_position,
            teff_k: star.teff_k,
            nature: star.nature,
        });
        true
    }

    /// Non-empty cubes in index order.
    pub fn cubes(&self) -> impl Iterator<Item = &Cube> {
        self.cubes.values()
    }

    pub fn cube_count(&self) -> usize {
        self.cubes.len()
    }

    /// Total stars across all cubes.
    pub fn star_count(&self) -> usize {
        self.cubes.values().map(|c| c.stars.len()).sum()
    }
}
