//! Query and grid parameters with their derived quantities.
//!
//! [`QueryConfig`] describes the archive selection (search radius, quality
//! thresholds, optional temperature floor and row limit) and derives the
//! minimum detectable parallax for the radius. [`GridConfig`] fixes the voxel
//! geometry. Both validate on construction and are immutable afterwards.

use crate::error::{AtlasError, AtlasResult};

/// Light-years per parsec.
pub const LY_PER_PARSEC: f64 = 3.26156;

/// Archive selection parameters.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    radius_ly: f64,
    min_parallax_snr: f64,
    max_ruwe: f64,
    min_teff_k: Option<f64>,
    row_limit: Option<usize>,
}

impl QueryConfig {
    /// Creates a selection over a sphere of `radius_ly` light-years.
    ///
    /// # Errors
    /// Returns `AtlasError::InvalidConfig` if the radius is not positive and
    /// finite, or either quality threshold is non-finite.
    pub fn new(radius_ly: f64, min_parallax_snr: f64, max_ruwe: f64) -> AtlasResult<Self> {
        if !radius_ly.is_finite() || radius_ly <= 0.0 {
            return Err(AtlasError::invalid_config(format!(
                "Search radius must be positive and finite, got {}",
                radius_ly
            )));
        }
        if !min_parallax_snr.is_finite() {
            return Err(AtlasError::invalid_config(format!(
                "Parallax SNR floor must be finite, got {}",
                min_parallax_snr
            )));
        }
        if !max_ruwe.is_finite() {
            return Err(AtlasError::invalid_config(format!(
                "RUWE ceiling must be finite, got {}",
                max_ruwe
            )));
        }
        Ok(Self {
            radius_ly,
            min_parallax_snr,
            max_ruwe,
            min_teff_k: None,
            row_limit: None,
        })
    }

    /// Only select stars whose measured temperature is at least `min_teff_k`.
    /// Stars without a measured temperature are unaffected.
    pub fn with_min_teff(mut self, min_teff_k: f64) -> Self {
        self.min_teff_k = Some(min_teff_k);
        self
    }

    /// Cap the number of retrieved rows.
    pub fn with_row_limit(mut self, row_limit: usize) -> Self {
        self.row_limit = Some(row_limit);
        self
    }

    pub fn radius_ly(&self) -> f64 {
        self.radius_ly
    }

    pub fn min_parallax_snr(&self) -> f64 {
        self.min_parallax_snr
    }

    pub fn max_ruwe(&self) -> f64 {
        self.max_ruwe
    }

    pub fn min_teff_k(&self) -> Option<f64> {
        self.min_teff_k
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.row_limit
    }

    /// Smallest parallax a star inside the search radius can have.
    ///
    /// A star at exactly `radius_ly` has parallax
    /// `1000 / (radius_ly / 3.26156)` milliarcseconds; anything smaller lies
    /// beyond the sphere.
    pub fn min_parallax_mas(&self) -> f64 {
        1000.0 / (self.radius_ly / LY_PER_PARSEC)
    }
}

/// Voxel grid geometry.
#[derive(Debug, Clone)]
pub struct GridConfig {
    edge_ly: f64,
    half_extent_ly: f64,
}

impl GridConfig {
    /// Creates a grid of cubes with `edge_ly` sides covering
    /// `[-half_extent_ly, +half_extent_ly]` on every axis.
    ///
    /// # Errors
    /// Returns `AtlasError::InvalidConfig` if either length is not positive
    /// and finite.
    pub fn new(edge_ly: f64, half_extent_ly: f64) -> AtlasResult<Self> {
        if !edge_ly.is_finite() || edge_ly <= 0.0 {
            return Err(AtlasError::invalid_config(format!(
                "Cube edge length must be positive and finite, got {}",
                edge_ly
            )));
        }
        if !half_extent_ly.is_finite() || half_extent_ly <= 0.0 {
            return Err(AtlasError::invalid_config(format!(
                "Grid half-extent must be positive and finite, got {}",
                half_extent_ly
            )));
        }
        Ok(Self {
            edge_ly,
            half_extent_ly,
        })
    }

    pub fn edge_ly(&self) -> f64 {
        self.edge_ly
    }

    pub fn half_extent_ly(&self) -> f64 {
        self.half_extent_ly
    }
}
