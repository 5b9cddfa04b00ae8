//! Engine-wide configuration.
//!
//! All settings have defaults; a partial JSON document overrides only the
//! fields it names.

use serde::{Deserialize, Serialize};

use crate::error::{PseError, Result};
use crate::tolerance::Tolerance;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tolerance: Tolerance,
    pub extremum: ExtremumConfig,
    pub scan: ScanConfig,
    pub cache: CacheConfig,
    pub fitting: FittingConfig,
}

/// Settings of the curvature extremum search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtremumConfig {
    /// Seeds (gradient descent) or samples (line segregation) per axis.
    pub grid: usize,
    /// Iteration cap of a single descent.
    pub max_iterations: usize,
    /// Descent stops once a parameter step is shorter than this.
    pub step_tolerance: f64,
    /// Seeds, nodes or cells between two polls of the progress collaborator.
    pub poll_every: usize,
}

/// Settings of the grid min/max distance scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub grid_u: usize,
    pub grid_v: usize,
    /// How many smallest and how many largest distances to keep.
    pub keep: usize,
    /// Samples between two polls of the progress collaborator.
    pub poll_every: usize,
    /// Distances closer than this collapse into one record.
    pub merge_epsilon: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Idle scratch blocks kept per surface; extra blocks are dropped on release.
    pub max_idle_blocks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FittingConfig {
    /// Upper bound of interpolation points per axis in NURBS conversion.
    pub max_points: usize,
    /// Starting number of interpolation points per axis.
    pub initial_points: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            extremum: ExtremumConfig::default(),
            scan: ScanConfig::default(),
            cache: CacheConfig::default(),
            fitting: FittingConfig::default(),
        }
    }
}

impl Default for ExtremumConfig {
    fn default() -> Self {
        Self {
            grid: 9,
            max_iterations: 200,
            step_tolerance: 1e-9,
            poll_every: 32,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            grid_u: 16,
            grid_v: 16,
            keep: 1,
            poll_every: 32,
            merge_epsilon: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_idle_blocks: 16 }
    }
}

impl Default for FittingConfig {
    fn default() -> Self {
        Self {
            max_points: 65,
            initial_points: 5,
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let tol = &self.tolerance;
        if !(tol.linear > 0.0 && tol.angular > 0.0 && tol.parametric > 0.0) {
            return Err(PseError::Config("tolerances must be positive".into()));
        }
        if self.extremum.grid < 2 {
            return Err(PseError::Config("extremum grid needs at least 2 samples per axis".into()));
        }
        if self.extremum.max_iterations == 0 || self.extremum.poll_every == 0 {
            return Err(PseError::Config("extremum iteration cap and poll cadence must be non-zero".into()));
        }
        if self.scan.grid_u < 1 || self.scan.grid_v < 1 {
            return Err(PseError::Config("scan grid must be non-empty".into()));
        }
        if self.scan.keep == 0 || self.scan.poll_every == 0 {
            return Err(PseError::Config("scan keep count and poll cadence must be non-zero".into()));
        }
        if let Some(eps) = self.scan.merge_epsilon {
            if eps < 0.0 {
                return Err(PseError::Config("merge epsilon must not be negative".into()));
            }
        }
        if self.fitting.initial_points < 4 || self.fitting.max_points < self.fitting.initial_points {
            return Err(PseError::Config(
                "fitting needs at least 4 initial points and max_points >= initial_points".into(),
            ));
        }
        Ok(())
    }
}
