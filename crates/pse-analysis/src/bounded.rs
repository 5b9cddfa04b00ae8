//! Extremum search restricted to a trimmed region of the parameter domain.

use pse_core::config::ExtremumConfig;
use pse_core::{Outcome, Progress, PseError, Result};
use pse_geometry::Surface;
use serde::{Deserialize, Serialize};

use crate::curvature::CurvatureField;
use crate::extremum::{bounded_search, run, ExtremumStrategy, FieldExtrema};

/// Closed polygon in `(u, v)` bounding the searched part of a surface.
///
/// With a border margin, points closer than the margin to the boundary are not
/// admitted and the boundary itself is not sampled, which keeps a search away
/// from trimming curves whose curvature is meaningless for the face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimRegion {
    boundary: Vec<(f64, f64)>,
    border_margin: Option<f64>,
}

impl TrimRegion {
    pub fn new(boundary: Vec<(f64, f64)>) -> Result<Self> {
        if boundary.len() < 3 {
            return Err(PseError::Domain(format!(
                "trim region needs at least 3 vertices, got {}",
                boundary.len()
            )));
        }
        if boundary.iter().any(|(u, v)| !u.is_finite() || !v.is_finite()) {
            return Err(PseError::Domain("trim region vertex is not finite".into()));
        }
        Ok(Self {
            boundary,
            border_margin: None,
        })
    }

    pub fn rectangle(u: (f64, f64), v: (f64, f64)) -> Result<Self> {
        if !(u.0 < u.1 && v.0 < v.1) {
            return Err(PseError::Domain(format!("empty trim rectangle {u:?} x {v:?}")));
        }
        Self::new(vec![(u.0, v.0), (u.1, v.0), (u.1, v.1), (u.0, v.1)])
    }

    /// Exclude the boundary and a band of width `margin` inside it.
    pub fn ignoring_border(mut self, margin: f64) -> Self {
        self.border_margin = Some(margin.max(0.0));
        self
    }

    pub fn boundary(&self) -> &[(f64, f64)] {
        &self.boundary
    }

    pub fn ignores_border(&self) -> bool {
        self.border_margin.is_some()
    }

    /// Even-odd point-in-polygon test.
    pub fn contains(&self, u: f64, v: f64) -> bool {
        let n = self.boundary.len();
        let mut inside = false;
        for i in 0..n {
            let (ua, va) = self.boundary[i];
            let (ub, vb) = self.boundary[(i + 1) % n];
            if (va > v) != (vb > v) {
                let cross = ua + (v - va) / (vb - va) * (ub - ua);
                if u < cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Distance in parameter space from `(u, v)` to the nearest boundary edge.
    pub fn distance_to_border(&self, u: f64, v: f64) -> f64 {
        let n = self.boundary.len();
        (0..n)
            .map(|i| segment_distance((u, v), self.boundary[i], self.boundary[(i + 1) % n]))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn admits(&self, u: f64, v: f64) -> bool {
        if !self.contains(u, v) {
            return false;
        }
        match self.border_margin {
            Some(margin) => self.distance_to_border(u, v) > margin,
            None => true,
        }
    }

    /// Bounding rectangle `((umin, umax), (vmin, vmax))`.
    pub fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        self.boundary.iter().fold(
            ((f64::INFINITY, f64::NEG_INFINITY), (f64::INFINITY, f64::NEG_INFINITY)),
            |((u0, u1), (v0, v1)), &(u, v)| ((u0.min(u), u1.max(u)), (v0.min(v), v1.max(v))),
        )
    }
}

fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p.0 - a.0 - t * dx).hypot(p.1 - a.1 - t * dy)
}

/// [`find_extrema`](crate::extremum::find_extrema) over the part of the domain
/// admitted by `region`.
///
/// On a closed axis the region is moved by whole periods onto the domain, so a
/// region given past the seam searches the same band of the surface. A region
/// that still misses the domain yields [`Outcome::NotFound`].
pub fn find_extrema_bounded(
    surface: &Surface,
    field: CurvatureField,
    strategy: ExtremumStrategy,
    config: &ExtremumConfig,
    region: &TrimRegion,
    progress: &dyn Progress,
) -> Outcome<FieldExtrema> {
    match bounded_search(surface, field, config, region) {
        Some(search) => run(search, strategy, progress),
        None => Outcome::NotFound,
    }
}
