//! Conversion of any surface patch to a bicubic B-spline.

use pse_core::config::FittingConfig;
use pse_core::{ensure_positive, PseError, Result};
use pse_math::Point3;
use rayon::prelude::*;

use super::{BSplineSurface, ParamDomain, Scratch, Surface, SurfaceEval};
use crate::nurbs::fit::interpolate_grid;

const DEGREE: usize = 3;
/// Cell fractions checked against the source surface, per axis.
const CHECK_FRACTIONS: [f64; 3] = [0.25, 0.5, 0.75];
/// Share of the tolerance the checked points may use; the unchecked rest of a
/// cell deviates slightly more than its worst checked point.
const CHECK_SAFETY: f64 = 0.5;

impl Surface {
    /// Bicubic B-spline approximating the patch `u` x `v` within `tolerance`.
    ///
    /// The patch keeps the surface's parametrization: the result evaluated at
    /// `(u, v)` is close to `self.point_at_raw(u, v)`.
    pub fn to_nurbs(&self, u: (f64, f64), v: (f64, f64), tolerance: f64) -> Result<BSplineSurface> {
        self.to_nurbs_with(u, v, tolerance, &FittingConfig::default())
    }

    /// Interpolate an `n` x `n` grid, doubling the density until the deviation at
    /// the quarter points of every cell is within half of `tolerance` or
    /// `config.max_points` is reached.
    pub fn to_nurbs_with(
        &self,
        u: (f64, f64),
        v: (f64, f64),
        tolerance: f64,
        config: &FittingConfig,
    ) -> Result<BSplineSurface> {
        ParamDomain::new(u, v)?;
        ensure_positive("conversion tolerance", tolerance)?;
        let max_points = config.max_points.max(DEGREE + 1);
        let mut n = config.initial_points.clamp(DEGREE + 1, max_points);
        loop {
            let params_u = linspace(u, n);
            let params_v = linspace(v, n);
            let patch = self.interpolate(&params_u, &params_v)?;
            let deviation = self.cell_deviation(&patch, &params_u, &params_v);
            if deviation <= CHECK_SAFETY * tolerance {
                tracing::debug!(id = %self.id(), points = n, deviation, "converted to bicubic patch");
                return Ok(patch);
            }
            if n >= max_points {
                tracing::warn!(id = %self.id(), points = n, deviation, tolerance, "conversion did not reach tolerance");
                return Err(PseError::NotConverged(format!(
                    "deviation {deviation:e} above {tolerance:e} with {n} x {n} points"
                )));
            }
            n = (2 * n - 1).min(max_points);
        }
    }

    fn interpolate(&self, params_u: &[f64], params_v: &[f64]) -> Result<BSplineSurface> {
        let grid: Vec<Vec<Point3>> = params_u
            .par_iter()
            .map(|&pu| params_v.iter().map(|&pv| self.point_at_raw(pu, pv)).collect())
            .collect();
        let (knots_u, knots_v, control_points) = interpolate_grid(params_u, params_v, &grid, DEGREE)?;
        BSplineSurface::new(DEGREE, DEGREE, knots_u, knots_v, control_points)
    }

    /// Largest distance between `patch` and the surface over the quarter points
    /// of every interpolation cell.
    fn cell_deviation(&self, patch: &BSplineSurface, params_u: &[f64], params_v: &[f64]) -> f64 {
        params_u
            .par_windows(2)
            .map(|wu| {
                let mut scratch = Scratch::default();
                let mut worst: f64 = 0.0;
                for wv in params_v.windows(2) {
                    for fu in CHECK_FRACTIONS {
                        let pu = wu[0] + fu * (wu[1] - wu[0]);
                        for fv in CHECK_FRACTIONS {
                            let pv = wv[0] + fv * (wv[1] - wv[0]);
                            let gap = (patch.eval(pu, pv, 0, &mut scratch).point - self.point_at_raw(pu, pv)).length();
                            worst = worst.max(gap);
                        }
                    }
                }
                worst
            })
            .reduce(|| 0.0, f64::max)
    }
}

fn linspace((lo, hi): (f64, f64), n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| if i + 1 == n { hi } else { lo + (hi - lo) * i as f64 / (n - 1) as f64 })
        .collect()
}
