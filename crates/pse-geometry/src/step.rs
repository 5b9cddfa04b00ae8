//! Parametric step sizes for sampling a surface.
//!
//! Consumers that walk a surface (tessellators, marching schemes) ask a
//! [`StepEstimator`] how far they may advance in `u` and `v` from a point while
//! keeping the chord deviation below `sag` and the turning of the tangent below
//! `angle`.

use crate::surface::Surface;

/// Collaborator choosing parameter increments on a surface.
pub trait StepEstimator: Send + Sync {
    /// Parameter increments `(du, dv)` at `(u, v)`.
    fn step(&self, surface: &Surface, u: f64, v: f64, sag: f64, angle: f64) -> (f64, f64);
}

/// Steps from the curvature of the two isoparametric curves through the point.
///
/// An arc of curvature `k` deviates from its chord of length `L` by about
/// `k L^2 / 8` and turns by `k L`, which bounds `L` by both criteria. The arc
/// length is turned into a parameter increment through the speed `|Su|` or `|Sv|`
/// and clamped to fractions of the domain width or height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvatureStepEstimator {
    pub min_fraction: f64,
    pub max_fraction: f64,
}

impl Default for CurvatureStepEstimator {
    fn default() -> Self {
        Self {
            min_fraction: 1e-4,
            max_fraction: 0.25,
        }
    }
}

impl CurvatureStepEstimator {
    fn param_step(&self, bend: f64, speed: f64, sag: f64, angle: f64, span: f64) -> f64 {
        let (lo, hi) = (self.min_fraction * span, self.max_fraction * span);
        if speed <= f64::EPSILON {
            return lo;
        }
        let k = bend / speed.powi(3);
        let mut arc = f64::INFINITY;
        if k > f64::EPSILON {
            if sag > 0.0 {
                arc = arc.min((8.0 * sag / k).sqrt());
            }
            if angle > 0.0 {
                arc = arc.min(angle / k);
            }
        }
        (arc / speed).clamp(lo, hi)
    }
}

impl StepEstimator for CurvatureStepEstimator {
    fn step(&self, surface: &Surface, u: f64, v: f64, sag: f64, angle: f64) -> (f64, f64) {
        let b = surface.derivs(u, v);
        let domain = surface.domain();
        let du = self.param_step(b.du.cross(b.duu).length(), b.du.length(), sag, angle, domain.width());
        let dv = self.param_step(b.dv.cross(b.dvv).length(), b.dv.length(), sag, angle, domain.height());
        (du, dv)
    }
}

impl Surface {
    /// Parameter increments at `(u, v)` chosen by `estimator`.
    pub fn step_size(&self, u: f64, v: f64, sag: f64, angle: f64, estimator: &dyn StepEstimator) -> (f64, f64) {
        estimator.step(self, u, v, sag, angle)
    }
}
