//! Surface of revolution.
//!
//! `P(u, v) = o + R(u) (G(v) - o)` where `R(u)` rotates about the axis through `o`
//! by angle `u`. Partials in `u` use the rotation-derivative recurrence.

use std::f64::consts::TAU;

use pse_core::{ensure_positive, Result};
use pse_math::rotation::rotation_derivs;
use pse_math::{Axis, MatDerivs, Vector3};

use super::{DerivBundle, Edge, ParamDomain, Poles, Scratch, SurfaceEval};
use crate::curve::CurveRef;

#[derive(Debug, Clone)]
pub struct RevolutionSurface {
    pub generator: CurveRef,
    pub axis: Axis,
    /// Swept angle; a full turn closes the surface in `u`.
    pub angle: f64,
}

impl RevolutionSurface {
    /// Full turn of `generator` about `axis`.
    pub fn new(generator: CurveRef, axis: Axis) -> Result<Self> {
        Self::partial(generator, axis, TAU)
    }

    pub fn partial(generator: CurveRef, axis: Axis, angle: f64) -> Result<Self> {
        ensure_positive("revolution angle", angle)?;
        Ok(Self {
            generator,
            axis,
            angle: angle.min(TAU),
        })
    }

    pub fn is_full_turn(&self) -> bool {
        (self.angle - TAU).abs() < 1e-12
    }

    pub(super) fn set_generator(&mut self, generator: CurveRef) -> Result<()> {
        self.generator = generator;
        Ok(())
    }

    pub(super) fn set_axis(&mut self, axis: Axis) -> Result<()> {
        self.axis = axis;
        Ok(())
    }

    fn rotation(&self, u: f64, scratch: &mut Scratch) -> MatDerivs {
        if !scratch.holds(u) {
            let r = rotation_derivs(self.axis.direction, 1.0, u);
            scratch.matrices[..4].copy_from_slice(&r);
            scratch.set_key(u);
        }
        std::array::from_fn(|n| scratch.matrices[n])
    }
}

impl SurfaceEval for RevolutionSurface {
    fn eval(&self, u: f64, v: f64, order: usize, scratch: &mut Scratch) -> DerivBundle {
        let r = self.rotation(u, scratch);
        let g = self.generator.derivs(v);
        let o = self.axis.origin;
        DerivBundle::from_partials(order, |i, j| match (i, j) {
            (0, 0) => o + r[0] * (g[0] - o),
            (_, 0) => r[i] * (g[0] - o),
            _ => r[i] * g[j],
        })
    }

    fn natural_domain(&self) -> Result<ParamDomain> {
        Ok(ParamDomain::new((0.0, self.angle), self.generator.domain())?
            .closed(self.is_full_turn(), self.generator.is_closed()))
    }

    /// Poles sit where a generator endpoint lies on the axis.
    fn poles(&self, domain: &ParamDomain, tol: f64) -> Poles {
        let on_axis = |v: f64| self.axis.distance_to_point(self.generator.point_at(v)) <= tol;
        let mut poles = Poles::none();
        poles.set(Edge::VMin, on_axis(domain.v.0));
        poles.set(Edge::VMax, on_axis(domain.v.1));
        poles
    }

    fn normal_hint(&self, u: f64, v: f64) -> Option<Vector3> {
        let (lo, hi) = self.generator.domain();
        // Leaving the pole, Su grows like (v - v0) (a x w) with w the rotated tangent.
        let sign = if (v - lo).abs() <= (hi - v).abs() { 1.0 } else { -1.0 };
        let a = self.axis.direction;
        let w = rotation_derivs(a, 1.0, u)[0] * self.generator.tangent_at(v);
        (sign * (w * w.dot(a) - a * w.length_squared())).try_normalize()
    }
}
