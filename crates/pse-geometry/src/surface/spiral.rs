//! Spiral surface: a generator rotated about an axis while advancing along it.
//!
//! `P(u, v) = o + R(v) (G(u) - o) + pitch * v / (2 PI) * a`, so one full turn of `v`
//! advances the generator by `pitch` along the axis direction `a`.

use std::f64::consts::TAU;

use pse_core::{ensure_positive, Result};
use pse_math::rotation::rotation_derivs;
use pse_math::{Axis, MatDerivs};

use super::{DerivBundle, ParamDomain, Poles, Scratch, SurfaceEval};
use crate::curve::CurveRef;

#[derive(Debug, Clone)]
pub struct SpiralSurface {
    pub generator: CurveRef,
    pub axis: Axis,
    pub pitch: f64,
    pub turns: f64,
}

impl SpiralSurface {
    pub fn new(generator: CurveRef, axis: Axis, pitch: f64, turns: f64) -> Result<Self> {
        ensure_positive("spiral pitch", pitch)?;
        ensure_positive("spiral turns", turns)?;
        Ok(Self {
            generator,
            axis,
            pitch,
            turns,
        })
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub(super) fn set_generator(&mut self, generator: CurveRef) -> Result<()> {
        self.generator = generator;
        Ok(())
    }

    pub(super) fn set_axis(&mut self, axis: Axis) -> Result<()> {
        self.axis = axis;
        Ok(())
    }

    fn rotation(&self, v: f64, scratch: &mut Scratch) -> MatDerivs {
        if !scratch.holds(v) {
            let r = rotation_derivs(self.axis.direction, 1.0, v);
            scratch.matrices[..4].copy_from_slice(&r);
            scratch.set_key(v);
        }
        std::array::from_fn(|n| scratch.matrices[n])
    }
}

impl SurfaceEval for SpiralSurface {
    fn eval(&self, u: f64, v: f64, order: usize, scratch: &mut Scratch) -> DerivBundle {
        let r = self.rotation(v, scratch);
        let g = self.generator.derivs(u);
        let o = self.axis.origin;
        let rise = self.axis.direction * (self.pitch / TAU);
        DerivBundle::from_partials(order, |i, j| match (i, j) {
            (0, 0) => o + r[0] * (g[0] - o) + rise * v,
            (0, 1) => r[1] * (g[0] - o) + rise,
            (0, _) => r[j] * (g[0] - o),
            _ => r[j] * g[i],
        })
    }

    fn natural_domain(&self) -> Result<ParamDomain> {
        Ok(ParamDomain::new(self.generator.domain(), (0.0, TAU * self.turns))?
            .closed(self.generator.is_closed(), false))
    }

    fn poles(&self, _domain: &ParamDomain, _tol: f64) -> Poles {
        Poles::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{Circle, Line};
    use pse_math::DVec3;

    fn coil() -> SpiralSurface {
        let generator = Circle::new(DVec3::new(3.0, 0.0, 0.0), DVec3::Y, 0.5);
        let axis = Axis::new(DVec3::ZERO, DVec3::Z).unwrap();
        SpiralSurface::new(CurveRef::owned(generator), axis, 2.0, 3.0).unwrap()
    }

    #[test]
    fn test_one_turn_advances_by_pitch() {
        let surf = coil();
        let mut scratch = Scratch::default();
        let a = surf.eval(0.4, 0.0, 0, &mut scratch).point;
        let b = surf.eval(0.4, TAU, 0, &mut scratch).point;
        assert!((b - a - DVec3::new(0.0, 0.0, 2.0)).length() < 1e-10);
    }

    #[test]
    fn test_partials_match_finite_differences() {
        let surf = coil();
        let mut scratch = Scratch::default();
        let (u, v, h) = (1.2, 4.0, 1e-5);
        let b = surf.eval(u, v, 3, &mut scratch);
        let vp = surf.eval(u, v + h, 3, &mut scratch);
        let vm = surf.eval(u, v - h, 3, &mut scratch);
        assert!(((vp.point - vm.point) / (2.0 * h) - b.dv).length() < 1e-6);
        assert!(((vp.dv - vm.dv) / (2.0 * h) - b.dvv).length() < 1e-6);
        assert!(((vp.dvv - vm.dvv) / (2.0 * h) - b.dvvv).length() < 1e-5);
        assert!(((vp.duu - vm.duu) / (2.0 * h) - b.duuv).length() < 1e-5);
    }

    #[test]
    fn test_pitch_must_be_positive() {
        let generator = CurveRef::owned(Line::new(DVec3::X, DVec3::new(2.0, 0.0, 0.0)));
        let axis = Axis::new(DVec3::ZERO, DVec3::Z).unwrap();
        assert!(SpiralSurface::new(generator.clone(), axis, 0.0, 1.0).is_err());
        assert!(SpiralSurface::new(generator, axis, 1.0, -1.0).is_err());
    }
}
