//! Evolution surface: a generator rigidly transported along a spine while twisting
//! about it.
//!
//! `P(u, v) = S(v) + M(v) (G(u) - S(t0))` with the transport matrix
//! `M(v) = F(v) Rz(w (v - t0)) F(t0)^T`, where `F` is the spine frame and `w` the
//! twist rate in radians per unit of spine parameter.

use pse_core::{PseError, Result};
use pse_math::derivs::mat_product_derivs;
use pse_math::rotation::rotation_derivs;
use pse_math::{DMat3, MatDerivs, Point3, VecDerivs, Vector3};

use super::swept::SpineFrame;
use super::{DerivBundle, ParamDomain, Scratch, SurfaceEval};
use crate::curve::CurveRef;

#[derive(Debug, Clone)]
pub struct EvolutionSurface {
    pub generator: CurveRef,
    pub frame: SpineFrame,
    pub twist: f64,
    start: f64,
    start_point: Point3,
    start_inverse: DMat3,
}

impl EvolutionSurface {
    pub fn new(generator: CurveRef, spine: CurveRef, reference: Vector3, twist: f64) -> Result<Self> {
        if !twist.is_finite() {
            return Err(PseError::Domain(format!("twist rate must be finite, got {twist}")));
        }
        let frame = SpineFrame::new(spine, reference)?;
        Ok(Self::build(generator, frame, twist))
    }

    fn build(generator: CurveRef, frame: SpineFrame, twist: f64) -> Self {
        let start = frame.spine.domain().0;
        Self {
            start,
            start_point: frame.spine.point_at(start),
            start_inverse: frame.matrix(start).transpose(),
            generator,
            frame,
            twist,
        }
    }

    pub fn spine(&self) -> &CurveRef {
        &self.frame.spine
    }

    /// Transport matrix and its derivatives of orders 1..=3 in `v`.
    pub fn transport(&self, v: f64) -> MatDerivs {
        let twisted = mat_product_derivs(
            &self.frame.derivs(v),
            &rotation_derivs(Vector3::Z, self.twist, v - self.start),
        );
        twisted.map(|m| m * self.start_inverse)
    }

    pub(super) fn set_generator(&mut self, generator: CurveRef) -> Result<()> {
        self.generator = generator;
        Ok(())
    }

    pub(super) fn set_reference(&mut self, reference: Vector3) -> Result<()> {
        let frame = SpineFrame::new(self.frame.spine.clone(), reference)?;
        *self = Self::build(self.generator.clone(), frame, self.twist);
        Ok(())
    }

    pub(super) fn set_spine(&mut self, spine: CurveRef) -> Result<()> {
        let frame = SpineFrame::new(spine, self.frame.reference)?;
        *self = Self::build(self.generator.clone(), frame, self.twist);
        Ok(())
    }

    fn state(&self, v: f64, scratch: &mut Scratch) -> (VecDerivs, MatDerivs) {
        if !scratch.holds(v) {
            let s = self.frame.spine.derivs(v);
            let m = self.transport(v);
            scratch.vectors[..4].copy_from_slice(&s);
            scratch.matrices[..4].copy_from_slice(&m);
            scratch.set_key(v);
        }
        (
            std::array::from_fn(|n| scratch.vectors[n]),
            std::array::from_fn(|n| scratch.matrices[n]),
        )
    }
}

impl SurfaceEval for EvolutionSurface {
    fn eval(&self, u: f64, v: f64, order: usize, scratch: &mut Scratch) -> DerivBundle {
        let (s, m) = self.state(v, scratch);
        let g = self.generator.derivs(u);
        DerivBundle::from_partials(order, |i, j| {
            if i == 0 {
                s[j] + m[j] * (g[0] - self.start_point)
            } else {
                m[j] * g[i]
            }
        })
    }

    fn natural_domain(&self) -> Result<ParamDomain> {
        // A twisted closed spine does not close up unless the twist is whole turns.
        let turns = self.twist * (self.frame.spine.domain().1 - self.start) / std::f64::consts::TAU;
        let closed_v = self.frame.spine.is_closed() && (turns - turns.round()).abs() < 1e-12;
        Ok(ParamDomain::new(self.generator.domain(), self.frame.spine.domain())?
            .closed(self.generator.is_closed(), closed_v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{Curve, Line};
    use pse_math::DVec3;

    fn twisted_strip(twist: f64) -> EvolutionSurface {
        let spine = Line::new(DVec3::ZERO, DVec3::new(0.0, 0.0, 4.0));
        let generator = Line::new(DVec3::new(-1.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0));
        EvolutionSurface::new(CurveRef::owned(generator), CurveRef::owned(spine), DVec3::X, twist)
            .unwrap()
    }

    #[test]
    fn test_zero_twist_translates() {
        let surf = twisted_strip(0.0);
        let b = surf.eval(1.0, 0.5, 1, &mut Scratch::default());
        assert!((b.point - DVec3::new(1.0, 0.0, 2.0)).length() < 1e-12);
    }

    #[test]
    fn test_twist_rotates_generator() {
        let surf = twisted_strip(std::f64::consts::PI);
        // A quarter turn at mid-spine: (1, 0) ends up at (0, 1).
        let p = surf.eval(1.0, 0.5, 0, &mut Scratch::default()).point;
        assert!((p - DVec3::new(0.0, 1.0, 2.0)).length() < 1e-12);
    }

    #[test]
    fn test_helicoid_partials() {
        let surf = twisted_strip(1.3);
        let mut scratch = Scratch::default();
        let (u, v, h) = (0.2, 0.45, 1e-5);
        let b = surf.eval(u, v, 3, &mut scratch);
        let vp = surf.eval(u, v + h, 3, &mut scratch);
        let vm = surf.eval(u, v - h, 3, &mut scratch);
        assert!(((vp.point - vm.point) / (2.0 * h) - b.dv).length() < 1e-6);
        assert!(((vp.dvv - vm.dvv) / (2.0 * h) - b.dvvv).length() < 1e-5);
        assert!(((vp.du - vm.du) / (2.0 * h) - b.duv).length() < 1e-6);
        assert_eq!(b.duu, DVec3::ZERO);
    }

    #[test]
    fn test_transport_starts_at_identity() {
        let surf = twisted_strip(0.7);
        let m = surf.transport(0.0)[0];
        for c in 0..3 {
            assert!((m.col(c) - DMat3::IDENTITY.col(c)).length() < 1e-12);
        }
        assert!(surf.spine().tangent_at(0.0).z > 0.0);
    }
}
