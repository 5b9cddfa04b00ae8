//! Swept surface: a generator carried along a spine by a moving frame.
//!
//! `P(u, v) = S(t) + M(t) g(u)` with `t = reparam(v)`, where `M(t)` is the spine
//! frame and `g(u) = M(t0)^T (G(u) - S(t0))` is the generator expressed in the
//! frame at the start of the spine. Within one re-parametrization segment
//! `dt/dv = k` is constant, so `d^(i+j)P/du^i dv^j = k^j [S^(j) + M^(j) g^(i)]`
//! (the spine term only for `i = 0`).
//!
//! The generator in the start frame is a derived working curve kept in the
//! evaluation scratch; a cache reset after an edit rebuilds it.

use std::sync::Arc;

use pse_core::{PseError, Result};
use pse_math::derivs::{cross_derivs, dot_derivs, scale_derivs, unit_derivs};
use pse_math::{DMat3, DVec3, Frame, MatDerivs, Point3, VecDerivs, Vector3};

use super::{DerivBundle, ParamDomain, Scratch, SurfaceEval};
use crate::curve::{Curve, CurveRef};

/// Spine samples checked when validating a frame.
const FRAME_SAMPLES: usize = 17;

/// Moving frame along a spine: `z` is the unit tangent, `x` the reference vector
/// projected onto the normal plane, `y = z x x`.
#[derive(Debug, Clone)]
pub struct SpineFrame {
    pub spine: CurveRef,
    pub reference: Vector3,
}

impl SpineFrame {
    pub fn new(spine: CurveRef, reference: Vector3) -> Result<Self> {
        let frame = Self { spine, reference };
        let (lo, hi) = frame.spine.domain();
        for i in 0..FRAME_SAMPLES {
            let t = lo + (hi - lo) * i as f64 / (FRAME_SAMPLES - 1) as f64;
            let tangent = frame.spine.tangent_at(t).try_normalize().ok_or_else(|| {
                PseError::Geometry(format!("spine tangent vanishes at t = {t}"))
            })?;
            if tangent.cross(reference).length() < 1e-6 * reference.length().max(1e-300) {
                return Err(PseError::Geometry(format!(
                    "reference vector is parallel to the spine at t = {t}"
                )));
            }
        }
        Ok(frame)
    }

    /// Frame matrix (columns `x`, `y`, `z`) and its derivatives of orders 1..=3.
    pub fn derivs(&self, t: f64) -> MatDerivs {
        let d = self.spine.derivs(t);
        let tangent = [d[1], d[2], d[3], self.spine.fourth_derivative(t)];
        let Some(ez) = unit_derivs(&tangent) else {
            return self.fallback(t, d[1]);
        };
        let r: VecDerivs = [self.reference, DVec3::ZERO, DVec3::ZERO, DVec3::ZERO];
        let along = scale_derivs(&dot_derivs(&r, &ez), &ez);
        let projected: VecDerivs = std::array::from_fn(|n| r[n] - along[n]);
        let Some(ex) = unit_derivs(&projected) else {
            return self.fallback(t, d[1]);
        };
        let ey = cross_derivs(&ez, &ex);
        std::array::from_fn(|n| DMat3::from_cols(ex[n], ey[n], ez[n]))
    }

    pub fn matrix(&self, t: f64) -> DMat3 {
        self.derivs(t)[0]
    }

    /// Frozen frame where the moving frame is undefined.
    fn fallback(&self, t: f64, tangent: Vector3) -> MatDerivs {
        let m = Frame::from_axis(self.spine.point_at(t), tangent)
            .map_or(DMat3::IDENTITY, |f| f.matrix());
        [m, DMat3::ZERO, DMat3::ZERO, DMat3::ZERO]
    }
}

/// Piecewise-linear map from the surface parameter `v` to the spine parameter `t`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reparam {
    v: Vec<f64>,
    t: Vec<f64>,
}

impl Reparam {
    /// `t = v` over `[lo, hi]`.
    pub fn identity(lo: f64, hi: f64) -> Self {
        Self {
            v: vec![lo, hi],
            t: vec![lo, hi],
        }
    }

    /// Table of `(v_i, t_i)` knots; both columns must increase strictly.
    pub fn new(v: Vec<f64>, t: Vec<f64>) -> Result<Self> {
        if v.len() < 2 || v.len() != t.len() {
            return Err(PseError::Domain(
                "re-parametrization needs at least two (v, t) pairs".into(),
            ));
        }
        let increasing = |xs: &[f64]| xs.windows(2).all(|w| w[0] < w[1]);
        if !increasing(&v) || !increasing(&t) {
            return Err(PseError::Domain("re-parametrization table must increase".into()));
        }
        Ok(Self { v, t })
    }

    pub fn v_range(&self) -> (f64, f64) {
        (self.v[0], self.v[self.v.len() - 1])
    }

    pub fn t_range(&self) -> (f64, f64) {
        (self.t[0], self.t[self.t.len() - 1])
    }

    /// Spine parameter at `v` and the segment factor `dt/dv`.
    ///
    /// Values outside the table extrapolate the first or last segment.
    pub fn map(&self, v: f64) -> (f64, f64) {
        let n = self.v.len();
        let seg = self.v.partition_point(|&x| x <= v).clamp(1, n - 1) - 1;
        let k = (self.t[seg + 1] - self.t[seg]) / (self.v[seg + 1] - self.v[seg]);
        (self.t[seg] + k * (v - self.v[seg]), k)
    }
}

#[derive(Debug, Clone)]
pub struct SweptSurface {
    pub generator: CurveRef,
    pub frame: SpineFrame,
    pub reparam: Reparam,
    start_point: Point3,
    start_inverse: DMat3,
}

impl SweptSurface {
    /// Sweep `generator` along `spine` with `t = v`.
    pub fn new(generator: CurveRef, spine: CurveRef, reference: Vector3) -> Result<Self> {
        let (lo, hi) = spine.domain();
        let frame = SpineFrame::new(spine, reference)?;
        Self::build(generator, frame, Reparam::identity(lo, hi))
    }

    pub fn with_reparam(self, reparam: Reparam) -> Result<Self> {
        Self::build(self.generator, self.frame, reparam)
    }

    fn build(generator: CurveRef, frame: SpineFrame, reparam: Reparam) -> Result<Self> {
        let (lo, hi) = frame.spine.domain();
        let (t0, t1) = reparam.t_range();
        if t0 < lo || t1 > hi {
            return Err(PseError::Domain(format!(
                "re-parametrization range [{t0}, {t1}] leaves the spine domain [{lo}, {hi}]"
            )));
        }
        Ok(Self {
            start_point: frame.spine.point_at(t0),
            start_inverse: frame.matrix(t0).transpose(),
            generator,
            frame,
            reparam,
        })
    }

    pub fn spine(&self) -> &CurveRef {
        &self.frame.spine
    }

    pub(super) fn set_generator(&mut self, generator: CurveRef) -> Result<()> {
        *self = Self::build(generator, self.frame.clone(), self.reparam.clone())?;
        Ok(())
    }

    /// Keep the spine and re-parametrization, orient the frame by `reference`.
    pub(super) fn set_reference(&mut self, reference: Vector3) -> Result<()> {
        let frame = SpineFrame::new(self.frame.spine.clone(), reference)?;
        *self = Self::build(self.generator.clone(), frame, self.reparam.clone())?;
        Ok(())
    }

    /// A new spine restarts with the identity re-parametrization over its domain.
    pub(super) fn set_spine(&mut self, spine: CurveRef) -> Result<()> {
        let (lo, hi) = spine.domain();
        let frame = SpineFrame::new(spine, self.frame.reference)?;
        *self = Self::build(self.generator.clone(), frame, Reparam::identity(lo, hi))?;
        Ok(())
    }

    fn local_generator(&self) -> LocalGenerator {
        LocalGenerator {
            generator: self.generator.arc().clone(),
            origin: self.start_point,
            inverse: self.start_inverse,
        }
    }
}

/// Generator expressed in the spine frame at the start of the sweep.
#[derive(Debug, Clone)]
pub(super) struct LocalGenerator {
    generator: Arc<dyn Curve>,
    origin: Point3,
    inverse: DMat3,
}

impl Curve for LocalGenerator {
    fn derivs(&self, u: f64) -> VecDerivs {
        let g = self.generator.derivs(u);
        std::array::from_fn(|n| {
            let base = if n == 0 { g[0] - self.origin } else { g[n] };
            self.inverse * base
        })
    }

    fn domain(&self) -> (f64, f64) {
        self.generator.domain()
    }

    fn is_closed(&self) -> bool {
        self.generator.is_closed()
    }

    fn clone_curve(&self) -> Arc<dyn Curve> {
        Arc::new(Self {
            generator: self.generator.clone_curve(),
            ..self.clone()
        })
    }
}

/// Spine derivatives and frame derivatives at `t`, cached in `scratch`.
pub(super) fn spine_state(frame: &SpineFrame, t: f64, scratch: &mut Scratch) -> (VecDerivs, MatDerivs) {
    if !scratch.holds(t) {
        let s = frame.spine.derivs(t);
        let m = frame.derivs(t);
        scratch.vectors[..4].copy_from_slice(&s);
        scratch.matrices[..4].copy_from_slice(&m);
        scratch.set_key(t);
    }
    (
        std::array::from_fn(|n| scratch.vectors[n]),
        std::array::from_fn(|n| scratch.matrices[n]),
    )
}

impl SurfaceEval for SweptSurface {
    fn eval(&self, u: f64, v: f64, order: usize, scratch: &mut Scratch) -> DerivBundle {
        let (t, k) = self.reparam.map(v);
        let (s, m) = spine_state(&self.frame, t, scratch);
        let g = scratch.derived_or_insert_with(|| self.local_generator()).derivs(u);
        DerivBundle::from_partials(order, |i, j| {
            let mut d = m[j] * g[i];
            if i == 0 {
                d += s[j];
            }
            d * k.powi(j as i32)
        })
    }

    fn natural_domain(&self) -> Result<ParamDomain> {
        let closed_v = self.frame.spine.is_closed() && self.reparam.t_range() == self.frame.spine.domain();
        Ok(ParamDomain::new(self.generator.domain(), self.reparam.v_range())?
            .closed(self.generator.is_closed(), closed_v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{Circle, Curve, Line};

    fn torus_sweep() -> SweptSurface {
        // Spine: radius 5 circle in the xz plane starting at (0, 0, -5), heading -x.
        let spine = Circle::new(DVec3::ZERO, DVec3::Y, 5.0);
        let generator = Circle::new(DVec3::new(0.0, 0.0, -5.0), DVec3::NEG_X, 1.0);
        SweptSurface::new(CurveRef::owned(generator), CurveRef::owned(spine), DVec3::Y).unwrap()
    }

    #[test]
    fn test_straight_sweep_is_cylinder() {
        let spine = Line::new(DVec3::ZERO, DVec3::new(0.0, 0.0, 5.0));
        let generator = Circle::new(DVec3::ZERO, DVec3::Z, 1.0);
        let surf =
            SweptSurface::new(CurveRef::owned(generator), CurveRef::owned(spine), DVec3::X).unwrap();
        let mut scratch = Scratch::default();
        for (u, v) in [(0.0, 0.0), (1.0, 0.5), (4.0, 1.0)] {
            let p = surf.eval(u, v, 0, &mut scratch).point;
            assert!((DVec3::new(p.x, p.y, 0.0).length() - 1.0).abs() < 1e-10);
            assert!((p.z - 5.0 * v).abs() < 1e-10);
        }
    }

    #[test]
    fn test_curved_sweep_stays_on_torus() {
        let surf = torus_sweep();
        let mut scratch = Scratch::default();
        for (u, v) in [(0.0, 0.0), (1.3, 0.7), (3.0, 2.5), (5.5, 6.0)] {
            let p = surf.eval(u, v, 0, &mut scratch).point;
            let ring = (p.x * p.x + p.z * p.z).sqrt();
            let tube = ((ring - 5.0).powi(2) + p.y * p.y).sqrt();
            assert!((tube - 1.0).abs() < 1e-9, "off tube at ({u}, {v}): {tube}");
        }
    }

    #[test]
    fn test_partials_match_finite_differences() {
        let surf = torus_sweep();
        let mut scratch = Scratch::default();
        let (u, v, h) = (0.8, 1.9, 1e-5);
        let b = surf.eval(u, v, 3, &mut scratch);
        let vp = surf.eval(u, v + h, 3, &mut scratch);
        let vm = surf.eval(u, v - h, 3, &mut scratch);
        let up = surf.eval(u + h, v, 3, &mut scratch);
        let um = surf.eval(u - h, v, 3, &mut scratch);
        assert!(((vp.point - vm.point) / (2.0 * h) - b.dv).length() < 1e-6);
        assert!(((vp.dv - vm.dv) / (2.0 * h) - b.dvv).length() < 1e-6);
        assert!(((vp.dvv - vm.dvv) / (2.0 * h) - b.dvvv).length() < 1e-5);
        assert!(((vp.du - vm.du) / (2.0 * h) - b.duv).length() < 1e-6);
        assert!(((vp.duv - vm.duv) / (2.0 * h) - b.duvv).length() < 1e-5);
        assert!(((up.duv - um.duv) / (2.0 * h) - b.duuv).length() < 1e-5);
    }

    #[test]
    fn test_reparam_scales_v_partials() {
        let spine = Line::new(DVec3::ZERO, DVec3::new(0.0, 0.0, 2.0));
        let generator = Line::new(DVec3::ZERO, DVec3::X);
        let surf = SweptSurface::new(CurveRef::owned(generator), CurveRef::owned(spine), DVec3::X)
            .unwrap()
            .with_reparam(Reparam::new(vec![0.0, 2.0, 4.0], vec![0.0, 0.5, 1.0]).unwrap())
            .unwrap();
        let b = surf.eval(0.5, 3.0, 1, &mut Scratch::default());
        assert!((b.point - DVec3::new(0.5, 0.0, 1.5)).length() < 1e-12);
        assert!((b.dv - DVec3::new(0.0, 0.0, 0.5)).length() < 1e-12);
        assert_eq!(surf.natural_domain().unwrap().v, (0.0, 4.0));
    }

    #[test]
    fn test_local_generator_is_kept_in_scratch() {
        let surf = torus_sweep();
        let mut scratch = Scratch::default();
        assert!(!scratch.has_derived());
        let b = surf.eval(0.4, 0.0, 0, &mut scratch);
        assert!(scratch.has_derived());
        // At the spine start the start frame is the identity transport.
        assert!((b.point - surf.generator.point_at(0.4)).length() < 1e-12);
    }

    #[test]
    fn test_new_reference_keeps_spine_and_reparam() {
        let spine = Line::new(DVec3::ZERO, DVec3::new(0.0, 0.0, 2.0));
        let generator = Line::new(DVec3::ZERO, DVec3::X);
        let mut surf = SweptSurface::new(CurveRef::owned(generator), CurveRef::owned(spine), DVec3::X)
            .unwrap()
            .with_reparam(Reparam::new(vec![0.0, 4.0], vec![0.0, 1.0]).unwrap())
            .unwrap();
        surf.set_reference(DVec3::Y).unwrap();
        assert_eq!(surf.reparam.v_range(), (0.0, 4.0));
        assert_eq!(surf.frame.reference, DVec3::Y);
        // The generator is rigid in the start frame, so a straight sweep is unchanged.
        let p = surf.eval(0.5, 2.0, 0, &mut Scratch::default()).point;
        assert!((p - DVec3::new(0.5, 0.0, 1.0)).length() < 1e-12);
        assert!(surf.set_reference(DVec3::Z).is_err());
    }

    #[test]
    fn test_reparam_map() {
        let r = Reparam::new(vec![0.0, 1.0, 2.0], vec![0.0, 2.0, 3.0]).unwrap();
        assert_eq!(r.map(0.5), (1.0, 2.0));
        assert_eq!(r.map(1.5), (2.5, 1.0));
        assert_eq!(r.map(3.0), (4.0, 1.0));
        assert!(Reparam::new(vec![0.0, 0.0], vec![0.0, 1.0]).is_err());
    }

    #[test]
    fn test_parallel_reference_rejected() {
        let spine = Line::new(DVec3::ZERO, DVec3::Z);
        let generator = Line::new(DVec3::ZERO, DVec3::X);
        let err = SweptSurface::new(CurveRef::owned(generator), CurveRef::owned(spine), DVec3::Z);
        assert!(matches!(err, Err(PseError::Geometry(_))));
    }

    #[test]
    fn test_spine_frame_is_orthonormal() {
        let frame = SpineFrame::new(CurveRef::owned(Circle::new(DVec3::ZERO, DVec3::Y, 5.0)), DVec3::Y).unwrap();
        let m = frame.matrix(1.0);
        let should_be_identity = m.transpose() * m;
        for c in 0..3 {
            assert!((should_be_identity.col(c) - DMat3::IDENTITY.col(c)).length() < 1e-12);
        }
        let tangent = frame.spine.tangent_at(1.0).normalize();
        assert!((m.col(2) - tangent).length() < 1e-12);
    }
}
