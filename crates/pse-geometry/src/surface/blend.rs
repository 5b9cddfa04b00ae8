//! Blend surfaces (fillet and chamfer) spanning two base surfaces.
//!
//! Each rail is an isoparametric line of a base surface, re-parametrized onto
//! `v` in `[0, 1]`. The cross-section at `v` interpolates between the rails in `u`
//! in `[0, 1]`: linearly for a chamfer, as a cubic Hermite segment for a fillet,
//! whose end tangents are the base surfaces' cross partials scaled by a tension.

use std::sync::Arc;

use pse_core::{PseError, Result};
use pse_math::{DVec3, VecDerivs};

use super::{DerivBundle, ParamDomain, Scratch, Surface, SurfaceEval};

/// Which isoparametric line of the base surface a rail follows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RailIso {
    /// `u = value`; the rail runs along `v` and the cross direction is `u`.
    U(f64),
    /// `v = value`; the rail runs along `u` and the cross direction is `v`.
    V(f64),
}

#[derive(Debug, Clone)]
pub struct BlendRail {
    pub surface: Arc<Surface>,
    pub iso: RailIso,
    /// Base-surface parameter range mapped onto `v` in `[0, 1]`.
    pub range: (f64, f64),
    /// Scale of the cross tangent; its sign picks the direction of travel.
    pub tension: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendShape {
    Chamfer,
    Fillet,
}

#[derive(Debug, Clone)]
pub struct BlendSurface {
    pub shape: BlendShape,
    pub rails: [BlendRail; 2],
}

impl BlendRail {
    pub fn new(surface: Arc<Surface>, iso: RailIso, range: (f64, f64), tension: f64) -> Result<Self> {
        if !(range.0.is_finite() && range.1.is_finite()) || range.0 == range.1 {
            return Err(PseError::Domain(format!(
                "rail range [{}, {}] is empty or not finite",
                range.0, range.1
            )));
        }
        if !tension.is_finite() {
            return Err(PseError::Domain(format!("rail tension must be finite, got {tension}")));
        }
        Ok(Self {
            surface,
            iso,
            range,
            tension,
        })
    }

    fn length(&self) -> f64 {
        self.range.1 - self.range.0
    }

    /// Base-surface bundle at rail parameter `t`, with `v` along the rail.
    fn along(&self, t: f64) -> DerivBundle {
        match self.iso {
            RailIso::U(u) => self.surface.derivs_ext(u, t),
            RailIso::V(v) => self.surface.derivs_ext(t, v).transposed(),
        }
    }

    /// Rail point and cross tangent, each with derivatives of orders 1..=3 in `v`.
    ///
    /// The third derivative of the cross tangent needs a fourth-order partial of
    /// the base surface and is taken by central difference.
    fn state(&self, v: f64) -> (VecDerivs, VecDerivs) {
        let l = self.length();
        let t = self.range.0 + v * l;
        let b = self.along(t);
        let h = 1e-4 * l.abs();
        let third = (self.along(t + h).duvv - self.along(t - h).duvv) / (2.0 * h);
        let rail = [b.point, b.dv * l, b.dvv * l * l, b.dvvv * l.powi(3)];
        let k = self.tension;
        let cross = [b.du * k, b.duv * (k * l), b.duvv * (k * l * l), third * (k * l.powi(3))];
        (rail, cross)
    }
}

/// Hermite basis values and derivatives `[h, h', h'', h''']` for `h00, h10, h01, h11`.
fn hermite(u: f64) -> [[f64; 4]; 4] {
    let (u2, u3) = (u * u, u * u * u);
    [
        [2.0 * u3 - 3.0 * u2 + 1.0, 6.0 * u2 - 6.0 * u, 12.0 * u - 6.0, 12.0],
        [u3 - 2.0 * u2 + u, 3.0 * u2 - 4.0 * u + 1.0, 6.0 * u - 4.0, 6.0],
        [-2.0 * u3 + 3.0 * u2, -6.0 * u2 + 6.0 * u, -12.0 * u + 6.0, -12.0],
        [u3 - u2, 3.0 * u2 - 2.0 * u, 6.0 * u - 2.0, 6.0],
    ]
}

impl BlendSurface {
    pub fn new(shape: BlendShape, first: BlendRail, second: BlendRail) -> Result<Self> {
        Ok(Self {
            shape,
            rails: [first, second],
        })
    }

    pub fn fillet(first: BlendRail, second: BlendRail) -> Result<Self> {
        Self::new(BlendShape::Fillet, first, second)
    }

    pub fn chamfer(first: BlendRail, second: BlendRail) -> Result<Self> {
        Self::new(BlendShape::Chamfer, first, second)
    }

    /// Rail and cross-tangent stacks of both rails at `v`, cached in `scratch`.
    fn rails_at(&self, v: f64, scratch: &mut Scratch) -> [VecDerivs; 4] {
        if !scratch.holds(v) {
            let (r0, x0) = self.rails[0].state(v);
            let (r1, x1) = self.rails[1].state(v);
            for (slot, stack) in [r0, x0, r1, x1].iter().enumerate() {
                scratch.vectors[4 * slot..4 * slot + 4].copy_from_slice(stack);
            }
            scratch.set_key(v);
        }
        std::array::from_fn(|k| std::array::from_fn(|n| scratch.vectors[4 * k + n]))
    }
}

impl SurfaceEval for BlendSurface {
    fn eval(&self, u: f64, v: f64, order: usize, scratch: &mut Scratch) -> DerivBundle {
        let [r0, x0, r1, x1] = self.rails_at(v, scratch);
        match self.shape {
            BlendShape::Chamfer => DerivBundle::from_partials(order, |i, j| match i {
                0 => r0[j] * (1.0 - u) + r1[j] * u,
                1 => r1[j] - r0[j],
                _ => DVec3::ZERO,
            }),
            BlendShape::Fillet => {
                let h = hermite(u);
                DerivBundle::from_partials(order, |i, j| {
                    r0[j] * h[0][i] + x0[j] * h[1][i] + r1[j] * h[2][i] + x1[j] * h[3][i]
                })
            }
        }
    }

    fn natural_domain(&self) -> Result<ParamDomain> {
        ParamDomain::new((0.0, 1.0), (0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{CylindricalSurface, PlanarSurface};

    fn plane(origin: DVec3, u_axis: DVec3, v_axis: DVec3) -> Arc<Surface> {
        Arc::new(Surface::new(PlanarSurface::new(origin, u_axis, v_axis).unwrap()).unwrap())
    }

    fn corner_fillet() -> BlendSurface {
        // Floor z = 0 and wall x = 2; rails at x = 1 on the floor and z = 1 on the wall.
        let floor = plane(DVec3::ZERO, DVec3::X, DVec3::Y);
        let wall = plane(DVec3::new(2.0, 0.0, 0.0), DVec3::Z, DVec3::Y);
        BlendSurface::fillet(
            BlendRail::new(floor, RailIso::U(1.0), (0.0, 2.0), 1.0).unwrap(),
            BlendRail::new(wall, RailIso::U(1.0), (0.0, 2.0), 1.0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_fillet_meets_rails_tangentially() {
        let fillet = corner_fillet();
        let mut scratch = Scratch::default();
        let start = fillet.eval(0.0, 0.5, 1, &mut scratch);
        assert!((start.point - DVec3::new(1.0, 1.0, 0.0)).length() < 1e-12);
        assert!((start.du - DVec3::X).length() < 1e-12);
        let end = fillet.eval(1.0, 0.5, 1, &mut scratch);
        assert!((end.point - DVec3::new(2.0, 1.0, 1.0)).length() < 1e-12);
        assert!((end.du - DVec3::Z).length() < 1e-12);
        assert!((end.dv - DVec3::new(0.0, 2.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_chamfer_is_linear() {
        let f = corner_fillet();
        let chamfer = BlendSurface::chamfer(f.rails[0].clone(), f.rails[1].clone()).unwrap();
        let b = chamfer.eval(0.5, 0.0, 2, &mut Scratch::default());
        assert!((b.point - DVec3::new(1.5, 0.0, 0.5)).length() < 1e-12);
        assert!((b.du - DVec3::new(1.0, 0.0, 1.0)).length() < 1e-12);
        assert_eq!(b.duu, DVec3::ZERO);
    }

    #[test]
    fn test_curved_rail_partials() {
        let cyl = Arc::new(
            Surface::new(CylindricalSurface::new(DVec3::ZERO, DVec3::Z, 1.0).unwrap()).unwrap(),
        );
        let top = plane(DVec3::new(0.0, 0.0, 1.0), DVec3::X, DVec3::Y);
        let fillet = BlendSurface::fillet(
            BlendRail::new(cyl, RailIso::V(0.0), (0.0, 1.5), 0.5).unwrap(),
            BlendRail::new(top, RailIso::V(0.0), (0.0, 1.5), -0.5).unwrap(),
        )
        .unwrap();
        let mut scratch = Scratch::default();
        let (u, v, h) = (0.3, 0.4, 1e-4);
        let b = fillet.eval(u, v, 3, &mut scratch);
        let vp = fillet.eval(u, v + h, 3, &mut scratch);
        let vm = fillet.eval(u, v - h, 3, &mut scratch);
        assert!(((vp.point - vm.point) / (2.0 * h) - b.dv).length() < 1e-6);
        assert!(((vp.dvv - vm.dvv) / (2.0 * h) - b.dvvv).length() < 1e-4);
        assert!(((vp.duv - vm.duv) / (2.0 * h) - b.duvv).length() < 1e-5);
    }

    #[test]
    fn test_empty_rail_range_rejected() {
        let floor = plane(DVec3::ZERO, DVec3::X, DVec3::Y);
        assert!(BlendRail::new(floor.clone(), RailIso::U(0.0), (1.0, 1.0), 1.0).is_err());
        assert!(BlendRail::new(floor, RailIso::U(0.0), (0.0, 1.0), f64::NAN).is_err());
    }
}
