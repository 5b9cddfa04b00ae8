//! Spherical surface.

use std::f64::consts::{FRAC_PI_2, PI};

use pse_core::{ensure_positive, Result};
use pse_math::rotation::trig_deriv;
use pse_math::{Axis, Frame, Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::cylindrical::radial;
use super::{DerivBundle, Edge, ParamDomain, Poles, Scratch, SurfaceEval};

/// A spherical surface parameterized by longitude `u` in `[0, 2*PI]` and
/// latitude `v` in `[-PI/2, PI/2]`.
///
/// `P(u, v) = center + radius * (cos(v) * radial(u) + sin(v) * z)`; the poles are
/// fixed at `v = -PI/2` and `v = PI/2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SphericalSurface {
    pub frame: Frame,
    pub radius: f64,
}

impl SphericalSurface {
    pub fn new(center: Point3, radius: f64) -> Result<Self> {
        Self::from_frame(Frame::world_at(center), radius)
    }

    pub fn from_frame(frame: Frame, radius: f64) -> Result<Self> {
        ensure_positive("sphere radius", radius)?;
        Ok(Self { frame, radius })
    }

    pub fn center(&self) -> Point3 {
        self.frame.origin
    }

    /// Polar axis.
    pub fn axis(&self) -> Axis {
        Axis {
            origin: self.frame.origin,
            direction: self.frame.z,
        }
    }
}

impl SurfaceEval for SphericalSurface {
    fn eval(&self, u: f64, v: f64, order: usize, _scratch: &mut Scratch) -> DerivBundle {
        let f = &self.frame;
        DerivBundle::from_partials(order, |i, j| {
            let (cv, sv) = trig_deriv(v, j);
            let mut d = cv * radial(f, u, i);
            if i == 0 {
                d += sv * f.z;
            }
            d *= self.radius;
            if i == 0 && j == 0 {
                d += f.origin;
            }
            d
        })
    }

    fn natural_domain(&self) -> Result<ParamDomain> {
        Ok(ParamDomain::new((0.0, 2.0 * PI), (-FRAC_PI_2, FRAC_PI_2))?.closed(true, false))
    }

    fn poles(&self, domain: &ParamDomain, _tol: f64) -> Poles {
        let mut poles = Poles::none();
        poles.set(Edge::VMin, domain.v.0 <= -FRAC_PI_2);
        poles.set(Edge::VMax, domain.v.1 >= FRAC_PI_2);
        poles
    }

    /// Outward radial direction, which stays defined at the poles.
    fn normal_hint(&self, u: f64, v: f64) -> Option<Vector3> {
        let (sv, cv) = v.sin_cos();
        Some(cv * radial(&self.frame, u, 0) + sv * self.frame.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pse_math::DVec3;

    #[test]
    fn test_spherical_points_on_sphere() {
        let sphere = SphericalSurface::new(DVec3::new(1.0, 2.0, 3.0), 5.0).unwrap();
        let mut scratch = Scratch::default();
        for i in 0..8 {
            for j in 0..5 {
                let u = i as f64 * PI / 4.0;
                let v = -FRAC_PI_2 + j as f64 * PI / 4.0;
                let p = sphere.eval(u, v, 0, &mut scratch).point;
                let dist = (p - sphere.center()).length();
                assert!((dist - 5.0).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_spherical_normal_is_outward() {
        let sphere = SphericalSurface::new(DVec3::ZERO, 2.0).unwrap();
        let b = sphere.eval(0.8, 0.3, 2, &mut Scratch::default());
        let n = b.normal_bundle(1e-12).unwrap();
        assert!((n.normal - b.point / 2.0).length() < 1e-10);
        // Unit sphere scaled by r: dN/du = Su / r
        assert!((n.normal_u - b.du / 2.0).length() < 1e-10);
        assert!((n.normal_v - b.dv / 2.0).length() < 1e-10);
    }

    #[test]
    fn test_fixed_poles() {
        let sphere = SphericalSurface::new(DVec3::ZERO, 1.0).unwrap();
        let domain = sphere.natural_domain().unwrap();
        let poles = sphere.poles(&domain, 1e-9);
        assert!(poles.get(Edge::VMin) && poles.get(Edge::VMax));
        assert!(!poles.get(Edge::UMin));
        let hint = sphere.normal_hint(1.0, FRAC_PI_2).unwrap();
        assert!((hint - DVec3::Z).length() < 1e-12);
    }
}
