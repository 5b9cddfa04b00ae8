//! Cylindrical surface.

use std::f64::consts::PI;

use pse_core::{ensure_positive, Result};
use pse_math::rotation::trig_deriv;
use pse_math::{Axis, DVec3, Frame, Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::{DerivBundle, ParamDomain, Poles, Scratch, SurfaceEval};

/// A cylindrical surface parameterized by angle `u` in `[0, 2*PI]` and height `v`.
///
/// `P(u, v) = origin + radius * (cos(u) x + sin(u) y) + v z`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CylindricalSurface {
    pub frame: Frame,
    pub radius: f64,
}

impl CylindricalSurface {
    pub fn new(origin: Point3, axis: Vector3, radius: f64) -> Result<Self> {
        Self::from_frame(Frame::from_axis(origin, axis)?, radius)
    }

    pub fn from_frame(frame: Frame, radius: f64) -> Result<Self> {
        ensure_positive("cylinder radius", radius)?;
        Ok(Self { frame, radius })
    }

    pub fn axis(&self) -> Axis {
        Axis {
            origin: self.frame.origin,
            direction: self.frame.z,
        }
    }
}

/// `order`-th derivative of `cos(u) x + sin(u) y` in a frame.
pub(super) fn radial(frame: &Frame, u: f64, order: usize) -> Vector3 {
    let (c, s) = trig_deriv(u, order);
    c * frame.x + s * frame.y
}

impl SurfaceEval for CylindricalSurface {
    fn eval(&self, u: f64, v: f64, order: usize, _scratch: &mut Scratch) -> DerivBundle {
        let f = &self.frame;
        DerivBundle::from_partials(order, |i, j| match (i, j) {
            (0, 0) => f.origin + self.radius * radial(f, u, 0) + v * f.z,
            (0, 1) => f.z,
            (_, 0) => self.radius * radial(f, u, i),
            _ => DVec3::ZERO,
        })
    }

    fn natural_domain(&self) -> Result<ParamDomain> {
        Ok(ParamDomain::new((0.0, 2.0 * PI), (-1e6, 1e6))?.closed(true, false))
    }

    fn poles(&self, _domain: &ParamDomain, _tol: f64) -> Poles {
        Poles::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cylindrical_point_on_surface() {
        let cyl = CylindricalSurface::new(DVec3::ZERO, DVec3::Z, 2.0).unwrap();
        let mut scratch = Scratch::default();
        for i in 0..8 {
            let u = i as f64 * PI / 4.0;
            let p = cyl.eval(u, 3.0, 0, &mut scratch).point;
            let r = (p.x * p.x + p.y * p.y).sqrt();
            assert!((r - 2.0).abs() < 1e-10);
            assert!((p.z - 3.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_cylindrical_normal_is_radial() {
        let cyl = CylindricalSurface::new(DVec3::ZERO, DVec3::Z, 1.5).unwrap();
        let b = cyl.eval(0.7, -2.0, 2, &mut Scratch::default());
        let n = b.normal_bundle(1e-12).unwrap().normal;
        let radial = DVec3::new(b.point.x, b.point.y, 0.0).normalize();
        assert!((n - radial).length() < 1e-10);
    }

    #[test]
    fn test_third_partials() {
        let cyl = CylindricalSurface::new(DVec3::ZERO, DVec3::Z, 1.0).unwrap();
        let b = cyl.eval(0.3, 0.0, 3, &mut Scratch::default());
        assert!((b.duuu + b.du).length() < 1e-12);
        assert_eq!(b.duuv, DVec3::ZERO);
        assert_eq!(b.dvvv, DVec3::ZERO);
    }

    #[test]
    fn test_non_positive_radius_rejected() {
        assert!(CylindricalSurface::new(DVec3::ZERO, DVec3::Z, 0.0).is_err());
        assert!(CylindricalSurface::new(DVec3::ZERO, DVec3::ZERO, 1.0).is_err());
    }
}
