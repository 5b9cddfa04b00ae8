//! Toroidal surface.

use std::f64::consts::PI;

use pse_core::{ensure_positive, Result};
use pse_math::rotation::trig_deriv;
use pse_math::{Axis, Frame, Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::cylindrical::radial;
use super::{DerivBundle, ParamDomain, Scratch, SurfaceEval};

/// A toroidal surface parameterized by major angle `u` and minor angle `v`,
/// both in `[0, 2*PI]` and both closed.
///
/// `P(u, v) = center + (R + r cos(v)) * radial(u) + r sin(v) * z`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToroidalSurface {
    pub frame: Frame,
    pub major_radius: f64,
    pub minor_radius: f64,
}

impl ToroidalSurface {
    pub fn new(center: Point3, axis: Vector3, major_radius: f64, minor_radius: f64) -> Result<Self> {
        Self::from_frame(Frame::from_axis(center, axis)?, major_radius, minor_radius)
    }

    pub fn from_frame(frame: Frame, major_radius: f64, minor_radius: f64) -> Result<Self> {
        ensure_positive("torus major radius", major_radius)?;
        ensure_positive("torus minor radius", minor_radius)?;
        Ok(Self {
            frame,
            major_radius,
            minor_radius,
        })
    }

    pub fn axis(&self) -> Axis {
        Axis {
            origin: self.frame.origin,
            direction: self.frame.z,
        }
    }
}

impl SurfaceEval for ToroidalSurface {
    fn eval(&self, u: f64, v: f64, order: usize, _scratch: &mut Scratch) -> DerivBundle {
        let f = &self.frame;
        DerivBundle::from_partials(order, |i, j| {
            let (cv, sv) = trig_deriv(v, j);
            let ring = if j == 0 { self.major_radius } else { 0.0 } + self.minor_radius * cv;
            let mut d = ring * radial(f, u, i);
            if i == 0 {
                d += self.minor_radius * sv * f.z;
                if j == 0 {
                    d += f.origin;
                }
            }
            d
        })
    }

    fn natural_domain(&self) -> Result<ParamDomain> {
        Ok(ParamDomain::new((0.0, 2.0 * PI), (0.0, 2.0 * PI))?.closed(true, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pse_math::DVec3;

    #[test]
    fn test_toroidal_outer_and_inner() {
        let torus = ToroidalSurface::new(DVec3::ZERO, DVec3::Z, 5.0, 1.0).unwrap();
        let mut scratch = Scratch::default();
        let outer = torus.eval(0.0, 0.0, 0, &mut scratch).point;
        assert!((outer - DVec3::new(6.0, 0.0, 0.0)).length() < 1e-10);
        let inner = torus.eval(0.0, PI, 0, &mut scratch).point;
        assert!((inner - DVec3::new(4.0, 0.0, 0.0)).length() < 1e-10);
        let top = torus.eval(PI / 2.0, PI / 2.0, 0, &mut scratch).point;
        assert!((top - DVec3::new(0.0, 5.0, 1.0)).length() < 1e-10);
    }

    #[test]
    fn test_partials_match_finite_differences() {
        let torus = ToroidalSurface::new(DVec3::ONE, DVec3::new(0.0, 1.0, 1.0), 3.0, 0.5).unwrap();
        let mut scratch = Scratch::default();
        let (u, v, h) = (0.6, 2.1, 1e-6);
        let b = torus.eval(u, v, 3, &mut scratch);
        let bu = torus.eval(u + h, v, 3, &mut scratch);
        let bv = torus.eval(u, v + h, 3, &mut scratch);
        assert!(((bu.duv - b.duv) / h - b.duuv).length() < 1e-4);
        assert!(((bv.dvv - b.dvv) / h - b.dvvv).length() < 1e-4);
        assert!(((bv.du - b.du) / h - b.duv).length() < 1e-4);
    }

    #[test]
    fn test_torus_has_no_poles() {
        let torus = ToroidalSurface::new(DVec3::ZERO, DVec3::Z, 2.0, 1.0).unwrap();
        let domain = torus.natural_domain().unwrap();
        assert!(!torus.poles(&domain, 1e-9).any());
    }
}
