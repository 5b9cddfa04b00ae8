//! Conical surface.

use std::f64::consts::{FRAC_PI_2, PI};

use pse_core::{ensure_positive, PseError, Result};
use pse_math::{Axis, DVec3, Frame, Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::cylindrical::radial;
use super::{DerivBundle, Edge, ParamDomain, Poles, Scratch, SurfaceEval};

/// A conical surface parameterized by angle `u` in `[0, 2*PI]` and distance `v` from apex.
///
/// The frame origin is the apex. Points are computed as:
/// `P(u, v) = apex + v * (sin(half_angle) * radial(u) + cos(half_angle) * axis)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConicalSurface {
    pub frame: Frame,
    pub half_angle: f64,
}

impl ConicalSurface {
    pub fn new(apex: Point3, axis: Vector3, half_angle: f64) -> Result<Self> {
        Self::from_frame(Frame::from_axis(apex, axis)?, half_angle)
    }

    pub fn from_frame(frame: Frame, half_angle: f64) -> Result<Self> {
        ensure_positive("cone half angle", half_angle)?;
        if half_angle >= FRAC_PI_2 {
            return Err(PseError::Domain(format!(
                "cone half angle must be below PI/2, got {half_angle}"
            )));
        }
        Ok(Self { frame, half_angle })
    }

    pub fn apex(&self) -> Point3 {
        self.frame.origin
    }

    pub fn axis(&self) -> Axis {
        Axis {
            origin: self.frame.origin,
            direction: self.frame.z,
        }
    }

    fn ruling(&self, u: f64, order: usize) -> Vector3 {
        let (s, c) = self.half_angle.sin_cos();
        let r = s * radial(&self.frame, u, order);
        if order == 0 {
            r + c * self.frame.z
        } else {
            r
        }
    }
}

impl SurfaceEval for ConicalSurface {
    fn eval(&self, u: f64, v: f64, order: usize, _scratch: &mut Scratch) -> DerivBundle {
        DerivBundle::from_partials(order, |i, j| match j {
            0 if i == 0 => self.apex() + v * self.ruling(u, 0),
            0 => v * self.ruling(u, i),
            1 => self.ruling(u, i),
            _ => DVec3::ZERO,
        })
    }

    fn natural_domain(&self) -> Result<ParamDomain> {
        Ok(ParamDomain::new((0.0, 2.0 * PI), (0.0, 1e6))?.closed(true, false))
    }

    fn poles(&self, domain: &ParamDomain, _tol: f64) -> Poles {
        let mut poles = Poles::none();
        poles.set(Edge::VMin, domain.v.0 == 0.0);
        poles
    }

    /// The apex normal is the limit along the ruling through `u`.
    fn normal_hint(&self, u: f64, _v: f64) -> Option<Vector3> {
        let (s, c) = self.half_angle.sin_cos();
        Some(c * radial(&self.frame, u, 0) - s * self.frame.z)
    }
}
