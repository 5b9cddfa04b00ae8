//! Planar surface.

use pse_core::{PseError, Result};
use pse_math::{DVec3, Frame, Plane, Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::{DerivBundle, ParamDomain, Poles, Scratch, SurfaceEval};

/// Half extent of the plane's parameter rectangle.
const EXTENT: f64 = 1e6;

/// An infinite planar surface parameterized by `origin + u * u_axis + v * v_axis`.
///
/// The domain is `[-1e6, 1e6]` in both u and v (effectively infinite).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanarSurface {
    pub origin: Point3,
    pub u_axis: Vector3,
    pub v_axis: Vector3,
}

impl PlanarSurface {
    pub fn new(origin: Point3, u_axis: Vector3, v_axis: Vector3) -> Result<Self> {
        if u_axis.cross(v_axis).length() < 1e-15 {
            return Err(PseError::Domain("plane axes are parallel or zero".into()));
        }
        Ok(Self {
            origin,
            u_axis,
            v_axis,
        })
    }

    /// XY plane centered at origin.
    pub fn xy() -> Self {
        Self::from_frame(&Frame::world())
    }

    pub fn from_frame(frame: &Frame) -> Self {
        Self {
            origin: frame.origin,
            u_axis: frame.x,
            v_axis: frame.y,
        }
    }

    pub fn plane(&self) -> Plane {
        Plane::new(self.origin, self.u_axis.cross(self.v_axis))
    }
}

impl SurfaceEval for PlanarSurface {
    fn eval(&self, u: f64, v: f64, order: usize, _scratch: &mut Scratch) -> DerivBundle {
        DerivBundle::from_partials(order, |i, j| match (i, j) {
            (0, 0) => self.origin + u * self.u_axis + v * self.v_axis,
            (1, 0) => self.u_axis,
            (0, 1) => self.v_axis,
            _ => DVec3::ZERO,
        })
    }

    fn natural_domain(&self) -> Result<ParamDomain> {
        ParamDomain::new((-EXTENT, EXTENT), (-EXTENT, EXTENT))
    }

    fn poles(&self, _domain: &ParamDomain, _tol: f64) -> Poles {
        Poles::none()
    }
}
