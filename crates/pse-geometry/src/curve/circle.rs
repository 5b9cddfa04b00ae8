//! Circle curve.

use std::f64::consts::PI;
use std::sync::Arc;

use pse_math::rotation::trig_deriv;
use pse_math::{Frame, Point3, VecDerivs, Vector3};
use serde::{Deserialize, Serialize};

use super::Curve;

/// A circle in 3D space, parameterized over `[0, 2*PI]`.
///
/// The circle lies in the plane defined by `center` and `normal`; `t = 0` is at
/// `center + radius * x_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point3,
    pub normal: Vector3,
    pub x_dir: Vector3,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point3, normal: Vector3, radius: f64) -> Self {
        let normal = normal.normalize();
        // Choose a vector not parallel to normal to build the frame
        let ref_vec = if normal.x.abs() < 0.9 { Vector3::X } else { Vector3::Y };
        Self {
            center,
            normal,
            x_dir: normal.cross(ref_vec).normalize(),
            radius,
        }
    }

    /// Circle in the `x`/`y` plane of `frame`, starting on its `x` axis.
    pub fn from_frame(frame: &Frame, radius: f64) -> Self {
        Self {
            center: frame.origin,
            normal: frame.z,
            x_dir: frame.x,
            radius,
        }
    }

    fn y_dir(&self) -> Vector3 {
        self.normal.cross(self.x_dir)
    }

    fn nth(&self, t: f64, order: usize) -> Vector3 {
        let (c, s) = trig_deriv(t, order);
        self.radius * (c * self.x_dir + s * self.y_dir())
    }
}

impl Curve for Circle {
    fn derivs(&self, t: f64) -> VecDerivs {
        [
            self.center + self.nth(t, 0),
            self.nth(t, 1),
            self.nth(t, 2),
            self.nth(t, 3),
        ]
    }

    fn fourth_derivative(&self, t: f64) -> Vector3 {
        self.nth(t, 4)
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, 2.0 * PI)
    }

    fn is_closed(&self) -> bool {
        true
    }

    fn clone_curve(&self) -> Arc<dyn Curve> {
        Arc::new(self.clone())
    }
}
