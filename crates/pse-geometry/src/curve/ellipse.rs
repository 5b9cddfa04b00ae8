//! Ellipse curve.

use std::f64::consts::PI;
use std::sync::Arc;

use pse_math::rotation::trig_deriv;
use pse_math::{DVec3, Point3, VecDerivs, Vector3};
use serde::{Deserialize, Serialize};

use super::Curve;

/// An ellipse in 3D space, parameterized over `[0, 2*PI]`.
///
/// Defined by center, normal, major axis direction, and minor radius.
/// The major radius is the length of `major_axis`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: Point3,
    pub normal: Vector3,
    pub major_axis: Vector3,
    pub minor_radius: f64,
}

impl Ellipse {
    pub fn new(center: Point3, normal: Vector3, major_axis: Vector3, minor_radius: f64) -> Self {
        Self {
            center,
            normal: normal.normalize(),
            major_axis,
            minor_radius,
        }
    }

    /// Major radius (length of major_axis).
    pub fn major_radius(&self) -> f64 {
        self.major_axis.length()
    }

    /// Compute the minor axis direction (perpendicular to both normal and major axis).
    fn minor_axis(&self) -> DVec3 {
        self.normal.cross(self.major_axis).normalize()
    }

    fn nth(&self, t: f64, order: usize) -> Vector3 {
        let (c, s) = trig_deriv(t, order);
        c * self.major_axis + s * self.minor_radius * self.minor_axis()
    }
}

impl Curve for Ellipse {
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
