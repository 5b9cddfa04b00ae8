use pse_core::{PseError, Result};
use serde::{Deserialize, Serialize};

use crate::{Point3, Vector3};

/// An infinite oriented line in 3D space defined by origin and unit direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub origin: Point3,
    pub direction: Vector3,
}

/// Closest points between two axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisApproach {
    pub t_self: f64,
    pub t_other: f64,
    pub point_self: Point3,
    pub point_other: Point3,
    pub distance: f64,
}

impl Axis {
    pub fn new(origin: Point3, direction: Vector3) -> Result<Self> {
        let direction = direction
            .try_normalize()
            .ok_or_else(|| PseError::Geometry("axis direction has zero length".into()))?;
        Ok(Self { origin, direction })
    }

    /// Get a point along the axis at parameter t.
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Parameter of the orthogonal projection of `point`.
    pub fn project(&self, point: Point3) -> f64 {
        (point - self.origin).dot(self.direction)
    }

    /// Find the closest point on the axis to a given point.
    pub fn closest_point(&self, point: Point3) -> Point3 {
        self.at(self.project(point))
    }

    /// Distance from a point to the axis.
    pub fn distance_to_point(&self, point: Point3) -> f64 {
        (point - self.closest_point(point)).length()
    }

    pub fn reversed(&self) -> Self {
        Self {
            origin: self.origin,
            direction: -self.direction,
        }
    }

    /// Angle between the two directions in `[0, PI]`.
    pub fn angle_to(&self, other: &Axis) -> f64 {
        self.direction.dot(other.direction).clamp(-1.0, 1.0).acos()
    }

    pub fn is_parallel(&self, other: &Axis, angular: f64) -> bool {
        self.direction.cross(other.direction).length() <= angular
    }

    /// Closest points between two non-parallel axes, `None` when parallel.
    pub fn approach(&self, other: &Axis, angular: f64) -> Option<AxisApproach> {
        if self.is_parallel(other, angular) {
            return None;
        }
        let w = self.origin - other.origin;
        let b = self.direction.dot(other.direction);
        let d = self.direction.dot(w);
        let e = other.direction.dot(w);
        let denom = 1.0 - b * b;
        let t_self = (b * e - d) / denom;
        let t_other = (e - b * d) / denom;
        let point_self = self.at(t_self);
        let point_other = other.at(t_other);
        Some(AxisApproach {
            t_self,
            t_other,
            point_self,
            point_other,
            distance: (point_self - point_other).length(),
        })
    }
}
