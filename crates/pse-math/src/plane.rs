use serde::{Deserialize, Serialize};

use crate::{Axis, Frame, Point3, Vector3};

/// A plane in 3D space defined by a point and normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3,
    pub normal: Vector3,
}

impl Plane {
    pub fn new(origin: Point3, normal: Vector3) -> Self {
        Self {
            origin,
            normal: normal.normalize(),
        }
    }

    pub fn xy() -> Self {
        Self::new(Point3::ZERO, Vector3::Z)
    }

    pub fn xz() -> Self {
        Self::new(Point3::ZERO, Vector3::Y)
    }

    pub fn yz() -> Self {
        Self::new(Point3::ZERO, Vector3::X)
    }

    /// The plane spanned by a frame's `x` and `y` axes.
    pub fn from_frame(frame: &Frame) -> Self {
        Self {
            origin: frame.origin,
            normal: frame.z,
        }
    }

    /// Signed distance from a point to this plane.
    pub fn signed_distance(&self, point: Point3) -> f64 {
        (point - self.origin).dot(self.normal)
    }

    /// Project a point onto this plane.
    pub fn project_point(&self, point: Point3) -> Point3 {
        point - self.normal * self.signed_distance(point)
    }

    pub fn flipped(&self) -> Self {
        Self {
            origin: self.origin,
            normal: -self.normal,
        }
    }

    /// Parameter along `axis` where it pierces the plane, `None` when parallel.
    pub fn intersect_axis(&self, axis: &Axis, angular: f64) -> Option<f64> {
        let denom = axis.direction.dot(self.normal);
        if denom.abs() <= angular {
            return None;
        }
        Some(-self.signed_distance(axis.origin) / denom)
    }

    /// Line of intersection with another plane, `None` when parallel.
    pub fn intersect_plane(&self, other: &Plane, angular: f64) -> Option<Axis> {
        let dir = self.normal.cross(other.normal);
        let len2 = dir.length_squared();
        if len2.sqrt() <= angular {
            return None;
        }
        let d1 = self.normal.dot(self.origin);
        let d2 = other.normal.dot(other.origin);
        let point = (other.normal.cross(dir) * d1 + dir.cross(self.normal) * d2) / len2;
        Axis::new(point, dir).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec3;

    #[test]
    fn test_signed_distance() {
        let plane = Plane::xy();
        assert!((plane.signed_distance(dvec3(0.0, 0.0, 5.0)) - 5.0).abs() < 1e-10);
        assert!((plane.signed_distance(dvec3(0.0, 0.0, -3.0)) + 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_project_point() {
        let plane = Plane::xy();
        let projected = plane.project_point(dvec3(1.0, 2.0, 5.0));
        assert!((projected - dvec3(1.0, 2.0, 0.0)).length() < 1e-10);
    }

    #[test]
    fn test_intersect_axis() {
        let plane = Plane::new(dvec3(0.0, 0.0, 2.0), Vector3::Z);
        let axis = Axis::new(dvec3(1.0, 1.0, 0.0), dvec3(0.0, 0.0, 1.0)).unwrap();
        let t = plane.intersect_axis(&axis, 1e-12).unwrap();
        assert!((axis.at(t) - dvec3(1.0, 1.0, 2.0)).length() < 1e-12);

        let parallel = Axis::new(dvec3(0.0, 0.0, 0.0), Vector3::X).unwrap();
        assert!(plane.intersect_axis(&parallel, 1e-12).is_none());
    }

    #[test]
    fn test_intersect_plane() {
        let a = Plane::new(dvec3(0.0, 0.0, 1.0), Vector3::Z);
        let b = Plane::new(dvec3(2.0, 0.0, 0.0), Vector3::X);
        let line = a.intersect_plane(&b, 1e-12).unwrap();
        assert!(a.signed_distance(line.origin).abs() < 1e-12);
        assert!(b.signed_distance(line.origin).abs() < 1e-12);
        assert!(line.direction.cross(Vector3::Y).length() < 1e-12);
        assert!(a.intersect_plane(&Plane::xy(), 1e-12).is_none());
    }
}
