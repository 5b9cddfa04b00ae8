use pse_core::{PseError, Result};
use serde::{Deserialize, Serialize};

use crate::{DMat3, Point3, Vector3};

/// Right-handed orthonormal placement (origin + x, y, z axes).
///
/// Surfaces and spine frames express their local geometry in a `Frame`;
/// `z` is the axis of rotation for axisymmetric surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub origin: Point3,
    pub x: Vector3,
    pub y: Vector3,
    pub z: Vector3,
}

impl Frame {
    pub fn world() -> Self {
        Self {
            origin: Point3::ZERO,
            x: Vector3::X,
            y: Vector3::Y,
            z: Vector3::Z,
        }
    }

    /// World axes placed at `origin`.
    pub fn world_at(origin: Point3) -> Self {
        Self {
            origin,
            ..Self::world()
        }
    }

    /// Build a frame from its `z` axis and a hint for `x`.
    ///
    /// `x_hint` is projected onto the plane normal to `z`; it must not be
    /// parallel to `z`.
    pub fn new(origin: Point3, z: Vector3, x_hint: Vector3) -> Result<Self> {
        let z = z
            .try_normalize()
            .ok_or_else(|| PseError::Geometry("frame axis has zero length".into()))?;
        let x = (x_hint - z * x_hint.dot(z))
            .try_normalize()
            .ok_or_else(|| PseError::Geometry("frame x hint is parallel to its axis".into()))?;
        Ok(Self {
            origin,
            x,
            y: z.cross(x),
            z,
        })
    }

    /// Build a frame around `z`, choosing `x` from the least aligned world axis.
    pub fn from_axis(origin: Point3, z: Vector3) -> Result<Self> {
        let hint = if z.x.abs() < 0.9 { Vector3::X } else { Vector3::Y };
        Self::new(origin, z, hint)
    }

    /// Rotation part as a matrix whose columns are `x`, `y`, `z`.
    pub fn matrix(&self) -> DMat3 {
        DMat3::from_cols(self.x, self.y, self.z)
    }

    pub fn to_global_point(&self, local: Point3) -> Point3 {
        self.origin + self.to_global_vector(local)
    }

    pub fn to_global_vector(&self, local: Vector3) -> Vector3 {
        self.x * local.x + self.y * local.y + self.z * local.z
    }

    pub fn to_local_point(&self, p: Point3) -> Point3 {
        self.to_local_vector(p - self.origin)
    }

    pub fn to_local_vector(&self, v: Vector3) -> Vector3 {
        Vector3::new(v.dot(self.x), v.dot(self.y), v.dot(self.z))
    }

    /// Same placement with `z` (and `y`) flipped.
    pub fn reversed(&self) -> Self {
        Self {
            origin: self.origin,
            x: self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::world()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::dvec3;

    #[test]
    fn test_world_identity() {
        let f = Frame::world();
        let p = dvec3(1.0, 2.0, 3.0);
        assert!((f.to_global_point(p) - p).length() < 1e-10);
        assert!((f.to_local_point(p) - p).length() < 1e-10);
    }

    #[test]
    fn test_new_orthonormalizes() {
        let f = Frame::new(dvec3(1.0, 0.0, 0.0), dvec3(0.0, 0.0, 2.0), dvec3(1.0, 0.0, 1.0)).unwrap();
        assert!((f.x - Vector3::X).length() < 1e-12);
        assert!((f.y - Vector3::Y).length() < 1e-12);
        assert!((f.z - Vector3::Z).length() < 1e-12);
        assert_abs_diff_eq!(f.matrix().determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_local_global_round_trip() {
        let f = Frame::from_axis(dvec3(1.0, -2.0, 0.5), dvec3(1.0, 1.0, 1.0)).unwrap();
        let p = dvec3(0.3, 4.0, -1.0);
        let back = f.to_global_point(f.to_local_point(p));
        assert!((back - p).length() < 1e-12);
    }

    #[test]
    fn test_degenerate_frame_rejected() {
        assert!(Frame::new(Point3::ZERO, Vector3::ZERO, Vector3::X).is_err());
        assert!(Frame::new(Point3::ZERO, Vector3::Z, Vector3::Z).is_err());
    }
}
