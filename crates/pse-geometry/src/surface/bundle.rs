//! Derivative bundle: position and all partials up to third order, computed together.

use pse_math::{DVec3, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::nurbs::SurfacePartials;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivBundle {
    pub point: Point3,
    pub du: Vector3,
    pub dv: Vector3,
    pub duu: Vector3,
    pub duv: Vector3,
    pub dvv: Vector3,
    pub duuu: Vector3,
    pub duuv: Vector3,
    pub duvv: Vector3,
    pub dvvv: Vector3,
}

/// Unit normal and its first partials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalBundle {
    pub normal: Vector3,
    pub normal_u: Vector3,
    pub normal_v: Vector3,
}

impl DerivBundle {
    /// Fill the bundle from a function returning `d^(i+j) P / du^i dv^j`.
    ///
    /// Partials of total order above `order` are left zero.
    pub fn from_partials(order: usize, mut partial: impl FnMut(usize, usize) -> DVec3) -> Self {
        let mut b = Self {
            point: partial(0, 0),
            ..Self::default()
        };
        if order >= 1 {
            b.du = partial(1, 0);
            b.dv = partial(0, 1);
        }
        if order >= 2 {
            b.duu = partial(2, 0);
            b.duv = partial(1, 1);
            b.dvv = partial(0, 2);
        }
        if order >= 3 {
            b.duuu = partial(3, 0);
            b.duuv = partial(2, 1);
            b.duvv = partial(1, 2);
            b.dvvv = partial(0, 3);
        }
        b
    }

    pub fn from_skl(skl: &SurfacePartials) -> Self {
        Self::from_partials(3, |i, j| skl[i][j])
    }

    /// `d^(i+j) P / du^i dv^j` for `i + j <= 3`.
    pub fn partial(&self, i: usize, j: usize) -> DVec3 {
        match (i, j) {
            (0, 0) => self.point,
            (1, 0) => self.du,
            (0, 1) => self.dv,
            (2, 0) => self.duu,
            (1, 1) => self.duv,
            (0, 2) => self.dvv,
            (3, 0) => self.duuu,
            (2, 1) => self.duuv,
            (1, 2) => self.duvv,
            (0, 3) => self.dvvv,
            _ => DVec3::ZERO,
        }
    }

    /// Swap the roles of `u` and `v`.
    pub fn transposed(&self) -> Self {
        Self::from_partials(3, |i, j| self.partial(j, i))
    }

    /// Unnormalized normal `Su x Sv`.
    pub fn raw_normal(&self) -> Vector3 {
        self.du.cross(self.dv)
    }

    /// Unit normal and its partials; `None` where `Su x Sv` vanishes.
    pub fn normal_bundle(&self, tol: f64) -> Option<NormalBundle> {
        let n = self.raw_normal();
        let len = n.length();
        if len <= tol {
            return None;
        }
        let unit = n / len;
        let n_u = self.duu.cross(self.dv) + self.du.cross(self.duv);
        let n_v = self.duv.cross(self.dv) + self.du.cross(self.dvv);
        Some(NormalBundle {
            normal: unit,
            normal_u: (n_u - unit * unit.dot(n_u)) / len,
            normal_v: (n_v - unit * unit.dot(n_v)) / len,
        })
    }
}

impl NormalBundle {
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            normal_u: -self.normal_u,
            normal_v: -self.normal_v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_layout() {
        let b = DerivBundle::from_partials(3, |i, j| DVec3::new(i as f64, j as f64, 0.0));
        for i in 0..=3 {
            for j in 0..=(3 - i) {
                assert_eq!(b.partial(i, j), DVec3::new(i as f64, j as f64, 0.0));
            }
        }
        let t = b.transposed();
        assert_eq!(t.duuv, DVec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_order_limits_bundle() {
        let b = DerivBundle::from_partials(1, |_, _| DVec3::ONE);
        assert_eq!(b.du, DVec3::ONE);
        assert_eq!(b.duu, DVec3::ZERO);
    }

    #[test]
    fn test_normal_of_degenerate_bundle() {
        let b = DerivBundle {
            du: DVec3::X,
            dv: DVec3::X,
            ..Default::default()
        };
        assert!(b.normal_bundle(1e-12).is_none());
    }

    #[test]
    fn test_normal_partials_of_cylinder() {
        // P = (cos u, sin u, v): N = (cos u, sin u, 0), N_u = (-sin u, cos u, 0)
        let u: f64 = 0.4;
        let b = DerivBundle {
            point: DVec3::new(u.cos(), u.sin(), 0.0),
            du: DVec3::new(-u.sin(), u.cos(), 0.0),
            dv: DVec3::Z,
            duu: DVec3::new(-u.cos(), -u.sin(), 0.0),
            ..Default::default()
        };
        let nb = b.normal_bundle(1e-12).unwrap();
        assert!((nb.normal - DVec3::new(u.cos(), u.sin(), 0.0)).length() < 1e-12);
        assert!((nb.normal_u - DVec3::new(-u.sin(), u.cos(), 0.0)).length() < 1e-12);
        assert!(nb.normal_v.length() < 1e-12);
    }
}
