//! Leibniz-rule algebra on derivative stacks `[f, f', f'', f''']`.
//!
//! Used to differentiate moving frames built from normalized vectors and
//! cross products without symbolic expansion.

use crate::{DMat3, DVec3, MatDerivs, VecDerivs};

const BINOMIAL: [[f64; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [1.0, 1.0, 0.0, 0.0],
    [1.0, 2.0, 1.0, 0.0],
    [1.0, 3.0, 3.0, 1.0],
];

/// Binomial coefficient for `n <= 3`.
pub fn binomial(n: usize, k: usize) -> f64 {
    BINOMIAL[n][k]
}

pub fn dot_derivs(a: &VecDerivs, b: &VecDerivs) -> [f64; 4] {
    let mut out = [0.0; 4];
    for (n, slot) in out.iter_mut().enumerate() {
        *slot = (0..=n).map(|k| binomial(n, k) * a[k].dot(b[n - k])).sum();
    }
    out
}

pub fn cross_derivs(a: &VecDerivs, b: &VecDerivs) -> VecDerivs {
    let mut out = [DVec3::ZERO; 4];
    for (n, slot) in out.iter_mut().enumerate() {
        *slot = (0..=n).fold(DVec3::ZERO, |acc, k| acc + binomial(n, k) * a[k].cross(b[n - k]));
    }
    out
}

pub fn scale_derivs(s: &[f64; 4], a: &VecDerivs) -> VecDerivs {
    let mut out = [DVec3::ZERO; 4];
    for (n, slot) in out.iter_mut().enumerate() {
        *slot = (0..=n).fold(DVec3::ZERO, |acc, k| acc + binomial(n, k) * s[k] * a[n - k]);
    }
    out
}

pub fn mat_product_derivs(a: &MatDerivs, b: &MatDerivs) -> MatDerivs {
    let mut out = [DMat3::ZERO; 4];
    for (n, slot) in out.iter_mut().enumerate() {
        *slot = (0..=n).fold(DMat3::ZERO, |acc, k| acc + (a[k] * b[n - k]) * binomial(n, k));
    }
    out
}

/// Derivatives of `f / |f|`; `None` when `f` vanishes.
pub fn unit_derivs(f: &VecDerivs) -> Option<VecDerivs> {
    let q = dot_derivs(f, f);
    if q[0] <= f64::EPSILON * f64::EPSILON {
        return None;
    }
    // g = q^(-1/2)
    let r = q[0].sqrt();
    let g0 = 1.0 / r;
    let g1 = -0.5 * q[1] / (q[0] * r);
    let g2 = 0.75 * q[1] * q[1] / (q[0] * q[0] * r) - 0.5 * q[2] / (q[0] * r);
    let g3 = -1.875 * q[1].powi(3) / (q[0].powi(3) * r) + 2.25 * q[1] * q[2] / (q[0] * q[0] * r)
        - 0.5 * q[3] / (q[0] * r);
    Some(scale_derivs(&[g0, g1, g2, g3], f))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(t: f64) -> DVec3 {
        DVec3::new(t.cos() * 2.0, t.sin() + t * t, 1.0 + t)
    }

    fn stack(f: impl Fn(f64) -> DVec3, t: f64) -> VecDerivs {
        let h = 1e-3;
        let p = |k: f64| f(t + k * h);
        [
            p(0.0),
            (p(1.0) - p(-1.0)) / (2.0 * h),
            (p(1.0) - 2.0 * p(0.0) + p(-1.0)) / (h * h),
            (p(2.0) - 2.0 * p(1.0) + 2.0 * p(-1.0) - p(-2.0)) / (2.0 * h * h * h),
        ]
    }

    #[test]
    fn test_unit_derivs_against_finite_differences() {
        let t = 0.3;
        let f = stack(curve, t);
        let n = unit_derivs(&f).unwrap();
        let expected = stack(|s| curve(s).normalize(), t);
        assert!((n[0] - expected[0]).length() < 1e-9);
        assert!((n[1] - expected[1]).length() < 1e-5);
        assert!((n[2] - expected[2]).length() < 1e-4);
        assert!((n[3] - expected[3]).length() < 1e-2);
    }

    #[test]
    fn test_cross_derivs_product_rule() {
        let a = [DVec3::X, DVec3::Y, DVec3::ZERO, DVec3::ZERO];
        let b = [DVec3::Y, DVec3::ZERO, DVec3::ZERO, DVec3::ZERO];
        let c = cross_derivs(&a, &b);
        assert!((c[0] - DVec3::Z).length() < 1e-15);
        assert!(c[1].length() < 1e-15); // Y x Y
    }

    #[test]
    fn test_zero_vector_has_no_unit_derivs() {
        assert!(unit_derivs(&[DVec3::ZERO; 4]).is_none());
    }
}
