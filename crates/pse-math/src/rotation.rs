//! Rotation matrices about a unit axis and their derivatives with respect to the angle.
//!
//! With `K` the cross-product matrix of the axis, Rodrigues' formula gives
//! `R(a) = I + sin(a) K + (1 - cos(a)) K^2`, so for `n >= 1`
//! `R^(n)(a) = sin^(n)(a) K - cos^(n)(a) K^2`.

use crate::{DMat3, MatDerivs, Vector3};

/// `n`-th derivatives of `cos` and `sin` at `angle`, as `(cos^(n), sin^(n))`.
pub fn trig_deriv(angle: f64, order: usize) -> (f64, f64) {
    let (s, c) = angle.sin_cos();
    match order % 4 {
        0 => (c, s),
        1 => (-s, c),
        2 => (-c, -s),
        _ => (s, -c),
    }
}

/// Matrix `K` with `K v = axis x v`.
pub fn cross_matrix(axis: Vector3) -> DMat3 {
    DMat3::from_cols(
        Vector3::new(0.0, axis.z, -axis.y),
        Vector3::new(-axis.z, 0.0, axis.x),
        Vector3::new(axis.y, -axis.x, 0.0),
    )
}

/// `order`-th derivative of the rotation about unit `axis` with respect to the angle.
pub fn rotation_deriv(axis: Vector3, angle: f64, order: usize) -> DMat3 {
    let k = cross_matrix(axis);
    let k2 = k * k;
    let (c, s) = trig_deriv(angle, order);
    if order == 0 {
        DMat3::IDENTITY + k * s + k2 * (1.0 - c)
    } else {
        k * s - k2 * c
    }
}

/// Rotation about unit `axis` by `rate * t` and its derivatives of orders 1..=3 in `t`.
pub fn rotation_derivs(axis: Vector3, rate: f64, t: f64) -> MatDerivs {
    let angle = rate * t;
    let mut out = [DMat3::IDENTITY; 4];
    let mut factor = 1.0;
    for (order, slot) in out.iter_mut().enumerate() {
        *slot = rotation_deriv(axis, angle, order) * factor;
        factor *= rate;
    }
    out
}
