//! Curve contract and implementations.
//!
//! Curves are the generators, spines and rails of the surface families. The
//! surface layer only relies on the [`Curve`] trait: point and derivatives up to
//! third order, the parameter domain, closedness and smoothness breaks.

mod bspline;
mod circle;
mod ellipse;
mod line;

use std::fmt;
use std::sync::Arc;

use pse_math::{Point3, VecDerivs, Vector3};

pub use bspline::{BSplineCurve, NurbsCurve};
pub use circle::Circle;
pub use ellipse::Ellipse;
pub use line::Line;

/// Trait for parametric curves in 3D space.
pub trait Curve: Send + Sync + fmt::Debug {
    /// Evaluate the curve at parameter `t`.
    fn point_at(&self, t: f64) -> Point3 {
        self.derivs(t)[0]
    }

    /// Point and derivatives of orders 1 to 3 at parameter `t`.
    fn derivs(&self, t: f64) -> VecDerivs;

    /// Evaluate the tangent vector at parameter `t`.
    fn tangent_at(&self, t: f64) -> Vector3 {
        self.derivs(t)[1]
    }

    /// Fourth derivative, needed by moving frames differentiated to third order.
    ///
    /// Defaults to a central difference of the third derivative.
    fn fourth_derivative(&self, t: f64) -> Vector3 {
        let (lo, hi) = self.domain();
        let h = 1e-4 * (hi - lo).max(1e-9);
        (self.derivs(t + h)[3] - self.derivs(t - h)[3]) / (2.0 * h)
    }

    /// Return the parameter domain `(t_min, t_max)`.
    fn domain(&self) -> (f64, f64);

    /// Whether the curve is closed (start == end) and periodic over its domain.
    fn is_closed(&self) -> bool {
        false
    }

    /// Interior parameters where derivatives may be discontinuous.
    fn breaks(&self) -> Vec<f64> {
        Vec::new()
    }

    /// Deep copy behind a fresh shared pointer.
    fn clone_curve(&self) -> Arc<dyn Curve>;
}

/// Whether a surface exclusively owns a curve or shares it with other surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    Owned,
    Shared,
}

/// A curve referenced by a surface, with explicit ownership.
///
/// Owned curves are deep-copied whenever the surface is duplicated; shared curves
/// are copied once per duplication and reused by every duplicated referrer.
#[derive(Debug, Clone)]
pub struct CurveRef {
    curve: Arc<dyn Curve>,
    ownership: Ownership,
}

impl CurveRef {
    pub fn owned(curve: impl Curve + 'static) -> Self {
        Self {
            curve: Arc::new(curve),
            ownership: Ownership::Owned,
        }
    }

    pub fn shared(curve: Arc<dyn Curve>) -> Self {
        Self {
            curve,
            ownership: Ownership::Shared,
        }
    }

    pub fn from_arc(curve: Arc<dyn Curve>, ownership: Ownership) -> Self {
        Self { curve, ownership }
    }

    pub fn curve(&self) -> &dyn Curve {
        self.curve.as_ref()
    }

    pub fn arc(&self) -> &Arc<dyn Curve> {
        &self.curve
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Identity of the referenced allocation, stable for the lifetime of the `Arc`.
    pub fn address(&self) -> usize {
        Arc::as_ptr(&self.curve) as *const () as usize
    }
}

impl std::ops::Deref for CurveRef {
    type Target = dyn Curve;

    fn deref(&self) -> &Self::Target {
        self.curve.as_ref()
    }
}

/// Length of the domain interval of `curve`.
pub fn domain_length(curve: &dyn Curve) -> f64 {
    let (lo, hi) = curve.domain();
    hi - lo
}

/// Whether every sampled point of `curve` lies within `tol` of its start.
pub fn is_degenerate(curve: &dyn Curve, tol: f64) -> bool {
    let (lo, hi) = curve.domain();
    let p0 = curve.point_at(lo);
    (1..=16).all(|i| {
        let t = lo + (hi - lo) * i as f64 / 16.0;
        (curve.point_at(t) - p0).length() <= tol
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pse_math::DVec3;

    #[test]
    fn test_curve_ref_identity() {
        let shared: Arc<dyn Curve> = Arc::new(Line::new(DVec3::ZERO, DVec3::X));
        let a = CurveRef::shared(shared.clone());
        let b = CurveRef::shared(shared);
        assert_eq!(a.address(), b.address());
        assert_eq!(a.ownership(), Ownership::Shared);

        let c = CurveRef::owned(Line::new(DVec3::ZERO, DVec3::X));
        assert_ne!(a.address(), c.address());
        assert_eq!(c.ownership(), Ownership::Owned);
    }

    #[test]
    fn test_degenerate_detection() {
        assert!(is_degenerate(&Line::new(DVec3::ONE, DVec3::ONE), 1e-9));
        assert!(!is_degenerate(&Line::new(DVec3::ZERO, DVec3::X), 1e-9));
    }

    #[test]
    fn test_default_fourth_derivative() {
        // x = t^4 has constant fourth derivative 24
        let cps = vec![
            DVec3::ZERO,
            DVec3::ZERO,
            DVec3::ZERO,
            DVec3::ZERO,
            DVec3::X,
        ];
        let knots = vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let curve = BSplineCurve::new(4, knots, cps).unwrap();
        assert!((curve.fourth_derivative(0.5).x - 24.0).abs() < 1e-4);
    }
}
