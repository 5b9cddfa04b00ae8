//! B-spline and NURBS curve implementations.

use std::sync::Arc;

use pse_core::{PseError, Result};
use pse_math::{Point3, VecDerivs};
use serde::{Deserialize, Serialize};

use super::Curve;
use crate::nurbs::knot::{self, check_layout};
use crate::nurbs::deboor;

/// A B-spline curve defined by degree, knot vector, and control points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BSplineCurve {
    pub degree: usize,
    pub knots: Vec<f64>,
    pub control_points: Vec<Point3>,
}

impl BSplineCurve {
    pub fn new(degree: usize, knots: Vec<f64>, control_points: Vec<Point3>) -> Result<Self> {
        check_layout(degree, &knots, control_points.len())?;
        Ok(Self {
            degree,
            knots,
            control_points,
        })
    }

    /// Interpolating cubic (or lower degree for few points) through `points` at `params`.
    pub fn interpolate(params: &[f64], points: &[Point3], degree: usize) -> Result<Self> {
        let (knots, control_points) = crate::nurbs::fit::interpolate_curve(params, points, degree)?;
        Self::new(degree, knots, control_points)
    }
}

impl Curve for BSplineCurve {
    fn point_at(&self, t: f64) -> Point3 {
        deboor::curve_point(self.degree, &self.knots, &self.control_points, t)
    }

    fn derivs(&self, t: f64) -> VecDerivs {
        deboor::curve_derivs(self.degree, &self.knots, &self.control_points, t)
    }

    fn domain(&self) -> (f64, f64) {
        let p = self.degree;
        (self.knots[p], self.knots[self.knots.len() - p - 1])
    }

    fn is_closed(&self) -> bool {
        let first = self.control_points[0];
        let last = self.control_points[self.control_points.len() - 1];
        (first - last).length() < 1e-12
    }

    fn breaks(&self) -> Vec<f64> {
        knot::interior_breaks(self.degree, &self.knots)
    }

    fn clone_curve(&self) -> Arc<dyn Curve> {
        Arc::new(self.clone())
    }
}

/// A NURBS (Non-Uniform Rational B-Spline) curve.
///
/// Extends `BSplineCurve` with weights for rational evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NurbsCurve {
    pub degree: usize,
    pub knots: Vec<f64>,
    pub control_points: Vec<Point3>,
    pub weights: Vec<f64>,
}

impl NurbsCurve {
    pub fn new(
        degree: usize,
        knots: Vec<f64>,
        control_points: Vec<Point3>,
        weights: Vec<f64>,
    ) -> Result<Self> {
        check_layout(degree, &knots, control_points.len())?;
        if control_points.len() != weights.len() {
            return Err(PseError::Domain(
                "Must have same number of weights as control points".into(),
            ));
        }
        if !weights.iter().all(|&w| w > 0.0) {
            return Err(PseError::Domain("All weights must be positive".into()));
        }
        Ok(Self {
            degree,
            knots,
            control_points,
            weights,
        })
    }
}

impl Curve for NurbsCurve {
    fn point_at(&self, t: f64) -> Point3 {
        deboor::nurbs_curve_point(
            self.degree,
            &self.knots,
            &self.control_points,
            &self.weights,
            t,
        )
    }

    fn derivs(&self, t: f64) -> VecDerivs {
        deboor::nurbs_curve_derivs(
            self.degree,
            &self.knots,
            &self.control_points,
            &self.weights,
            t,
        )
    }

    fn domain(&self) -> (f64, f64) {
        let p = self.degree;
        (self.knots[p], self.knots[self.knots.len() - p - 1])
    }

    fn is_closed(&self) -> bool {
        let first = self.control_points[0];
        let last = self.control_points[self.control_points.len() - 1];
        (first - last).length() < 1e-12
    }

    fn breaks(&self) -> Vec<f64> {
        knot::interior_breaks(self.degree, &self.knots)
    }

    fn clone_curve(&self) -> Arc<dyn Curve> {
        Arc::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pse_math::DVec3;

    #[test]
    fn test_bspline_curve_endpoints() {
        let curve = BSplineCurve::new(
            2,
            vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            vec![
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(0.5, 1.0, 0.0),
                DVec3::new(1.0, 0.0, 0.0),
            ],
        )
        .unwrap();

        assert!((curve.point_at(0.0) - DVec3::ZERO).length() < 1e-10);
        assert!((curve.point_at(1.0) - DVec3::X).length() < 1e-10);
        assert_eq!(curve.domain(), (0.0, 1.0));
    }

    #[test]
    fn test_bspline_layout_validation() {
        let err = BSplineCurve::new(2, vec![0.0, 0.0, 1.0, 1.0], vec![DVec3::ZERO; 3]);
        assert!(matches!(err, Err(PseError::Domain(_))));
        let err = BSplineCurve::new(1, vec![0.0, 0.0, 0.0, 0.0], vec![DVec3::ZERO; 2]);
        assert!(err.is_err());
    }

    #[test]
    fn test_nurbs_rejects_bad_weights() {
        let knots = vec![0.0, 0.0, 1.0, 1.0];
        let cps = vec![DVec3::ZERO, DVec3::X];
        assert!(NurbsCurve::new(1, knots.clone(), cps.clone(), vec![1.0, 0.0]).is_err());
        assert!(NurbsCurve::new(1, knots, cps, vec![1.0]).is_err());
    }

    #[test]
    fn test_breaks_report_interior_knots() {
        let curve = BSplineCurve::new(
            1,
            vec![0.0, 0.0, 0.5, 1.0, 1.0],
            vec![DVec3::ZERO, DVec3::X, DVec3::new(1.0, 1.0, 0.0)],
        )
        .unwrap();
        assert_eq!(curve.breaks(), vec![0.5]);
    }
}
