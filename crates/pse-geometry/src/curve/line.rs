//! Line segment curve.

use std::sync::Arc;

use pse_math::{DVec3, Point3, VecDerivs, Vector3};
use serde::{Deserialize, Serialize};

use super::Curve;

/// A line segment from `start` to `end`, parameterized over `[0, 1]`.
///
/// `start == end` is allowed and models a curve collapsed to a point (cone apex).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub start: Point3,
    pub end: Point3,
}

impl Line {
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    pub fn direction(&self) -> Vector3 {
        self.end - self.start
    }
}

impl Curve for Line {
    fn derivs(&self, t: f64) -> VecDerivs {
        let d = self.direction();
        [self.start + t * d, d, DVec3::ZERO, DVec3::ZERO]
    }

    fn fourth_derivative(&self, _t: f64) -> Vector3 {
        DVec3::ZERO
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn clone_curve(&self) -> Arc<dyn Curve> {
        Arc::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_point_at() {
        let line = Line::new(DVec3::new(0.0, 0.0, 0.0), DVec3::new(2.0, 4.0, 6.0));
        let p = line.point_at(0.5);
        assert!((p.x - 1.0).abs() < 1e-10);
        assert!((p.y - 2.0).abs() < 1e-10);
        assert!((p.z - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_line_endpoints() {
        let line = Line::new(DVec3::new(1.0, 2.0, 3.0), DVec3::new(4.0, 5.0, 6.0));
        let p0 = line.point_at(0.0);
        let p1 = line.point_at(1.0);
        assert!((p0 - line.start).length() < 1e-10);
        assert!((p1 - line.end).length() < 1e-10);
    }

    #[test]
    fn test_line_derivs() {
        let line = Line::new(DVec3::new(0.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0));
        let d = line.derivs(0.5);
        assert!((d[1] - DVec3::X).length() < 1e-10);
        assert!(d[2].length() < 1e-15 && d[3].length() < 1e-15);
    }

    #[test]
    fn test_line_domain() {
        let line = Line::new(DVec3::ZERO, DVec3::X);
        assert_eq!(line.domain(), (0.0, 1.0));
        assert!(!line.is_closed());
    }
}
