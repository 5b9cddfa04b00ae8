//! Curvature analysis along a 3D curve.
//!
//! The curve is split at its smoothness breaks and each piece is sampled
//! uniformly. Sign changes of the curvature (planar curves only) and of its
//! analytic derivative between neighboring samples are refined by bisection into
//! inflections and local extrema. At every break the one-sided curvatures are
//! compared and a jump is reported as a before/after pair.

use pse_core::{PseError, Result, Tolerance};
use pse_geometry::curve::Curve;
use pse_math::Vector3;
use serde::{Deserialize, Serialize};

/// Curvature or curvature slope below this counts as zero for sign tests.
const ZERO_CURVATURE: f64 = 1e-10;
/// One-sided offset from a break, relative to the domain length.
const BREAK_OFFSET: f64 = 1e-9;
const MAX_BISECTIONS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub t: f64,
    pub curvature: f64,
}

/// Curvature on both sides of a break.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvatureJump {
    pub before: CurvePoint,
    pub after: CurvePoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveAnalysis {
    pub max: CurvePoint,
    pub min: CurvePoint,
    /// Sign changes of the signed curvature.
    ///
    /// The curvature of a non-planar curve is unsigned and never changes sign, so
    /// this stays empty; a point where it touches zero is reported in
    /// `local_minima` instead.
    pub inflections: Vec<CurvePoint>,
    pub local_maxima: Vec<CurvePoint>,
    pub local_minima: Vec<CurvePoint>,
    pub discontinuities: Vec<CurvatureJump>,
    /// Normal the curvature is signed against, `None` when unsigned.
    pub planar_normal: Option<Vector3>,
}

impl CurveAnalysis {
    fn record(&mut self, point: CurvePoint) {
        if point.curvature > self.max.curvature {
            self.max = point;
        }
        if point.curvature < self.min.curvature {
            self.min = point;
        }
    }
}

/// Curvature and its derivative in `t`, signed against `normal` when given.
fn curvature(curve: &dyn Curve, t: f64, normal: Option<Vector3>) -> (f64, f64) {
    let [_, d1, d2, d3] = curve.derivs(t);
    let speed = d1.length();
    if speed <= f64::EPSILON {
        return (0.0, 0.0);
    }
    let w = d1.cross(d2);
    let dw = d1.cross(d3);
    let dspeed = d1.dot(d2) / speed;
    let (bend, dbend) = match normal {
        Some(n) => (w.dot(n), dw.dot(n)),
        None => {
            let len = w.length();
            let dlen = if len > f64::EPSILON { w.dot(dw) / len } else { 0.0 };
            (len, dlen)
        }
    };
    let s3 = speed.powi(3);
    (bend / s3, dbend / s3 - 3.0 * bend * dspeed / (s3 * speed))
}

fn sign(x: f64) -> i8 {
    if x > ZERO_CURVATURE {
        1
    } else if x < -ZERO_CURVATURE {
        -1
    } else {
        0
    }
}

/// Normal of the plane holding `points`, or `None` when they are collinear or
/// leave every plane by more than `tol`.
fn infer_plane(curve: &dyn Curve, params: &[f64], tol: f64) -> Option<Vector3> {
    let (normal, _) = params
        .iter()
        .map(|&t| {
            let [_, d1, d2, _] = curve.derivs(t);
            let w = d1.cross(d2);
            (w, w.length())
        })
        .fold((Vector3::ZERO, 0.0), |best, cand| if cand.1 > best.1 { cand } else { best });
    let normal = normal.try_normalize()?;
    let origin = curve.point_at(params[0]);
    params
        .iter()
        .all(|&t| (curve.point_at(t) - origin).dot(normal).abs() <= tol)
        .then_some(normal)
}

/// Root of `f` on `[lo, hi]` where `f` changes sign, by bisection.
fn bisect(mut lo: f64, mut hi: f64, f: impl Fn(f64) -> f64, tol: f64) -> f64 {
    let low_negative = f(lo) < 0.0;
    for _ in 0..MAX_BISECTIONS {
        let mid = 0.5 * (lo + hi);
        if (f(mid) < 0.0) == low_negative {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= tol {
            break;
        }
    }
    0.5 * (lo + hi)
}

/// Analyze the curvature of `curve` with `samples` uniform samples over its domain.
///
/// With `plane_normal` the curve is taken as planar and its curvature is signed
/// against that normal. Otherwise planarity is inferred from the samples.
pub fn analyze_curve(curve: &dyn Curve, plane_normal: Option<Vector3>, samples: usize) -> Result<CurveAnalysis> {
    let (lo, hi) = curve.domain();
    if !(hi > lo) {
        return Err(PseError::Domain(format!("curve domain [{lo}, {hi}] is empty")));
    }
    if samples < 2 {
        return Err(PseError::Domain(format!("curve analysis needs at least 2 samples, got {samples}")));
    }
    let span = hi - lo;
    let offset = BREAK_OFFSET * span;
    let param_tol = Tolerance::default().parametric * span;

    let uniform: Vec<f64> = (0..samples).map(|i| lo + span * i as f64 / (samples - 1) as f64).collect();
    let normal = match plane_normal {
        Some(n) => Some(
            n.try_normalize()
                .ok_or_else(|| PseError::Geometry("plane normal has zero length".into()))?,
        ),
        None => infer_plane(curve, &uniform, Tolerance::default().linear),
    };
    let kappa = |t: f64| curvature(curve, t, normal);

    let breaks: Vec<f64> = curve.breaks().into_iter().filter(|&b| b > lo && b < hi).collect();
    let mut bounds = Vec::with_capacity(breaks.len() + 2);
    bounds.push(lo);
    bounds.extend(&breaks);
    bounds.push(hi);

    let mut analysis = CurveAnalysis {
        max: CurvePoint {
            t: lo,
            curvature: f64::NEG_INFINITY,
        },
        min: CurvePoint {
            t: lo,
            curvature: f64::INFINITY,
        },
        inflections: Vec::new(),
        local_maxima: Vec::new(),
        local_minima: Vec::new(),
        discontinuities: Vec::new(),
        planar_normal: normal,
    };
    for (k, piece) in bounds.windows(2).enumerate() {
        let a = if k == 0 { piece[0] } else { piece[0] + offset };
        let b = if k + 2 == bounds.len() { piece[1] } else { piece[1] - offset };
        let count = ((samples as f64 * (b - a) / span).ceil() as usize).max(2);
        // Last sample with a nonzero curvature and a nonzero slope.
        let mut last_bend: Option<(f64, i8)> = None;
        let mut last_slope: Option<(f64, i8)> = None;
        for i in 0..=count {
            let t = a + (b - a) * i as f64 / count as f64;
            let (c, slope) = kappa(t);
            analysis.record(CurvePoint { t, curvature: c });

            if normal.is_some() && sign(c) != 0 {
                if let Some((t0, s0)) = last_bend {
                    if s0 != sign(c) {
                        let t = bisect(t0, t, |t| kappa(t).0, param_tol);
                        analysis.inflections.push(CurvePoint { t, curvature: 0.0 });
                    }
                }
                last_bend = Some((t, sign(c)));
            }
            if sign(slope) != 0 {
                if let Some((t0, s0)) = last_slope {
                    if s0 != sign(slope) {
                        let t = bisect(t0, t, |t| kappa(t).1, param_tol);
                        let point = CurvePoint {
                            t,
                            curvature: kappa(t).0,
                        };
                        analysis.record(point);
                        if s0 > 0 {
                            analysis.local_maxima.push(point);
                        } else {
                            analysis.local_minima.push(point);
                        }
                    }
                }
                last_slope = Some((t, sign(slope)));
            }
        }
    }

    for &b in &breaks {
        let before = CurvePoint {
            t: b,
            curvature: kappa(b - offset).0,
        };
        let after = CurvePoint {
            t: b,
            curvature: kappa(b + offset).0,
        };
        let scale = before.curvature.abs().max(after.curvature.abs()).max(1.0);
        if (before.curvature - after.curvature).abs() > 1e-6 * scale {
            analysis.discontinuities.push(CurvatureJump { before, after });
        }
    }

    tracing::debug!(
        samples,
        planar = normal.is_some(),
        inflections = analysis.inflections.len(),
        extrema = analysis.local_maxima.len() + analysis.local_minima.len(),
        jumps = analysis.discontinuities.len(),
        "curve analyzed"
    );
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pse_geometry::curve::{BSplineCurve, Circle};
    use pse_math::DVec3;

    fn s_curve() -> BSplineCurve {
        let cps = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(2.0, -1.0, 0.0),
            DVec3::new(3.0, 0.0, 0.0),
        ];
        BSplineCurve::new(3, vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0], cps).unwrap()
    }

    #[test]
    fn test_circle_has_constant_signed_curvature() {
        let circle = Circle::new(DVec3::ZERO, DVec3::Z, 2.0);
        let analysis = analyze_curve(&circle, Some(DVec3::Z), 64).unwrap();
        assert_abs_diff_eq!(analysis.max.curvature, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(analysis.min.curvature, 0.5, epsilon = 1e-12);
        assert!(analysis.inflections.is_empty());
        assert!(analysis.local_maxima.is_empty() && analysis.local_minima.is_empty());

        let flipped = analyze_curve(&circle, Some(-DVec3::Z), 64).unwrap();
        assert_abs_diff_eq!(flipped.max.curvature, -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_s_curve_inflection_and_extrema() {
        let curve = s_curve();
        let analysis = analyze_curve(&curve, None, 50).unwrap();
        assert_eq!(analysis.planar_normal.map(|n| n.z.abs()), Some(1.0));
        assert_eq!(analysis.inflections.len(), 1);
        assert_abs_diff_eq!(analysis.inflections[0].t, 0.5, epsilon = 1e-8);
        assert_eq!(analysis.local_maxima.len(), 1);
        assert_eq!(analysis.local_minima.len(), 1);
        // Point symmetry about the midpoint mirrors the extremes.
        assert_abs_diff_eq!(analysis.max.curvature, -analysis.min.curvature, epsilon = 1e-9);
        assert_abs_diff_eq!(analysis.max.t + analysis.min.t, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_helix_curvature_is_unsigned() {
        #[derive(Debug)]
        struct Helix;
        impl Curve for Helix {
            fn derivs(&self, t: f64) -> pse_math::VecDerivs {
                let (s, c) = t.sin_cos();
                [
                    DVec3::new(c, s, 0.5 * t),
                    DVec3::new(-s, c, 0.5),
                    DVec3::new(-c, -s, 0.0),
                    DVec3::new(s, -c, 0.0),
                ]
            }
            fn domain(&self) -> (f64, f64) {
                (0.0, 6.0)
            }
            fn clone_curve(&self) -> std::sync::Arc<dyn Curve> {
                std::sync::Arc::new(Helix)
            }
        }
        let analysis = analyze_curve(&Helix, None, 32).unwrap();
        assert!(analysis.planar_normal.is_none());
        assert!(analysis.inflections.is_empty());
        assert_abs_diff_eq!(analysis.max.curvature, 1.0 / 1.25, epsilon = 1e-12);
    }

    #[test]
    fn test_twisted_cubic_straight_point_is_a_minimum() {
        // (t, t^3, t^4) straightens at t = 0 without lying in a plane.
        #[derive(Debug)]
        struct Twisted;
        impl Curve for Twisted {
            fn derivs(&self, t: f64) -> pse_math::VecDerivs {
                [
                    DVec3::new(t, t.powi(3), t.powi(4)),
                    DVec3::new(1.0, 3.0 * t * t, 4.0 * t.powi(3)),
                    DVec3::new(0.0, 6.0 * t, 12.0 * t * t),
                    DVec3::new(0.0, 6.0, 24.0 * t),
                ]
            }
            fn domain(&self) -> (f64, f64) {
                (-1.0, 1.0)
            }
            fn clone_curve(&self) -> std::sync::Arc<dyn Curve> {
                std::sync::Arc::new(Twisted)
            }
        }
        let analysis = analyze_curve(&Twisted, None, 40).unwrap();
        assert!(analysis.planar_normal.is_none());
        assert!(analysis.inflections.is_empty());
        assert!(analysis
            .local_minima
            .iter()
            .any(|p| p.t.abs() < 1e-6 && p.curvature < 1e-5));
        assert!(analysis.min.curvature < 1e-5);
    }

    #[test]
    fn test_break_reports_curvature_jump() {
        // Straight first span, bent second span: C1 at the interior knot.
        let cps = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(3.0, 1.0, 0.0),
        ];
        let curve = BSplineCurve::new(2, vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0], cps).unwrap();
        let analysis = analyze_curve(&curve, Some(DVec3::Z), 40).unwrap();
        assert_eq!(analysis.discontinuities.len(), 1);
        let jump = analysis.discontinuities[0];
        assert_eq!(jump.before.t, 0.5);
        assert_abs_diff_eq!(jump.before.curvature, 0.0, epsilon = 1e-9);
        assert!(jump.after.curvature > 0.1);
    }

    #[test]
    fn test_rejects_single_sample() {
        assert!(analyze_curve(&s_curve(), None, 1).is_err());
    }
}
