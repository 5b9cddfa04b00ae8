//! B-spline and NURBS evaluation with derivatives.

use pse_math::derivs::binomial;
use pse_math::{DVec3, Point3, VecDerivs};

use super::knot::{basis_functions, ders_basis_functions, find_span};

/// Partial derivatives `skl[k][l]` (`k + l <= 3`) of a tensor-product patch.
pub type SurfacePartials = [[DVec3; 4]; 4];

/// Evaluate a B-spline curve point at parameter `t` using the De Boor algorithm.
pub fn curve_point(degree: usize, knots: &[f64], control_points: &[Point3], t: f64) -> Point3 {
    let n = control_points.len() - 1;
    let span = find_span(degree, knots, n, t);
    let basis = basis_functions(degree, knots, span, t);

    let mut point = DVec3::ZERO;
    for (i, b) in basis.iter().enumerate() {
        point += *b * control_points[span - degree + i];
    }

    point
}

/// Point and derivatives up to third order of a B-spline curve.
pub fn curve_derivs(degree: usize, knots: &[f64], control_points: &[Point3], t: f64) -> VecDerivs {
    let n = control_points.len() - 1;
    let span = find_span(degree, knots, n, t);
    let ders = ders_basis_functions(degree, knots, span, t, 3);

    let mut out = [DVec3::ZERO; 4];
    for (k, slot) in out.iter_mut().enumerate() {
        for j in 0..=degree {
            *slot += ders[k][j] * control_points[span - degree + j];
        }
    }
    out
}

/// Point and derivatives up to third order of a NURBS curve (quotient rule).
pub fn nurbs_curve_derivs(
    degree: usize,
    knots: &[f64],
    control_points: &[Point3],
    weights: &[f64],
    t: f64,
) -> VecDerivs {
    let n = control_points.len() - 1;
    let span = find_span(degree, knots, n, t);
    let ders = ders_basis_functions(degree, knots, span, t, 3);

    let mut a = [DVec3::ZERO; 4];
    let mut w = [0.0; 4];
    for k in 0..4 {
        for j in 0..=degree {
            let idx = span - degree + j;
            let bw = ders[k][j] * weights[idx];
            a[k] += bw * control_points[idx];
            w[k] += bw;
        }
    }

    let mut out = [DVec3::ZERO; 4];
    if w[0].abs() < 1e-15 {
        return a;
    }
    for k in 0..4 {
        let mut v = a[k];
        for i in 1..=k {
            v -= binomial(k, i) * w[i] * out[k - i];
        }
        out[k] = v / w[0];
    }
    out
}

/// Evaluate a rational B-spline (NURBS) curve point at parameter `t`.
pub fn nurbs_curve_point(
    degree: usize,
    knots: &[f64],
    control_points: &[Point3],
    weights: &[f64],
    t: f64,
) -> Point3 {
    let n = control_points.len() - 1;
    let span = find_span(degree, knots, n, t);
    let basis = basis_functions(degree, knots, span, t);

    let mut point = DVec3::ZERO;
    let mut w = 0.0;

    for (i, b) in basis.iter().enumerate() {
        let idx = span - degree + i;
        let bw = b * weights[idx];
        point += bw * control_points[idx];
        w += bw;
    }

    if w.abs() < 1e-15 {
        point
    } else {
        point / w
    }
}

/// Partial derivatives up to total order `order` (at most 3) of a B-spline surface.
#[allow(clippy::needless_range_loop, clippy::too_many_arguments)]
pub fn surface_derivs(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    control_points: &[Vec<Point3>],
    u: f64,
    v: f64,
    order: usize,
) -> SurfacePartials {
    let order = order.min(3);
    let n_u = control_points.len() - 1;
    let span_u = find_span(degree_u, knots_u, n_u, u);
    let nu = ders_basis_functions(degree_u, knots_u, span_u, u, order);

    let n_v = control_points[0].len() - 1;
    let span_v = find_span(degree_v, knots_v, n_v, v);
    let nv = ders_basis_functions(degree_v, knots_v, span_v, v, order);

    let mut skl = [[DVec3::ZERO; 4]; 4];
    for k in 0..=order {
        for l in 0..=(order - k) {
            let mut acc = DVec3::ZERO;
            for i in 0..=degree_u {
                let row = &control_points[span_u - degree_u + i];
                let mut temp = DVec3::ZERO;
                for j in 0..=degree_v {
                    temp += nv[l][j] * row[span_v - degree_v + j];
                }
                acc += nu[k][i] * temp;
            }
            skl[k][l] = acc;
        }
    }
    skl
}

/// Partial derivatives up to total order `order` (at most 3) of a NURBS surface.
#[allow(clippy::needless_range_loop, clippy::too_many_arguments)]
pub fn nurbs_surface_derivs(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    control_points: &[Vec<Point3>],
    weights: &[Vec<f64>],
    u: f64,
    v: f64,
    order: usize,
) -> SurfacePartials {
    let order = order.min(3);
    let n_u = control_points.len() - 1;
    let span_u = find_span(degree_u, knots_u, n_u, u);
    let nu = ders_basis_functions(degree_u, knots_u, span_u, u, order);

    let n_v = control_points[0].len() - 1;
    let span_v = find_span(degree_v, knots_v, n_v, v);
    let nv = ders_basis_functions(degree_v, knots_v, span_v, v, order);

    // Derivatives of the homogeneous numerator and of the weight function
    let mut a = [[DVec3::ZERO; 4]; 4];
    let mut w = [[0.0; 4]; 4];
    for k in 0..=order {
        for l in 0..=(order - k) {
            for i in 0..=degree_u {
                let iu = span_u - degree_u + i;
                for j in 0..=degree_v {
                    let iv = span_v - degree_v + j;
                    let b = nu[k][i] * nv[l][j] * weights[iu][iv];
                    a[k][l] += b * control_points[iu][iv];
                    w[k][l] += b;
                }
            }
        }
    }

    let mut skl = [[DVec3::ZERO; 4]; 4];
    if w[0][0].abs() < 1e-15 {
        return a;
    }
    for k in 0..=order {
        for l in 0..=(order - k) {
            let mut val = a[k][l];
            for j in 1..=l {
                val -= binomial(l, j) * w[0][j] * skl[k][l - j];
            }
            for i in 1..=k {
                val -= binomial(k, i) * w[i][0] * skl[k - i][l];
                let mut inner = DVec3::ZERO;
                for j in 1..=l {
                    inner += binomial(l, j) * w[i][j] * skl[k - i][l - j];
                }
                val -= binomial(k, i) * inner;
            }
            skl[k][l] = val / w[0][0];
        }
    }
    skl
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_point_linear() {
        let degree = 1;
        let knots = vec![0.0, 0.0, 1.0, 2.0, 2.0];
        let cps = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
        ];

        let p = curve_point(degree, &knots, &cps, 0.5);
        assert!((p.x - 0.5).abs() < 1e-10);
        assert!(p.y.abs() < 1e-10);

        let p = curve_point(degree, &knots, &cps, 1.5);
        assert!((p.x - 1.0).abs() < 1e-10);
        assert!((p.y - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_curve_derivs_quadratic() {
        // Quadratic Bezier (0,0) (0.5,1) (1,0): x = t, y = 2t(1-t)
        let knots = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let cps = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.5, 1.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
        ];
        let d = curve_derivs(2, &knots, &cps, 0.25);
        assert!((d[0] - DVec3::new(0.25, 0.375, 0.0)).length() < 1e-12);
        assert!((d[1] - DVec3::new(1.0, 1.0, 0.0)).length() < 1e-12);
        assert!((d[2] - DVec3::new(0.0, -4.0, 0.0)).length() < 1e-12);
        assert!(d[3].length() < 1e-12);
    }

    #[test]
    fn test_rational_quarter_circle() {
        // Quarter circle as a rational quadratic
        let knots = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let cps = vec![
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ];
        let w = vec![1.0, std::f64::consts::FRAC_1_SQRT_2, 1.0];
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            let d = nurbs_curve_derivs(2, &knots, &cps, &w, t);
            assert!((d[0].length() - 1.0).abs() < 1e-12);
            // Tangent of a circle is orthogonal to the radius.
            assert!(d[0].dot(d[1]).abs() < 1e-10);
            let p = nurbs_curve_point(2, &knots, &cps, &w, t);
            assert!((p - d[0]).length() < 1e-12);
        }
    }

    #[test]
    fn test_surface_point_bilinear() {
        let knots_u = vec![0.0, 0.0, 1.0, 1.0];
        let knots_v = vec![0.0, 0.0, 1.0, 1.0];
        let cps = vec![
            vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0)],
            vec![DVec3::new(0.0, 1.0, 0.0), DVec3::new(1.0, 1.0, 1.0)],
        ];

        let skl = surface_derivs(1, 1, &knots_u, &knots_v, &cps, 0.5, 0.5, 3);
        assert!((skl[0][0] - DVec3::new(0.5, 0.5, 0.25)).length() < 1e-10);
        // Twist vector of a bilinear patch is constant.
        assert!((skl[1][1] - DVec3::new(0.0, 0.0, 1.0)).length() < 1e-10);
        assert!(skl[2][0].length() < 1e-12);
    }

    #[test]
    fn test_rational_surface_matches_polynomial_with_unit_weights() {
        let knots = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let cps: Vec<Vec<Point3>> = (0..3)
            .map(|i| {
                (0..3)
                    .map(|j| DVec3::new(i as f64, j as f64, ((i * j) as f64).sin()))
                    .collect()
            })
            .collect();
        let weights = vec![vec![1.0; 3]; 3];
        let a = surface_derivs(2, 2, &knots, &knots, &cps, 0.3, 0.7, 3);
        let b = nurbs_surface_derivs(2, 2, &knots, &knots, &cps, &weights, 0.3, 0.7, 3);
        for k in 0..=3 {
            for l in 0..=(3 - k) {
                assert!((a[k][l] - b[k][l]).length() < 1e-10, "mismatch at ({}, {})", k, l);
            }
        }
    }
}
