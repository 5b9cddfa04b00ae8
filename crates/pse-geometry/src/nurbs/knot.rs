//! Knot vector utilities for B-spline/NURBS evaluation.

use pse_core::{PseError, Result};

/// Find the knot span index for parameter `t` in the knot vector.
///
/// Returns the index `i` such that `knots[i] <= t < knots[i+1]`,
/// with special handling for the upper boundary.
///
/// # Arguments
/// * `degree` - Degree of the B-spline
/// * `knots` - The knot vector
/// * `n` - Number of control points minus 1
/// * `t` - Parameter value
pub fn find_span(degree: usize, knots: &[f64], n: usize, t: f64) -> usize {
    // Special case: t at upper boundary
    if t >= knots[n + 1] {
        return n;
    }
    if t <= knots[degree] {
        return degree;
    }

    // Binary search
    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;

    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }

    mid
}

/// Compute the non-vanishing basis functions at parameter `t`.
///
/// Returns a vector of `degree + 1` basis function values N_{span-degree,degree}(t)
/// through N_{span,degree}(t).
pub fn basis_functions(degree: usize, knots: &[f64], span: usize, t: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];

    n[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;

        for r in 0..j {
            let temp = n[r] / (right[r + 1] + left[j - r]);
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }

        n[j] = saved;
    }

    n
}

/// Compute basis functions and their derivatives up to order `n` at parameter `t`.
///
/// `ders[k][j]` is the `k`-th derivative of N_{span-degree+j,degree}(t).
/// Rows beyond the degree are zero.
#[allow(clippy::needless_range_loop)]
pub fn ders_basis_functions(
    degree: usize,
    knots: &[f64],
    span: usize,
    t: f64,
    n: usize,
) -> Vec<Vec<f64>> {
    let p = degree;
    let mut ders = vec![vec![0.0; p + 1]; n + 1];

    // Triangular table of basis functions (upper) and knot differences (lower)
    let mut ndu = vec![vec![0.0; p + 1]; p + 1];
    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];
    ndu[0][0] = 1.0;

    for j in 1..=p {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            ndu[j][r] = right[r + 1] + left[j - r];
            let temp = ndu[r][j - 1] / ndu[j][r];
            ndu[r][j] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        ndu[j][j] = saved;
    }

    for j in 0..=p {
        ders[0][j] = ndu[j][p];
    }

    let top = n.min(p);
    let mut a = vec![vec![0.0; p + 1]; 2];

    for r in 0..=p {
        let mut s1 = 0usize;
        let mut s2 = 1usize;
        a[0][0] = 1.0;

        for k in 1..=top {
            let mut d = 0.0;
            let rk = r as isize - k as isize;
            let pk = p - k;

            if r >= k {
                a[s2][0] = a[s1][0] / ndu[pk + 1][rk as usize];
                d = a[s2][0] * ndu[rk as usize][pk];
            }

            let j1 = if rk >= -1 { 1 } else { (-rk) as usize };
            let j2 = if r as isize - 1 <= pk as isize { k - 1 } else { p - r };

            for j in j1..=j2 {
                let idx = (rk + j as isize) as usize;
                a[s2][j] = (a[s1][j] - a[s1][j - 1]) / ndu[pk + 1][idx];
                d += a[s2][j] * ndu[idx][pk];
            }

            if r <= pk {
                a[s2][k] = -a[s1][k - 1] / ndu[pk + 1][r];
                d += a[s2][k] * ndu[r][pk];
            }

            ders[k][r] = d;
            std::mem::swap(&mut s1, &mut s2);
        }
    }

    // Multiply through by p!/(p-k)!
    let mut factor = p as f64;
    for k in 1..=top {
        for j in 0..=p {
            ders[k][j] *= factor;
        }
        factor *= (p - k) as f64;
    }

    ders
}

/// Distinct interior knot values, i.e. the parameters where a spline may lose smoothness.
pub fn interior_breaks(degree: usize, knots: &[f64]) -> Vec<f64> {
    let lo = knots[degree];
    let hi = knots[knots.len() - degree - 1];
    let mut out: Vec<f64> = Vec::new();
    for &k in &knots[degree + 1..knots.len() - degree - 1] {
        if k > lo && k < hi && out.last().map_or(true, |&last| last < k) {
            out.push(k);
        }
    }
    out
}

/// Multiplicity of the knot value `value`.
pub fn multiplicity(knots: &[f64], value: f64) -> usize {
    knots.iter().filter(|&&k| k == value).count()
}

/// Validate a clamped spline layout: degree, knot count and knot ordering.
pub fn check_layout(degree: usize, knots: &[f64], n_points: usize) -> Result<()> {
    if degree == 0 || n_points < degree + 1 {
        return Err(PseError::Domain(format!(
            "degree {} spline needs at least {} control points, got {}",
            degree,
            degree + 1,
            n_points
        )));
    }
    if knots.len() != n_points + degree + 1 {
        return Err(PseError::Domain(format!(
            "Knot vector length must be n + p + 1, got {} knots for {} CPs with degree {}",
            knots.len(),
            n_points,
            degree
        )));
    }
    if knots.windows(2).any(|w| w[1] < w[0]) {
        return Err(PseError::Domain("knot vector must be non-decreasing".into()));
    }
    if knots[degree] >= knots[knots.len() - degree - 1] {
        return Err(PseError::Domain("spline parameter range is empty".into()));
    }
    Ok(())
}
