//! Global B-spline interpolation used by NURBS conversion.

use nalgebra::DMatrix;
use pse_core::{PseError, Result};
use pse_math::{DVec3, Point3};

use super::knot::{basis_functions, find_span};

/// Clamped knot vector by knot averaging over the interpolation parameters.
pub fn averaged_knots(params: &[f64], degree: usize) -> Vec<f64> {
    let n = params.len() - 1;
    let mut knots = Vec::with_capacity(n + degree + 2);
    knots.extend(std::iter::repeat(params[0]).take(degree + 1));
    for j in 1..=(n - degree) {
        let sum: f64 = params[j..j + degree].iter().sum();
        knots.push(sum / degree as f64);
    }
    knots.extend(std::iter::repeat(params[n]).take(degree + 1));
    knots
}

/// Collocation matrix `N_j(t_i)` of the interpolation problem.
fn collocation(params: &[f64], knots: &[f64], degree: usize) -> DMatrix<f64> {
    let n = params.len();
    let mut m = DMatrix::zeros(n, n);
    for (i, &t) in params.iter().enumerate() {
        let span = find_span(degree, knots, n - 1, t);
        let basis = basis_functions(degree, knots, span, t);
        for (j, b) in basis.iter().enumerate() {
            m[(i, span - degree + j)] = *b;
        }
    }
    m
}

/// Solve for control points interpolating each column of `rows` at `params`.
///
/// `rows[r][i]` is the point of row `r` to interpolate at `params[i]`.
fn solve_rows(params: &[f64], knots: &[f64], degree: usize, rows: &[Vec<Point3>]) -> Result<Vec<Vec<Point3>>> {
    let n = params.len();
    let lu = collocation(params, knots, degree).lu();
    let mut rhs = DMatrix::zeros(n, rows.len() * 3);
    for (r, row) in rows.iter().enumerate() {
        for (i, p) in row.iter().enumerate() {
            rhs[(i, 3 * r)] = p.x;
            rhs[(i, 3 * r + 1)] = p.y;
            rhs[(i, 3 * r + 2)] = p.z;
        }
    }
    let sol = lu
        .solve(&rhs)
        .ok_or_else(|| PseError::Geometry("singular interpolation matrix".into()))?;
    Ok((0..rows.len())
        .map(|r| {
            (0..n)
                .map(|i| DVec3::new(sol[(i, 3 * r)], sol[(i, 3 * r + 1)], sol[(i, 3 * r + 2)]))
                .collect()
        })
        .collect())
}

/// Interpolate a curve through `points` at `params`; returns `(knots, control_points)`.
pub fn interpolate_curve(params: &[f64], points: &[Point3], degree: usize) -> Result<(Vec<f64>, Vec<Point3>)> {
    check_params(params, degree)?;
    if points.len() != params.len() {
        return Err(PseError::Geometry("point and parameter counts differ".into()));
    }
    let knots = averaged_knots(params, degree);
    let mut cps = solve_rows(params, &knots, degree, &[points.to_vec()])?;
    Ok((knots, cps.remove(0)))
}

/// Tensor-product interpolation of `grid[i][j]` sampled at `(params_u[i], params_v[j])`.
///
/// Returns `(knots_u, knots_v, control_points)` with `control_points[i][j]` laid out
/// like the input grid.
pub fn interpolate_grid(
    params_u: &[f64],
    params_v: &[f64],
    grid: &[Vec<Point3>],
    degree: usize,
) -> Result<(Vec<f64>, Vec<f64>, Vec<Vec<Point3>>)> {
    check_params(params_u, degree)?;
    check_params(params_v, degree)?;
    if grid.len() != params_u.len() || grid.iter().any(|row| row.len() != params_v.len()) {
        return Err(PseError::Geometry("grid shape does not match parameters".into()));
    }
    let knots_u = averaged_knots(params_u, degree);
    let knots_v = averaged_knots(params_v, degree);

    // Interpolate along v for every u row, then along u for every resulting column.
    let along_v = solve_rows(params_v, &knots_v, degree, grid)?;
    let columns: Vec<Vec<Point3>> = (0..params_v.len())
        .map(|j| along_v.iter().map(|row| row[j]).collect())
        .collect();
    let along_u = solve_rows(params_u, &knots_u, degree, &columns)?;
    let control_points = (0..params_u.len())
        .map(|i| along_u.iter().map(|col| col[i]).collect())
        .collect();
    Ok((knots_u, knots_v, control_points))
}

fn check_params(params: &[f64], degree: usize) -> Result<()> {
    if degree == 0 || params.len() < degree + 1 {
        return Err(PseError::Geometry(format!(
            "degree {} interpolation needs at least {} points, got {}",
            degree,
            degree + 1,
            params.len()
        )));
    }
    if params.windows(2).any(|w| !(w[0] < w[1])) {
        return Err(PseError::Geometry("interpolation parameters must increase".into()));
    }
    Ok(())
}
