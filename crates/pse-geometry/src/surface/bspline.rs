//! B-spline and NURBS surface implementations.

use pse_core::{PseError, Result};
use pse_math::Point3;
use serde::{Deserialize, Serialize};

use super::{DerivBundle, ParamDomain, Scratch, SurfaceEval};
use crate::nurbs::deboor;
use crate::nurbs::knot::check_layout;

/// A B-spline surface defined by degrees, knot vectors, and a 2D grid of control points.
///
/// `control_points[i][j]` is the control point at row `i` (u-direction) and column `j` (v-direction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BSplineSurface {
    pub degree_u: usize,
    pub degree_v: usize,
    pub knots_u: Vec<f64>,
    pub knots_v: Vec<f64>,
    pub control_points: Vec<Vec<Point3>>,
}

fn check_grid(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    control_points: &[Vec<Point3>],
) -> Result<()> {
    let n_v = control_points.first().map_or(0, Vec::len);
    if control_points.iter().any(|row| row.len() != n_v) {
        return Err(PseError::Domain("control point rows differ in length".into()));
    }
    check_layout(degree_u, knots_u, control_points.len())?;
    check_layout(degree_v, knots_v, n_v)
}

fn knot_range(degree: usize, knots: &[f64]) -> (f64, f64) {
    (knots[degree], knots[knots.len() - degree - 1])
}

impl BSplineSurface {
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        control_points: Vec<Vec<Point3>>,
    ) -> Result<Self> {
        check_grid(degree_u, degree_v, &knots_u, &knots_v, &control_points)?;
        Ok(Self {
            degree_u,
            degree_v,
            knots_u,
            knots_v,
            control_points,
        })
    }
}

impl SurfaceEval for BSplineSurface {
    fn eval(&self, u: f64, v: f64, order: usize, _scratch: &mut Scratch) -> DerivBundle {
        let skl = deboor::surface_derivs(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.control_points,
            u,
            v,
            order,
        );
        DerivBundle::from_partials(order, |i, j| skl[i][j])
    }

    fn natural_domain(&self) -> Result<ParamDomain> {
        ParamDomain::new(
            knot_range(self.degree_u, &self.knots_u),
            knot_range(self.degree_v, &self.knots_v),
        )
    }
}

/// A NURBS surface (rational B-spline surface).
///
/// Extends `BSplineSurface` with a 2D grid of weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NurbsSurface {
    pub degree_u: usize,
    pub degree_v: usize,
    pub knots_u: Vec<f64>,
    pub knots_v: Vec<f64>,
    pub control_points: Vec<Vec<Point3>>,
    pub weights: Vec<Vec<f64>>,
}

impl NurbsSurface {
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        control_points: Vec<Vec<Point3>>,
        weights: Vec<Vec<f64>>,
    ) -> Result<Self> {
        check_grid(degree_u, degree_v, &knots_u, &knots_v, &control_points)?;
        let same_shape = weights.len() == control_points.len()
            && weights.iter().zip(&control_points).all(|(w, p)| w.len() == p.len());
        if !same_shape {
            return Err(PseError::Domain("weight grid must match the control grid".into()));
        }
        if !weights.iter().flatten().all(|&w| w > 0.0) {
            return Err(PseError::Domain("All weights must be positive".into()));
        }
        Ok(Self {
            degree_u,
            degree_v,
            knots_u,
            knots_v,
            control_points,
            weights,
        })
    }
}

impl From<BSplineSurface> for NurbsSurface {
    fn from(s: BSplineSurface) -> Self {
        let weights = s.control_points.iter().map(|row| vec![1.0; row.len()]).collect();
        Self {
            degree_u: s.degree_u,
            degree_v: s.degree_v,
            knots_u: s.knots_u,
            knots_v: s.knots_v,
            control_points: s.control_points,
            weights,
        }
    }
}

impl SurfaceEval for NurbsSurface {
    fn eval(&self, u: f64, v: f64, order: usize, _scratch: &mut Scratch) -> DerivBundle {
        let skl = deboor::nurbs_surface_derivs(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.control_points,
            &self.weights,
            u,
            v,
            order,
        );
        DerivBundle::from_partials(order, |i, j| skl[i][j])
    }

    fn natural_domain(&self) -> Result<ParamDomain> {
        ParamDomain::new(
            knot_range(self.degree_u, &self.knots_u),
            knot_range(self.degree_v, &self.knots_v),
        )
    }
}
