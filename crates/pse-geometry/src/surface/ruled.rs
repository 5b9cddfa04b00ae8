//! Ruled surface between two boundary curves.
//!
//! `P(u, v) = (1 - v) C1(u) + v C2(r(u))`, where `r` maps the domain of `C1`
//! linearly onto the domain of `C2`. The surface classifies itself on
//! construction and after every edit and evaluates with the cheapest formula
//! of its class: an extrusion never evaluates `C2`, a pole class never evaluates
//! its degenerate curve. Pole classes take their normal from the non-degenerate
//! side and never divide by the vanishing `Su`.

use pse_core::{PseError, Result, Tolerance};
use pse_math::{DVec3, Plane, Point3, VecDerivs, Vector3};
use serde::{Deserialize, Serialize};

use super::{DerivBundle, Edge, ParamDomain, Poles, Scratch, SurfaceEval};
use crate::curve::{is_degenerate, CurveRef};

/// Samples along `u` used by the classifier.
const CLASSIFY_SAMPLES: usize = 17;

/// Shape class of a ruled surface, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuledClass {
    /// `C1` collapses to a point.
    PoleAtVMin,
    /// `C2` collapses to a point.
    PoleAtVMax,
    Planar,
    /// Every ruling is the same vector.
    Extrusion,
    /// Rulings share one direction but vary in length.
    OffsetOfExtrusion,
    /// Both boundaries are straight lines.
    StraightGenerators,
    /// `C2' = lambda C1'` with a constant `lambda != 1`: the rulings meet in an apex.
    Conical,
    Arbitrary,
}

#[derive(Debug, Clone)]
pub struct RuledSurface {
    pub curves: [CurveRef; 2],
    class: RuledClass,
    plane: Option<Plane>,
    formula: Formula,
}

/// Evaluation shortcut fixed by the class.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Formula {
    /// `(1 - v) C1(u) + v C2(r(u))`.
    General,
    /// `C1(u) + v d` with the common ruling `d`.
    Extrusion(Vector3),
    /// `(1 - v) apex + v C2(r(u))`.
    ApexAtVMin(Point3),
    /// `(1 - v) C1(u) + v apex`.
    ApexAtVMax(Point3),
}

impl RuledSurface {
    pub fn new(first: CurveRef, second: CurveRef) -> Result<Self> {
        let mut surface = Self {
            curves: [first, second],
            class: RuledClass::Arbitrary,
            plane: None,
            formula: Formula::General,
        };
        surface.reclassify(Tolerance::DEFAULT_LINEAR)?;
        Ok(surface)
    }

    pub fn class(&self) -> RuledClass {
        self.class
    }

    /// Supporting plane of a planar ruled surface.
    pub fn plane(&self) -> Option<Plane> {
        self.plane
    }

    pub(super) fn set_curve(&mut self, index: usize, curve: CurveRef) -> Result<()> {
        let mut edited = self.clone();
        edited.curves[index] = curve;
        edited.reclassify(Tolerance::DEFAULT_LINEAR)?;
        *self = edited;
        Ok(())
    }

    /// Slope of the linear map from the `C1` domain onto the `C2` domain.
    fn scale(&self) -> f64 {
        let (a0, a1) = self.curves[0].domain();
        let (b0, b1) = self.curves[1].domain();
        (b1 - b0) / (a1 - a0)
    }

    fn second_param(&self, u: f64) -> f64 {
        let a0 = self.curves[0].domain().0;
        let b0 = self.curves[1].domain().0;
        b0 + (u - a0) * self.scale()
    }

    /// Derivatives of `C2(r(u))` with respect to `u`.
    fn second(&self, u: f64) -> VecDerivs {
        let s = self.scale();
        let raw = self.curves[1].derivs(self.second_param(u));
        std::array::from_fn(|n| raw[n] * s.powi(n as i32))
    }

    /// Derivatives of both boundaries with respect to `u`.
    fn boundaries(&self, u: f64) -> (VecDerivs, VecDerivs) {
        (self.curves[0].derivs(u), self.second(u))
    }

    fn samples(&self) -> Vec<(VecDerivs, VecDerivs)> {
        let (lo, hi) = self.curves[0].domain();
        (0..CLASSIFY_SAMPLES)
            .map(|i| self.boundaries(lo + (hi - lo) * i as f64 / (CLASSIFY_SAMPLES - 1) as f64))
            .collect()
    }

    fn reclassify(&mut self, tol: f64) -> Result<()> {
        let degenerate = [
            is_degenerate(self.curves[0].curve(), tol),
            is_degenerate(self.curves[1].curve(), tol),
        ];
        if degenerate[0] && degenerate[1] {
            return Err(PseError::Geometry("both ruled boundaries collapse to points".into()));
        }
        self.plane = None;
        self.class = if degenerate[0] {
            RuledClass::PoleAtVMin
        } else if degenerate[1] {
            RuledClass::PoleAtVMax
        } else {
            let samples = self.samples();
            if let Some(plane) = fit_plane(&samples, tol) {
                self.plane = Some(plane);
                RuledClass::Planar
            } else {
                classify_rulings(&samples, tol)
            }
        };
        self.formula = match self.class {
            RuledClass::PoleAtVMin => Formula::ApexAtVMin(self.curves[0].point_at(self.curves[0].domain().0)),
            RuledClass::PoleAtVMax => Formula::ApexAtVMax(self.curves[1].point_at(self.curves[1].domain().0)),
            RuledClass::Extrusion => {
                let (a, b) = self.boundaries(self.curves[0].domain().0);
                Formula::Extrusion(b[0] - a[0])
            }
            _ => Formula::General,
        };
        tracing::debug!(class = ?self.class, "ruled surface classified");
        Ok(())
    }
}

/// Plane through every sampled boundary point, if there is one.
fn fit_plane(samples: &[(VecDerivs, VecDerivs)], tol: f64) -> Option<Plane> {
    let points: Vec<Point3> = samples.iter().flat_map(|(a, b)| [a[0], b[0]]).collect();
    let p0 = points[0];
    let p1 = *points
        .iter()
        .max_by(|a, b| (**a - p0).length_squared().total_cmp(&(**b - p0).length_squared()))?;
    let axis = p1 - p0;
    let normal = points
        .iter()
        .map(|p| axis.cross(*p - p0))
        .max_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))?
        .try_normalize()?;
    let plane = Plane::new(p0, normal);
    points
        .iter()
        .all(|p| plane.signed_distance(*p).abs() <= tol)
        .then_some(plane)
}

fn classify_rulings(samples: &[(VecDerivs, VecDerivs)], tol: f64) -> RuledClass {
    let rulings: Vec<Vector3> = samples.iter().map(|(a, b)| b[0] - a[0]).collect();
    let first = rulings[0];
    if rulings.iter().all(|d| (*d - first).length() <= tol) {
        return RuledClass::Extrusion;
    }
    if let Some(dir) = first.try_normalize() {
        if rulings.iter().all(|d| d.cross(dir).length() <= tol) {
            return RuledClass::OffsetOfExtrusion;
        }
    }
    let straight = |c: &VecDerivs| c[2].length() <= tol * c[1].length().max(1.0);
    if samples.iter().all(|(a, b)| straight(a) && straight(b)) {
        return RuledClass::StraightGenerators;
    }
    if let Some(lambda) = tangent_ratio(samples, tol) {
        if (lambda - 1.0).abs() > tol {
            return RuledClass::Conical;
        }
    }
    RuledClass::Arbitrary
}

/// Constant `lambda` with `C2' = lambda C1'` at every sample, if it exists.
fn tangent_ratio(samples: &[(VecDerivs, VecDerivs)], tol: f64) -> Option<f64> {
    let mut lambda = None;
    for (a, b) in samples {
        let t1 = a[1];
        let len2 = t1.length_squared();
        if len2 <= tol * tol {
            return None;
        }
        let l = b[1].dot(t1) / len2;
        if (b[1] - t1 * l).length() > tol * t1.length().max(1.0) {
            return None;
        }
        match lambda {
            None => lambda = Some(l),
            Some(prev) if (prev - l).abs() > tol * prev.abs().max(1.0) => return None,
            _ => {}
        }
    }
    lambda
}

impl SurfaceEval for RuledSurface {
    fn eval(&self, u: f64, v: f64, order: usize, _scratch: &mut Scratch) -> DerivBundle {
        match self.formula {
            Formula::Extrusion(ruling) => {
                let c1 = self.curves[0].derivs(u);
                DerivBundle::from_partials(order, |i, j| match (i, j) {
                    (0, 0) => c1[0] + ruling * v,
                    (_, 0) => c1[i],
                    (0, 1) => ruling,
                    _ => DVec3::ZERO,
                })
            }
            Formula::ApexAtVMin(apex) => {
                let c2 = self.second(u);
                DerivBundle::from_partials(order, |i, j| match (i, j) {
                    (0, 0) => apex * (1.0 - v) + c2[0] * v,
                    (_, 0) => c2[i] * v,
                    (0, 1) => c2[0] - apex,
                    (_, 1) => c2[i],
                    _ => DVec3::ZERO,
                })
            }
            Formula::ApexAtVMax(apex) => {
                let c1 = self.curves[0].derivs(u);
                DerivBundle::from_partials(order, |i, j| match (i, j) {
                    (0, 0) => c1[0] * (1.0 - v) + apex * v,
                    (_, 0) => c1[i] * (1.0 - v),
                    (0, 1) => apex - c1[0],
                    (_, 1) => -c1[i],
                    _ => DVec3::ZERO,
                })
            }
            Formula::General => {
                let (c1, c2) = self.boundaries(u);
                DerivBundle::from_partials(order, |i, j| match j {
                    0 => c1[i] * (1.0 - v) + c2[i] * v,
                    1 => c2[i] - c1[i],
                    _ => DVec3::ZERO,
                })
            }
        }
    }

    fn natural_domain(&self) -> Result<ParamDomain> {
        let closed = self.curves.iter().all(|c| c.is_closed());
        Ok(ParamDomain::new(self.curves[0].domain(), (0.0, 1.0))?.closed(closed, false))
    }

    fn poles(&self, _domain: &ParamDomain, _tol: f64) -> Poles {
        match self.class {
            RuledClass::PoleAtVMin => Poles::none().with(Edge::VMin),
            RuledClass::PoleAtVMax => Poles::none().with(Edge::VMax),
            _ => Poles::none(),
        }
    }

    fn normal_hint(&self, u: f64, _v: f64) -> Option<Vector3> {
        match self.formula {
            Formula::ApexAtVMin(apex) => {
                let c2 = self.second(u);
                c2[1].cross(c2[0] - apex).try_normalize()
            }
            Formula::ApexAtVMax(apex) => {
                let c1 = self.curves[0].derivs(u);
                c1[1].cross(apex - c1[0]).try_normalize()
            }
            _ => None,
        }
    }
}
