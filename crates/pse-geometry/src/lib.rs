//! PSE geometry: curves, NURBS numerics and the parametric surface evaluator.

pub mod curve;
pub mod nurbs;
pub mod step;
pub mod surface;

pub use curve::{Curve, CurveRef, Ownership};
pub use step::{CurvatureStepEstimator, StepEstimator};
pub use surface::{Surface, SurfaceKind};
