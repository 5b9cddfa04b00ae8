//! PSE analysis: curvature fields and their extrema, curve curvature analysis,
//! axis/surface classification and min/max distance scans.

pub mod axis;
pub mod bounded;
pub mod curvature;
pub mod curve;
pub mod extremum;
pub mod scan;

pub use axis::{classify_axes, AxisRelation, ClassifyError, Orientation, RelationKind};
pub use bounded::{find_extrema_bounded, TrimRegion};
pub use curvature::{curvatures, CurvatureField, Curvatures};
pub use curve::{analyze_curve, CurvatureJump, CurveAnalysis, CurvePoint};
pub use extremum::{find_extrema, Extremum, ExtremumStrategy, FieldExtrema};
pub use scan::{scan_distances, DistanceSample, DistanceScan};
