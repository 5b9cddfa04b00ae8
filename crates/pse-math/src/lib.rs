pub mod axis;
pub mod derivs;
pub mod frame;
pub mod plane;
pub mod rotation;

pub use glam::{dvec2, dvec3, DMat3, DVec2, DVec3};
pub use axis::Axis;
pub use frame::Frame;
pub use plane::Plane;

pub type Point2 = DVec2;
pub type Point3 = DVec3;
pub type Vector2 = DVec2;
pub type Vector3 = DVec3;

/// Point and derivatives of orders 1..=3 of a vector-valued function of one variable.
pub type VecDerivs = [DVec3; 4];

/// Matrix and derivatives of orders 1..=3 of a matrix-valued function of one variable.
pub type MatDerivs = [DMat3; 4];
