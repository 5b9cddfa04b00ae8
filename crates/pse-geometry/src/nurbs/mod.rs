//! NURBS core algorithms: knot vector utilities, evaluation and interpolation.

pub mod deboor;
pub mod fit;
pub mod knot;

pub use deboor::*;
pub use knot::{basis_functions, ders_basis_functions, find_span};
