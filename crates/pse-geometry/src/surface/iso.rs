//! Isoparametric curves of a surface.

use std::sync::Arc;

use pse_math::VecDerivs;

use super::{DerivBundle, Surface};
use crate::curve::Curve;

/// Which parameter is held fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IsoDirection {
    /// `u` fixed; the curve parameter is `v`.
    U(f64),
    /// `v` fixed; the curve parameter is `u`.
    V(f64),
}

/// The curve traced on a surface with one parameter held fixed.
#[derive(Debug, Clone)]
pub struct IsoCurve {
    surface: Arc<Surface>,
    direction: IsoDirection,
}

impl IsoCurve {
    pub fn new(surface: Arc<Surface>, direction: IsoDirection) -> Self {
        Self { surface, direction }
    }

    pub fn surface(&self) -> &Arc<Surface> {
        &self.surface
    }

    pub fn direction(&self) -> IsoDirection {
        self.direction
    }

    fn bundle(&self, t: f64) -> DerivBundle {
        match self.direction {
            IsoDirection::U(u) => self.surface.derivs_raw(u, t),
            IsoDirection::V(v) => self.surface.derivs_raw(t, v).transposed(),
        }
    }
}

impl Curve for IsoCurve {
    fn derivs(&self, t: f64) -> VecDerivs {
        let b = self.bundle(t);
        [b.point, b.dv, b.dvv, b.dvvv]
    }

    fn domain(&self) -> (f64, f64) {
        let domain = self.surface.domain();
        match self.direction {
            IsoDirection::U(_) => domain.v,
            IsoDirection::V(_) => domain.u,
        }
    }

    fn is_closed(&self) -> bool {
        match self.direction {
            IsoDirection::U(_) => self.surface.is_closed_v(),
            IsoDirection::V(_) => self.surface.is_closed_u(),
        }
    }

    fn clone_curve(&self) -> Arc<dyn Curve> {
        Arc::new(self.clone())
    }
}
