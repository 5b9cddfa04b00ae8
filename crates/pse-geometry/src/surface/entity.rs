//! The surface entity: variant record, corrected domain and auxiliary cache.

use std::sync::Arc;

use pse_core::{EngineConfig, EntityId, Result, Tolerance};
use pse_math::{Axis, Plane, Point3, Vector3};

use super::{
    AuxCache, DerivBundle, Edge, IsoCurve, IsoDirection, NormalBundle, ParamDomain, SurfaceKind,
};

/// A parametric surface with the uniform evaluation contract.
///
/// Every capability comes in three entry points: the plain one corrects the
/// parameters into the domain first (closed axes wrap, open axes clamp), the
/// `_ext` one lets them run past open edges except across a pole, and the `_raw`
/// one evaluates exactly where asked. Blend surfaces never correct `u`.
#[derive(Debug)]
pub struct Surface {
    id: EntityId,
    pub(super) kind: SurfaceKind,
    pub(super) domain: ParamDomain,
    pub(super) tolerance: Tolerance,
    pub(super) cache: AuxCache,
}

macro_rules! capability {
    ($(#[$doc:meta])* $name:ident, $ext:ident, $raw:ident, $order:expr, $field:ident) => {
        $(#[$doc])*
        pub fn $name(&self, u: f64, v: f64) -> Vector3 {
            let (u, v) = self.correct(u, v, false);
            self.$raw(u, v)
        }

        pub fn $ext(&self, u: f64, v: f64) -> Vector3 {
            let (u, v) = self.correct(u, v, true);
            self.$raw(u, v)
        }

        pub fn $raw(&self, u: f64, v: f64) -> Vector3 {
            self.eval_raw(u, v, $order).$field
        }
    };
}

impl Surface {
    /// Surface over the family's natural domain.
    pub fn new(kind: impl Into<SurfaceKind>) -> Result<Self> {
        Self::with_tolerance(kind, Tolerance::default())
    }

    pub fn with_tolerance(kind: impl Into<SurfaceKind>, tolerance: Tolerance) -> Result<Self> {
        let kind = kind.into();
        let natural = kind.as_eval().natural_domain()?;
        Self::assemble(kind, natural, tolerance, AuxCache::default())
    }

    /// Surface restricted to the sub-rectangle `u` x `v` of the natural domain.
    pub fn with_domain(kind: impl Into<SurfaceKind>, u: (f64, f64), v: (f64, f64)) -> Result<Self> {
        let kind = kind.into();
        let natural = kind.as_eval().natural_domain()?;
        Self::assemble(kind, natural.restrict(u, v)?, Tolerance::default(), AuxCache::default())
    }

    /// Surface over the natural domain, with tolerance and cache bound from `config`.
    pub fn from_config(kind: impl Into<SurfaceKind>, config: &EngineConfig) -> Result<Self> {
        let kind = kind.into();
        let natural = kind.as_eval().natural_domain()?;
        Self::assemble(kind, natural, config.tolerance, AuxCache::new(config.cache.max_idle_blocks))
    }

    fn assemble(kind: SurfaceKind, domain: ParamDomain, tolerance: Tolerance, cache: AuxCache) -> Result<Self> {
        let poles = kind.as_eval().poles(&domain, tolerance.linear);
        let surface = Self {
            id: EntityId::new(),
            domain: domain.with_poles(poles),
            kind,
            tolerance,
            cache,
        };
        tracing::debug!(
            id = %surface.id,
            kind = surface.kind.name(),
            u = ?surface.domain.u,
            v = ?surface.domain.v,
            poles = ?surface.domain.poles,
            "surface created"
        );
        Ok(surface)
    }

    /// Copy with a fresh id and an empty cache, sharing every curve reference.
    pub(super) fn rebuilt(&self, kind: SurfaceKind) -> Self {
        Self {
            id: EntityId::new(),
            kind,
            domain: self.domain,
            tolerance: self.tolerance,
            cache: self.cache.clone(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> &SurfaceKind {
        &self.kind
    }

    pub fn domain(&self) -> &ParamDomain {
        &self.domain
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    pub fn cache(&self) -> &AuxCache {
        &self.cache
    }

    pub fn is_closed_u(&self) -> bool {
        self.domain.closed_u
    }

    pub fn is_closed_v(&self) -> bool {
        self.domain.closed_v
    }

    pub fn has_pole(&self, edge: Edge) -> bool {
        self.domain.poles.get(edge)
    }

    pub fn rotation_axis(&self) -> Option<Axis> {
        self.kind.rotation_axis()
    }

    pub fn as_plane(&self) -> Option<Plane> {
        self.kind.as_plane()
    }

    /// Apply the domain guard; blends keep `u` as given.
    pub fn correct(&self, u: f64, v: f64, extend: bool) -> (f64, f64) {
        let (cu, cv) = self.domain.correct(u, v, extend);
        match self.kind {
            SurfaceKind::Blend(_) => (u, cv),
            _ => (cu, cv),
        }
    }

    fn eval_raw(&self, u: f64, v: f64, order: usize) -> DerivBundle {
        let mut guard = self.cache.acquire();
        self.kind.as_eval().eval(u, v, order, guard.block())
    }

    pub fn point_at(&self, u: f64, v: f64) -> Point3 {
        let (u, v) = self.correct(u, v, false);
        self.point_at_raw(u, v)
    }

    pub fn point_at_ext(&self, u: f64, v: f64) -> Point3 {
        let (u, v) = self.correct(u, v, true);
        self.point_at_raw(u, v)
    }

    pub fn point_at_raw(&self, u: f64, v: f64) -> Point3 {
        self.eval_raw(u, v, 0).point
    }

    capability!(derive_u, derive_u_ext, derive_u_raw, 1, du);
    capability!(derive_v, derive_v_ext, derive_v_raw, 1, dv);
    capability!(derive_uu, derive_uu_ext, derive_uu_raw, 2, duu);
    capability!(derive_uv, derive_uv_ext, derive_uv_raw, 2, duv);
    capability!(derive_vv, derive_vv_ext, derive_vv_raw, 2, dvv);
    capability!(derive_uuu, derive_uuu_ext, derive_uuu_raw, 3, duuu);
    capability!(derive_uuv, derive_uuv_ext, derive_uuv_raw, 3, duuv);
    capability!(derive_uvv, derive_uvv_ext, derive_uvv_raw, 3, duvv);
    capability!(derive_vvv, derive_vvv_ext, derive_vvv_raw, 3, dvvv);

    /// Position and all partials up to third order.
    pub fn derivs(&self, u: f64, v: f64) -> DerivBundle {
        let (u, v) = self.correct(u, v, false);
        self.derivs_raw(u, v)
    }

    pub fn derivs_ext(&self, u: f64, v: f64) -> DerivBundle {
        let (u, v) = self.correct(u, v, true);
        self.derivs_raw(u, v)
    }

    pub fn derivs_raw(&self, u: f64, v: f64) -> DerivBundle {
        self.eval_raw(u, v, 3)
    }

    pub fn normal(&self, u: f64, v: f64) -> Vector3 {
        self.normal_bundle(u, v).normal
    }

    pub fn normal_ext(&self, u: f64, v: f64) -> Vector3 {
        self.normal_bundle_ext(u, v).normal
    }

    pub fn normal_raw(&self, u: f64, v: f64) -> Vector3 {
        self.normal_bundle_raw(u, v).normal
    }

    pub fn normal_u(&self, u: f64, v: f64) -> Vector3 {
        self.normal_bundle(u, v).normal_u
    }

    pub fn normal_u_ext(&self, u: f64, v: f64) -> Vector3 {
        self.normal_bundle_ext(u, v).normal_u
    }

    pub fn normal_u_raw(&self, u: f64, v: f64) -> Vector3 {
        self.normal_bundle_raw(u, v).normal_u
    }

    pub fn normal_v(&self, u: f64, v: f64) -> Vector3 {
        self.normal_bundle(u, v).normal_v
    }

    pub fn normal_v_ext(&self, u: f64, v: f64) -> Vector3 {
        self.normal_bundle_ext(u, v).normal_v
    }

    pub fn normal_v_raw(&self, u: f64, v: f64) -> Vector3 {
        self.normal_bundle_raw(u, v).normal_v
    }

    pub fn normal_bundle(&self, u: f64, v: f64) -> NormalBundle {
        let (u, v) = self.correct(u, v, false);
        self.normal_bundle_raw(u, v)
    }

    pub fn normal_bundle_ext(&self, u: f64, v: f64) -> NormalBundle {
        let (u, v) = self.correct(u, v, true);
        self.normal_bundle_raw(u, v)
    }

    /// Unit normal `Su x Sv` and its partials.
    ///
    /// Where `Su x Sv` vanishes the family's closed-form limit is used when it has
    /// one; otherwise the parameter is nudged towards the domain interior until the
    /// cross product no longer vanishes.
    pub fn normal_bundle_raw(&self, u: f64, v: f64) -> NormalBundle {
        let bundle = self.eval_raw(u, v, 2);
        if let Some(nb) = bundle.normal_bundle(DEGENERATE_NORMAL) {
            return nb;
        }
        let nudged = self.nudged_normal(u, v);
        match self.kind.as_eval().normal_hint(u, v) {
            Some(normal) => NormalBundle {
                normal,
                ..nudged.unwrap_or(NormalBundle {
                    normal,
                    normal_u: Vector3::ZERO,
                    normal_v: Vector3::ZERO,
                })
            },
            None => nudged.unwrap_or(NormalBundle {
                normal: Vector3::ZERO,
                normal_u: Vector3::ZERO,
                normal_v: Vector3::ZERO,
            }),
        }
    }

    fn nudged_normal(&self, u: f64, v: f64) -> Option<NormalBundle> {
        let (cu, cv) = self.domain.center();
        let scale = self.domain.width().max(self.domain.height()).max(1.0);
        let mut step = self.tolerance.parametric.max(MIN_NUDGE) * scale;
        for _ in 0..NUDGE_ATTEMPTS {
            let nu = u + step * (cu - u).signum();
            let nv = v + step * (cv - v).signum();
            if let Some(nb) = self.eval_raw(nu, nv, 2).normal_bundle(DEGENERATE_NORMAL) {
                return Some(nb);
            }
            step *= 10.0;
        }
        None
    }

    /// Isoparametric curve `u = value`, running along `v`.
    pub fn iso_u(self: Arc<Self>, u: f64) -> IsoCurve {
        IsoCurve::new(self, IsoDirection::U(u))
    }

    /// Isoparametric curve `v = value`, running along `u`.
    pub fn iso_v(self: Arc<Self>, v: f64) -> IsoCurve {
        IsoCurve::new(self, IsoDirection::V(v))
    }
}

/// `|Su x Sv|` at or below this is treated as a singular point.
const DEGENERATE_NORMAL: f64 = 1e-13;
const MIN_NUDGE: f64 = 1e-8;
const NUDGE_ATTEMPTS: usize = 6;
