//! Parametric surfaces.
//!
//! Every family is a record implementing [`SurfaceEval`], the low-level capability
//! "partials up to order n at (u, v)". The closed [`SurfaceKind`] enum tags the
//! family; [`Surface`] wraps it with an id, the corrected parameter domain and the
//! auxiliary cache, and exposes the public evaluation contract.

mod blend;
mod bspline;
mod bundle;
mod cache;
mod conical;
mod convert;
mod cylindrical;
mod domain;
mod duplicate;
mod edit;
mod entity;
mod evolution;
mod iso;
mod planar;
mod revolution;
mod ruled;
mod spherical;
mod spiral;
mod swept;
mod toroidal;

use std::fmt;

use pse_math::{Axis, Plane, Vector3};
use pse_core::Result;

pub use blend::{BlendRail, BlendShape, BlendSurface, RailIso};
pub use bspline::{BSplineSurface, NurbsSurface};
pub use bundle::{DerivBundle, NormalBundle};
pub use cache::{AuxCache, CacheStats, Scratch, ScratchGuard, ScratchKey};
pub use conical::ConicalSurface;
pub use cylindrical::CylindricalSurface;
pub use domain::{Edge, ParamDomain, Poles};
pub use duplicate::DuplicationMap;
pub use edit::RuledSide;
pub use entity::Surface;
pub use evolution::EvolutionSurface;
pub use iso::{IsoCurve, IsoDirection};
pub use planar::PlanarSurface;
pub use revolution::RevolutionSurface;
pub use ruled::{RuledClass, RuledSurface};
pub use spherical::SphericalSurface;
pub use spiral::SpiralSurface;
pub use swept::{Reparam, SpineFrame, SweptSurface};
pub use toroidal::ToroidalSurface;

/// Family-specific evaluation capability.
///
/// `eval` receives parameters that were already corrected (or deliberately not)
/// by the caller; implementations never clamp or wrap. Scratch blocks belong to
/// the owning surface's cache and may hold values keyed by one parameter.
pub trait SurfaceEval: Send + Sync + fmt::Debug {
    /// Position and partials of total order up to `order` (at most 3).
    fn eval(&self, u: f64, v: f64, order: usize, scratch: &mut Scratch) -> DerivBundle;

    /// Natural parameter rectangle and closedness, without pole flags.
    fn natural_domain(&self) -> Result<ParamDomain>;

    /// Edges of `domain` along which the surface collapses to a point.
    fn poles(&self, domain: &ParamDomain, tol: f64) -> Poles {
        sample_poles(self, domain, tol)
    }

    /// Limit normal at a point where `Su x Sv` vanishes, when known in closed form.
    fn normal_hint(&self, _u: f64, _v: f64) -> Option<Vector3> {
        None
    }
}

/// Tagged surface family.
#[derive(Debug, Clone)]
pub enum SurfaceKind {
    Plane(PlanarSurface),
    Cylinder(CylindricalSurface),
    Cone(ConicalSurface),
    Sphere(SphericalSurface),
    Torus(ToroidalSurface),
    Swept(SweptSurface),
    Ruled(RuledSurface),
    Revolution(RevolutionSurface),
    Evolution(EvolutionSurface),
    Spiral(SpiralSurface),
    Blend(BlendSurface),
    BSpline(BSplineSurface),
    Nurbs(NurbsSurface),
}

impl SurfaceKind {
    pub fn as_eval(&self) -> &dyn SurfaceEval {
        match self {
            SurfaceKind::Plane(s) => s,
            SurfaceKind::Cylinder(s) => s,
            SurfaceKind::Cone(s) => s,
            SurfaceKind::Sphere(s) => s,
            SurfaceKind::Torus(s) => s,
            SurfaceKind::Swept(s) => s,
            SurfaceKind::Ruled(s) => s,
            SurfaceKind::Revolution(s) => s,
            SurfaceKind::Evolution(s) => s,
            SurfaceKind::Spiral(s) => s,
            SurfaceKind::Blend(s) => s,
            SurfaceKind::BSpline(s) => s,
            SurfaceKind::Nurbs(s) => s,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SurfaceKind::Plane(_) => "plane",
            SurfaceKind::Cylinder(_) => "cylinder",
            SurfaceKind::Cone(_) => "cone",
            SurfaceKind::Sphere(_) => "sphere",
            SurfaceKind::Torus(_) => "torus",
            SurfaceKind::Swept(_) => "swept",
            SurfaceKind::Ruled(_) => "ruled",
            SurfaceKind::Revolution(_) => "revolution",
            SurfaceKind::Evolution(_) => "evolution",
            SurfaceKind::Spiral(_) => "spiral",
            SurfaceKind::Blend(_) => "blend",
            SurfaceKind::BSpline(_) => "bspline",
            SurfaceKind::Nurbs(_) => "nurbs",
        }
    }

    /// Axis of rotational symmetry or of the generating rotation.
    pub fn rotation_axis(&self) -> Option<Axis> {
        match self {
            SurfaceKind::Cylinder(s) => Some(s.axis()),
            SurfaceKind::Cone(s) => Some(s.axis()),
            SurfaceKind::Sphere(s) => Some(s.axis()),
            SurfaceKind::Torus(s) => Some(s.axis()),
            SurfaceKind::Revolution(s) => Some(s.axis),
            SurfaceKind::Spiral(s) => Some(s.axis()),
            _ => None,
        }
    }

    /// The supporting plane of planar variants.
    pub fn as_plane(&self) -> Option<Plane> {
        match self {
            SurfaceKind::Plane(s) => Some(s.plane()),
            SurfaceKind::Ruled(s) if s.class() == RuledClass::Planar => s.plane(),
            _ => None,
        }
    }
}

macro_rules! impl_from_family {
    ($($family:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$family> for SurfaceKind {
                fn from(surface: $family) -> Self {
                    SurfaceKind::$variant(surface)
                }
            }
        )*
    };
}

impl_from_family! {
    PlanarSurface => Plane,
    CylindricalSurface => Cylinder,
    ConicalSurface => Cone,
    SphericalSurface => Sphere,
    ToroidalSurface => Torus,
    SweptSurface => Swept,
    RuledSurface => Ruled,
    RevolutionSurface => Revolution,
    EvolutionSurface => Evolution,
    SpiralSurface => Spiral,
    BlendSurface => Blend,
    BSplineSurface => BSpline,
    NurbsSurface => Nurbs,
}

/// Samples per boundary isoline in pole detection.
const POLE_SAMPLES: usize = 9;

/// Flag every edge whose boundary isoline stays within `tol` of a single point.
pub fn sample_poles<S: SurfaceEval + ?Sized>(surface: &S, domain: &ParamDomain, tol: f64) -> Poles {
    let mut scratch = Scratch::default();
    let mut poles = Poles::none();
    for edge in Edge::ALL {
        let point = |s: f64, scratch: &mut Scratch| {
            let (u, v) = match edge {
                Edge::UMin => (domain.u.0, domain.v.0 + s * domain.height()),
                Edge::UMax => (domain.u.1, domain.v.0 + s * domain.height()),
                Edge::VMin => (domain.u.0 + s * domain.width(), domain.v.0),
                Edge::VMax => (domain.u.0 + s * domain.width(), domain.v.1),
            };
            surface.eval(u, v, 0, scratch).point
        };
        let first = point(0.0, &mut scratch);
        let collapsed = (1..POLE_SAMPLES).all(|i| {
            let s = i as f64 / (POLE_SAMPLES - 1) as f64;
            (point(s, &mut scratch) - first).length() <= tol
        });
        poles.set(edge, collapsed);
    }
    poles
}
