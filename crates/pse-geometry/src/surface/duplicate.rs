//! Deep duplication of surfaces with shared-curve bookkeeping.

use std::collections::HashMap;
use std::sync::Arc;

use super::{BlendRail, Surface, SurfaceKind};
use crate::curve::{Curve, CurveRef, Ownership};

/// Original-to-copy registry for one duplication pass.
///
/// Owned curves are always deep-copied. Shared curves and shared base surfaces
/// are copied the first time they are met and the copy is reused afterwards, so
/// sharing among the originals is mirrored among the copies. The map keeps the
/// originals alive, which keeps their addresses stable for the whole pass.
#[derive(Debug, Default)]
pub struct DuplicationMap {
    curves: HashMap<usize, (Arc<dyn Curve>, Arc<dyn Curve>)>,
    surfaces: HashMap<usize, (Arc<Surface>, Arc<Surface>)>,
}

impl DuplicationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy registered for a shared curve, if it was duplicated in this pass.
    pub fn curve_copy(&self, original: &Arc<dyn Curve>) -> Option<Arc<dyn Curve>> {
        self.curves
            .get(&curve_address(original))
            .map(|(_, copy)| copy.clone())
    }

    /// Copy registered for a shared base surface, if it was duplicated in this pass.
    pub fn surface_copy(&self, original: &Arc<Surface>) -> Option<Arc<Surface>> {
        self.surfaces
            .get(&(Arc::as_ptr(original) as usize))
            .map(|(_, copy)| copy.clone())
    }

    pub fn shared_curves(&self) -> usize {
        self.curves.len()
    }

    fn curve(&mut self, curve: &CurveRef) -> CurveRef {
        match curve.ownership() {
            Ownership::Owned => CurveRef::from_arc(curve.clone_curve(), Ownership::Owned),
            Ownership::Shared => {
                let (_, copy) = self
                    .curves
                    .entry(curve.address())
                    .or_insert_with(|| (curve.arc().clone(), curve.clone_curve()));
                CurveRef::shared(copy.clone())
            }
        }
    }

    fn surface(&mut self, surface: &Arc<Surface>) -> Arc<Surface> {
        let key = Arc::as_ptr(surface) as usize;
        if let Some((_, copy)) = self.surfaces.get(&key) {
            return copy.clone();
        }
        let copy = Arc::new(surface.duplicate(self));
        self.surfaces.insert(key, (surface.clone(), copy.clone()));
        copy
    }

    fn rail(&mut self, rail: &BlendRail) -> BlendRail {
        BlendRail {
            surface: self.surface(&rail.surface),
            ..rail.clone()
        }
    }
}

fn curve_address(curve: &Arc<dyn Curve>) -> usize {
    Arc::as_ptr(curve) as *const () as usize
}

impl Surface {
    /// Independent copy with a fresh id and an empty cache.
    pub fn duplicate(&self, map: &mut DuplicationMap) -> Surface {
        let mut kind = self.kind.clone();
        match &mut kind {
            SurfaceKind::Swept(s) => {
                s.generator = map.curve(&s.generator);
                s.frame.spine = map.curve(&s.frame.spine);
            }
            SurfaceKind::Evolution(s) => {
                s.generator = map.curve(&s.generator);
                s.frame.spine = map.curve(&s.frame.spine);
            }
            SurfaceKind::Revolution(s) => s.generator = map.curve(&s.generator),
            SurfaceKind::Spiral(s) => s.generator = map.curve(&s.generator),
            SurfaceKind::Ruled(s) => {
                let curves = [map.curve(&s.curves[0]), map.curve(&s.curves[1])];
                s.curves = curves;
            }
            SurfaceKind::Blend(s) => {
                let rails = [map.rail(&s.rails[0]), map.rail(&s.rails[1])];
                s.rails = rails;
            }
            SurfaceKind::Plane(_)
            | SurfaceKind::Cylinder(_)
            | SurfaceKind::Cone(_)
            | SurfaceKind::Sphere(_)
            | SurfaceKind::Torus(_)
            | SurfaceKind::BSpline(_)
            | SurfaceKind::Nurbs(_) => {}
        }
        self.rebuilt(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{Circle, Line};
    use crate::surface::{BlendSurface, PlanarSurface, RailIso, RevolutionSurface, RuledSurface};
    use pse_math::{Axis, DVec3};

    fn revolve(generator: CurveRef) -> Surface {
        let axis = Axis::new(DVec3::ZERO, DVec3::Z).unwrap();
        Surface::new(RevolutionSurface::new(generator, axis).unwrap()).unwrap()
    }

    fn generator(surface: &Surface) -> &CurveRef {
        match surface.kind() {
            SurfaceKind::Revolution(s) => &s.generator,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_owned_curve_is_deep_copied() {
        let original = revolve(CurveRef::owned(Circle::new(DVec3::new(3.0, 0.0, 0.0), DVec3::Y, 1.0)));
        let mut map = DuplicationMap::new();
        let copy = original.duplicate(&mut map);
        assert_ne!(copy.id(), original.id());
        assert_ne!(generator(&copy).address(), generator(&original).address());
        assert_eq!(generator(&copy).ownership(), Ownership::Owned);
        assert_eq!(map.shared_curves(), 0);
        assert!((copy.point_at(1.0, 2.0) - original.point_at(1.0, 2.0)).length() < 1e-15);
    }

    #[test]
    fn test_shared_curve_copied_once() {
        let profile: Arc<dyn Curve> = Arc::new(Line::new(DVec3::new(1.0, 0.0, 0.0), DVec3::new(2.0, 0.0, 1.0)));
        let a = revolve(CurveRef::shared(profile.clone()));
        let b = revolve(CurveRef::shared(profile.clone()));
        let mut map = DuplicationMap::new();
        let a2 = a.duplicate(&mut map);
        let b2 = b.duplicate(&mut map);
        assert_eq!(generator(&a2).address(), generator(&b2).address());
        assert_ne!(generator(&a2).address(), generator(&a).address());
        assert_eq!(map.shared_curves(), 1);
        let copy = map.curve_copy(&profile).unwrap();
        assert_eq!(curve_address(&copy), generator(&a2).address());
    }

    #[test]
    fn test_ruled_mixed_ownership() {
        let shared: Arc<dyn Curve> = Arc::new(Line::new(DVec3::ZERO, DVec3::X));
        let ruled = Surface::new(
            RuledSurface::new(
                CurveRef::shared(shared.clone()),
                CurveRef::owned(Line::new(DVec3::new(0.0, 1.0, 1.0), DVec3::new(1.0, 1.0, 1.0))),
            )
            .unwrap(),
        )
        .unwrap();
        let mut map = DuplicationMap::new();
        let copy = ruled.duplicate(&mut map);
        let SurfaceKind::Ruled(r) = copy.kind() else {
            unreachable!()
        };
        assert_eq!(r.curves[0].ownership(), Ownership::Shared);
        assert_eq!(r.curves[1].ownership(), Ownership::Owned);
        assert_eq!(r.class(), ruled_class(&ruled));
        assert!(map.curve_copy(&shared).is_some());
    }

    fn ruled_class(surface: &Surface) -> crate::surface::RuledClass {
        match surface.kind() {
            SurfaceKind::Ruled(r) => r.class(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_blend_base_surfaces_mapped_once() {
        let floor = Arc::new(Surface::new(PlanarSurface::xy()).unwrap());
        let blend = Surface::new(
            BlendSurface::chamfer(
                BlendRail::new(floor.clone(), RailIso::U(0.0), (0.0, 1.0), 1.0).unwrap(),
                BlendRail::new(floor.clone(), RailIso::U(1.0), (0.0, 1.0), 1.0).unwrap(),
            )
            .unwrap(),
        )
        .unwrap();
        let mut map = DuplicationMap::new();
        let copy = blend.duplicate(&mut map);
        let SurfaceKind::Blend(b) = copy.kind() else {
            unreachable!()
        };
        assert!(Arc::ptr_eq(&b.rails[0].surface, &b.rails[1].surface));
        assert!(!Arc::ptr_eq(&b.rails[0].surface, &floor));
        assert!(Arc::ptr_eq(&map.surface_copy(&floor).unwrap(), &b.rails[0].surface));
        assert!((copy.point_at(0.5, 0.5) - blend.point_at(0.5, 0.5)).length() < 1e-15);
    }
}
