//! Relative position of two surfaces through their rotation axes and planes.
//!
//! A surface with a rotation axis is reduced to that axis, a planar surface to
//! its plane. Two axes classify as coincident, parallel, intersecting or
//! distant; an axis against a plane as lying on it, parallel to it, crossing the
//! surface inside its domain or missing it; two planes as coincident, parallel
//! or intersecting.

use pse_core::Tolerance;
use pse_geometry::{Surface, SurfaceKind};
use pse_math::{Axis, Plane, Point3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Gauss-Newton steps locating a point on a planar surface.
const LOCATE_STEPS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Forward,
    Reversed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    AxesCoincident,
    AxesParallel,
    AxesIntersecting,
    AxesDistant,
    AxisOnSurface,
    AxisParallelToSurface,
    /// The axis pierces the surface inside its parameter domain.
    AxisCrossesSurface,
    /// The axis pierces the supporting plane outside the surface domain.
    AxisDistantFromSurface,
    PlanesCoincident,
    PlanesParallel,
    PlanesIntersecting,
}

/// Classification with representative points on each side.
///
/// `angle` is measured between the oriented directions that were compared: both
/// axes, the axis and the plane normal, or both plane normals. For coincident
/// axes `distance` is the difference of the representative radii.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRelation {
    pub kind: RelationKind,
    pub points: (Point3, Point3),
    pub angle: f64,
    pub distance: f64,
}

/// Stage at which a classification failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("axis-axis classification failed: {0}")]
    AxisAxis(String),

    #[error("axis-surface classification failed: {0}")]
    AxisSurface(String),

    #[error("surface-surface classification failed: {0}")]
    SurfaceSurface(String),
}

fn oriented_axis(surface: &Surface, orientation: Orientation) -> Option<Axis> {
    let axis = surface.rotation_axis()?;
    Some(match orientation {
        Orientation::Forward => axis,
        Orientation::Reversed => axis.reversed(),
    })
}

fn oriented_plane(surface: &Surface, orientation: Orientation) -> Option<Plane> {
    let plane = surface.as_plane()?;
    Some(match orientation {
        Orientation::Forward => plane,
        Orientation::Reversed => plane.flipped(),
    })
}

/// Distance of the surface from its own axis at a representative position.
fn representative_radius(surface: &Surface, axis: &Axis) -> Option<f64> {
    let radius = match surface.kind() {
        SurfaceKind::Cylinder(s) => s.radius,
        SurfaceKind::Sphere(s) => s.radius,
        SurfaceKind::Cone(_) => 0.0,
        SurfaceKind::Torus(s) => s.major_radius,
        SurfaceKind::Revolution(s) => axis.distance_to_point(s.generator.point_at(s.generator.domain().0)),
        SurfaceKind::Spiral(s) => axis.distance_to_point(s.generator.point_at(s.generator.domain().0)),
        _ => return None,
    };
    radius.is_finite().then_some(radius)
}

/// Classify two oriented surfaces through their axes or planes.
pub fn classify_axes(
    (a, orient_a): (&Surface, Orientation),
    (b, orient_b): (&Surface, Orientation),
) -> Result<AxisRelation, ClassifyError> {
    let tol = a.tolerance();
    let relation = match (oriented_axis(a, orient_a), oriented_axis(b, orient_b)) {
        (Some(axis_a), Some(axis_b)) => axis_axis((a, &axis_a), (b, &axis_b), tol)?,
        (Some(axis), None) => axis_surface(&axis, b, orient_b, tol)?,
        (None, Some(axis)) => {
            let relation = axis_surface(&axis, a, orient_a, tol)?;
            AxisRelation {
                points: (relation.points.1, relation.points.0),
                ..relation
            }
        }
        (None, None) => surface_surface(a, orient_a, b, orient_b, tol)?,
    };
    tracing::debug!(a = %a.id(), b = %b.id(), kind = ?relation.kind, distance = relation.distance, "classified");
    Ok(relation)
}

fn axis_axis(
    (a, axis_a): (&Surface, &Axis),
    (b, axis_b): (&Surface, &Axis),
    tol: Tolerance,
) -> Result<AxisRelation, ClassifyError> {
    if !(axis_a.origin.is_finite() && axis_a.direction.is_finite() && axis_b.origin.is_finite() && axis_b.direction.is_finite()) {
        return Err(ClassifyError::AxisAxis("axis is not finite".into()));
    }
    let angle = axis_a.angle_to(axis_b);
    match axis_a.approach(axis_b, tol.angular) {
        None => {
            let foot = axis_b.closest_point(axis_a.origin);
            let gap = (foot - axis_a.origin).length();
            if gap > tol.linear {
                return Ok(AxisRelation {
                    kind: RelationKind::AxesParallel,
                    points: (axis_a.origin, foot),
                    angle,
                    distance: gap,
                });
            }
            let radius = |surface: &Surface, axis: &Axis| {
                representative_radius(surface, axis).ok_or_else(|| {
                    ClassifyError::AxisAxis(format!("no representative radius for {}", surface.kind().name()))
                })
            };
            let (ra, rb) = (radius(a, axis_a)?, radius(b, axis_b)?);
            Ok(AxisRelation {
                kind: RelationKind::AxesCoincident,
                points: (axis_a.origin, foot),
                angle,
                distance: (ra - rb).abs(),
            })
        }
        Some(approach) => Ok(AxisRelation {
            kind: if approach.distance <= tol.linear {
                RelationKind::AxesIntersecting
            } else {
                RelationKind::AxesDistant
            },
            points: (approach.point_self, approach.point_other),
            angle,
            distance: approach.distance,
        }),
    }
}

fn axis_surface(
    axis: &Axis,
    surface: &Surface,
    orientation: Orientation,
    tol: Tolerance,
) -> Result<AxisRelation, ClassifyError> {
    let plane = oriented_plane(surface, orientation).ok_or_else(|| {
        ClassifyError::AxisSurface(format!("{} surface has neither axis nor plane", surface.kind().name()))
    })?;
    let angle = axis.direction.dot(plane.normal).clamp(-1.0, 1.0).acos();
    let Some(t) = plane.intersect_axis(axis, tol.angular) else {
        let offset = plane.signed_distance(axis.origin);
        let kind = if offset.abs() <= tol.linear {
            RelationKind::AxisOnSurface
        } else {
            RelationKind::AxisParallelToSurface
        };
        return Ok(AxisRelation {
            kind,
            points: (axis.origin, plane.project_point(axis.origin)),
            angle,
            distance: offset.abs(),
        });
    };
    let pierce = axis.at(t);
    let (u, v) = locate(surface, pierce);
    if !(u.is_finite() && v.is_finite()) {
        return Err(ClassifyError::AxisSurface("pierce point could not be located on the surface".into()));
    }
    let domain = surface.domain();
    let (cu, cv) = (u.clamp(domain.u.0, domain.u.1), v.clamp(domain.v.0, domain.v.1));
    let foot = surface.point_at_raw(cu, cv);
    let distance = (foot - pierce).length();
    let kind = if distance <= tol.linear {
        RelationKind::AxisCrossesSurface
    } else {
        RelationKind::AxisDistantFromSurface
    };
    Ok(AxisRelation {
        kind,
        points: (pierce, foot),
        angle,
        distance,
    })
}

/// Parameters of the point of a planar surface closest to `target`.
fn locate(surface: &Surface, target: Point3) -> (f64, f64) {
    let (mut u, mut v) = surface.domain().center();
    for _ in 0..LOCATE_STEPS {
        let b = surface.derivs_raw(u, v);
        let r = target - b.point;
        let (e, f, g) = (b.du.dot(b.du), b.du.dot(b.dv), b.dv.dot(b.dv));
        let det = e * g - f * f;
        if det.abs() <= f64::MIN_POSITIVE {
            return (f64::NAN, f64::NAN);
        }
        let (ru, rv) = (r.dot(b.du), r.dot(b.dv));
        let (du, dv) = ((g * ru - f * rv) / det, (e * rv - f * ru) / det);
        u += du;
        v += dv;
        if du.abs().max(dv.abs()) <= 1e-14 * (1.0 + u.abs().max(v.abs())) {
            break;
        }
    }
    (u, v)
}

fn surface_surface(
    a: &Surface,
    orient_a: Orientation,
    b: &Surface,
    orient_b: Orientation,
    tol: Tolerance,
) -> Result<AxisRelation, ClassifyError> {
    let plane = |surface: &Surface, orientation| {
        oriented_plane(surface, orientation).ok_or_else(|| {
            ClassifyError::SurfaceSurface(format!("{} surface has neither axis nor plane", surface.kind().name()))
        })
    };
    let (pa, pb) = (plane(a, orient_a)?, plane(b, orient_b)?);
    let angle = pa.normal.dot(pb.normal).clamp(-1.0, 1.0).acos();
    if let Some(line) = pa.intersect_plane(&pb, tol.angular) {
        return Ok(AxisRelation {
            kind: RelationKind::PlanesIntersecting,
            points: (line.origin, line.origin),
            angle,
            distance: 0.0,
        });
    }
    let gap = pb.signed_distance(pa.origin).abs();
    Ok(AxisRelation {
        kind: if gap <= tol.linear {
            RelationKind::PlanesCoincident
        } else {
            RelationKind::PlanesParallel
        },
        points: (pa.origin, pb.project_point(pa.origin)),
        angle,
        distance: gap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pse_geometry::surface::{ConicalSurface, CylindricalSurface, PlanarSurface, SphericalSurface};
    use pse_math::DVec3;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn cylinder(origin: DVec3, dir: DVec3, r: f64) -> Surface {
        Surface::new(CylindricalSurface::new(origin, dir, r).unwrap()).unwrap()
    }

    #[test]
    fn test_parallel_and_intersecting_axes() {
        let a = cylinder(DVec3::ZERO, DVec3::Z, 1.0);
        let b = cylinder(DVec3::new(5.0, 0.0, 0.0), DVec3::Z, 1.0);
        let rel = classify_axes((&a, Orientation::Forward), (&b, Orientation::Forward)).unwrap();
        assert_eq!(rel.kind, RelationKind::AxesParallel);
        assert_abs_diff_eq!(rel.distance, 5.0, epsilon = 1e-12);

        let c = cylinder(DVec3::new(0.0, 0.0, 2.0), DVec3::X, 0.5);
        let rel = classify_axes((&a, Orientation::Forward), (&c, Orientation::Forward)).unwrap();
        assert_eq!(rel.kind, RelationKind::AxesIntersecting);
        assert_abs_diff_eq!(rel.angle, FRAC_PI_2, epsilon = 1e-12);
        assert!((rel.points.0 - DVec3::new(0.0, 0.0, 2.0)).length() < 1e-12);

        let d = cylinder(DVec3::new(0.0, 3.0, 2.0), DVec3::X, 0.5);
        let rel = classify_axes((&a, Orientation::Forward), (&d, Orientation::Forward)).unwrap();
        assert_eq!(rel.kind, RelationKind::AxesDistant);
        assert_abs_diff_eq!(rel.distance, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reversed_orientation_flips_angle() {
        let a = cylinder(DVec3::ZERO, DVec3::Z, 1.0);
        let cone = Surface::new(ConicalSurface::new(DVec3::new(0.0, 0.0, 4.0), DVec3::Z, 0.3).unwrap()).unwrap();
        let rel = classify_axes((&a, Orientation::Forward), (&cone, Orientation::Reversed)).unwrap();
        assert_eq!(rel.kind, RelationKind::AxesCoincident);
        assert_abs_diff_eq!(rel.angle, PI, epsilon = 1e-12);
        assert_abs_diff_eq!(rel.distance, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_axis_against_bounded_plane() {
        let a = cylinder(DVec3::ZERO, DVec3::Z, 1.0);
        let patch = Surface::with_domain(PlanarSurface::xy(), (-1.0, 1.0), (-1.0, 1.0)).unwrap();
        let rel = classify_axes((&a, Orientation::Forward), (&patch, Orientation::Forward)).unwrap();
        assert_eq!(rel.kind, RelationKind::AxisCrossesSurface);
        assert_abs_diff_eq!(rel.angle, 0.0, epsilon = 1e-12);

        let off = Surface::with_domain(PlanarSurface::xy(), (2.0, 3.0), (-1.0, 1.0)).unwrap();
        let rel = classify_axes((&off, Orientation::Forward), (&a, Orientation::Forward)).unwrap();
        assert_eq!(rel.kind, RelationKind::AxisDistantFromSurface);
        assert_abs_diff_eq!(rel.distance, 2.0, epsilon = 1e-12);
        // Points follow the argument order: surface side first.
        assert!((rel.points.0 - DVec3::new(2.0, 0.0, 0.0)).length() < 1e-12);

        let wall = Surface::new(PlanarSurface::new(DVec3::new(0.0, 2.0, 0.0), DVec3::X, DVec3::Z).unwrap()).unwrap();
        let rel = classify_axes((&a, Orientation::Forward), (&wall, Orientation::Forward)).unwrap();
        assert_eq!(rel.kind, RelationKind::AxisParallelToSurface);
        assert_abs_diff_eq!(rel.distance, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_two_planes() {
        let floor = Surface::new(PlanarSurface::xy()).unwrap();
        let lifted = Surface::new(PlanarSurface::new(DVec3::new(0.0, 0.0, 3.0), DVec3::Y, DVec3::X).unwrap()).unwrap();
        let rel = classify_axes((&floor, Orientation::Forward), (&lifted, Orientation::Forward)).unwrap();
        assert_eq!(rel.kind, RelationKind::PlanesParallel);
        assert_abs_diff_eq!(rel.distance, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rel.angle, PI, epsilon = 1e-12);

        let wall = Surface::new(PlanarSurface::new(DVec3::ZERO, DVec3::X, DVec3::Z).unwrap()).unwrap();
        let rel = classify_axes((&floor, Orientation::Forward), (&wall, Orientation::Forward)).unwrap();
        assert_eq!(rel.kind, RelationKind::PlanesIntersecting);
    }

    #[test]
    fn test_failures_name_their_stage() {
        let knots = vec![0.0, 0.0, 1.0, 1.0];
        let cps = vec![
            vec![DVec3::ZERO, DVec3::new(0.0, 1.0, 1.0)],
            vec![DVec3::new(1.0, 0.0, 1.0), DVec3::new(1.0, 1.0, 0.0)],
        ];
        let saddle = Surface::new(pse_geometry::surface::BSplineSurface::new(1, 1, knots.clone(), knots, cps).unwrap())
            .unwrap();
        let sphere = Surface::new(SphericalSurface::new(DVec3::ZERO, 1.0).unwrap()).unwrap();
        let floor = Surface::new(PlanarSurface::xy()).unwrap();

        let err = classify_axes((&sphere, Orientation::Forward), (&saddle, Orientation::Forward)).unwrap_err();
        assert!(matches!(err, ClassifyError::AxisSurface(_)));
        let err = classify_axes((&floor, Orientation::Forward), (&saddle, Orientation::Forward)).unwrap_err();
        assert!(matches!(err, ClassifyError::SurfaceSurface(_)));
    }
}
