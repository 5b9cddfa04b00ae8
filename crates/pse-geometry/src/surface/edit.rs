//! In-place edits of a surface's defining geometry.
//!
//! An edit is applied to a copy of the variant record; only when the record and
//! its re-derived domain are valid is it committed, after which the cache is
//! reset so no evaluation observes data from before the edit.

use pse_core::{PseError, Result};
use pse_math::{Axis, Frame};

use super::{PlanarSurface, Surface, SurfaceKind};
use crate::curve::CurveRef;

/// Boundary curve of a ruled surface: `v = 0` or `v = 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuledSide {
    First,
    Second,
}

impl Surface {
    /// Replace the profile curve of a swept, revolution, evolution or spiral surface.
    pub fn replace_generator(&mut self, generator: CurveRef) -> Result<()> {
        self.edit("replace_generator", |kind| match kind {
            SurfaceKind::Swept(s) => s.set_generator(generator),
            SurfaceKind::Revolution(s) => s.set_generator(generator),
            SurfaceKind::Evolution(s) => s.set_generator(generator),
            SurfaceKind::Spiral(s) => s.set_generator(generator),
            other => Err(not_applicable("replace_generator", other)),
        })
    }

    /// Replace the spine of a swept or evolution surface.
    pub fn replace_spine(&mut self, spine: CurveRef) -> Result<()> {
        self.edit("replace_spine", |kind| match kind {
            SurfaceKind::Swept(s) => s.set_spine(spine),
            SurfaceKind::Evolution(s) => s.set_spine(spine),
            other => Err(not_applicable("replace_spine", other)),
        })
    }

    /// Move a surface to `frame`.
    ///
    /// Planes, cylinders, cones, spheres and tori take the whole frame. Revolution
    /// and spiral surfaces take its origin and `z` as their axis. Swept and
    /// evolution surfaces keep their spine and take `x` as the reference vector of
    /// the moving frame. Ruled, blend and B-spline surfaces have no frame and fail
    /// with [`PseError::InvalidOperation`].
    pub fn replace_frame(&mut self, frame: Frame) -> Result<()> {
        self.edit("replace_frame", |kind| match kind {
            SurfaceKind::Plane(s) => {
                *s = PlanarSurface::from_frame(&frame);
                Ok(())
            }
            SurfaceKind::Cylinder(s) => {
                s.frame = frame;
                Ok(())
            }
            SurfaceKind::Cone(s) => {
                s.frame = frame;
                Ok(())
            }
            SurfaceKind::Sphere(s) => {
                s.frame = frame;
                Ok(())
            }
            SurfaceKind::Torus(s) => {
                s.frame = frame;
                Ok(())
            }
            SurfaceKind::Revolution(s) => s.set_axis(Axis::new(frame.origin, frame.z)?),
            SurfaceKind::Spiral(s) => s.set_axis(Axis::new(frame.origin, frame.z)?),
            SurfaceKind::Swept(s) => s.set_reference(frame.x),
            SurfaceKind::Evolution(s) => s.set_reference(frame.x),
            other => Err(not_applicable("replace_frame", other)),
        })
    }

    /// Replace one boundary curve of a ruled surface and reclassify it.
    pub fn replace_ruled_curve(&mut self, side: RuledSide, curve: CurveRef) -> Result<()> {
        self.edit("replace_ruled_curve", |kind| match kind {
            SurfaceKind::Ruled(s) => {
                let index = match side {
                    RuledSide::First => 0,
                    RuledSide::Second => 1,
                };
                s.set_curve(index, curve)
            }
            other => Err(not_applicable("replace_ruled_curve", other)),
        })
    }

    fn edit(&mut self, operation: &str, apply: impl FnOnce(&mut SurfaceKind) -> Result<()>) -> Result<()> {
        let mut kind = self.kind.clone();
        apply(&mut kind)?;
        let natural = kind.as_eval().natural_domain()?;
        let poles = kind.as_eval().poles(&natural, self.tolerance.linear);
        self.kind = kind;
        self.domain = natural.with_poles(poles);
        self.cache.reset(true);
        tracing::debug!(
            id = %self.id(),
            kind = self.kind.name(),
            operation,
            poles = ?self.domain.poles,
            "surface edited"
        );
        Ok(())
    }
}

fn not_applicable(operation: &str, kind: &SurfaceKind) -> PseError {
    PseError::InvalidOperation(format!("{operation} does not apply to a {} surface", kind.name()))
}
