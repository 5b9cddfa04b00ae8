//! Extremum search of curvature fields over a parameter rectangle.
//!
//! Two interchangeable strategies share one accumulator: the most negative and
//! the most positive field value seen, each with its location. A value is only
//! reported on its own side of zero, so a surface whose curvature is never
//! negative reports [`Extremum::None`] for the negative side.
//!
//! Both strategies split their work into chunks of `poll_every` seeds, nodes or
//! cells and poll the progress collaborator before each chunk.

mod descent;
mod segregation;

use std::ops::ControlFlow;

use pse_core::config::ExtremumConfig;
use pse_core::{Outcome, Progress};
use pse_geometry::Surface;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bounded::TrimRegion;
use crate::curvature::CurvatureField;

/// Search algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtremumStrategy {
    /// Seed a grid and follow the clamped gradient from every seed.
    GradientDescent,
    /// Intersect the sign-change loci of both partials, then add boundary samples.
    LineSegregation,
}

/// One side of the search result.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Extremum {
    Found {
        value: f64,
        u: f64,
        v: f64,
    },
    #[default]
    None,
}

impl Extremum {
    pub fn value(&self) -> f64 {
        match self {
            Extremum::Found { value, .. } => *value,
            Extremum::None => 0.0,
        }
    }

    pub fn location(&self) -> Option<(f64, f64)> {
        match self {
            Extremum::Found { u, v, .. } => Some((*u, *v)),
            Extremum::None => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Extremum::Found { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldExtrema {
    pub most_negative: Extremum,
    pub most_positive: Extremum,
}

impl FieldExtrema {
    /// Record a sample; only strict improvements replace the current holder.
    pub(crate) fn offer(&mut self, value: f64, u: f64, v: f64) {
        if !value.is_finite() {
            return;
        }
        if value < 0.0 && value < self.most_negative.value() {
            self.most_negative = Extremum::Found { value, u, v };
        }
        if value > 0.0 && value > self.most_positive.value() {
            self.most_positive = Extremum::Found { value, u, v };
        }
    }

    fn into_outcome(self) -> Outcome<Self> {
        if self.most_negative.is_found() || self.most_positive.is_found() {
            Outcome::Found(self)
        } else {
            Outcome::NotFound
        }
    }
}

/// The search problem shared by both strategies.
pub(crate) struct Search<'a> {
    pub surface: &'a Surface,
    pub field: CurvatureField,
    pub config: &'a ExtremumConfig,
    pub region: Option<&'a TrimRegion>,
    /// Period multiples taking search parameters to region parameters.
    pub shift: (f64, f64),
    /// Rectangle that is seeded or gridded.
    pub window: ((f64, f64), (f64, f64)),
    /// Segments sampled as boundary, in parameter space.
    pub edges: Vec<((f64, f64), (f64, f64))>,
}

impl<'a> Search<'a> {
    fn whole(surface: &'a Surface, field: CurvatureField, config: &'a ExtremumConfig) -> Self {
        let domain = surface.domain();
        let (u, v) = (domain.u, domain.v);
        let corners = [(u.0, v.0), (u.1, v.0), (u.1, v.1), (u.0, v.1)];
        Self {
            surface,
            field,
            config,
            region: None,
            shift: (0.0, 0.0),
            window: (u, v),
            edges: closed_polygon(&corners),
        }
    }

    /// Search over `region`, moved by whole periods onto the domain on closed
    /// axes; `None` when it does not overlap the domain.
    fn bounded(
        surface: &'a Surface,
        field: CurvatureField,
        config: &'a ExtremumConfig,
        region: &'a TrimRegion,
    ) -> Option<Self> {
        let domain = surface.domain();
        let (bu, bv) = region.bounds();
        let (shift_u, window_u) = overlap(bu, domain.u, domain.closed_u);
        let (shift_v, window_v) = overlap(bv, domain.v, domain.closed_v);
        if !(window_u.0 < window_u.1 && window_v.0 < window_v.1) {
            return None;
        }
        let edges = if region.ignores_border() {
            Vec::new()
        } else {
            let moved: Vec<(f64, f64)> = region
                .boundary()
                .iter()
                .map(|&(u, v)| (u - shift_u, v - shift_v))
                .collect();
            closed_polygon(&moved)
        };
        Some(Self {
            surface,
            field,
            config,
            region: Some(region),
            shift: (shift_u, shift_v),
            window: (window_u, window_v),
            edges,
        })
    }

    pub fn admits(&self, u: f64, v: f64) -> bool {
        self.region.map_or(true, |r| r.admits(u + self.shift.0, v + self.shift.1))
    }

    /// Map `(s, t)` in `[0, 1]^2` onto the window.
    pub fn lerp(&self, s: f64, t: f64) -> (f64, f64) {
        let ((u0, u1), (v0, v1)) = self.window;
        (u0 + s * (u1 - u0), v0 + t * (v1 - v0))
    }

    pub fn extent(&self) -> (f64, f64) {
        let ((u0, u1), (v0, v1)) = self.window;
        (u1 - u0, v1 - v0)
    }

    /// Keep `(u, v)` inside the window.
    pub fn clamp(&self, u: f64, v: f64) -> (f64, f64) {
        let ((u0, u1), (v0, v1)) = self.window;
        (u.clamp(u0, u1), v.clamp(v0, v1))
    }

    pub fn value(&self, u: f64, v: f64) -> f64 {
        self.field.value(self.surface, u, v)
    }

    pub fn value_and_gradient(&self, u: f64, v: f64) -> (f64, (f64, f64)) {
        self.field.value_and_gradient(self.surface, u, v)
    }

    pub fn gradient(&self, u: f64, v: f64) -> (f64, f64) {
        self.field.gradient(self.surface, u, v)
    }
}

/// Shift by whole periods and the resulting intersection of `range` with the
/// domain axis `axis`. On a closed axis the shift keeping the larger overlap wins;
/// a range straddling the seam keeps only that side.
fn overlap(range: (f64, f64), axis: (f64, f64), closed: bool) -> (f64, (f64, f64)) {
    let clip = |shift: f64| (range.0 - shift).max(axis.0)..(range.1 - shift).min(axis.1);
    if !closed {
        let r = clip(0.0);
        return (0.0, (r.start, r.end));
    }
    let period = axis.1 - axis.0;
    let first = ((range.0 - axis.0) / period).floor() * period;
    let best = [first, first + period]
        .into_iter()
        .max_by(|a, b| {
            let (ra, rb) = (clip(*a), clip(*b));
            (ra.end - ra.start).total_cmp(&(rb.end - rb.start))
        })
        .unwrap_or(first);
    let r = clip(best);
    (best, (r.start, r.end))
}

fn closed_polygon(points: &[(f64, f64)]) -> Vec<((f64, f64), (f64, f64))> {
    (0..points.len())
        .map(|i| (points[i], points[(i + 1) % points.len()]))
        .collect()
}

/// Strategy result: `Break` carries the partial result of a cancelled pass.
pub(crate) type Pass = ControlFlow<FieldExtrema, FieldExtrema>;

/// Map `work` over `items` in parallel, `config.poll_every` items at a time.
///
/// Progress is polled before and advanced after every chunk; `take` folds each
/// result into `found` in item order. Breaks when the collaborator asks to stop.
pub(crate) fn chunked<T, R>(
    search: &Search<'_>,
    progress: &dyn Progress,
    found: &mut FieldExtrema,
    items: &[T],
    work: impl Fn(&T) -> R + Sync + Send,
    mut take: impl FnMut(&mut FieldExtrema, R),
) -> ControlFlow<()>
where
    T: Sync,
    R: Send,
{
    for chunk in items.chunks(search.config.poll_every.max(1)) {
        if stopped(progress, found) {
            return ControlFlow::Break(());
        }
        let results: Vec<R> = chunk.par_iter().map(&work).collect();
        for result in results {
            take(found, result);
        }
        progress.advance(chunk.len());
    }
    ControlFlow::Continue(())
}

/// Stop check shared by the strategies; logs the cancellation.
pub(crate) fn stopped(progress: &dyn Progress, found: &FieldExtrema) -> bool {
    let stop = progress.should_stop();
    if stop {
        tracing::info!(
            negative = found.most_negative.is_found(),
            positive = found.most_positive.is_found(),
            "extremum search cancelled"
        );
    }
    stop
}

/// Most negative and most positive value of `field` over the surface domain.
pub fn find_extrema(
    surface: &Surface,
    field: CurvatureField,
    strategy: ExtremumStrategy,
    config: &ExtremumConfig,
    progress: &dyn Progress,
) -> Outcome<FieldExtrema> {
    run(Search::whole(surface, field, config), strategy, progress)
}

pub(crate) fn run(search: Search<'_>, strategy: ExtremumStrategy, progress: &dyn Progress) -> Outcome<FieldExtrema> {
    tracing::debug!(
        id = %search.surface.id(),
        field = ?search.field,
        ?strategy,
        bounded = search.region.is_some(),
        "extremum search"
    );
    let pass = match strategy {
        ExtremumStrategy::GradientDescent => descent::run(&search, progress),
        ExtremumStrategy::LineSegregation => segregation::run(&search, progress),
    };
    match pass {
        ControlFlow::Continue(found) => found.into_outcome(),
        ControlFlow::Break(partial) => Outcome::Cancelled { partial },
    }
}

pub(crate) fn bounded_search<'a>(
    surface: &'a Surface,
    field: CurvatureField,
    config: &'a ExtremumConfig,
    region: &'a TrimRegion,
) -> Option<Search<'a>> {
    let search = Search::bounded(surface, field, config, region);
    if search.is_none() {
        tracing::debug!(id = %surface.id(), bounds = ?region.bounds(), "trim region misses the domain");
    }
    search
}
