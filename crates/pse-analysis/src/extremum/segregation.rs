//! Line-segregation strategy.
//!
//! Interior extrema lie where the zero lines of both partials cross. The window
//! is gridded, every cell in which both partials change sign (or vanish) is
//! refined by quadrant subdivision, and the boundary is handled separately by
//! sampling each edge and bisecting sign changes of the tangential derivative.

use std::ops::ControlFlow;

use pse_core::Progress;

use super::{chunked, FieldExtrema, Pass, Search};

/// Grid refinement over the seed grid of the gradient strategy.
const GRID_FACTOR: usize = 4;
const MAX_LEVELS: usize = 40;
const MAX_BISECTIONS: usize = 60;

type Gradient = (f64, f64);
type Segment = ((f64, f64), (f64, f64));

/// Cell in normalized window coordinates, with the gradient at its corners.
#[derive(Debug, Clone, Copy)]
struct Cell {
    s: (f64, f64),
    t: (f64, f64),
    /// Corners in the order `(s0, t0)`, `(s1, t0)`, `(s0, t1)`, `(s1, t1)`.
    corners: [Gradient; 4],
}

impl Cell {
    fn straddles(&self) -> bool {
        let spans = |pick: fn(&Gradient) -> f64| {
            let (lo, hi) = self
                .corners
                .iter()
                .map(pick)
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), g| (lo.min(g), hi.max(g)));
            lo <= 0.0 && hi >= 0.0
        };
        spans(|g| g.0) && spans(|g| g.1)
    }

    fn center(&self) -> (f64, f64) {
        (0.5 * (self.s.0 + self.s.1), 0.5 * (self.t.0 + self.t.1))
    }
}

/// Sample of an edge: edge index, fraction along it, field value, derivative along it.
type EdgeSample = (usize, f64, f64, f64);

pub(super) fn run(search: &Search<'_>, progress: &dyn Progress) -> Pass {
    match passes(search, progress) {
        (ControlFlow::Continue(()), found) => ControlFlow::Continue(found),
        (ControlFlow::Break(()), found) => ControlFlow::Break(found),
    }
}

fn passes(search: &Search<'_>, progress: &dyn Progress) -> (ControlFlow<()>, FieldExtrema) {
    let n = search.config.grid.max(1) * GRID_FACTOR;
    let frac = |k: usize| k as f64 / n as f64;
    let mut found = FieldExtrema::default();

    let nodes: Vec<(usize, usize)> = (0..=n).flat_map(|i| (0..=n).map(move |j| (i, j))).collect();
    let mut gradients = Vec::with_capacity(nodes.len());
    let flow = chunked(
        search,
        progress,
        &mut found,
        &nodes,
        |&(i, j)| gradient_at(search, frac(i), frac(j)),
        |_, g| gradients.push(g),
    );
    if flow.is_break() {
        return (flow, found);
    }
    let node = |i: usize, j: usize| gradients[i * (n + 1) + j];

    let cells: Vec<(usize, usize)> = (0..n).flat_map(|i| (0..n).map(move |j| (i, j))).collect();
    let flow = chunked(
        search,
        progress,
        &mut found,
        &cells,
        |&(i, j)| {
            let cell = Cell {
                s: (frac(i), frac(i + 1)),
                t: (frac(j), frac(j + 1)),
                corners: [node(i, j), node(i + 1, j), node(i, j + 1), node(i + 1, j + 1)],
            };
            if !cell.straddles() {
                return None;
            }
            let (s, t) = refine(search, cell);
            let (u, v) = search.lerp(s, t);
            search.admits(u, v).then(|| (search.value(u, v), u, v))
        },
        |found, landing: Option<(f64, f64, f64)>| {
            if let Some((value, u, v)) = landing {
                tracing::trace!(u, v, value, "critical cell");
                found.offer(value, u, v);
            }
        },
    );
    if flow.is_break() {
        return (flow, found);
    }

    let edge_nodes: Vec<(usize, f64)> = (0..search.edges.len())
        .flat_map(|e| (0..=n).map(move |k| (e, frac(k))))
        .collect();
    let mut samples: Vec<EdgeSample> = Vec::with_capacity(edge_nodes.len());
    let flow = chunked(
        search,
        progress,
        &mut found,
        &edge_nodes,
        |&(e, r)| {
            let (value, slope) = edge_slope(search, search.edges[e], r);
            (e, r, value, slope)
        },
        |found, sample: EdgeSample| {
            let (u, v) = edge_point(search, search.edges[sample.0], sample.1);
            found.offer(sample.2, u, v);
            samples.push(sample);
        },
    );
    if flow.is_break() {
        return (flow, found);
    }

    // Consecutive samples of one edge whose derivative changes sign.
    let brackets: Vec<(EdgeSample, EdgeSample)> = samples
        .windows(2)
        .filter(|pair| pair[0].0 == pair[1].0 && pair[0].3 * pair[1].3 < 0.0)
        .map(|pair| (pair[0], pair[1]))
        .collect();
    let flow = chunked(
        search,
        progress,
        &mut found,
        &brackets,
        |&(lo, hi)| bisect_edge(search, search.edges[lo.0], lo, hi),
        |found, (value, u, v): (f64, f64, f64)| found.offer(value, u, v),
    );
    (flow, found)
}

fn gradient_at(search: &Search<'_>, s: f64, t: f64) -> Gradient {
    let (u, v) = search.lerp(s, t);
    search.gradient(u, v)
}

/// Shrink `cell` around a crossing of both zero lines; returns the center of the
/// smallest cell reached.
fn refine(search: &Search<'_>, mut cell: Cell) -> (f64, f64) {
    for _ in 0..MAX_LEVELS {
        let (s0, s1) = cell.s;
        let (t0, t1) = cell.t;
        if (s1 - s0).max(t1 - t0) < search.config.step_tolerance {
            break;
        }
        let (sm, tm) = cell.center();
        let [c00, c10, c01, c11] = cell.corners;
        let mid_t0 = gradient_at(search, sm, t0);
        let mid_t1 = gradient_at(search, sm, t1);
        let mid_s0 = gradient_at(search, s0, tm);
        let mid_s1 = gradient_at(search, s1, tm);
        let mid = gradient_at(search, sm, tm);
        let quadrants = [
            Cell { s: (s0, sm), t: (t0, tm), corners: [c00, mid_t0, mid_s0, mid] },
            Cell { s: (sm, s1), t: (t0, tm), corners: [mid_t0, c10, mid, mid_s1] },
            Cell { s: (s0, sm), t: (tm, t1), corners: [mid_s0, mid, c01, mid_t1] },
            Cell { s: (sm, s1), t: (tm, t1), corners: [mid, mid_s1, mid_t1, c11] },
        ];
        match quadrants.into_iter().find(Cell::straddles) {
            Some(next) => cell = next,
            None => break,
        }
    }
    cell.center()
}

fn edge_point(search: &Search<'_>, (a, b): Segment, r: f64) -> (f64, f64) {
    search.clamp(a.0 + r * (b.0 - a.0), a.1 + r * (b.1 - a.1))
}

/// Field value at fraction `r` of the edge and its derivative along the edge.
fn edge_slope(search: &Search<'_>, edge: Segment, r: f64) -> (f64, f64) {
    let ((a0, a1), (b0, b1)) = edge;
    let (u, v) = edge_point(search, edge, r);
    let (value, (gu, gv)) = search.value_and_gradient(u, v);
    (value, gu * (b0 - a0) + gv * (b1 - a1))
}

/// Bisect a sign change of the derivative along an edge; returns `(value, u, v)`.
fn bisect_edge(search: &Search<'_>, edge: Segment, lo: EdgeSample, hi: EdgeSample) -> (f64, f64, f64) {
    let falling = lo.3 < 0.0;
    let (mut lo, mut hi) = (lo.1, hi.1);
    for _ in 0..MAX_BISECTIONS {
        let mid = 0.5 * (lo + hi);
        if (edge_slope(search, edge, mid).1 < 0.0) == falling {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < search.config.step_tolerance {
            break;
        }
    }
    let (u, v) = edge_point(search, edge, 0.5 * (lo + hi));
    (search.value(u, v), u, v)
}
