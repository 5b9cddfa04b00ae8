//! Gradient strategy: climb from every seed of a coarse grid.

use std::ops::ControlFlow;

use pse_core::Progress;

use super::{chunked, FieldExtrema, Pass, Search};

/// `(value, u, v)` where a climb ended.
type Landing = (f64, f64, f64);

pub(super) fn run(search: &Search<'_>, progress: &dyn Progress) -> Pass {
    let n = search.config.grid;
    let cell = |k: usize| (k as f64 + 0.5) / n as f64;
    let seeds: Vec<(f64, f64)> = (0..n)
        .flat_map(|i| (0..n).map(move |j| (i, j)))
        .map(|(i, j)| search.lerp(cell(i), cell(j)))
        .collect();
    let mut found = FieldExtrema::default();
    let flow = chunked(
        search,
        progress,
        &mut found,
        &seeds,
        |&(u, v)| search.admits(u, v).then(|| [climb(search, u, v, -1.0), climb(search, u, v, 1.0)]),
        |found, landings: Option<[Landing; 2]>| {
            if let Some([low, high]) = landings {
                tracing::trace!(low = low.0, high = high.0, "seed climbed");
                found.offer(low.0, low.1, low.2);
                found.offer(high.0, high.1, high.2);
            }
        },
    );
    match flow {
        ControlFlow::Continue(()) => ControlFlow::Continue(found),
        ControlFlow::Break(()) => ControlFlow::Break(found),
    }
}

/// Follow the gradient of `sign * field` from `(u, v)` with a backtracking step.
///
/// Steps are measured in window-normalized parameters and every trial point is
/// clamped into the window; points outside the trim region are rejected like
/// non-improving ones.
fn climb(search: &Search<'_>, mut u: f64, mut v: f64, sign: f64) -> Landing {
    let (width, height) = search.extent();
    let (value, mut grad) = search.value_and_gradient(u, v);
    let mut value = sign * value;
    let mut step = 1.0 / search.config.grid as f64;
    for _ in 0..search.config.max_iterations {
        let (gs, gt) = (sign * grad.0 * width, sign * grad.1 * height);
        let norm = gs.hypot(gt);
        if !(norm > f64::MIN_POSITIVE) {
            break;
        }
        let mut moved = false;
        while step >= search.config.step_tolerance {
            let (cu, cv) = search.clamp(u + gs / norm * step * width, v + gt / norm * step * height);
            if search.admits(cu, cv) {
                let (cval, cgrad) = search.value_and_gradient(cu, cv);
                if sign * cval > value {
                    (u, v, value, grad) = (cu, cv, sign * cval, cgrad);
                    step = (2.0 * step).min(0.5);
                    moved = true;
                    break;
                }
            }
            step *= 0.5;
        }
        if !moved {
            break;
        }
    }
    (sign * value, u, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curvature::CurvatureField;
    use pse_core::config::ExtremumConfig;
    use pse_geometry::surface::ToroidalSurface;
    use pse_geometry::Surface;
    use pse_math::DVec3;

    #[test]
    fn test_climb_reaches_inner_equator() {
        let torus = Surface::new(ToroidalSurface::new(DVec3::ZERO, DVec3::Z, 3.0, 1.0).unwrap()).unwrap();
        let config = ExtremumConfig::default();
        let search = Search::whole(&torus, CurvatureField::Gaussian, &config);
        let (value, _, v) = climb(&search, 1.0, 2.5, -1.0);
        assert!((value + 0.5).abs() < 1e-8);
        assert!((v - std::f64::consts::PI).abs() < 1e-3);
    }

    #[test]
    fn test_every_seed_row_reports_progress() {
        let torus = Surface::new(ToroidalSurface::new(DVec3::ZERO, DVec3::Z, 3.0, 1.0).unwrap()).unwrap();
        let config = ExtremumConfig {
            grid: 4,
            ..ExtremumConfig::default()
        };
        let search = Search::whole(&torus, CurvatureField::Mean, &config);
        let token = pse_core::CancelToken::new();
        let pass = run(&search, &token);
        assert!(matches!(pass, ControlFlow::Continue(_)));
        assert_eq!(token.done(), 16);
    }
}
