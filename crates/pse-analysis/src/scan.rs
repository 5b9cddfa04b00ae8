//! Grid min/max distance scan between two surfaces.
//!
//! Surface A is sampled on a `grid_u x grid_v` node grid. From every sample a
//! ray is cast along the scan direction (or A's normal there) and intersected
//! with surface B by Newton iteration; the signed ray parameter is the distance.
//! The scan keeps the `keep` smallest and `keep` largest distances.

use nalgebra::{Matrix3, Vector3 as NVector3};
use pse_core::config::ScanConfig;
use pse_core::{Outcome, Progress};
use pse_geometry::Surface;
use pse_math::{Point3, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Seeds per axis of the coarse grid on B that starts each Newton solve.
const SEED_GRID: usize = 8;
const NEWTON_STEPS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceSample {
    /// Signed distance along the cast direction.
    pub distance: f64,
    /// Parameters on A.
    pub a: (f64, f64),
    /// Parameters on B.
    pub b: (f64, f64),
    pub point_a: Point3,
    pub point_b: Point3,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DistanceScan {
    /// Ascending by distance.
    pub smallest: Vec<DistanceSample>,
    /// Descending by distance.
    pub largest: Vec<DistanceSample>,
    /// Samples of A processed so far.
    pub samples: usize,
}

impl DistanceScan {
    fn offer(&mut self, sample: DistanceSample, config: &ScanConfig) {
        keep_sorted(&mut self.smallest, sample, config, |x, y| x < y);
        keep_sorted(&mut self.largest, sample, config, |x, y| x > y);
    }
}

/// Insert `sample` into `list` ordered by `before`, keeping at most `config.keep`
/// entries. A distance within `merge_epsilon` of a kept one is dropped.
fn keep_sorted(list: &mut Vec<DistanceSample>, sample: DistanceSample, config: &ScanConfig, before: fn(f64, f64) -> bool) {
    if let Some(eps) = config.merge_epsilon {
        if list.iter().any(|kept| (kept.distance - sample.distance).abs() <= eps) {
            return;
        }
    }
    let at = list
        .iter()
        .position(|kept| before(sample.distance, kept.distance))
        .unwrap_or(list.len());
    if at < config.keep {
        list.insert(at, sample);
        list.truncate(config.keep);
    }
}

fn fraction(i: usize, n: usize) -> f64 {
    if n > 1 {
        i as f64 / (n - 1) as f64
    } else {
        0.5
    }
}

fn to_na(v: Vector3) -> NVector3<f64> {
    NVector3::new(v.x, v.y, v.z)
}

/// Intersect the ray `origin + lambda * dir` with `b`, returning `(s, t, lambda)`.
fn cast(b: &Surface, seeds: &[(f64, f64, Point3)], origin: Point3, dir: Vector3) -> Option<(f64, f64, f64)> {
    let (s0, t0, _) = seeds
        .iter()
        .min_by(|x, y| {
            let dx = (x.2 - origin).cross(dir).length_squared();
            let dy = (y.2 - origin).cross(dir).length_squared();
            dx.total_cmp(&dy)
        })
        .copied()?;
    let domain = b.domain();
    let tol = b.tolerance().linear;
    let (mut s, mut t) = (s0, t0);
    let mut lambda = (b.point_at_raw(s, t) - origin).dot(dir);
    for _ in 0..NEWTON_STEPS {
        let bundle = b.derivs_raw(s, t);
        let residual = bundle.point - origin - lambda * dir;
        if residual.length() <= tol {
            return domain.contains(s, t).then_some((s, t, lambda));
        }
        let jacobian = Matrix3::from_columns(&[to_na(bundle.du), to_na(bundle.dv), to_na(-dir)]);
        let step = jacobian.lu().solve(&(-to_na(residual)))?;
        s += step[0];
        t += step[1];
        lambda += step[2];
        if domain.closed_u {
            (s, _) = b.correct(s, domain.v.0, false);
        }
        if domain.closed_v {
            (_, t) = b.correct(domain.u.0, t, false);
        }
        if !(s.is_finite() && t.is_finite() && lambda.is_finite()) {
            return None;
        }
    }
    None
}

/// Signed distances from `a` to `b` along `direction`, or along the normal of
/// `a` at each sample when `direction` is `None`.
///
/// Progress is polled every `poll_every` samples; on cancellation the samples
/// seen so far are returned as [`Outcome::Cancelled`].
pub fn scan_distances(
    a: &Surface,
    b: &Surface,
    direction: Option<Vector3>,
    config: &ScanConfig,
    progress: &dyn Progress,
) -> Outcome<DistanceScan> {
    let direction = direction.and_then(|d| d.try_normalize());
    let (gu, gv) = (config.grid_u.max(1), config.grid_v.max(1));
    let da = a.domain();
    let db = b.domain();
    let nodes: Vec<(f64, f64)> = (0..gu)
        .flat_map(|i| (0..gv).map(move |j| da.lerp(fraction(i, gu), fraction(j, gv))))
        .collect();
    let seeds: Vec<(f64, f64, Point3)> = (0..SEED_GRID)
        .flat_map(|i| {
            (0..SEED_GRID).map(move |j| db.lerp((i as f64 + 0.5) / SEED_GRID as f64, (j as f64 + 0.5) / SEED_GRID as f64))
        })
        .map(|(s, t)| (s, t, b.point_at(s, t)))
        .collect();
    tracing::debug!(a = %a.id(), b = %b.id(), samples = nodes.len(), "distance scan");

    let mut scan = DistanceScan::default();
    for chunk in nodes.chunks(config.poll_every.max(1)) {
        if progress.should_stop() {
            tracing::info!(samples = scan.samples, kept = scan.smallest.len(), "distance scan cancelled");
            return Outcome::Cancelled { partial: scan };
        }
        let hits: Vec<Option<DistanceSample>> = chunk
            .par_iter()
            .map(|&(u, v)| {
                let origin = a.point_at(u, v);
                let dir = direction.unwrap_or_else(|| a.normal(u, v));
                match cast(b, &seeds, origin, dir) {
                    Some((s, t, distance)) => Some(DistanceSample {
                        distance,
                        a: (u, v),
                        b: (s, t),
                        point_a: origin,
                        point_b: b.point_at_raw(s, t),
                    }),
                    None => {
                        tracing::warn!(u, v, "ray from sample did not converge on the target surface");
                        None
                    }
                }
            })
            .collect();
        for hit in hits.into_iter().flatten() {
            scan.offer(hit, config);
        }
        scan.samples += chunk.len();
        progress.advance(chunk.len());
    }

    if scan.smallest.is_empty() {
        Outcome::NotFound
    } else {
        Outcome::Found(scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pse_core::NoProgress;
    use pse_geometry::surface::{PlanarSurface, SphericalSurface};
    use pse_math::DVec3;

    fn sample(distance: f64) -> DistanceSample {
        DistanceSample {
            distance,
            a: (0.0, 0.0),
            b: (0.0, 0.0),
            point_a: DVec3::ZERO,
            point_b: DVec3::ZERO,
        }
    }

    #[test]
    fn test_keeps_extremes_and_merges_duplicates() {
        let config = ScanConfig {
            keep: 2,
            merge_epsilon: Some(0.01),
            ..ScanConfig::default()
        };
        let mut scan = DistanceScan::default();
        for d in [3.0, 1.0, 1.005, 2.0, 5.0, 4.999] {
            scan.offer(sample(d), &config);
        }
        let smallest: Vec<f64> = scan.smallest.iter().map(|s| s.distance).collect();
        let largest: Vec<f64> = scan.largest.iter().map(|s| s.distance).collect();
        assert_eq!(smallest, vec![1.0, 2.0]);
        assert_eq!(largest, vec![5.0, 3.0]);
    }

    #[test]
    fn test_normal_rays_to_concentric_sphere() {
        let inner = Surface::with_domain(SphericalSurface::new(DVec3::ZERO, 1.0).unwrap(), (0.0, 3.0), (-1.0, 1.0))
            .unwrap();
        // Same patch on the outer sphere so each normal line meets it once.
        let outer = Surface::with_domain(SphericalSurface::new(DVec3::ZERO, 3.0).unwrap(), (0.0, 3.0), (-1.0, 1.0))
            .unwrap();
        let config = ScanConfig {
            grid_u: 4,
            grid_v: 4,
            ..ScanConfig::default()
        };
        let scan = scan_distances(&inner, &outer, None, &config, &NoProgress)
            .into_data()
            .unwrap();
        assert_eq!(scan.samples, 16);
        assert_abs_diff_eq!(scan.smallest[0].distance.abs(), 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(scan.largest[0].distance.abs(), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_missing_target_is_not_found() {
        let a = Surface::with_domain(PlanarSurface::xy(), (0.0, 1.0), (0.0, 1.0)).unwrap();
        let b = Surface::with_domain(
            PlanarSurface::new(DVec3::new(10.0, 0.0, 1.0), DVec3::X, DVec3::Y).unwrap(),
            (0.0, 1.0),
            (0.0, 1.0),
        )
        .unwrap();
        let config = ScanConfig {
            grid_u: 3,
            grid_v: 3,
            ..ScanConfig::default()
        };
        assert_eq!(scan_distances(&a, &b, Some(DVec3::Z), &config, &NoProgress), Outcome::NotFound);
    }
}
