//! Parameter domain and the domain guard applied before evaluation.

use pse_core::{PseError, Result};
use serde::{Deserialize, Serialize};

/// Domain edge of a parameter rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    UMin,
    UMax,
    VMin,
    VMax,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::UMin, Edge::UMax, Edge::VMin, Edge::VMax];

    fn index(self) -> usize {
        match self {
            Edge::UMin => 0,
            Edge::UMax => 1,
            Edge::VMin => 2,
            Edge::VMax => 3,
        }
    }
}

/// One flag per domain edge, set where the surface degenerates to a point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poles([bool; 4]);

impl Poles {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn get(&self, edge: Edge) -> bool {
        self.0[edge.index()]
    }

    pub fn set(&mut self, edge: Edge, value: bool) {
        self.0[edge.index()] = value;
    }

    pub fn with(mut self, edge: Edge) -> Self {
        self.set(edge, true);
        self
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|&p| p)
    }
}

/// The `[u_min, u_max] x [v_min, v_max]` rectangle with closedness and pole flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamDomain {
    pub u: (f64, f64),
    pub v: (f64, f64),
    pub closed_u: bool,
    pub closed_v: bool,
    pub poles: Poles,
}

impl ParamDomain {
    /// Open domain; fails on an empty or non-finite range.
    pub fn new(u: (f64, f64), v: (f64, f64)) -> Result<Self> {
        check_range("u", u)?;
        check_range("v", v)?;
        Ok(Self {
            u,
            v,
            closed_u: false,
            closed_v: false,
            poles: Poles::none(),
        })
    }

    pub fn closed(mut self, closed_u: bool, closed_v: bool) -> Self {
        self.closed_u = closed_u;
        self.closed_v = closed_v;
        self
    }

    pub fn with_poles(mut self, poles: Poles) -> Self {
        self.poles = poles;
        self
    }

    pub fn width(&self) -> f64 {
        self.u.1 - self.u.0
    }

    pub fn height(&self) -> f64 {
        self.v.1 - self.v.0
    }

    pub fn period_u(&self) -> Option<f64> {
        self.closed_u.then(|| self.width())
    }

    pub fn period_v(&self) -> Option<f64> {
        self.closed_v.then(|| self.height())
    }

    pub fn contains(&self, u: f64, v: f64) -> bool {
        u >= self.u.0 && u <= self.u.1 && v >= self.v.0 && v <= self.v.1
    }

    pub fn center(&self) -> (f64, f64) {
        (0.5 * (self.u.0 + self.u.1), 0.5 * (self.v.0 + self.v.1))
    }

    /// Map `(s, t)` in `[0, 1]^2` to the domain.
    pub fn lerp(&self, s: f64, t: f64) -> (f64, f64) {
        (self.u.0 + s * self.width(), self.v.0 + t * self.height())
    }

    /// Bring `(u, v)` into the domain.
    ///
    /// Without `extend`, closed axes wrap modulo their period and open axes clamp.
    /// With `extend`, values pass through unchanged unless they cross a pole edge,
    /// in which case they are clamped exactly onto that edge.
    pub fn correct(&self, u: f64, v: f64, extend: bool) -> (f64, f64) {
        (
            correct_axis(u, self.u, self.closed_u, extend, self.poles.get(Edge::UMin), self.poles.get(Edge::UMax)),
            correct_axis(v, self.v, self.closed_v, extend, self.poles.get(Edge::VMin), self.poles.get(Edge::VMax)),
        )
    }

    /// Restrict to a sub-rectangle; closedness survives only on axes kept whole.
    pub fn restrict(&self, u: (f64, f64), v: (f64, f64)) -> Result<Self> {
        let mut out = Self::new(u, v)?;
        out.closed_u = self.closed_u && u == self.u;
        out.closed_v = self.closed_v && v == self.v;
        Ok(out)
    }
}

fn check_range(name: &str, (lo, hi): (f64, f64)) -> Result<()> {
    if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
        return Err(PseError::Domain(format!(
            "{name} range [{lo}, {hi}] is empty or not finite"
        )));
    }
    Ok(())
}

fn correct_axis(x: f64, (lo, hi): (f64, f64), closed: bool, extend: bool, pole_lo: bool, pole_hi: bool) -> f64 {
    if extend {
        if pole_lo && x < lo {
            return lo;
        }
        if pole_hi && x > hi {
            return hi;
        }
        return x;
    }
    if closed {
        let period = hi - lo;
        let wrapped = lo + (x - lo).rem_euclid(period);
        // rem_euclid may round up to exactly one period
        if wrapped >= hi {
            lo
        } else {
            wrapped
        }
    } else {
        x.clamp(lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn closed_u_domain() -> ParamDomain {
        ParamDomain::new((0.0, 2.0 * PI), (-1.0, 1.0)).unwrap().closed(true, false)
    }

    #[test]
    fn test_wrap_closed_axis() {
        let d = closed_u_domain();
        let (u, _) = d.correct(2.0 * PI + 0.5, 0.0, false);
        assert!((u - 0.5).abs() < 1e-12);
        let (u, _) = d.correct(-0.5, 0.0, false);
        assert!((u - (2.0 * PI - 0.5)).abs() < 1e-12);
        let (u, _) = d.correct(2.0 * PI, 0.0, false);
        assert_eq!(u, 0.0);
    }

    #[test]
    fn test_clamp_open_axis() {
        let d = closed_u_domain();
        assert_eq!(d.correct(0.0, 5.0, false).1, 1.0);
        assert_eq!(d.correct(0.0, -5.0, false).1, -1.0);
    }

    #[test]
    fn test_extend_passes_through_without_poles() {
        let d = closed_u_domain();
        assert_eq!(d.correct(10.0, 5.0, true), (10.0, 5.0));
    }

    #[test]
    fn test_extend_stops_at_pole() {
        let d = ParamDomain::new((0.0, 1.0), (0.0, 1.0))
            .unwrap()
            .with_poles(Poles::none().with(Edge::VMin));
        assert_eq!(d.correct(2.0, -0.5, true), (2.0, 0.0));
        assert_eq!(d.correct(2.0, 1.5, true), (2.0, 1.5));
    }

    #[test]
    fn test_degenerate_domain_rejected() {
        assert!(matches!(ParamDomain::new((1.0, 1.0), (0.0, 1.0)), Err(PseError::Domain(_))));
        assert!(ParamDomain::new((0.0, 1.0), (2.0, -2.0)).is_err());
        assert!(ParamDomain::new((0.0, f64::INFINITY), (0.0, 1.0)).is_err());
    }

    #[test]
    fn test_restrict_drops_closedness() {
        let d = closed_u_domain();
        assert!(d.restrict((0.0, 2.0 * PI), (0.0, 0.5)).unwrap().closed_u);
        assert!(!d.restrict((0.0, PI), (0.0, 0.5)).unwrap().closed_u);
    }
}
