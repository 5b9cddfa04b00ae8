//! Curvature scalar fields on a surface and their analytic gradients.
//!
//! Everything is derived from the first and second fundamental forms at a point.
//! Gradients differentiate the forms with the third-order partials and the
//! partials of the unit normal, so no finite differences are involved.

use pse_geometry::Surface;
use serde::{Deserialize, Serialize};

/// `EG - F^2` at or below this marks a singular point where every field is zero.
const SINGULAR: f64 = 1e-24;

/// Scalar curvature field selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurvatureField {
    /// Smaller principal curvature.
    MinNormal,
    /// Larger principal curvature.
    MaxNormal,
    Gaussian,
    Mean,
    /// Normal curvature in the `u` parameter direction, `L / E`.
    UNormal,
    /// Normal curvature in the `v` parameter direction, `N / G`.
    VNormal,
}

/// A value together with its partials in `u` and `v`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Graded {
    value: f64,
    du: f64,
    dv: f64,
}

impl Graded {
    fn new(value: f64, du: f64, dv: f64) -> Self {
        Self { value, du, dv }
    }

    fn add(self, o: Self) -> Self {
        Self::new(self.value + o.value, self.du + o.du, self.dv + o.dv)
    }

    fn sub(self, o: Self) -> Self {
        Self::new(self.value - o.value, self.du - o.du, self.dv - o.dv)
    }

    fn mul(self, o: Self) -> Self {
        Self::new(
            self.value * o.value,
            self.du * o.value + self.value * o.du,
            self.dv * o.value + self.value * o.dv,
        )
    }

    fn scale(self, s: f64) -> Self {
        Self::new(self.value * s, self.du * s, self.dv * s)
    }

    fn div(self, o: Self) -> Self {
        let q2 = o.value * o.value;
        Self::new(
            self.value / o.value,
            (self.du * o.value - self.value * o.du) / q2,
            (self.dv * o.value - self.value * o.dv) / q2,
        )
    }

    fn sqrt(self) -> Self {
        let r = self.value.max(0.0).sqrt();
        if r <= 1e-12 {
            // Umbilic: the root is not differentiable, report a flat gradient.
            return Self::new(r, 0.0, 0.0);
        }
        Self::new(r, self.du / (2.0 * r), self.dv / (2.0 * r))
    }
}

/// First and second fundamental forms with their parameter partials.
#[derive(Debug, Clone, Copy)]
struct Forms {
    e: Graded,
    f: Graded,
    g: Graded,
    l: Graded,
    m: Graded,
    n: Graded,
}

impl Forms {
    fn at(surface: &Surface, u: f64, v: f64) -> Option<Self> {
        let b = surface.derivs(u, v);
        let nb = surface.normal_bundle(u, v);
        let (nn, nu, nv) = (nb.normal, nb.normal_u, nb.normal_v);
        let forms = Self {
            e: Graded::new(b.du.dot(b.du), 2.0 * b.du.dot(b.duu), 2.0 * b.du.dot(b.duv)),
            f: Graded::new(
                b.du.dot(b.dv),
                b.duu.dot(b.dv) + b.du.dot(b.duv),
                b.duv.dot(b.dv) + b.du.dot(b.dvv),
            ),
            g: Graded::new(b.dv.dot(b.dv), 2.0 * b.dv.dot(b.duv), 2.0 * b.dv.dot(b.dvv)),
            l: Graded::new(
                b.duu.dot(nn),
                b.duuu.dot(nn) + b.duu.dot(nu),
                b.duuv.dot(nn) + b.duu.dot(nv),
            ),
            m: Graded::new(
                b.duv.dot(nn),
                b.duuv.dot(nn) + b.duv.dot(nu),
                b.duvv.dot(nn) + b.duv.dot(nv),
            ),
            n: Graded::new(
                b.dvv.dot(nn),
                b.duvv.dot(nn) + b.dvv.dot(nu),
                b.dvvv.dot(nn) + b.dvv.dot(nv),
            ),
        };
        (forms.area().value > SINGULAR && nn.length_squared() > 0.5).then_some(forms)
    }

    fn area(&self) -> Graded {
        self.e.mul(self.g).sub(self.f.mul(self.f))
    }

    fn gaussian(&self) -> Graded {
        self.l.mul(self.n).sub(self.m.mul(self.m)).div(self.area())
    }

    fn mean(&self) -> Graded {
        let r = self
            .e
            .mul(self.n)
            .sub(self.f.mul(self.m).scale(2.0))
            .add(self.g.mul(self.l));
        r.div(self.area().scale(2.0))
    }

    fn field(&self, field: CurvatureField) -> Graded {
        match field {
            CurvatureField::Gaussian => self.gaussian(),
            CurvatureField::Mean => self.mean(),
            CurvatureField::MinNormal | CurvatureField::MaxNormal => {
                let h = self.mean();
                let spread = h.mul(h).sub(self.gaussian()).sqrt();
                if field == CurvatureField::MinNormal {
                    h.sub(spread)
                } else {
                    h.add(spread)
                }
            }
            CurvatureField::UNormal => self.l.div(self.e),
            CurvatureField::VNormal => self.n.div(self.g),
        }
    }
}

/// Principal, Gaussian and mean curvature at one point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Curvatures {
    pub min: f64,
    pub max: f64,
    pub gaussian: f64,
    pub mean: f64,
}

/// Curvatures at `(u, v)`; all zero at a singular point.
pub fn curvatures(surface: &Surface, u: f64, v: f64) -> Curvatures {
    match Forms::at(surface, u, v) {
        Some(forms) => Curvatures {
            min: forms.field(CurvatureField::MinNormal).value,
            max: forms.field(CurvatureField::MaxNormal).value,
            gaussian: forms.gaussian().value,
            mean: forms.mean().value,
        },
        None => Curvatures::default(),
    }
}

impl CurvatureField {
    pub const ALL: [CurvatureField; 6] = [
        CurvatureField::MinNormal,
        CurvatureField::MaxNormal,
        CurvatureField::Gaussian,
        CurvatureField::Mean,
        CurvatureField::UNormal,
        CurvatureField::VNormal,
    ];

    /// Field value at `(u, v)`, zero at singular points.
    pub fn value(self, surface: &Surface, u: f64, v: f64) -> f64 {
        Forms::at(surface, u, v).map_or(0.0, |forms| forms.field(self).value)
    }

    /// Partials `(df/du, df/dv)` at `(u, v)`, zero at singular points.
    pub fn gradient(self, surface: &Surface, u: f64, v: f64) -> (f64, f64) {
        Forms::at(surface, u, v).map_or((0.0, 0.0), |forms| {
            let g = forms.field(self);
            (g.du, g.dv)
        })
    }

    /// Value and gradient from one evaluation of the forms.
    pub fn value_and_gradient(self, surface: &Surface, u: f64, v: f64) -> (f64, (f64, f64)) {
        Forms::at(surface, u, v).map_or((0.0, (0.0, 0.0)), |forms| {
            let g = forms.field(self);
            (g.value, (g.du, g.dv))
        })
    }
}
