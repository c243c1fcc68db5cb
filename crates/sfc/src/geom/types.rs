//! Basic 3D types and tolerances used by the corridor H-representations.
//!
//! - `GeomCfg`: centralizes epsilons for determinants, feasibility and seed slack.
//! - `Halfplane`: closed half-space `n·x + d <= 0` with helper predicates.
//! - `Aabb`: axis-aligned local window, convertible to its six face halfplanes.

use nalgebra::Vector3;

/// World-frame coordinate. Planar problems keep `z = 0`.
pub type Point = Vector3<f64>;

/// Geometry configuration (tolerances).
#[derive(Clone, Copy, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct GeomCfg {
    pub eps_det: f64,
    pub eps_feas: f64,
    /// Slack used when asking whether a seed is strictly interior.
    pub eps_seed: f64,
}

impl Default for GeomCfg {
    fn default() -> Self {
        Self {
            eps_det: 1e-12,
            eps_feas: 1e-9,
            eps_seed: 1e-6,
        }
    }
}

/// Closed half-space `n · x + d <= 0`, i.e. the row `(a, b, c, d)`.
///
/// Invariants:
/// - `n` is not normalized unless produced by `normalized()`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Halfplane {
    pub n: Vector3<f64>,
    pub d: f64,
}

impl Halfplane {
    #[inline]
    pub fn new(n: Vector3<f64>, d: f64) -> Self {
        Self { n, d }
    }
    #[inline]
    pub fn from_coeffs(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            n: Vector3::new(a, b, c),
            d,
        }
    }
    #[inline]
    pub fn coeffs(&self) -> [f64; 4] {
        [self.n.x, self.n.y, self.n.z, self.d]
    }
    /// Signed row value `n·p + d` (negative inside).
    #[inline]
    pub fn eval(&self, p: &Point) -> f64 {
        self.n.dot(p) + self.d
    }
    #[inline]
    pub fn satisfies_eps(&self, p: &Point, eps: f64) -> bool {
        self.eval(p) <= eps
    }
    /// Unit-normal copy; `None` for zero or non-finite normals.
    #[inline]
    pub fn normalized(&self) -> Option<Self> {
        let norm = self.n.norm();
        if !norm.is_finite() || norm <= 0.0 {
            return None;
        }
        Some(Self::new(self.n / norm, self.d / norm))
    }
    /// Move a unit-normal plane inward by `depth` (positive shrinks the region).
    #[inline]
    pub fn shifted(&self, depth: f64) -> Self {
        Self::new(self.n, self.d + depth)
    }
}

/// Axis-aligned box `[lo, hi]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    pub lo: Point,
    pub hi: Point,
}

impl Aabb {
    #[inline]
    pub fn new(lo: Point, hi: Point) -> Self {
        Self { lo, hi }
    }

    /// Box around segment `[a, b]` padded by `half_window` per axis and
    /// clipped to the map extents `[low, high]`.
    pub fn around_segment(a: &Point, b: &Point, half_window: f64, low: &Point, high: &Point) -> Self {
        let mut lo = Point::zeros();
        let mut hi = Point::zeros();
        for k in 0..3 {
            lo[k] = (a[k].min(b[k]) - half_window).max(low[k]);
            hi[k] = (a[k].max(b[k]) + half_window).min(high[k]);
        }
        Self { lo, hi }
    }

    /// True if some axis has no interior.
    #[inline]
    pub fn is_empty(&self) -> bool {
        (0..3).any(|k| !(self.lo[k] < self.hi[k]))
    }

    /// Strict membership: every face evaluates `< 0`.
    #[inline]
    pub fn contains_strict(&self, p: &Point) -> bool {
        self.halfplanes().iter().all(|h| h.eval(p) < 0.0)
    }

    #[inline]
    pub fn center(&self) -> Point {
        (self.lo + self.hi) * 0.5
    }

    /// Face rows in fixed order: +x, −x, +y, −y, +z, −z.
    pub fn halfplanes(&self) -> [Halfplane; 6] {
        [
            Halfplane::from_coeffs(1.0, 0.0, 0.0, -self.hi.x),
            Halfplane::from_coeffs(-1.0, 0.0, 0.0, self.lo.x),
            Halfplane::from_coeffs(0.0, 1.0, 0.0, -self.hi.y),
            Halfplane::from_coeffs(0.0, -1.0, 0.0, self.lo.y),
            Halfplane::from_coeffs(0.0, 0.0, 1.0, -self.hi.z),
            Halfplane::from_coeffs(0.0, 0.0, -1.0, self.lo.z),
        ]
    }
}
