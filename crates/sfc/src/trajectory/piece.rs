//! Quintic polynomial piece in 3D.

use nalgebra::Matrix3x6;

use super::BoundaryState;
use crate::geom::Point;

/// Coefficients, one column per power, highest order first: column `k`
/// multiplies `t^(5-k)`.
pub type CoeffMat = Matrix3x6<f64>;

/// One trajectory piece over local time `[0, duration]`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Piece {
    duration: f64,
    coeffs: CoeffMat,
}

impl Piece {
    #[inline]
    pub fn new(duration: f64, coeffs: CoeffMat) -> Self {
        Self { duration, coeffs }
    }

    /// Quintic Hermite piece matching `start` at `t = 0` and `end` at `t = duration`.
    ///
    /// Pre: `duration > 0`.
    pub fn hermite(start: &BoundaryState, end: &BoundaryState, duration: f64) -> Self {
        let t = duration;
        let (t2, t3) = (t * t, t * t * t);
        let (t4, t5) = (t3 * t, t3 * t2);
        let (p0, v0, a0) = (start.pos, start.vel, start.acc);
        let (p1, v1, a1) = (end.pos, end.vel, end.acc);
        let c0 = p0;
        let c1 = v0;
        let c2 = a0 * 0.5;
        let c3 = ((p1 - p0) * 20.0 - (v1 * 8.0 + v0 * 12.0) * t - (a0 * 3.0 - a1) * t2) / (2.0 * t3);
        let c4 = ((p0 - p1) * 30.0 + (v1 * 14.0 + v0 * 16.0) * t + (a0 * 3.0 - a1 * 2.0) * t2) / (2.0 * t4);
        let c5 = ((p1 - p0) * 12.0 - (v1 + v0) * 6.0 * t - (a0 - a1) * t2) / (2.0 * t5);
        Self {
            duration,
            coeffs: CoeffMat::from_columns(&[c5, c4, c3, c2, c1, c0]),
        }
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[inline]
    pub fn coeffs(&self) -> &CoeffMat {
        &self.coeffs
    }

    pub fn pos(&self, t: f64) -> Point {
        let mut out = Point::zeros();
        for k in 0..6 {
            out = out * t + self.coeffs.column(k);
        }
        out
    }

    pub fn vel(&self, t: f64) -> Point {
        let mut out = Point::zeros();
        for k in 0..5 {
            out = out * t + self.coeffs.column(k) * (5 - k) as f64;
        }
        out
    }

    pub fn acc(&self, t: f64) -> Point {
        let mut out = Point::zeros();
        for k in 0..4 {
            let p = (5 - k) as f64;
            out = out * t + self.coeffs.column(k) * (p * (p - 1.0));
        }
        out
    }

    pub fn jerk(&self, t: f64) -> Point {
        let mut out = Point::zeros();
        for k in 0..3 {
            let p = (5 - k) as f64;
            out = out * t + self.coeffs.column(k) * (p * (p - 1.0) * (p - 2.0));
        }
        out
    }

    #[inline]
    pub fn state(&self, t: f64) -> BoundaryState {
        BoundaryState::new(self.pos(t), self.vel(t), self.acc(t))
    }

    #[inline]
    pub fn start_state(&self) -> BoundaryState {
        self.state(0.0)
    }

    #[inline]
    pub fn end_state(&self) -> BoundaryState {
        self.state(self.duration)
    }
}
