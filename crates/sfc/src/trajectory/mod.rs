//! Piecewise-polynomial trajectories and boundary states.
//!
//! A `Trajectory` is an ordered list of quintic `Piece`s; piece `k + 1`
//! starts where piece `k` ends (position, velocity and acceleration).
//! Splicing only ever truncates the tail and appends.

mod piece;

pub use piece::{CoeffMat, Piece};

use crate::geom::Point;

/// Position / velocity / acceleration triple.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundaryState {
    pub pos: Point,
    pub vel: Point,
    pub acc: Point,
}

impl BoundaryState {
    #[inline]
    pub fn new(pos: Point, vel: Point, acc: Point) -> Self {
        Self { pos, vel, acc }
    }

    /// At `pos` with zero velocity and acceleration.
    #[inline]
    pub fn at_rest(pos: Point) -> Self {
        Self::new(pos, Point::zeros(), Point::zeros())
    }

    /// Max-abs distance over all three components.
    pub fn max_abs_diff(&self, other: &BoundaryState) -> f64 {
        let d = |a: &Point, b: &Point| (a - b).amax();
        d(&self.pos, &other.pos)
            .max(d(&self.vel, &other.vel))
            .max(d(&self.acc, &other.acc))
    }
}

/// Time-stamped state, e.g. for execution layers.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    pub t: f64,
    pub state: BoundaryState,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trajectory {
    pieces: Vec<Piece>,
}

impl Trajectory {
    #[inline]
    pub fn new(pieces: Vec<Piece>) -> Self {
        Self { pieces }
    }

    #[inline]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    #[inline]
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn total_duration(&self) -> f64 {
        self.pieces.iter().map(Piece::duration).sum()
    }

    /// Piece covering global time `t` and the local time inside it.
    ///
    /// Times before 0 clamp to the first piece, times past the end clamp to
    /// the end of the last piece. `None` for an empty trajectory.
    pub fn locate_piece(&self, t: f64) -> Option<(usize, f64)> {
        let last = self.pieces.len().checked_sub(1)?;
        let mut rest = t.max(0.0);
        for (k, p) in self.pieces.iter().enumerate() {
            if rest <= p.duration() || k == last {
                return Some((k, rest.min(p.duration())));
            }
            rest -= p.duration();
        }
        None
    }

    pub fn state(&self, t: f64) -> Option<BoundaryState> {
        let (k, local) = self.locate_piece(t)?;
        Some(self.pieces[k].state(local))
    }

    #[inline]
    pub fn pos(&self, t: f64) -> Option<Point> {
        self.state(t).map(|s| s.pos)
    }

    pub fn start_state(&self) -> Option<BoundaryState> {
        self.pieces.first().map(Piece::start_state)
    }

    pub fn end_state(&self) -> Option<BoundaryState> {
        self.pieces.last().map(Piece::end_state)
    }

    /// Keep the first `keep` pieces.
    #[inline]
    pub fn truncate(&mut self, keep: usize) {
        self.pieces.truncate(keep);
    }

    #[inline]
    pub fn append(&mut self, other: Trajectory) {
        self.pieces.extend(other.pieces);
    }

    /// Junction positions: start of every piece plus the final end point.
    pub fn waypoints(&self) -> Vec<Point> {
        let mut out: Vec<Point> = self.pieces.iter().map(|p| p.pos(0.0)).collect();
        if let Some(end) = self.end_state() {
            out.push(end.pos);
        }
        out
    }

    /// Largest sampled speed (`resolution` samples per piece).
    pub fn max_vel_rate(&self, resolution: usize) -> f64 {
        let n = resolution.max(1);
        let mut best: f64 = 0.0;
        for p in &self.pieces {
            for i in 0..=n {
                let t = p.duration() * i as f64 / n as f64;
                best = best.max(p.vel(t).norm());
            }
        }
        best
    }

    /// States every `dt` seconds from 0, plus the exact end state.
    pub fn sample(&self, dt: f64) -> Vec<Sample> {
        let mut out = Vec::new();
        if self.pieces.is_empty() || !(dt > 0.0) {
            return out;
        }
        let total = self.total_duration();
        let mut k = 0usize;
        loop {
            let t = k as f64 * dt;
            if t >= total {
                break;
            }
            if let Some(state) = self.state(t) {
                out.push(Sample { t, state });
            }
            k += 1;
        }
        if let Some(state) = self.end_state() {
            out.push(Sample { t: total, state });
        }
        out
    }
}
