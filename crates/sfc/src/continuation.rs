//! Receding-horizon trajectory continuation.
//!
//! Purpose
//! - Decide the initial boundary state for each optimizer call from the
//!   trajectory in flight, and splice the result onto the committed prefix.
//!
//! Model
//! - `Empty`: plan from the measured state; on success commit the whole
//!   result and start the clock.
//! - `Flying`: locate the piece covering the elapsed time and plan from its
//!   *end* state, so the piece being flown is always finished as committed.
//!   On success keep pieces `0..=k` and append the new result; the clock is
//!   not restarted.
//! - Failures never touch the committed trajectory.

use tracing::{debug, info, warn};

use crate::corridor::Corridor;
use crate::error::{ContinuationError, OptimizeError};
use crate::geom::Point;
use crate::optimizer::{OptimizerParams, TrajectoryOptimizer};
use crate::trajectory::{BoundaryState, Trajectory};

/// Continuation parameters.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ContinuationCfg {
    /// Wall-clock seconds per trajectory second (execution slow-down factor).
    pub time_scale: f64,
    /// Extra trajectory time added when locating the current piece.
    pub lookahead: f64,
    /// Always plan from the measured state and overwrite (manual/teleop mode).
    pub reset_each_cycle: bool,
}

impl Default for ContinuationCfg {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            lookahead: 0.0,
            reset_each_cycle: false,
        }
    }
}

impl ContinuationCfg {
    /// `time_scale` must be positive and finite, `lookahead` finite.
    pub fn validate(&self) -> Result<(), ContinuationError> {
        if !(self.time_scale.is_finite() && self.time_scale > 0.0) {
            return Err(ContinuationError::Config(format!(
                "time scale must be positive, got {}",
                self.time_scale
            )));
        }
        if !self.lookahead.is_finite() {
            return Err(ContinuationError::Config(format!(
                "lookahead must be finite, got {}",
                self.lookahead
            )));
        }
        Ok(())
    }
}

/// Latest measured vehicle state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measured {
    pub pos: Point,
    pub vel: Option<Point>,
}

impl Measured {
    pub fn boundary(&self) -> BoundaryState {
        BoundaryState::new(self.pos, self.vel.unwrap_or_else(Point::zeros), Point::zeros())
    }
}

#[derive(Clone, Debug, Default)]
pub enum Phase {
    #[default]
    Empty,
    Flying { trajectory: Trajectory, start: f64 },
}

/// Initial condition chosen for one optimizer call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Handoff {
    pub initial: BoundaryState,
    /// Pieces of the committed trajectory to keep; `None` replaces it.
    pub keep: Option<usize>,
}

/// Outcome of a successful replan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpliceReport {
    pub kept_pieces: usize,
    pub new_pieces: usize,
    pub cost: f64,
    /// True when the committed trajectory was replaced and the clock restarted.
    pub restarted: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ContinuationManager {
    cfg: ContinuationCfg,
    phase: Phase,
}

impl ContinuationManager {
    pub fn new(cfg: ContinuationCfg) -> Self {
        Self {
            cfg,
            phase: Phase::Empty,
        }
    }

    #[inline]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    #[inline]
    pub fn is_flying(&self) -> bool {
        matches!(self.phase, Phase::Flying { .. })
    }

    pub fn committed(&self) -> Option<&Trajectory> {
        match &self.phase {
            Phase::Flying { trajectory, .. } => Some(trajectory),
            Phase::Empty => None,
        }
    }

    pub fn start_time(&self) -> Option<f64> {
        match self.phase {
            Phase::Flying { start, .. } => Some(start),
            Phase::Empty => None,
        }
    }

    /// Drop the committed trajectory (e.g. on a new goal or operator reset).
    pub fn reset(&mut self) {
        self.phase = Phase::Empty;
    }

    /// Trajectory time corresponding to wall-clock `now`.
    pub fn trajectory_time(&self, now: f64) -> Option<f64> {
        let start = self.start_time()?;
        Some((now - start) / self.cfg.time_scale + self.cfg.lookahead)
    }

    /// Boundary state for the next optimizer call.
    pub fn handoff(&self, measured: &Measured, now: f64) -> Handoff {
        let fresh = Handoff {
            initial: measured.boundary(),
            keep: None,
        };
        if self.cfg.reset_each_cycle {
            return fresh;
        }
        let Phase::Flying { trajectory, start } = &self.phase else {
            return fresh;
        };
        let t = (now - start) / self.cfg.time_scale + self.cfg.lookahead;
        match trajectory.locate_piece(t) {
            Some((k, _)) => Handoff {
                initial: trajectory.pieces()[k].end_state(),
                keep: Some(k + 1),
            },
            None => fresh,
        }
    }

    /// Optimize towards `goal` through `corridor` and commit on success.
    pub fn replan<O: TrajectoryOptimizer + ?Sized>(
        &mut self,
        optimizer: &O,
        measured: &Measured,
        goal: &BoundaryState,
        corridor: &Corridor,
        params: &OptimizerParams,
        now: f64,
    ) -> Result<SpliceReport, ContinuationError> {
        self.cfg.validate()?;
        if corridor.is_empty() {
            return Err(ContinuationError::EmptyCorridor);
        }
        let handoff = self.handoff(measured, now);
        let out = optimizer
            .optimize(&handoff.initial, goal, corridor, params)
            .and_then(|o| {
                if o.cost.is_finite() && !o.trajectory.is_empty() {
                    Ok(o)
                } else {
                    Err(OptimizeError::NonFiniteCost(o.cost))
                }
            })
            .map_err(|e| {
                warn!(error = %e, "optimizer failed; keeping committed trajectory");
                ContinuationError::Solver(e)
            })?;

        let new_pieces = out.trajectory.piece_count();
        if let (Some(keep), Phase::Flying { trajectory, .. }) = (handoff.keep, &mut self.phase) {
            trajectory.truncate(keep);
            trajectory.append(out.trajectory);
            debug!(keep, new_pieces, "spliced trajectory");
            return Ok(SpliceReport {
                kept_pieces: keep,
                new_pieces,
                cost: out.cost,
                restarted: false,
            });
        }
        info!(new_pieces, "trajectory overwritten");
        self.phase = Phase::Flying {
            trajectory: out.trajectory,
            start: now,
        };
        Ok(SpliceReport {
            kept_pieces: 0,
            new_pieces,
            cost: out.cost,
            restarted: true,
        })
    }
}

#[cfg(test)]
mod tests;
