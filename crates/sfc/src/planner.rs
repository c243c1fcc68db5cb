//! Replanning loop: shared inputs, one cycle, and a periodic driver.
//!
//! Purpose
//! - Ingestion (odometry, range scans, goals) writes `SharedInputs` from any
//!   thread; each cycle takes one owned `InputSnapshot` and runs
//!   path → corridor → simplify → optimize → splice on it.
//!
//! Invariants
//! - The input lock is held only for the snapshot clone, never while planning.
//! - Every failure short-circuits the cycle with a `PlanError`; the committed
//!   trajectory stays with the continuation manager.
//!
//! Code cross-refs: `corridor::CoverMode`, `obstacles::padded_scan`,
//! `continuation::ContinuationManager`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::continuation::{ContinuationCfg, ContinuationManager, Measured, SpliceReport};
use crate::corridor::{Corridor, CoverCfg, CoverMode, Simplifier};
use crate::error::{ErrorKind, PlanError, Result};
use crate::geom::Point;
use crate::inflate::Inflator;
use crate::obstacles::{collect_scan, occupied_points, padded_scan, LaserScan, Pose2};
use crate::occupancy::OccupancySource;
use crate::optimizer::{OptimizerParams, TrajectoryOptimizer};
use crate::path::PathSource;
use crate::trajectory::{BoundaryState, Trajectory};

/// Everything one replanning cycle is parameterized by.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PlannerCfg {
    pub cover: CoverCfg,
    pub cover_mode: CoverMode,
    pub simplifier: Simplifier,
    /// Overlap depth required between kept regions when simplifying.
    pub overlap_tol: f64,
    pub optimizer: OptimizerParams,
    pub continuation: ContinuationCfg,
    /// Target cycle period in seconds.
    pub period_s: f64,
    /// Half-height of the z-slab that bounds planar problems.
    pub slab_half_height: f64,
    /// Include every occupied map cell as an obstacle point.
    pub map_obstacles: bool,
    /// Ray-cast scan points through the map from the vehicle and keep the
    /// first blocked cell instead of the raw hit.
    pub pad_scan: bool,
}

impl Default for PlannerCfg {
    fn default() -> Self {
        Self {
            cover: CoverCfg::default(),
            cover_mode: CoverMode::default(),
            simplifier: Simplifier::default(),
            overlap_tol: 0.01,
            optimizer: OptimizerParams::default(),
            continuation: ContinuationCfg::default(),
            period_s: 0.1,
            slab_half_height: 0.1,
            map_obstacles: true,
            pad_scan: false,
        }
    }
}

impl PlannerCfg {
    /// Reject settings no cycle could run with.
    pub fn validate(&self) -> Result<()> {
        self.continuation
            .validate()
            .map_err(|e| PlanError::Precondition(e.to_string()))?;
        if !(self.period_s.is_finite() && self.period_s >= 0.0) {
            return Err(PlanError::Precondition(format!(
                "period must be non-negative, got {}",
                self.period_s
            )));
        }
        if !(self.slab_half_height.is_finite() && self.slab_half_height > 0.0) {
            return Err(PlanError::Precondition(format!(
                "slab half-height must be positive, got {}",
                self.slab_half_height
            )));
        }
        Ok(())
    }
}

/// Owned copy of the latest inputs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputSnapshot {
    pub pose: Option<Pose2>,
    pub velocity: Option<Point>,
    /// World-frame obstacle points from the most recent scan.
    pub scan: Vec<Point>,
    pub goal: Option<Point>,
}

/// Latest inputs, written by ingestion callbacks and read once per cycle.
#[derive(Debug, Default)]
pub struct SharedInputs {
    inner: RwLock<InputSnapshot>,
}

impl SharedInputs {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, f: impl FnOnce(&mut InputSnapshot)) {
        match self.inner.write() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    pub fn set_pose(&self, pose: Pose2) {
        self.update(|s| s.pose = Some(pose));
    }

    /// Pose plus forward speed along the heading.
    pub fn update_odometry(&self, pose: Pose2, forward_speed: f64) {
        self.update(|s| {
            s.pose = Some(pose);
            s.velocity = Some(pose.forward_velocity(forward_speed));
        });
    }

    /// Convert `scan` at the current pose. Ignored (returns false) before the
    /// first pose arrives.
    pub fn set_scan(&self, scan: &LaserScan) -> bool {
        let mut accepted = false;
        self.update(|s| {
            if let Some(pose) = s.pose {
                s.scan = collect_scan(scan, &pose);
                accepted = true;
            }
        });
        accepted
    }

    pub fn set_obstacles(&self, points: Vec<Point>) {
        self.update(|s| s.scan = points);
    }

    pub fn set_goal(&self, goal: Point) {
        self.update(|s| s.goal = Some(goal));
    }

    pub fn clear_goal(&self) {
        self.update(|s| s.goal = None);
    }

    pub fn snapshot(&self) -> InputSnapshot {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Outputs of one successful cycle, for publishing.
#[derive(Clone, Debug)]
pub struct CycleReport {
    pub path: Vec<Point>,
    /// Corridor as built, before simplification.
    pub raw_regions: usize,
    pub corridor: Corridor,
    pub splice: SpliceReport,
}

/// Drives the pipeline over an occupancy source `M`, path source `P`,
/// inflator `I` and optimizer `O`.
pub struct Planner<M, P, I, O> {
    pub map: M,
    pub paths: P,
    pub inflator: I,
    pub optimizer: O,
    pub cfg: PlannerCfg,
    continuation: ContinuationManager,
}

impl<M, P, I, O> Planner<M, P, I, O>
where
    M: OccupancySource,
    P: PathSource,
    I: Inflator,
    O: TrajectoryOptimizer,
{
    pub fn new(map: M, paths: P, inflator: I, optimizer: O, cfg: PlannerCfg) -> Self {
        Self {
            map,
            paths,
            inflator,
            optimizer,
            continuation: ContinuationManager::new(cfg.continuation),
            cfg,
        }
    }

    pub fn trajectory(&self) -> Option<&Trajectory> {
        self.continuation.committed()
    }

    pub fn continuation(&self) -> &ContinuationManager {
        &self.continuation
    }

    /// Forget the committed trajectory; the next cycle plans from the measurement.
    pub fn reset(&mut self) {
        self.continuation.reset();
    }

    /// Map extents widened to the z-slab.
    pub fn extents(&self) -> (Point, Point) {
        let (mut lo, mut hi) = self.map.extents();
        lo.z = -self.cfg.slab_half_height;
        hi.z = self.cfg.slab_half_height;
        (lo, hi)
    }

    /// One replanning cycle at time `now` (seconds, caller's monotonic clock).
    pub fn run_cycle(&mut self, snap: &InputSnapshot, now: f64) -> Result<CycleReport> {
        let pose = snap.pose.ok_or(PlanError::NotReady("pose"))?;
        let goal = snap.goal.ok_or(PlanError::NotReady("goal"))?;
        let start = pose.position();

        let path = self.paths.plan(&start, &goal).ok_or(PlanError::NoPath)?;
        if path.is_empty() {
            return Err(PlanError::NoPath);
        }

        let mut obstacles = if self.cfg.map_obstacles {
            occupied_points(&self.map)
        } else {
            Vec::new()
        };
        if self.cfg.pad_scan {
            obstacles.extend(padded_scan(&self.map, &start, &snap.scan));
        } else {
            obstacles.extend_from_slice(&snap.scan);
        }

        let (lo, hi) = self.extents();
        let raw = self
            .cfg
            .cover_mode
            .build(&path, &obstacles, &lo, &hi, &self.cfg.cover, &self.inflator)?;
        let corridor = self
            .cfg
            .simplifier
            .apply(&raw, self.cfg.overlap_tol, &self.cfg.cover.geom);
        debug!(
            path = path.len(),
            obstacles = obstacles.len(),
            raw = raw.len(),
            kept = corridor.len(),
            "corridor ready"
        );

        let measured = Measured {
            pos: start,
            vel: snap.velocity,
        };
        let splice = self.continuation.replan(
            &self.optimizer,
            &measured,
            &BoundaryState::at_rest(goal),
            &corridor,
            &self.cfg.optimizer,
            now,
        )?;

        Ok(CycleReport {
            path,
            raw_regions: raw.len(),
            corridor,
            splice,
        })
    }

    /// Run cycles every `period_s` until `stop` is set. `publish` sees every
    /// successful cycle together with the committed trajectory.
    ///
    /// An overrunning cycle delays the next one; cycles are never skipped or
    /// run concurrently.
    pub fn spin<F>(&mut self, inputs: &SharedInputs, stop: &AtomicBool, mut publish: F)
    where
        F: FnMut(&CycleReport, &Trajectory),
    {
        let clock = Instant::now();
        let period = Duration::try_from_secs_f64(self.cfg.period_s).unwrap_or_default();
        info!(period_s = self.cfg.period_s, "replanning loop started");
        while !stop.load(Ordering::Relaxed) {
            let tick = Instant::now();
            let snap = inputs.snapshot();
            match self.run_cycle(&snap, clock.elapsed().as_secs_f64()) {
                Ok(report) => {
                    info!(
                        regions = report.corridor.len(),
                        kept = report.splice.kept_pieces,
                        new = report.splice.new_pieces,
                        cost = report.splice.cost,
                        elapsed_ms = tick.elapsed().as_secs_f64() * 1e3,
                        "cycle done"
                    );
                    if let Some(traj) = self.continuation.committed() {
                        publish(&report, traj);
                    }
                }
                Err(PlanError::NotReady(what)) => debug!(what, "waiting for inputs"),
                Err(e) => match e.kind() {
                    ErrorKind::PreconditionViolation => error!(error = %e, "cycle aborted"),
                    ErrorKind::SolverFailure => warn!(error = %e, "cycle failed; trajectory retained"),
                    ErrorKind::DegenerateInput => warn!(error = %e, "degenerate cycle input"),
                },
            }
            if let Some(rest) = period.checked_sub(tick.elapsed()) {
                thread::sleep(rest);
            }
        }
        info!("replanning loop stopped");
    }
}
