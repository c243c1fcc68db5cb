//! Trajectory optimizer seam and a waypoint-through-overlaps reference optimizer.
//!
//! The production optimizer (corridor-constrained minimum-control polynomial
//! optimization) is external; the continuation manager only consumes the
//! `TrajectoryOptimizer` contract. `HermiteOptimizer` routes through one
//! interior point of every adjacent overlap and joins them with quintic
//! Hermite pieces.

use tracing::debug;

use crate::corridor::Corridor;
use crate::error::OptimizeError;
use crate::geom::{GeomCfg, Point};
use crate::trajectory::{BoundaryState, Piece, Trajectory};

/// Tuning parameters forwarded to the optimizer.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct OptimizerParams {
    /// Weight of total duration in the cost.
    pub time_weight: f64,
    /// Speed bound used to time pieces.
    pub max_vel: f64,
    /// Samples per piece for cost integrals.
    pub integral_resolution: usize,
    /// Depth of waypoints inside adjacent-region overlaps.
    pub overlap_depth: f64,
    /// Lower bound on any piece duration.
    pub min_piece_duration: f64,
}

impl Default for OptimizerParams {
    fn default() -> Self {
        Self {
            time_weight: 20.0,
            max_vel: 0.5,
            integral_resolution: 16,
            overlap_depth: 1e-3,
            min_piece_duration: 0.1,
        }
    }
}

/// Successful optimizer output.
#[derive(Clone, Debug)]
pub struct Optimized {
    pub trajectory: Trajectory,
    pub cost: f64,
}

/// Optimizer contract: `Ok` trajectories start exactly at `initial` and end at `fin`.
pub trait TrajectoryOptimizer {
    fn optimize(
        &self,
        initial: &BoundaryState,
        fin: &BoundaryState,
        corridor: &Corridor,
        params: &OptimizerParams,
    ) -> Result<Optimized, OptimizeError>;
}

impl<T: TrajectoryOptimizer + ?Sized> TrajectoryOptimizer for &T {
    fn optimize(
        &self,
        initial: &BoundaryState,
        fin: &BoundaryState,
        corridor: &Corridor,
        params: &OptimizerParams,
    ) -> Result<Optimized, OptimizeError> {
        (**self).optimize(initial, fin, corridor, params)
    }
}

/// Reference optimizer; see module docs. Cost is
/// `time_weight · T + ∫ |jerk|² dt` (trapezoid over `integral_resolution` samples).
#[derive(Clone, Copy, Debug, Default)]
pub struct HermiteOptimizer {
    pub geom: GeomCfg,
}

impl HermiteOptimizer {
    fn waypoints(
        &self,
        initial: &BoundaryState,
        fin: &BoundaryState,
        corridor: &Corridor,
        params: &OptimizerParams,
    ) -> Result<Vec<Point>, OptimizeError> {
        let (Some(first), Some(last)) = (corridor.first(), corridor.last()) else {
            return Err(OptimizeError::Setup("empty corridor".into()));
        };
        if !first.contains_eps(&initial.pos, self.geom.eps_seed) {
            return Err(OptimizeError::Setup("initial position outside first region".into()));
        }
        if !last.contains_eps(&fin.pos, self.geom.eps_seed) {
            return Err(OptimizeError::Setup("final position outside last region".into()));
        }
        let mut out = Vec::with_capacity(corridor.len() + 1);
        out.push(initial.pos);
        for (k, w) in corridor.polys.windows(2).enumerate() {
            let x = w[0]
                .intersect(&w[1])
                .interior_point(params.overlap_depth, &self.geom)
                .ok_or_else(|| OptimizeError::Setup(format!("regions {k} and {} do not overlap", k + 1)))?;
            out.push(x);
        }
        out.push(fin.pos);
        Ok(out)
    }
}

impl TrajectoryOptimizer for HermiteOptimizer {
    fn optimize(
        &self,
        initial: &BoundaryState,
        fin: &BoundaryState,
        corridor: &Corridor,
        params: &OptimizerParams,
    ) -> Result<Optimized, OptimizeError> {
        if !(params.max_vel > 0.0) {
            return Err(OptimizeError::Setup(format!("max_vel must be positive, got {}", params.max_vel)));
        }
        let wps = self.waypoints(initial, fin, corridor, params)?;
        let n = wps.len();
        let mut states = Vec::with_capacity(n);
        states.push(*initial);
        for k in 1..n - 1 {
            let dir = (wps[k + 1] - wps[k - 1]).try_normalize(1e-12).unwrap_or_else(Point::zeros);
            states.push(BoundaryState::new(wps[k], dir * params.max_vel, Point::zeros()));
        }
        states.push(*fin);

        let pieces: Vec<Piece> = states
            .windows(2)
            .map(|s| {
                let dist = (s[1].pos - s[0].pos).norm();
                let duration = (dist / params.max_vel).max(params.min_piece_duration);
                Piece::hermite(&s[0], &s[1], duration)
            })
            .collect();
        let trajectory = Trajectory::new(pieces);

        let res = params.integral_resolution.max(1);
        let mut effort = 0.0;
        for p in trajectory.pieces() {
            let h = p.duration() / res as f64;
            for i in 0..res {
                let j0 = p.jerk(h * i as f64).norm_squared();
                let j1 = p.jerk(h * (i + 1) as f64).norm_squared();
                effort += 0.5 * h * (j0 + j1);
            }
        }
        let cost = params.time_weight * trajectory.total_duration() + effort;
        if !cost.is_finite() {
            return Err(OptimizeError::NonFiniteCost(cost));
        }
        debug!(pieces = trajectory.piece_count(), cost, "hermite optimize");
        Ok(Optimized { trajectory, cost })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Aabb, Polytope};
    use nalgebra::vector;

    fn corridor() -> Corridor {
        Corridor::new(vec![
            Polytope::from_box(&Aabb::new(vector![-1.0, -1.0, -0.1], vector![3.0, 1.0, 0.1])),
            Polytope::from_box(&Aabb::new(vector![2.0, -1.0, -0.1], vector![3.0, 5.0, 0.1])),
        ])
    }

    #[test]
    fn routes_through_overlap_and_hits_boundaries() {
        let start = BoundaryState::at_rest(vector![0.0, 0.0, 0.0]);
        let goal = BoundaryState::at_rest(vector![2.5, 4.0, 0.0]);
        let out = HermiteOptimizer::default()
            .optimize(&start, &goal, &corridor(), &OptimizerParams::default())
            .unwrap();
        let traj = &out.trajectory;
        assert_eq!(traj.piece_count(), 2);
        assert!(traj.start_state().unwrap().max_abs_diff(&start) < 1e-9);
        assert!(traj.end_state().unwrap().max_abs_diff(&goal) < 1e-9);
        // Junction lies in the overlap x ∈ [2, 3], y ∈ [-1, 1].
        let mid = traj.pieces()[1].start_state();
        assert!((mid.pos - vector![2.5, 0.0, 0.0]).norm() < 1e-9);
        assert!(out.cost.is_finite() && out.cost > 0.0);
        // Continuity at the junction.
        assert!(traj.pieces()[0].end_state().max_abs_diff(&mid) < 1e-9);
    }

    #[test]
    fn rejects_start_outside_corridor() {
        let err = HermiteOptimizer::default()
            .optimize(
                &BoundaryState::at_rest(vector![-5.0, 0.0, 0.0]),
                &BoundaryState::at_rest(vector![2.5, 4.0, 0.0]),
                &corridor(),
                &OptimizerParams::default(),
            )
            .unwrap_err();
        assert!(matches!(err, OptimizeError::Setup(_)));
    }

    #[test]
    fn rejects_disconnected_regions() {
        let broken = Corridor::new(vec![
            Polytope::from_box(&Aabb::new(vector![-1.0, -1.0, -0.1], vector![1.0, 1.0, 0.1])),
            Polytope::from_box(&Aabb::new(vector![2.0, -1.0, -0.1], vector![3.0, 1.0, 0.1])),
        ]);
        let err = HermiteOptimizer::default()
            .optimize(
                &BoundaryState::at_rest(vector![0.0, 0.0, 0.0]),
                &BoundaryState::at_rest(vector![2.5, 0.0, 0.0]),
                &broken,
                &OptimizerParams::default(),
            )
            .unwrap_err();
        assert!(matches!(err, OptimizeError::Setup(_)));
    }
}
