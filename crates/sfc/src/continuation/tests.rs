use std::cell::{Cell, RefCell};

use nalgebra::vector;

use super::*;
use crate::geom::{Aabb, Polytope};
use crate::optimizer::Optimized;
use crate::trajectory::Piece;

/// Straight-line stub: `pieces` equal hops from `initial` to `fin`,
/// recording the boundary state it was asked to start from.
struct LineOptimizer {
    pieces: usize,
    cost: f64,
    fail: Cell<bool>,
    seen: RefCell<Vec<BoundaryState>>,
}

impl LineOptimizer {
    fn new(pieces: usize) -> Self {
        Self {
            pieces,
            cost: 1.0,
            fail: Cell::new(false),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl TrajectoryOptimizer for LineOptimizer {
    fn optimize(
        &self,
        initial: &BoundaryState,
        fin: &BoundaryState,
        _corridor: &Corridor,
        _params: &OptimizerParams,
    ) -> Result<Optimized, OptimizeError> {
        self.seen.borrow_mut().push(*initial);
        if self.fail.get() {
            return Err(OptimizeError::Setup("forced".into()));
        }
        let n = self.pieces as f64;
        let mut states = vec![*initial];
        for k in 1..self.pieces {
            let pos = initial.pos + (fin.pos - initial.pos) * (k as f64 / n);
            states.push(BoundaryState::new(pos, vector![0.5, 0.0, 0.0], Point::zeros()));
        }
        states.push(*fin);
        let pieces = states.windows(2).map(|s| Piece::hermite(&s[0], &s[1], 1.0)).collect();
        Ok(Optimized {
            trajectory: Trajectory::new(pieces),
            cost: self.cost,
        })
    }
}

fn corridor() -> Corridor {
    Corridor::new(vec![Polytope::from_box(&Aabb::new(
        vector![-1.0, -1.0, -1.0],
        vector![20.0, 1.0, 1.0],
    ))])
}

fn measured(x: f64) -> Measured {
    Measured {
        pos: vector![x, 0.0, 0.0],
        vel: None,
    }
}

fn goal(x: f64) -> BoundaryState {
    BoundaryState::at_rest(vector![x, 0.0, 0.0])
}

#[test]
fn empty_phase_commits_and_starts_clock() {
    let opt = LineOptimizer::new(4);
    let mut mgr = ContinuationManager::new(ContinuationCfg::default());
    let m = Measured {
        pos: vector![0.0, 0.0, 0.0],
        vel: Some(vector![0.3, 0.0, 0.0]),
    };
    let rep = mgr
        .replan(&opt, &m, &goal(4.0), &corridor(), &OptimizerParams::default(), 10.0)
        .unwrap();
    assert!(rep.restarted);
    assert_eq!(rep.new_pieces, 4);
    assert_eq!(mgr.start_time(), Some(10.0));
    // Measured velocity is used; acceleration starts at zero.
    let seen = opt.seen.borrow()[0];
    assert_eq!(seen.vel, vector![0.3, 0.0, 0.0]);
    assert_eq!(seen.acc, Point::zeros());
}

#[test]
fn mid_flight_splice_keeps_prefix_through_current_piece() {
    let first = LineOptimizer::new(4);
    let mut mgr = ContinuationManager::new(ContinuationCfg::default());
    mgr.replan(&first, &measured(0.0), &goal(4.0), &corridor(), &OptimizerParams::default(), 0.0)
        .unwrap();
    let before = mgr.committed().unwrap().clone();

    // Elapsed 2.5 s lands in piece 2 of four 1 s pieces.
    let second = LineOptimizer::new(2);
    let rep = mgr
        .replan(&second, &measured(2.4), &goal(8.0), &corridor(), &OptimizerParams::default(), 2.5)
        .unwrap();
    assert!(!rep.restarted);
    assert_eq!(rep.kept_pieces, 3);
    assert_eq!(rep.new_pieces, 2);

    let after = mgr.committed().unwrap();
    assert_eq!(after.piece_count(), 5);
    assert_eq!(&after.pieces()[..3], &before.pieces()[..3]);
    // The optimizer started from the end of piece 2, not from the measurement.
    let handed = second.seen.borrow()[0];
    assert!(handed.max_abs_diff(&before.pieces()[2].end_state()) < 1e-12);
    // C2 continuity across the splice.
    let joint = after.pieces()[2].end_state();
    assert!(joint.max_abs_diff(&after.pieces()[3].start_state()) < 1e-9);
    assert!(after.end_state().unwrap().max_abs_diff(&goal(8.0)) < 1e-9);
    // Clock is not restarted.
    assert_eq!(mgr.start_time(), Some(0.0));
}

#[test]
fn time_scale_and_lookahead_shift_the_located_piece() {
    let opt = LineOptimizer::new(4);
    let cfg = ContinuationCfg {
        time_scale: 5.0,
        lookahead: 0.1,
        reset_each_cycle: false,
    };
    let mut mgr = ContinuationManager::new(cfg);
    mgr.replan(&opt, &measured(0.0), &goal(4.0), &corridor(), &OptimizerParams::default(), 0.0)
        .unwrap();
    // 9.5 s wall clock -> 1.9 + 0.1 = 2.0 s trajectory time -> piece 1.
    assert!((mgr.trajectory_time(9.5).unwrap() - 2.0).abs() < 1e-12);
    assert_eq!(mgr.handoff(&measured(0.0), 9.5).keep, Some(2));
}

#[test]
fn failure_leaves_committed_trajectory_untouched() {
    let opt = LineOptimizer::new(4);
    let mut mgr = ContinuationManager::new(ContinuationCfg::default());
    mgr.replan(&opt, &measured(0.0), &goal(4.0), &corridor(), &OptimizerParams::default(), 0.0)
        .unwrap();
    let before = mgr.committed().unwrap().clone();

    opt.fail.set(true);
    let err = mgr
        .replan(&opt, &measured(1.0), &goal(9.0), &corridor(), &OptimizerParams::default(), 1.5)
        .unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::SolverFailure);
    assert_eq!(mgr.committed(), Some(&before));
    assert_eq!(mgr.start_time(), Some(0.0));
}

#[test]
fn non_finite_cost_is_rejected() {
    let mut opt = LineOptimizer::new(2);
    opt.cost = f64::INFINITY;
    let mut mgr = ContinuationManager::new(ContinuationCfg::default());
    let err = mgr
        .replan(&opt, &measured(0.0), &goal(4.0), &corridor(), &OptimizerParams::default(), 0.0)
        .unwrap_err();
    assert!(matches!(err, ContinuationError::Solver(OptimizeError::NonFiniteCost(_))));
    assert!(!mgr.is_flying());
}

#[test]
fn empty_corridor_is_degenerate() {
    let opt = LineOptimizer::new(2);
    let mut mgr = ContinuationManager::default();
    let err = mgr
        .replan(&opt, &measured(0.0), &goal(4.0), &Corridor::default(), &OptimizerParams::default(), 0.0)
        .unwrap_err();
    assert_eq!(err, ContinuationError::EmptyCorridor);
    assert!(opt.seen.borrow().is_empty());
}

#[test]
fn reset_mode_always_overwrites() {
    let opt = LineOptimizer::new(3);
    let cfg = ContinuationCfg {
        reset_each_cycle: true,
        ..ContinuationCfg::default()
    };
    let mut mgr = ContinuationManager::new(cfg);
    mgr.replan(&opt, &measured(0.0), &goal(3.0), &corridor(), &OptimizerParams::default(), 0.0)
        .unwrap();
    let rep = mgr
        .replan(&opt, &measured(1.2), &goal(3.0), &corridor(), &OptimizerParams::default(), 1.0)
        .unwrap();
    assert!(rep.restarted);
    assert_eq!(mgr.start_time(), Some(1.0));
    assert_eq!(opt.seen.borrow()[1].pos, vector![1.2, 0.0, 0.0]);
}

#[test]
fn non_positive_time_scale_is_rejected() {
    let opt = LineOptimizer::new(2);
    for time_scale in [0.0, -1.0, f64::NAN] {
        let cfg = ContinuationCfg {
            time_scale,
            ..ContinuationCfg::default()
        };
        assert!(cfg.validate().is_err());
        let mut mgr = ContinuationManager::new(cfg);
        let err = mgr
            .replan(&opt, &measured(0.0), &goal(4.0), &corridor(), &OptimizerParams::default(), 0.0)
            .unwrap_err();
        assert!(matches!(err, ContinuationError::Config(_)));
        assert_eq!(err.kind(), crate::error::ErrorKind::PreconditionViolation);
        assert!(!mgr.is_flying());
    }
    assert!(opt.seen.borrow().is_empty());

    let bad_lookahead = ContinuationCfg {
        lookahead: f64::INFINITY,
        ..ContinuationCfg::default()
    };
    assert!(bad_lookahead.validate().is_err());
    assert!(ContinuationCfg::default().validate().is_ok());
}
