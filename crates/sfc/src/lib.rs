//! Safe flight corridors and receding-horizon trajectory continuation.
//!
//! Pipeline per replanning cycle:
//! reference path + obstacles → `corridor::build_corridor` →
//! `corridor::Simplifier` → `continuation::ContinuationManager` → trajectory.
//!
//! Collaborators sit behind traits (`OccupancySource`, `PathSource`,
//! `Inflator`, `TrajectoryOptimizer`); the crate ships a small reference
//! implementation of each so the loop runs end to end.
//!
//! Conventions
//! - Halfplane rows `n·x + d ≤ 0`; points are `nalgebra::Vector3<f64>`.
//! - Planar problems use `z = 0` inside a thin z-slab.
//! - Time is `f64` seconds on a caller-supplied monotonic clock.

pub mod continuation;
pub mod corridor;
pub mod error;
pub mod geom;
pub mod inflate;
pub mod membership;
pub mod obstacles;
pub mod occupancy;
pub mod optimizer;
pub mod path;
pub mod planner;
pub mod trajectory;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use corridor::Corridor;
pub use error::{ErrorKind, PlanError};
pub use geom::{Aabb, GeomCfg, Halfplane, Point, Polytope};
pub use trajectory::{BoundaryState, Trajectory};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::continuation::{ContinuationCfg, ContinuationManager, Measured, SpliceReport};
    pub use crate::corridor::{
        build_corridor, cover_by_seeds, minimal_cover, shortcut, BridgeTest, Corridor, CoverCfg,
        CoverMode, Simplifier,
    };
    pub use crate::error::{
        ContinuationError, CorridorError, ErrorKind, InflateError, OptimizeError, PlanError,
    };
    pub use crate::geom::{Aabb, GeomCfg, Halfplane, Point, Polytope};
    pub use crate::inflate::{Inflator, Seed, SeparatingInflator};
    pub use crate::obstacles::{collect_scan, occupied_points, padded_scan, LaserScan, Pose2};
    pub use crate::occupancy::{OccupancyGrid, OccupancySource};
    pub use crate::optimizer::{HermiteOptimizer, Optimized, OptimizerParams, TrajectoryOptimizer};
    pub use crate::path::{GridAstar, PathSource};
    pub use crate::planner::{CycleReport, InputSnapshot, Planner, PlannerCfg, SharedInputs};
    pub use crate::trajectory::{BoundaryState, Piece, Sample, Trajectory};
}
