//! Corridor construction along a reference path.
//!
//! - `build_corridor`: convex cover. Advance a cursor along the path by at
//!   most `progress`, inflate the windowed segment, bridge with a point-seeded
//!   gap region when consecutive regions do not meet at the shared endpoint.
//! - `cover_by_seeds`: seed-driven cover. Re-seed at the first path vertex
//!   the last region does not contain until the goal is covered.

use tracing::{debug, warn};

use super::Corridor;
use crate::error::CorridorError;
use crate::geom::{Aabb, GeomCfg, Point, Polytope};
use crate::inflate::{Inflator, Seed};
use crate::membership::{contains, first_uncovered};

/// When two consecutive regions count as bridged at their shared endpoint `a`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BridgeTest {
    /// `a` is inside both regions and the regions overlap with depth `> tol`.
    Overlap { tol: f64 },
    /// Gap when at least `min` rows across both regions are near-active at `a`
    /// (value `> -eps`).
    ActiveCount { min: usize, eps: f64 },
}

impl Default for BridgeTest {
    fn default() -> Self {
        BridgeTest::Overlap { tol: 0.01 }
    }
}

impl BridgeTest {
    /// True if a gap region has to be inserted between `prev` and `next`.
    pub fn needs_gap(&self, prev: &Polytope, next: &Polytope, a: &Point, cfg: &GeomCfg) -> bool {
        match *self {
            BridgeTest::Overlap { tol } => {
                let inside = prev.contains_eps(a, cfg.eps_seed) && next.contains_eps(a, cfg.eps_seed);
                !inside || !prev.overlaps(next, tol, cfg)
            }
            BridgeTest::ActiveCount { min, eps } => {
                prev.count_near_active(a, eps) + next.count_near_active(a, eps) >= min
            }
        }
    }
}

/// Cover parameters.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct CoverCfg {
    /// Maximum arc length advanced per region.
    pub progress: f64,
    /// Window padding on each side of the segment.
    pub half_window: f64,
    pub bridge: BridgeTest,
    /// Iteration cap for `cover_by_seeds`.
    pub max_iters: usize,
    pub geom: GeomCfg,
}

impl Default for CoverCfg {
    fn default() -> Self {
        Self {
            progress: 7.0,
            half_window: 5.0,
            bridge: BridgeTest::default(),
            max_iters: 1000,
            geom: GeomCfg::default(),
        }
    }
}

impl CoverCfg {
    fn validate(&self) -> Result<(), CorridorError> {
        if !(self.progress.is_finite() && self.progress > 0.0) {
            return Err(CorridorError::Precondition(format!(
                "progress step must be positive, got {}",
                self.progress
            )));
        }
        if !(self.half_window.is_finite() && self.half_window > 0.0) {
            return Err(CorridorError::Precondition(format!(
                "half window must be positive, got {}",
                self.half_window
            )));
        }
        Ok(())
    }
}

/// Corridor construction strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoverMode {
    /// Fixed-progress segments along the path, see `build_corridor`.
    #[default]
    Convex,
    /// Point seeds at uncovered path vertices, see `cover_by_seeds`.
    Seeds,
}

impl CoverMode {
    pub fn build<I: Inflator + ?Sized>(
        &self,
        path: &[Point],
        obstacles: &[Point],
        low: &Point,
        high: &Point,
        cfg: &CoverCfg,
        inflator: &I,
    ) -> Result<Corridor, CorridorError> {
        match self {
            CoverMode::Convex => build_corridor(path, obstacles, low, high, cfg, inflator),
            CoverMode::Seeds => cover_by_seeds(path, obstacles, low, high, cfg, inflator),
        }
    }
}

/// Obstacles strictly inside the window.
pub fn filter_obstacles(bbox: &Aabb, obstacles: &[Point]) -> Vec<Point> {
    obstacles
        .iter()
        .filter(|p| bbox.contains_strict(p))
        .copied()
        .collect()
}

/// Convex cover of `path` within the map extents `[low, high]`.
///
/// Pre: `path` non-empty, `path[0]` inside the map extents.
/// Post: regions are path-ordered; each adjacent pair meets either directly or
/// through an inserted gap region. A single-point path has zero length and
/// yields an empty corridor. Any inflation failure aborts the whole build.
pub fn build_corridor<I: Inflator + ?Sized>(
    path: &[Point],
    obstacles: &[Point],
    low: &Point,
    high: &Point,
    cfg: &CoverCfg,
    inflator: &I,
) -> Result<Corridor, CorridorError> {
    cfg.validate()?;
    let Some(&start) = path.first() else {
        return Err(CorridorError::Precondition("empty path".into()));
    };
    let start_box = Aabb::around_segment(&start, &start, cfg.half_window, low, high);
    if start_box.is_empty() || !start_box.contains_strict(&start) {
        return Err(CorridorError::Precondition(format!(
            "path start {:?} outside map extents",
            start.as_slice()
        )));
    }

    if path.len() == 1 {
        debug!("zero-length path; empty corridor");
        return Ok(Corridor::default());
    }

    let mut polys: Vec<Polytope> = Vec::new();

    let mut b = start;
    let mut i = 1usize;
    let mut step = 0usize;
    while i < path.len() {
        let a = b;
        let to_vertex = path[i] - a;
        if to_vertex.norm() > cfg.progress {
            b = a + to_vertex.normalize() * cfg.progress;
        } else {
            b = path[i];
            i += 1;
        }

        let bbox = Aabb::around_segment(&a, &b, cfg.half_window, low, high);
        let pc = filter_obstacles(&bbox, obstacles);
        debug!(step, obstacles = pc.len(), "cover step");
        let hp = inflate_step(inflator, &bbox, &pc, Seed::Segment(a, b), step)?;

        if let Some(prev) = polys.last() {
            if cfg.bridge.needs_gap(prev, &hp, &a, &cfg.geom) {
                let gap = inflate_step(inflator, &bbox, &pc, Seed::Point(a), step)?;
                debug!(step, "inserted gap region");
                polys.push(gap);
            }
        }
        polys.push(hp);
        step += 1;
    }
    Ok(Corridor::new(polys))
}

/// Seed-driven cover: grow point-seeded regions until the last one holds the goal.
///
/// Each seed gets a window of `half_window` around it. Fails with a
/// precondition error when `max_iters` regions do not reach the goal.
pub fn cover_by_seeds<I: Inflator + ?Sized>(
    path: &[Point],
    obstacles: &[Point],
    low: &Point,
    high: &Point,
    cfg: &CoverCfg,
    inflator: &I,
) -> Result<Corridor, CorridorError> {
    cfg.validate()?;
    let (Some(&start), Some(&goal)) = (path.first(), path.last()) else {
        return Err(CorridorError::Precondition("empty path".into()));
    };
    let grow = |seed: Point, step: usize| -> Result<Polytope, CorridorError> {
        let bbox = Aabb::around_segment(&seed, &seed, cfg.half_window, low, high);
        if bbox.is_empty() || !bbox.contains_strict(&seed) {
            return Err(CorridorError::Precondition(format!(
                "seed {:?} outside map extents",
                seed.as_slice()
            )));
        }
        let pc = filter_obstacles(&bbox, obstacles);
        inflate_step(inflator, &bbox, &pc, Seed::Point(seed), step)
    };

    let mut polys = vec![grow(start, 0)?];
    let mut last_stopped = 0usize;
    let mut iters = 0usize;
    while let Some(last) = polys.last() {
        if contains(last, &goal) {
            return Ok(Corridor::new(polys));
        }
        if iters >= cfg.max_iters {
            break;
        }
        let k = first_uncovered(last, path, last_stopped).unwrap_or(path.len() - 1);
        last_stopped = k;
        iters += 1;
        polys.push(grow(path[k], iters)?);
    }
    Err(CorridorError::Precondition(format!(
        "seed cover did not reach the goal after {} regions",
        polys.len()
    )))
}

fn inflate_step<I: Inflator + ?Sized>(
    inflator: &I,
    bbox: &Aabb,
    obstacles: &[Point],
    seed: Seed,
    step: usize,
) -> Result<Polytope, CorridorError> {
    inflator.inflate(bbox, obstacles, seed).map_err(|source| {
        warn!(step, %source, "inflation failed");
        CorridorError::Inflation { step, source }
    })
}
