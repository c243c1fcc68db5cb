//! Corridor reduction over the implicit overlap graph.
//!
//! Edge `i → j` (j < i) exists when `P_i` and `P_j` overlap with depth `> tol`,
//! or when `j = i − 1` (always allowed). `shortcut` walks backwards from the
//! last region and jumps to the smallest overlapping index; `minimal_cover`
//! runs a breadth-first search for a minimum-cardinality chain instead.

use pathfinding::directed::bfs::bfs;

use super::Corridor;
use crate::geom::{GeomCfg, Polytope};

/// Reduction strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Simplifier {
    /// Greedy backward walk, O(n²) overlap tests worst case.
    #[default]
    Shortcut,
    /// Breadth-first search for the fewest regions.
    Minimal,
    /// Keep the corridor as built.
    Off,
}

impl Simplifier {
    pub fn apply(&self, corridor: &Corridor, tol: f64, cfg: &GeomCfg) -> Corridor {
        match self {
            Simplifier::Shortcut => shortcut(corridor, tol, cfg),
            Simplifier::Minimal => minimal_cover(corridor, tol, cfg),
            Simplifier::Off => corridor.clone(),
        }
    }
}

/// Indices kept by the greedy backward walk, in increasing order.
///
/// Corridors of length <= 2 are returned whole.
pub fn shortcut_indices(polys: &[Polytope], tol: f64, cfg: &GeomCfg) -> Vec<usize> {
    let m = polys.len();
    if m <= 2 {
        return (0..m).collect();
    }
    let mut kept = vec![m - 1];
    let mut i = m - 1;
    while i > 0 {
        let j = (0..i)
            .find(|&j| j + 1 == i || polys[i].overlaps(&polys[j], tol, cfg))
            .unwrap_or(i - 1);
        kept.push(j);
        i = j;
    }
    kept.reverse();
    kept
}

/// Greedy shortcut; first and last regions are always kept.
pub fn shortcut(corridor: &Corridor, tol: f64, cfg: &GeomCfg) -> Corridor {
    let idx = shortcut_indices(&corridor.polys, tol, cfg);
    Corridor::new(idx.into_iter().map(|k| corridor.polys[k].clone()).collect())
}

/// Minimum-cardinality overlap chain from the first to the last region.
pub fn minimal_cover(corridor: &Corridor, tol: f64, cfg: &GeomCfg) -> Corridor {
    let polys = &corridor.polys;
    let m = polys.len();
    if m <= 2 {
        return corridor.clone();
    }
    let chain = bfs(
        &0usize,
        |&i| {
            (i + 1..m)
                .filter(|&j| j == i + 1 || polys[i].overlaps(&polys[j], tol, cfg))
                .collect::<Vec<_>>()
        },
        |&i| i == m - 1,
    )
    // The trivial chain 0, 1, .., m-1 always exists.
    .unwrap_or_else(|| (0..m).collect());
    Corridor::new(chain.into_iter().map(|k| polys[k].clone()).collect())
}
