//! H-representation polytope in 3D (`Polytope`).
//!
//! Purpose
//! - One convex free-space region of a corridor, stored as the rows
//!   `(a, b, c, d)` of `a·x + b·y + c·z + d <= 0`.
//! - Provide the numerically explicit predicates the corridor pipeline needs:
//!   membership with slack, near-active row counts and the overlap test.
//!
//! Overlap and vertex enumeration assume bounded polytopes. Every polytope the
//! builder produces carries its clipped window faces, so this always holds.

use super::types::{Aabb, GeomCfg, Halfplane, Point};
use super::util::{dedup_points_in_place, plane_triple};

/// Convex region as an ordered list of halfplanes.
///
/// Invariants:
/// - Rows are kept in insertion order (window faces first for built regions).
/// - Immutable once handed to the corridor; edits go through `with_row`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polytope {
    pub hs: Vec<Halfplane>,
}

impl Polytope {
    #[inline]
    pub fn from_halfplanes(hs: Vec<Halfplane>) -> Self {
        Self { hs }
    }

    #[inline]
    pub fn from_box(bbox: &Aabb) -> Self {
        Self {
            hs: bbox.halfplanes().to_vec(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hs.is_empty()
    }

    /// Return a new polytope with one additional row.
    #[inline]
    pub fn with_row(&self, h: Halfplane) -> Self {
        let mut out = self.clone();
        out.hs.push(h);
        out
    }

    /// Membership with custom slack.
    ///
    /// `eps > 0` is permissive, `eps < 0` demands strict interior depth.
    #[inline]
    pub fn contains_eps(&self, p: &Point, eps: f64) -> bool {
        self.hs.iter().all(|h| h.satisfies_eps(p, eps))
    }

    /// Largest row value at `p` (`<= 0` means inside).
    pub fn max_violation(&self, p: &Point) -> f64 {
        self.hs
            .iter()
            .map(|h| h.eval(p))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Rows whose value at `p` exceeds `-eps` (near-active or violated).
    #[inline]
    pub fn count_near_active(&self, p: &Point, eps: f64) -> usize {
        self.hs.iter().filter(|h| h.eval(p) > -eps).count()
    }

    /// Stacked rows of both polytopes (intersection).
    pub fn intersect(&self, other: &Polytope) -> Polytope {
        let mut hs = Vec::with_capacity(self.hs.len() + other.hs.len());
        hs.extend_from_slice(&self.hs);
        hs.extend_from_slice(&other.hs);
        Polytope { hs }
    }

    /// Unit-normal rows moved inward by `depth`; zero rows are dropped.
    pub fn shrunk(&self, depth: f64) -> Polytope {
        Polytope {
            hs: self
                .hs
                .iter()
                .filter_map(|h| h.normalized())
                .map(|h| h.shifted(depth))
                .collect(),
        }
    }

    /// H→V conversion by enumerating 3-tuples of rows.
    ///
    /// Complexity: O(H^4). Corridor regions carry a handful of rows.
    pub fn vertices(&self, cfg: &GeomCfg) -> Vec<Point> {
        let mut out = Vec::new();
        for_each_vertex(&self.hs, cfg, |x| {
            out.push(x);
            false
        });
        dedup_points_in_place(&mut out, cfg.eps_feas.max(1e-9) * 10.0);
        out
    }

    /// Any vertex of the region, or `None` if the (bounded) region is empty.
    pub fn any_vertex(&self, cfg: &GeomCfg) -> Option<Point> {
        let mut found = None;
        for_each_vertex(&self.hs, cfg, |x| {
            found = Some(x);
            true
        });
        found
    }

    /// Point of depth at least `depth` inside the region: the centroid of the
    /// vertices of the shrunk polytope.
    pub fn interior_point(&self, depth: f64, cfg: &GeomCfg) -> Option<Point> {
        let verts = self.shrunk(depth).vertices(cfg);
        if verts.is_empty() {
            return None;
        }
        let sum = verts.iter().fold(Point::zeros(), |acc, v| acc + v);
        Some(sum / verts.len() as f64)
    }

    /// True if both regions share a point at depth `> tol` inside each.
    pub fn overlaps(&self, other: &Polytope, tol: f64, cfg: &GeomCfg) -> bool {
        self.intersect(other).shrunk(tol).any_vertex(cfg).is_some()
    }
}

/// Visit feasible vertices; stop early when `visit` returns true.
fn for_each_vertex<F: FnMut(Point) -> bool>(hs: &[Halfplane], cfg: &GeomCfg, mut visit: F) {
    let m = hs.len();
    if m < 3 {
        return;
    }
    for i in 0..m {
        for j in (i + 1)..m {
            for k in (j + 1)..m {
                let Some(x) = plane_triple(&hs[i], &hs[j], &hs[k], cfg.eps_det) else {
                    continue;
                };
                if !x.iter().all(|c| c.is_finite()) {
                    continue;
                }
                if hs.iter().all(|h| h.satisfies_eps(&x, cfg.eps_feas)) && visit(x) {
                    return;
                }
            }
        }
    }
}
