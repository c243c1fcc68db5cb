//! Safe flight corridor: construction and simplification.
//!
//! Purpose
//! - `Corridor` is a path-ordered chain of polytopes whose consecutive
//!   interiors overlap, so a continuous trajectory can pass through the union.
//! - `builder` grows the chain along a reference path (convex cover, seed
//!   cover); `simplify` reduces it to a shorter chain with the same property.
//!
//! Code cross-refs: `geom::Polytope`, `inflate::Inflator`, `membership`.

pub mod builder;
pub mod simplify;

pub use builder::{build_corridor, cover_by_seeds, BridgeTest, CoverCfg, CoverMode};
pub use simplify::{minimal_cover, shortcut, shortcut_indices, Simplifier};

use crate::geom::{GeomCfg, Point, Polytope};

/// Ordered, overlap-connected polytopes covering a path.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Corridor {
    pub polys: Vec<Polytope>,
}

impl Corridor {
    #[inline]
    pub fn new(polys: Vec<Polytope>) -> Self {
        Self { polys }
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.polys.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.polys.is_empty()
    }
    #[inline]
    pub fn first(&self) -> Option<&Polytope> {
        self.polys.first()
    }
    #[inline]
    pub fn last(&self) -> Option<&Polytope> {
        self.polys.last()
    }
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Polytope> {
        self.polys.iter()
    }

    /// Index of the first adjacent pair that fails the overlap test.
    pub fn first_disconnect(&self, tol: f64, cfg: &GeomCfg) -> Option<usize> {
        self.polys
            .windows(2)
            .position(|w| !w[0].overlaps(&w[1], tol, cfg))
    }

    /// Every adjacent pair overlaps with depth `> tol`.
    #[inline]
    pub fn is_connected(&self, tol: f64, cfg: &GeomCfg) -> bool {
        self.first_disconnect(tol, cfg).is_none()
    }

    /// First region holds `start`, last region holds `goal` (slack `eps`).
    pub fn covers_endpoints(&self, start: &Point, goal: &Point, eps: f64) -> bool {
        match (self.first(), self.last()) {
            (Some(f), Some(l)) => f.contains_eps(start, eps) && l.contains_eps(goal, eps),
            _ => false,
        }
    }
}

impl From<Vec<Polytope>> for Corridor {
    fn from(polys: Vec<Polytope>) -> Self {
        Self { polys }
    }
}

impl<'a> IntoIterator for &'a Corridor {
    type Item = &'a Polytope;
    type IntoIter = std::slice::Iter<'a, Polytope>;
    fn into_iter(self) -> Self::IntoIter {
        self.polys.iter()
    }
}
