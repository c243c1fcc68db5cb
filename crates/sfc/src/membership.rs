//! Point-in-polytope oracle.
//!
//! A point is inside iff every row evaluates to `<= 0`. Planar callers lift
//! `(x, y)` to `z = 0`, which is the mid-plane of the thin slab planar
//! corridors are built in.

use nalgebra::Vector2;

use crate::geom::{Point, Polytope};

/// Exact membership (no slack).
#[inline]
pub fn contains(poly: &Polytope, p: &Point) -> bool {
    poly.contains_eps(p, 0.0)
}

/// Membership of a planar point lifted to `z = 0`.
#[inline]
pub fn contains_planar(poly: &Polytope, p: &Vector2<f64>) -> bool {
    contains(poly, &Point::new(p.x, p.y, 0.0))
}

/// Membership with slack `eps` (see `Polytope::contains_eps`).
#[inline]
pub fn contains_eps(poly: &Polytope, p: &Point, eps: f64) -> bool {
    poly.contains_eps(p, eps)
}

/// Index of the first path vertex at or after `from` that `poly` does not contain.
pub fn first_uncovered(poly: &Polytope, path: &[Point], from: usize) -> Option<usize> {
    path.iter()
        .enumerate()
        .skip(from)
        .find(|(_, p)| !contains(poly, p))
        .map(|(k, _)| k)
}
