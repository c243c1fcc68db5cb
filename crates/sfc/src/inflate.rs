//! Polytope inflation seam and a greedy separating-halfplane reference solver.
//!
//! The production solver (convex inflation around a segment, e.g. an
//! iterative-regional method) is an external collaborator behind `Inflator`.
//! `SeparatingInflator` honors the same contract with simple numerics:
//! starting from the window, it repeatedly takes the nearest obstacle still
//! inside the region and adds the plane through it whose normal points from
//! its closest seed point towards it.

use crate::error::InflateError;
use crate::geom::{closest_on_segment, Aabb, Halfplane, Point, Polytope};

/// What a region is grown around.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Seed {
    Point(Point),
    Segment(Point, Point),
}

impl Seed {
    #[inline]
    pub fn endpoints(&self) -> (Point, Point) {
        match *self {
            Seed::Point(p) => (p, p),
            Seed::Segment(a, b) => (a, b),
        }
    }
}

/// Convex inflation contract.
///
/// Post: on success the seed lies strictly inside the returned polytope and
/// the polytope is contained in `bbox`.
pub trait Inflator {
    fn inflate(&self, bbox: &Aabb, obstacles: &[Point], seed: Seed) -> Result<Polytope, InflateError>;
}

impl<T: Inflator + ?Sized> Inflator for &T {
    fn inflate(&self, bbox: &Aabb, obstacles: &[Point], seed: Seed) -> Result<Polytope, InflateError> {
        (**self).inflate(bbox, obstacles, seed)
    }
}

/// Greedy separating-halfplane inflation.
#[derive(Clone, Copy, Debug)]
pub struct SeparatingInflator {
    /// Obstacles closer than this to the seed make the call fail.
    pub min_clearance: f64,
}

impl Default for SeparatingInflator {
    fn default() -> Self {
        Self {
            min_clearance: 1e-6,
        }
    }
}

impl Inflator for SeparatingInflator {
    fn inflate(&self, bbox: &Aabb, obstacles: &[Point], seed: Seed) -> Result<Polytope, InflateError> {
        if bbox.is_empty() {
            return Err(InflateError::EmptyBox);
        }
        let (a, b) = seed.endpoints();
        if !bbox.contains_strict(&a) || !bbox.contains_strict(&b) {
            return Err(InflateError::Degenerate("seed outside bounding box".into()));
        }
        let mut order: Vec<(f64, Point, Point)> = obstacles
            .iter()
            .map(|o| {
                let q = closest_on_segment(&a, &b, o);
                ((o - q).norm(), *o, q)
            })
            .collect();
        order.sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut poly = Polytope::from_box(bbox);
        for (dist, o, q) in order {
            if !dist.is_finite() || dist <= self.min_clearance {
                return Err(InflateError::SeedBlocked { distance: dist });
            }
            // Already cut away by an earlier plane.
            if poly.hs.iter().any(|h| h.eval(&o) >= 0.0) {
                continue;
            }
            let n = (o - q) / dist;
            poly.hs.push(Halfplane::new(n, -n.dot(&o)));
        }
        Ok(poly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    fn window() -> Aabb {
        Aabb::new(vector![-1.0, -1.0, -0.1], vector![5.0, 1.0, 0.1])
    }

    #[test]
    fn no_obstacles_returns_window() {
        let p = SeparatingInflator::default()
            .inflate(&window(), &[], Seed::Segment(vector![0.0, 0.0, 0.0], vector![4.0, 0.0, 0.0]))
            .unwrap();
        assert_eq!(p, Polytope::from_box(&window()));
    }

    #[test]
    fn segment_stays_strictly_inside() {
        let obs = vec![
            vector![2.0, 0.5, 0.0],
            vector![2.0, -0.3, 0.0],
            vector![4.5, 0.0, 0.0],
            vector![2.0, 0.8, 0.0],
        ];
        let a = vector![0.0, 0.0, 0.0];
        let b = vector![4.0, 0.0, 0.0];
        let p = SeparatingInflator::default()
            .inflate(&window(), &obs, Seed::Segment(a, b))
            .unwrap();
        for k in 0..=10 {
            let s = a + (b - a) * (k as f64 / 10.0);
            assert!(p.contains_eps(&s, -1e-6), "segment point {s:?} not interior");
        }
        for o in &obs {
            assert!(!p.contains_eps(o, -1e-9));
        }
        // The farther point at y=0.8 is shadowed by the plane through y=0.5.
        assert_eq!(p.len(), 6 + 3);
    }

    #[test]
    fn blocked_seed_is_an_error() {
        let err = SeparatingInflator::default()
            .inflate(&window(), &[vector![1.0, 0.0, 0.0]], Seed::Segment(vector![0.0, 0.0, 0.0], vector![2.0, 0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(err, InflateError::SeedBlocked { .. }));
    }

    #[test]
    fn empty_window_is_an_error() {
        let empty = Aabb::new(vector![0.0, 0.0, 0.0], vector![0.0, 1.0, 1.0]);
        let err = SeparatingInflator::default()
            .inflate(&empty, &[], Seed::Point(vector![0.0, 0.5, 0.5]))
            .unwrap_err();
        assert_eq!(err, InflateError::EmptyBox);
    }
}
