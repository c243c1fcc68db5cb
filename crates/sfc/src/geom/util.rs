//! Small utilities: 3x3 plane intersection, point dedup and segment projection.

use nalgebra::Matrix3;

use super::types::{Halfplane, Point};

/// Intersection point of three planes `n_i·x + d_i = 0`, if they are independent.
pub(crate) fn plane_triple(h1: &Halfplane, h2: &Halfplane, h3: &Halfplane, eps_det: f64) -> Option<Point> {
    let a = Matrix3::from_rows(&[h1.n.transpose(), h2.n.transpose(), h3.n.transpose()]);
    if a.determinant().abs() < eps_det {
        return None;
    }
    let inv = a.try_inverse()?;
    let rhs = Point::new(-h1.d, -h2.d, -h3.d);
    Some(inv * rhs)
}

pub(crate) fn dedup_points_in_place(points: &mut Vec<Point>, tol: f64) {
    if points.len() < 2 {
        return;
    }
    points.sort_by(|a, b| {
        a[0].partial_cmp(&b[0])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a[1].partial_cmp(&b[1]).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a[2].partial_cmp(&b[2]).unwrap_or(std::cmp::Ordering::Equal))
    });
    points.dedup_by(|a, b| (*a - *b).norm() < tol);
}

/// Closest point to `p` on segment `[a, b]` (degenerates to `a` for zero length).
pub fn closest_on_segment(a: &Point, b: &Point, p: &Point) -> Point {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 <= f64::EPSILON {
        return *a;
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}
