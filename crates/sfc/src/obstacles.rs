//! Obstacle collection: range readings and occupancy cells to world points.

use crate::geom::Point;
use crate::occupancy::{raycast, OccupancySource};

/// Planar vehicle pose.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose2 {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2 {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    #[inline]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y, 0.0)
    }

    /// World velocity of a unicycle moving forward at `speed`.
    #[inline]
    pub fn forward_velocity(&self, speed: f64) -> Point {
        Point::new(speed * self.yaw.cos(), speed * self.yaw.sin(), 0.0)
    }
}

/// One sweep of a planar range sensor, angles in the sensor frame.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaserScan {
    pub angle_min: f64,
    pub angle_increment: f64,
    pub range_min: f64,
    pub range_max: f64,
    pub ranges: Vec<f64>,
}

/// World-frame hit points of `scan` taken at `pose`.
///
/// Readings outside `[range_min, range_max]` (and non-finite ones) are
/// dropped.
pub fn collect_scan(scan: &LaserScan, pose: &Pose2) -> Vec<Point> {
    scan.ranges
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_finite() && **r >= scan.range_min && **r <= scan.range_max)
        .map(|(i, &r)| {
            let angle = scan.angle_min + i as f64 * scan.angle_increment + pose.yaw;
            Point::new(pose.x + r * angle.cos(), pose.y + r * angle.sin(), 0.0)
        })
        .collect()
}

/// Centers of every non-free cell.
pub fn occupied_points<M: OccupancySource + ?Sized>(map: &M) -> Vec<Point> {
    let (w, h) = map.size_in_cells();
    let mut out = Vec::new();
    for iy in 0..h {
        for ix in 0..w {
            if !map.is_free(ix, iy) {
                out.push(map.grid_to_world(ix, iy));
            }
        }
    }
    out
}

/// Ray-cast from `from` towards each point and keep where the ray stops:
/// the first non-free cell, or the point's own cell when the ray is clear.
///
/// Points outside the map are skipped; if `from` is outside, nothing is
/// returned.
pub fn padded_scan<M: OccupancySource + ?Sized>(map: &M, from: &Point, points: &[Point]) -> Vec<Point> {
    let Some(start) = map.world_to_grid(from) else {
        tracing::warn!(x = from.x, y = from.y, "vehicle outside occupancy map; padded scan empty");
        return Vec::new();
    };
    points
        .iter()
        .filter_map(|p| map.world_to_grid(p))
        .map(|end| {
            let (ix, iy) = raycast(map, start, end).unwrap_or(end);
            map.grid_to_world(ix, iy)
        })
        .collect()
}
