//! Occupancy source contract and a reference byte grid.
//!
//! Cells are addressed `(ix, iy)` with `ix` along world x. World coordinates
//! map to cells by `floor((p - origin) / resolution)`; `grid_to_world` returns
//! cell centers at `z = 0`.

use thiserror::Error;

use crate::geom::Point;

/// Read-only occupancy queries.
pub trait OccupancySource {
    /// `(width, height)` in cells.
    fn size_in_cells(&self) -> (usize, usize);
    /// Cell edge length in meters.
    fn resolution(&self) -> f64;
    /// World coordinates of the grid corner `(0, 0)`.
    fn origin(&self) -> Point;
    /// False for occupied or unknown cells. Out-of-range cells are not free.
    fn is_free(&self, ix: usize, iy: usize) -> bool;

    fn world_to_grid(&self, p: &Point) -> Option<(usize, usize)> {
        let o = self.origin();
        let r = self.resolution();
        let fx = ((p.x - o.x) / r).floor();
        let fy = ((p.y - o.y) / r).floor();
        let (w, h) = self.size_in_cells();
        if fx < 0.0 || fy < 0.0 || fx >= w as f64 || fy >= h as f64 {
            return None;
        }
        Some((fx as usize, fy as usize))
    }

    fn grid_to_world(&self, ix: usize, iy: usize) -> Point {
        let o = self.origin();
        let r = self.resolution();
        Point::new(o.x + (ix as f64 + 0.5) * r, o.y + (iy as f64 + 0.5) * r, 0.0)
    }

    /// `(lo, hi)` world corners in the plane (z left at the origin's z).
    fn extents(&self) -> (Point, Point) {
        let o = self.origin();
        let (w, h) = self.size_in_cells();
        let r = self.resolution();
        (o, Point::new(o.x + w as f64 * r, o.y + h as f64 * r, o.z))
    }
}

impl<T: OccupancySource + ?Sized> OccupancySource for &T {
    fn size_in_cells(&self) -> (usize, usize) {
        (**self).size_in_cells()
    }
    fn resolution(&self) -> f64 {
        (**self).resolution()
    }
    fn origin(&self) -> Point {
        (**self).origin()
    }
    fn is_free(&self, ix: usize, iy: usize) -> bool {
        (**self).is_free(ix, iy)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("grid must have positive size, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },
    #[error("resolution must be positive, got {0}")]
    BadResolution(f64),
    #[error("row {row} has {got} cells, expected {expected}")]
    RaggedRow { row: usize, got: usize, expected: usize },
    #[error("unexpected map character {ch:?} at row {row}")]
    BadChar { ch: char, row: usize },
}

/// Row-major grid; `0` is free, anything else is occupied.
#[derive(Clone, Debug, PartialEq)]
pub struct OccupancyGrid {
    width: usize,
    height: usize,
    resolution: f64,
    origin: Point,
    cells: Vec<u8>,
}

impl OccupancyGrid {
    /// All-free grid.
    pub fn new(width: usize, height: usize, resolution: f64, origin: Point) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyGrid { width, height });
        }
        if !(resolution > 0.0) {
            return Err(GridError::BadResolution(resolution));
        }
        Ok(Self {
            width,
            height,
            resolution,
            origin,
            cells: vec![0; width * height],
        })
    }

    /// Parse an ASCII map: `#` occupied, `.` free. The first text line is the
    /// top row (largest `iy`), matching how maps are usually drawn.
    pub fn from_ascii(text: &str, resolution: f64, origin: Point) -> Result<Self, GridError> {
        let rows: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.chars().count());
        let mut grid = Self::new(width, height, resolution, origin)?;
        for (row, line) in rows.iter().enumerate() {
            let got = line.chars().count();
            if got != width {
                return Err(GridError::RaggedRow { row, got, expected: width });
            }
            let iy = height - 1 - row;
            for (ix, ch) in line.chars().enumerate() {
                match ch {
                    '.' => {}
                    '#' => grid.set_occupied(ix, iy, true),
                    _ => return Err(GridError::BadChar { ch, row }),
                }
            }
        }
        Ok(grid)
    }

    #[inline]
    fn index(&self, ix: usize, iy: usize) -> Option<usize> {
        (ix < self.width && iy < self.height).then(|| iy * self.width + ix)
    }

    /// Out-of-range writes are ignored.
    pub fn set_occupied(&mut self, ix: usize, iy: usize, occupied: bool) {
        if let Some(i) = self.index(ix, iy) {
            self.cells[i] = u8::from(occupied) * 100;
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }
}

impl OccupancySource for OccupancyGrid {
    fn size_in_cells(&self) -> (usize, usize) {
        (self.width, self.height)
    }
    fn resolution(&self) -> f64 {
        self.resolution
    }
    fn origin(&self) -> Point {
        self.origin
    }
    fn is_free(&self, ix: usize, iy: usize) -> bool {
        self.index(ix, iy).is_some_and(|i| self.cells[i] == 0)
    }
}

/// Bresenham walk from `from` to `to`; returns the first non-free cell.
///
/// The start cell itself is skipped.
pub fn raycast<M: OccupancySource + ?Sized>(
    map: &M,
    from: (usize, usize),
    to: (usize, usize),
) -> Option<(usize, usize)> {
    let (mut x, mut y) = (from.0 as i64, from.1 as i64);
    let (x1, y1) = (to.0 as i64, to.1 as i64);
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        if (x, y) == (x1, y1) {
            return None;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
        if x < 0 || y < 0 {
            return None;
        }
        let cell = (x as usize, y as usize);
        if !map.is_free(cell.0, cell.1) {
            return Some(cell);
        }
    }
}
