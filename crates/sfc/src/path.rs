//! Reference path source: 8-connected grid A*.

use pathfinding::directed::astar::astar;
use tracing::debug;

use crate::geom::Point;
use crate::occupancy::OccupancySource;

/// Produces a collision-free polyline between two world points.
pub trait PathSource {
    fn plan(&self, start: &Point, goal: &Point) -> Option<Vec<Point>>;
}

impl<T: PathSource + ?Sized> PathSource for &T {
    fn plan(&self, start: &Point, goal: &Point) -> Option<Vec<Point>> {
        (**self).plan(start, goal)
    }
}

type Cell = (usize, usize);

const STRAIGHT: u32 = 10;
const DIAGONAL: u32 = 14;

/// A* over the free cells of an occupancy source.
///
/// Diagonal moves may not cut corners. The returned polyline starts at the
/// exact `start`, ends at the exact `goal`, and keeps only the cells where
/// the direction changes.
#[derive(Clone, Debug)]
pub struct GridAstar<M> {
    pub map: M,
}

impl<M: OccupancySource> GridAstar<M> {
    pub fn new(map: M) -> Self {
        Self { map }
    }

    fn free(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && self.map.is_free(x as usize, y as usize)
    }

    fn successors(&self, &(x, y): &Cell) -> Vec<(Cell, u32)> {
        let (x, y) = (x as i64, y as i64);
        let mut out = Vec::with_capacity(8);
        for dx in -1i64..=1 {
            for dy in -1i64..=1 {
                if (dx, dy) == (0, 0) || !self.free(x + dx, y + dy) {
                    continue;
                }
                let diagonal = dx != 0 && dy != 0;
                if diagonal && !(self.free(x + dx, y) && self.free(x, y + dy)) {
                    continue;
                }
                let cost = if diagonal { DIAGONAL } else { STRAIGHT };
                out.push((((x + dx) as usize, (y + dy) as usize), cost));
            }
        }
        out
    }

    /// Cell path from `start` to `goal`, both inclusive.
    pub fn search(&self, start: Cell, goal: Cell) -> Option<Vec<Cell>> {
        if !self.map.is_free(start.0, start.1) || !self.map.is_free(goal.0, goal.1) {
            return None;
        }
        let (cells, cost) = astar(
            &start,
            |c| self.successors(c),
            |&(x, y)| {
                let dx = x.abs_diff(goal.0) as u32;
                let dy = y.abs_diff(goal.1) as u32;
                STRAIGHT * dx.max(dy) + (DIAGONAL - STRAIGHT) * dx.min(dy)
            },
            |&c| c == goal,
        )?;
        debug!(cells = cells.len(), cost, "grid astar");
        Some(cells)
    }
}

/// Drop interior cells that continue the previous direction.
pub fn compress_collinear(cells: &[Cell]) -> Vec<Cell> {
    if cells.len() <= 2 {
        return cells.to_vec();
    }
    let step = |a: Cell, b: Cell| (b.0 as i64 - a.0 as i64, b.1 as i64 - a.1 as i64);
    let mut out = vec![cells[0]];
    for w in cells.windows(3) {
        if step(w[0], w[1]) != step(w[1], w[2]) {
            out.push(w[1]);
        }
    }
    out.extend(cells.last().copied());
    out
}

impl<M: OccupancySource> PathSource for GridAstar<M> {
    fn plan(&self, start: &Point, goal: &Point) -> Option<Vec<Point>> {
        let s = self.map.world_to_grid(start)?;
        let g = self.map.world_to_grid(goal)?;
        let cells = compress_collinear(&self.search(s, g)?);
        let mut path: Vec<Point> = cells.iter().map(|&(x, y)| self.map.grid_to_world(x, y)).collect();
        // Endpoints are the exact query points, not cell centers.
        if let Some(first) = path.first_mut() {
            *first = *start;
        }
        if path.len() == 1 {
            path.push(*goal);
        } else if let Some(last) = path.last_mut() {
            *last = *goal;
        }
        Some(path)
    }
}
