//! 3D H-representation geometry for corridor regions.
//!
//! Purpose
//! - Provide `Polytope` (rows `a·x + b·y + c·z + d <= 0`), the local window
//!   `Aabb`, and the tolerances they are evaluated with.
//! - Keep the predicates eps-aware and explicit; no hidden normalization.
//!
//! Code cross-refs: `membership`, `corridor::{builder, simplify}`.

mod poly;
mod types;
mod util;

pub use poly::Polytope;
pub use types::{Aabb, GeomCfg, Halfplane, Point};
pub use util::closest_on_segment;

#[cfg(test)]
mod tests;
