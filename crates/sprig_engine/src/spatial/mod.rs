//! Spatial partitioning for the collision broad phase
//!
//! Entities are bucketed by world-space bounding box so the narrow phase
//! only tests pairs that share space.

mod spatial_query;
mod hash_grid;

pub use spatial_query::BroadPhase;
pub use hash_grid::{CellCoord, SpatialHashGrid};
