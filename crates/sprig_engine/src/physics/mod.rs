//! Collision detection and response
//!
//! [`collision`] holds the geometry kernel (shapes, SAT, collision records);
//! [`collision_system`] runs the per-frame broad and narrow phases over the
//! entity tree.

pub mod collision;
pub mod collision_system;

pub use collision::{overlap, sat, Circle, Collision, Line, Polygon, Rect, Shape};
pub use collision_system::CollisionSystem;
