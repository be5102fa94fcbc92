//! Geometry kernel and narrow phase
//!
//! Shapes are stored in local space and transformed to world space on demand
//! during collision tests.
//!
//! # Module Organization
//!
//! - [`primitives`] - Rect, circle, polygon and line primitives
//! - [`shape`] - The closed [`Shape`] variant
//! - [`sat`] - Separating Axis Theorem overlap test
//! - [`contact`] - Collision records shared by both sides of a pair

pub mod primitives;
pub mod shape;
pub mod sat;
pub mod contact;

pub use primitives::{Circle, Line, Polygon, Rect};
pub use shape::Shape;
pub use sat::{overlap, sat};
pub use contact::Collision;
