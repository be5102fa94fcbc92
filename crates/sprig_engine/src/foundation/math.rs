//! Math utilities and types
//!
//! 2D vector and homogeneous matrix types for the entity tree. World
//! transforms are 3x3 affine matrices composed parent-first.

pub use nalgebra::{Matrix3, Vector2};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3x3 matrix type, used as a 2D affine transform
pub type Mat3 = Matrix3<f32>;

/// 2D point type
pub type Point2 = nalgebra::Point2<f32>;

/// Shorthand constructor for [`Vec2`]
pub fn vec2(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y)
}

/// Build an entity's local transform.
///
/// Composition order is translate, then scale, then rotate. The angle is
/// in degrees, positive clockwise in screen space (y grows downward).
pub fn local_transform(pos: Vec2, scale: Vec2, angle_deg: f32) -> Mat3 {
    let mut m = Mat3::new_translation(&pos);
    if scale != Vec2::new(1.0, 1.0) {
        m *= Mat3::new_nonuniform_scaling(&scale);
    }
    if angle_deg != 0.0 {
        m *= Mat3::new_rotation(angle_deg.to_radians());
    }
    m
}

/// Apply an affine transform to a point
pub fn transform_point(m: &Mat3, p: Vec2) -> Vec2 {
    m.transform_point(&Point2::from(p)).coords
}

/// Unit normal of the edge `a -> b`, or `None` for a zero-length edge
pub fn edge_normal(a: Vec2, b: Vec2) -> Option<Vec2> {
    let edge = b - a;
    let len = edge.norm();
    if len <= f32::EPSILON || !len.is_finite() {
        return None;
    }
    Some(Vec2::new(-edge.y / len, edge.x / len))
}

/// Common mathematical constants
pub mod constants {
    /// Tolerance used when deciding whether a displacement is zero
    pub const EPSILON: f32 = 1e-6;
}

/// Mathematical utility functions
pub mod utils {
    use super::Vec2;

    /// Whether a vector is exactly the zero vector
    pub fn is_zero(v: &Vec2) -> bool {
        v.x == 0.0 && v.y == 0.0
    }
}
