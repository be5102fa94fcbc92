//! Primitive 2D shapes
//!
//! Rects, circles, convex polygons and line segments. Every primitive can
//! report an axis-aligned bounding box and be mapped through an affine
//! transform into world space.

use std::f32::consts::TAU;

use crate::foundation::math::{transform_point, vec2, Mat3, Vec2};
use crate::{EngineError, EngineResult};

/// Axis-aligned rectangle: top-left corner plus size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Top-left corner
    pub pos: Vec2,
    /// Extent along x
    pub width: f32,
    /// Extent along y
    pub height: f32,
}

impl Rect {
    /// Creates a rect from its top-left corner and size
    pub fn new(pos: Vec2, width: f32, height: f32) -> Self {
        Self { pos, width, height }
    }

    /// Creates a rect spanning two corners
    pub fn from_points(p1: Vec2, p2: Vec2) -> Self {
        let min = vec2(p1.x.min(p2.x), p1.y.min(p2.y));
        let max = vec2(p1.x.max(p2.x), p1.y.max(p2.y));
        Self::new(min, max.x - min.x, max.y - min.y)
    }

    /// Minimum corner
    pub fn min(&self) -> Vec2 {
        self.pos
    }

    /// Maximum corner
    pub fn max(&self) -> Vec2 {
        self.pos + vec2(self.width, self.height)
    }

    /// Center point
    pub fn center(&self) -> Vec2 {
        self.pos + vec2(self.width, self.height) * 0.5
    }

    /// Corners in winding order starting at the top-left
    pub fn points(&self) -> [Vec2; 4] {
        let p = self.pos;
        [
            p,
            p + vec2(self.width, 0.0),
            p + vec2(self.width, self.height),
            p + vec2(0.0, self.height),
        ]
    }

    /// The rect as a four-point polygon
    pub fn to_polygon(&self) -> Polygon {
        Polygon { pts: self.points().to_vec() }
    }

    /// Map the rect through `m`; rotation makes it a general polygon
    pub fn transform(&self, m: &Mat3) -> Polygon {
        Polygon { pts: self.points().iter().map(|p| transform_point(m, *p)).collect() }
    }

    /// Point containment, edges inclusive
    pub fn contains_point(&self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.pos.x && p.x <= max.x && p.y >= self.pos.y && p.y <= max.y
    }

    /// Whether two rects share any area or edge
    pub fn intersects(&self, other: &Rect) -> bool {
        let (a_max, b_max) = (self.max(), other.max());
        self.pos.x <= b_max.x && other.pos.x <= a_max.x && self.pos.y <= b_max.y && other.pos.y <= a_max.y
    }

    /// Whether every coordinate is finite
    pub fn is_finite(&self) -> bool {
        self.pos.x.is_finite() && self.pos.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Circle in local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// Center point
    pub center: Vec2,
    /// Radius
    pub radius: f32,
}

impl Circle {
    /// Creates a circle
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Axis-aligned bounding box
    pub fn bbox(&self) -> Rect {
        let r = vec2(self.radius, self.radius);
        Rect::from_points(self.center - r, self.center + r)
    }

    /// Approximate the circle as a regular polygon with `segments` vertices
    pub fn to_polygon(&self, segments: usize) -> Polygon {
        self.transform(&Mat3::identity(), segments)
    }

    /// Map the circle through `m`.
    ///
    /// Scaling and rotation turn a circle into an ellipse, so the result is
    /// a polygon sampled on the transformed outline.
    pub fn transform(&self, m: &Mat3, segments: usize) -> Polygon {
        let segments = segments.max(3);
        let pts = (0..segments)
            .map(|i| {
                let theta = TAU * i as f32 / segments as f32;
                let local = self.center + vec2(theta.cos(), theta.sin()) * self.radius;
                transform_point(m, local)
            })
            .collect();
        Polygon { pts }
    }
}

/// Convex polygon with at least three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pts: Vec<Vec2>,
}

impl Polygon {
    /// Creates a polygon; fewer than three points is an invalid shape
    pub fn new(pts: Vec<Vec2>) -> EngineResult<Self> {
        if pts.len() < 3 {
            return Err(EngineError::InvalidShape(format!(
                "polygon needs at least 3 points, got {}",
                pts.len()
            )));
        }
        Ok(Self { pts })
    }

    /// Vertices in order
    pub fn points(&self) -> &[Vec2] {
        &self.pts
    }

    /// Edges as `(start, end)` pairs, closing back to the first vertex
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.pts
            .iter()
            .enumerate()
            .map(move |(i, a)| (*a, self.pts[(i + 1) % self.pts.len()]))
    }

    /// Axis-aligned bounding box
    pub fn bbox(&self) -> Rect {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in &self.pts {
            min = vec2(min.x.min(p.x), min.y.min(p.y));
            max = vec2(max.x.max(p.x), max.y.max(p.y));
        }
        Rect::from_points(min, max)
    }

    /// Map every vertex through `m`
    pub fn transform(&self, m: &Mat3) -> Polygon {
        Polygon { pts: self.pts.iter().map(|p| transform_point(m, *p)).collect() }
    }

    /// Project onto `axis`, returning `(min, max)`
    pub fn project(&self, axis: Vec2) -> (f32, f32) {
        self.pts.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            let d = p.dot(&axis);
            (lo.min(d), hi.max(d))
        })
    }

    /// Even-odd point containment test
    pub fn contains_point(&self, p: Vec2) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

/// Line segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// Start point
    pub p1: Vec2,
    /// End point
    pub p2: Vec2,
}

impl Line {
    /// Creates a segment
    pub fn new(p1: Vec2, p2: Vec2) -> Self {
        Self { p1, p2 }
    }

    /// Axis-aligned bounding box
    pub fn bbox(&self) -> Rect {
        Rect::from_points(self.p1, self.p2)
    }

    /// Map both endpoints through `m`
    pub fn transform(&self, m: &Mat3) -> Line {
        Line::new(transform_point(m, self.p1), transform_point(m, self.p2))
    }
}
