//! Closed shape variant used by areas and the narrow phase
//!
//! Shapes are stored in local space on the component that provides them and
//! mapped to world space on demand through the entity's cached transform.

use crate::foundation::math::{Mat3, Vec2};
use crate::{EngineError, EngineResult};

use super::primitives::{Circle, Line, Polygon, Rect};

/// Any collision shape
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Axis-aligned rect
    Rect(Rect),
    /// Circle, approximated as a polygon once transformed
    Circle(Circle),
    /// Convex polygon
    Polygon(Polygon),
    /// Line segment, not usable by the narrow phase
    Line(Line),
}

impl Shape {
    /// Axis-aligned bounding box
    pub fn bbox(&self) -> Rect {
        match self {
            Self::Rect(rect) => *rect,
            Self::Circle(circle) => circle.bbox(),
            Self::Polygon(poly) => poly.bbox(),
            Self::Line(line) => line.bbox(),
        }
    }

    /// Map the shape through `m`.
    ///
    /// Rects and circles become polygons since rotation and non-uniform
    /// scale do not preserve them. `segments` controls circle resolution.
    pub fn transform(&self, m: &Mat3, segments: usize) -> Shape {
        match self {
            Self::Rect(rect) => Self::Polygon(rect.transform(m)),
            Self::Circle(circle) => Self::Polygon(circle.transform(m, segments)),
            Self::Polygon(poly) => Self::Polygon(poly.transform(m)),
            Self::Line(line) => Self::Line(line.transform(m)),
        }
    }

    /// The shape as a polygon, for SAT
    pub fn to_polygon(&self, segments: usize) -> EngineResult<Polygon> {
        match self {
            Self::Rect(rect) => Ok(rect.to_polygon()),
            Self::Circle(circle) => Ok(circle.to_polygon(segments)),
            Self::Polygon(poly) => Ok(poly.clone()),
            Self::Line(_) => Err(EngineError::InvalidShape("a line has no area".to_string())),
        }
    }

    /// Point containment
    pub fn contains_point(&self, p: Vec2) -> bool {
        match self {
            Self::Rect(rect) => rect.contains_point(p),
            Self::Circle(circle) => (p - circle.center).norm() <= circle.radius,
            Self::Polygon(poly) => poly.contains_point(p),
            Self::Line(_) => false,
        }
    }
}

impl From<Rect> for Shape {
    fn from(rect: Rect) -> Self {
        Self::Rect(rect)
    }
}

impl From<Circle> for Shape {
    fn from(circle: Circle) -> Self {
        Self::Circle(circle)
    }
}

impl From<Polygon> for Shape {
    fn from(poly: Polygon) -> Self {
        Self::Polygon(poly)
    }
}

impl From<Line> for Shape {
    fn from(line: Line) -> Self {
        Self::Line(line)
    }
}
