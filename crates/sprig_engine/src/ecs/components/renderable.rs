//! Shape-bearing render components
//!
//! Rendering itself happens outside the engine; these components only carry
//! the geometry the renderer draws, and report it through
//! [`Component::render_area`] so an [`Area`](super::Area) without an
//! explicit shape can derive one.

use std::cell::{Cell, RefCell};

use crate::ecs::{Component, Value};
use crate::foundation::math::Vec2;
use crate::physics::collision::{Circle, Polygon, Rect, Shape};
use crate::EngineResult;

use super::expect_number;

/// Rectangle render component ("rect"), anchored through the entity's anchor
#[derive(Debug)]
pub struct RectShape {
    width: Cell<f32>,
    height: Cell<f32>,
}

impl RectShape {
    /// Create a `width` x `height` rectangle
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: Cell::new(width),
            height: Cell::new(height),
        }
    }

    /// Current size
    pub fn size(&self) -> (f32, f32) {
        (self.width.get(), self.height.get())
    }
}

impl Component for RectShape {
    fn id(&self) -> &str {
        "rect"
    }

    fn properties(&self) -> Vec<&str> {
        vec!["width", "height"]
    }

    fn get(&self, key: &str) -> Option<Value> {
        match key {
            "width" => Some(Value::Number(self.width.get())),
            "height" => Some(Value::Number(self.height.get())),
            _ => None,
        }
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        let n = expect_number(self.id(), key, &value)?;
        match key {
            "width" => self.width.set(n),
            _ => self.height.set(n),
        }
        Ok(())
    }

    fn render_area(&self) -> Option<Shape> {
        Some(Shape::Rect(Rect::new(Vec2::zeros(), self.width.get(), self.height.get())))
    }
}

/// Circle render component ("circle"), centered on the entity position
#[derive(Debug)]
pub struct CircleShape {
    radius: Cell<f32>,
}

impl CircleShape {
    /// Create with a radius
    pub fn new(radius: f32) -> Self {
        Self { radius: Cell::new(radius) }
    }
}

impl Component for CircleShape {
    fn id(&self) -> &str {
        "circle"
    }

    fn properties(&self) -> Vec<&str> {
        vec!["radius"]
    }

    fn get(&self, key: &str) -> Option<Value> {
        (key == "radius").then(|| Value::Number(self.radius.get()))
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        self.radius.set(expect_number(self.id(), key, &value)?);
        Ok(())
    }

    fn render_area(&self) -> Option<Shape> {
        Some(Shape::Circle(Circle::new(Vec2::zeros(), self.radius.get())))
    }
}

/// Convex polygon render component ("polygon")
#[derive(Debug)]
pub struct PolygonShape {
    polygon: RefCell<Polygon>,
}

impl PolygonShape {
    /// Create from local-space points; fewer than three is an invalid shape
    pub fn new(points: Vec<Vec2>) -> EngineResult<Self> {
        Ok(Self {
            polygon: RefCell::new(Polygon::new(points)?),
        })
    }

    /// Replace the outline
    pub fn set_points(&self, points: Vec<Vec2>) -> EngineResult<()> {
        *self.polygon.borrow_mut() = Polygon::new(points)?;
        Ok(())
    }
}

impl Component for PolygonShape {
    fn id(&self) -> &str {
        "polygon"
    }

    fn render_area(&self) -> Option<Shape> {
        Some(Shape::Polygon(self.polygon.borrow().clone()))
    }

    fn inspect(&self) -> Option<String> {
        Some(format!("{} points", self.polygon.borrow().points().len()))
    }
}
