//! Spatial components: position, scale, rotation, depth and anchor
//!
//! Each exposes one property that the world reads when composing an
//! entity's local transform (`pos`, `scale`, `angle`) or ordering and
//! aligning it (`z`, `anchor`).

use std::cell::Cell;

use crate::ecs::{Component, EntityId, Value, World};
use crate::foundation::math::{vec2, Vec2};
use crate::{EngineError, EngineResult};

use super::{arg_number, arg_vec2, expect_number, expect_vec2};

/// Position component ("pos")
#[derive(Debug)]
pub struct Pos {
    pos: Cell<Vec2>,
}

impl Pos {
    /// Create at a position
    pub fn new(pos: Vec2) -> Self {
        Self { pos: Cell::new(pos) }
    }

    /// Current position
    pub fn position(&self) -> Vec2 {
        self.pos.get()
    }

    /// Teleport
    pub fn set_position(&self, pos: Vec2) {
        self.pos.set(pos);
    }

    /// Translate by `delta`
    pub fn move_by(&self, delta: Vec2) {
        self.pos.set(self.pos.get() + delta);
    }

    /// Translate by `velocity` units per second over this frame
    pub fn move_with(&self, world: &World, velocity: Vec2) {
        self.move_by(velocity * world.dt());
    }

    /// Step toward `dest` at `speed` units per second, snapping when in reach
    pub fn move_to(&self, world: &World, dest: Vec2, speed: f32) {
        let diff = dest - self.position();
        let step = speed * world.dt();
        if diff.norm() <= step {
            self.set_position(dest);
        } else {
            self.move_with(world, diff.normalize() * speed);
        }
    }
}

impl Default for Pos {
    fn default() -> Self {
        Self::new(Vec2::zeros())
    }
}

impl Component for Pos {
    fn id(&self) -> &str {
        "pos"
    }

    fn properties(&self) -> Vec<&str> {
        vec!["pos"]
    }

    fn methods(&self) -> Vec<&str> {
        vec!["moveBy", "moveWith", "moveTo"]
    }

    fn get(&self, key: &str) -> Option<Value> {
        (key == "pos").then(|| Value::Vec2(self.pos.get()))
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        self.pos.set(expect_vec2(self.id(), key, &value)?);
        Ok(())
    }

    fn call(&self, world: &mut World, _entity: EntityId, method: &str, args: &[Value]) -> EngineResult<Value> {
        match method {
            "moveBy" => self.move_by(arg_vec2(method, args, 0)?),
            "moveWith" => self.move_with(world, arg_vec2(method, args, 0)?),
            "moveTo" => self.move_to(world, arg_vec2(method, args, 0)?, arg_number(method, args, 1)?),
            _ => return Err(EngineError::StateAssertion(format!("pos has no method {method}"))),
        }
        Ok(Value::Null)
    }

    fn inspect(&self) -> Option<String> {
        let p = self.pos.get();
        Some(format!("({}, {})", p.x, p.y))
    }
}

/// Scale component ("scale")
#[derive(Debug)]
pub struct Scale {
    scale: Cell<Vec2>,
}

impl Scale {
    /// Non-uniform scale
    pub fn new(scale: Vec2) -> Self {
        Self { scale: Cell::new(scale) }
    }

    /// Same factor on both axes
    pub fn uniform(factor: f32) -> Self {
        Self::new(vec2(factor, factor))
    }

    /// Current scale
    pub fn value(&self) -> Vec2 {
        self.scale.get()
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl Component for Scale {
    fn id(&self) -> &str {
        "scale"
    }

    fn properties(&self) -> Vec<&str> {
        vec!["scale"]
    }

    fn get(&self, key: &str) -> Option<Value> {
        (key == "scale").then(|| Value::Vec2(self.scale.get()))
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        let scale = match value {
            Value::Number(n) => vec2(n, n),
            other => expect_vec2(self.id(), key, &other)?,
        };
        self.scale.set(scale);
        Ok(())
    }
}

/// Rotation component ("rotate"), exposing `angle` in degrees
#[derive(Debug, Default)]
pub struct Rotate {
    angle: Cell<f32>,
}

impl Rotate {
    /// Create with an angle in degrees
    pub fn new(angle: f32) -> Self {
        Self { angle: Cell::new(angle) }
    }

    /// Current angle in degrees
    pub fn angle(&self) -> f32 {
        self.angle.get()
    }

    /// Add to the angle
    pub fn rotate_by(&self, degrees: f32) {
        self.angle.set(self.angle.get() + degrees);
    }
}

impl Component for Rotate {
    fn id(&self) -> &str {
        "rotate"
    }

    fn properties(&self) -> Vec<&str> {
        vec!["angle"]
    }

    fn get(&self, key: &str) -> Option<Value> {
        (key == "angle").then(|| Value::Number(self.angle.get()))
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        self.angle.set(expect_number(self.id(), key, &value)?);
        Ok(())
    }
}

/// Depth component ("z"); higher values sort later among siblings
#[derive(Debug, Default)]
pub struct Z {
    z: Cell<f32>,
}

impl Z {
    /// Create with a depth
    pub fn new(z: f32) -> Self {
        Self { z: Cell::new(z) }
    }
}

impl Component for Z {
    fn id(&self) -> &str {
        "z"
    }

    fn properties(&self) -> Vec<&str> {
        vec!["z"]
    }

    fn get(&self, key: &str) -> Option<Value> {
        (key == "z").then(|| Value::Number(self.z.get()))
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        self.z.set(expect_number(self.id(), key, &value)?);
        Ok(())
    }
}

/// Named anchor points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorPoint {
    /// (-1, -1)
    TopLeft,
    /// (0, -1)
    Top,
    /// (1, -1)
    TopRight,
    /// (-1, 0)
    Left,
    /// (0, 0)
    Center,
    /// (1, 0)
    Right,
    /// (-1, 1)
    BottomLeft,
    /// (0, 1)
    Bottom,
    /// (1, 1)
    BottomRight,
}

impl AnchorPoint {
    /// Offset in [-1, 1]² relative to the shape's center
    pub fn offset(self) -> Vec2 {
        match self {
            Self::TopLeft => vec2(-1.0, -1.0),
            Self::Top => vec2(0.0, -1.0),
            Self::TopRight => vec2(1.0, -1.0),
            Self::Left => vec2(-1.0, 0.0),
            Self::Center => vec2(0.0, 0.0),
            Self::Right => vec2(1.0, 0.0),
            Self::BottomLeft => vec2(-1.0, 1.0),
            Self::Bottom => vec2(0.0, 1.0),
            Self::BottomRight => vec2(1.0, 1.0),
        }
    }

    /// Parse names such as `"center"` or `"botleft"`
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "topleft" => Self::TopLeft,
            "top" => Self::Top,
            "topright" => Self::TopRight,
            "left" => Self::Left,
            "center" => Self::Center,
            "right" => Self::Right,
            "botleft" | "bottomleft" => Self::BottomLeft,
            "bot" | "bottom" => Self::Bottom,
            "botright" | "bottomright" => Self::BottomRight,
            _ => return None,
        })
    }
}

/// Anchor component ("anchor"); entities without one anchor at the top-left
#[derive(Debug)]
pub struct Anchor {
    offset: Cell<Vec2>,
}

impl Anchor {
    /// Named anchor
    pub fn new(point: AnchorPoint) -> Self {
        Self::custom(point.offset())
    }

    /// Arbitrary anchor in [-1, 1]²
    pub fn custom(offset: Vec2) -> Self {
        Self { offset: Cell::new(offset) }
    }

    /// Anchor offset
    pub fn offset(&self) -> Vec2 {
        self.offset.get()
    }
}

impl Component for Anchor {
    fn id(&self) -> &str {
        "anchor"
    }

    fn properties(&self) -> Vec<&str> {
        vec!["anchor"]
    }

    fn get(&self, key: &str) -> Option<Value> {
        (key == "anchor").then(|| Value::Vec2(self.offset.get()))
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        let offset = match &value {
            Value::Text(name) => AnchorPoint::from_name(name)
                .map(AnchorPoint::offset)
                .ok_or_else(|| EngineError::StateAssertion(format!("unknown anchor {name}")))?,
            other => expect_vec2(self.id(), key, other)?,
        };
        self.offset.set(offset);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components;
    use approx::assert_relative_eq;

    #[test]
    fn test_pos_move_to_snaps_when_in_reach() {
        let mut world = World::new();
        world.set_dt(0.5);
        let pos = Pos::new(vec2(0.0, 0.0));
        pos.move_to(&world, vec2(10.0, 0.0), 4.0);
        assert_relative_eq!(pos.position().x, 2.0);
        pos.move_to(&world, vec2(3.0, 0.0), 4.0);
        assert_relative_eq!(pos.position().x, 3.0);
    }

    #[test]
    fn test_pos_methods_through_world() {
        let mut world = World::new();
        let e = world.spawn(components![Pos::new(vec2(1.0, 1.0))]).unwrap();
        world.call(e, "moveBy", &[Value::Vec2(vec2(2.0, 3.0))]).unwrap();
        assert_eq!(world.vec2(e, "pos"), Some(vec2(3.0, 4.0)));
        assert!(world.set_prop(e, "pos", 5.0_f32).is_err());
    }

    #[test]
    fn test_scale_accepts_number() {
        let mut world = World::new();
        let e = world.spawn(components![Scale::default()]).unwrap();
        world.set_prop(e, "scale", 2.0_f32).unwrap();
        assert_eq!(world.vec2(e, "scale"), Some(vec2(2.0, 2.0)));
    }

    #[test]
    fn test_anchor_by_name() {
        let mut world = World::new();
        let e = world.spawn(components![Anchor::new(AnchorPoint::TopLeft)]).unwrap();
        world.set_prop(e, "anchor", "center").unwrap();
        assert_eq!(world.vec2(e, "anchor"), Some(vec2(0.0, 0.0)));
    }
}
