//! Motion components: constant-direction movement and following

use std::cell::Cell;

use crate::ecs::{Component, EntityId, Hooks, Value, World};
use crate::foundation::math::{vec2, Vec2};
use crate::EngineResult;

use super::{expect_number, expect_vec2};

/// Constant-velocity motion ("move"); requires `pos`
#[derive(Debug)]
pub struct Move {
    dir: Cell<Vec2>,
    speed: Cell<f32>,
}

impl Move {
    /// Move along `dir` at `speed` units per second. A zero direction stands still.
    pub fn new(dir: Vec2, speed: f32) -> Self {
        Self {
            dir: Cell::new(dir.try_normalize(f32::EPSILON).unwrap_or_else(Vec2::zeros)),
            speed: Cell::new(speed),
        }
    }

    /// Move at an angle in degrees, 0 pointing right
    pub fn from_angle(degrees: f32, speed: f32) -> Self {
        let rad = degrees.to_radians();
        Self::new(vec2(rad.cos(), rad.sin()), speed)
    }

    /// Velocity in units per second
    pub fn velocity(&self) -> Vec2 {
        self.dir.get() * self.speed.get()
    }
}

impl Component for Move {
    fn id(&self) -> &str {
        "move"
    }

    fn require(&self) -> Vec<&str> {
        vec!["pos"]
    }

    fn properties(&self) -> Vec<&str> {
        vec!["dir", "speed"]
    }

    fn hooks(&self) -> Hooks {
        Hooks::UPDATE
    }

    fn get(&self, key: &str) -> Option<Value> {
        match key {
            "dir" => Some(Value::Vec2(self.dir.get())),
            "speed" => Some(Value::Number(self.speed.get())),
            _ => None,
        }
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        match key {
            "dir" => {
                let dir = expect_vec2(self.id(), key, &value)?;
                self.dir.set(dir.try_normalize(f32::EPSILON).unwrap_or_else(Vec2::zeros));
            }
            _ => self.speed.set(expect_number(self.id(), key, &value)?),
        }
        Ok(())
    }

    fn on_update(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        let delta = self.velocity() * world.dt();
        world.move_by(entity, delta)
    }
}

/// Track another entity's position ("follow"); requires `pos`.
///
/// The target is held by id and skipped while it does not exist.
#[derive(Debug)]
pub struct Follow {
    target: Cell<EntityId>,
    offset: Cell<Vec2>,
}

impl Follow {
    /// Follow `target` at `offset`
    pub fn new(target: EntityId, offset: Vec2) -> Self {
        Self {
            target: Cell::new(target),
            offset: Cell::new(offset),
        }
    }

    /// Entity being followed
    pub fn target(&self) -> EntityId {
        self.target.get()
    }

    fn snap(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        let target = self.target.get();
        if !world.exists(target) {
            return Ok(());
        }
        let dest = world.pos(target) + self.offset.get();
        world.set_prop(entity, "pos", dest)
    }
}

impl Component for Follow {
    fn id(&self) -> &str {
        "follow"
    }

    fn require(&self) -> Vec<&str> {
        vec!["pos"]
    }

    fn properties(&self) -> Vec<&str> {
        vec!["followTarget", "followOffset"]
    }

    fn hooks(&self) -> Hooks {
        Hooks::ADD | Hooks::UPDATE
    }

    fn get(&self, key: &str) -> Option<Value> {
        match key {
            "followTarget" => Some(Value::Entity(self.target.get())),
            "followOffset" => Some(Value::Vec2(self.offset.get())),
            _ => None,
        }
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        match (key, &value) {
            ("followTarget", Value::Entity(e)) => self.target.set(*e),
            _ => self.offset.set(expect_vec2(self.id(), key, &value)?),
        }
        Ok(())
    }

    fn on_add(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        self.snap(world, entity)
    }

    fn on_update(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        self.snap(world, entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components;
    use crate::ecs::components::Pos;
    use approx::assert_relative_eq;

    #[test]
    fn test_move_normalizes_direction() {
        let mut world = World::new();
        world.set_dt(0.5);
        let e = world
            .spawn(components![Pos::default(), Move::new(vec2(3.0, 4.0), 10.0)])
            .unwrap();
        world.update_pass().unwrap();
        assert_relative_eq!(world.pos(e).x, 3.0);
        assert_relative_eq!(world.pos(e).y, 4.0);
    }

    #[test]
    fn test_move_with_zero_direction_stays_put() {
        let m = Move::new(Vec2::zeros(), 10.0);
        assert_relative_eq!(m.velocity().norm(), 0.0);
    }

    #[test]
    fn test_follow_tracks_until_target_is_gone() {
        let mut world = World::new();
        let leader = world.spawn(components![Pos::new(vec2(5.0, 5.0))]).unwrap();
        let follower = world
            .spawn(components![Pos::default(), Follow::new(leader, vec2(0.0, -2.0))])
            .unwrap();
        assert_eq!(world.pos(follower), vec2(5.0, 3.0));

        world.set_prop(leader, "pos", vec2(8.0, 5.0)).unwrap();
        world.update_pass().unwrap();
        assert_eq!(world.pos(follower), vec2(8.0, 3.0));

        world.destroy(leader).unwrap();
        world.update_pass().unwrap();
        assert_eq!(world.pos(follower), vec2(8.0, 3.0));
    }
}
