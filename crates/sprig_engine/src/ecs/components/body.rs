//! Platformer body
//!
//! Gravity, grounding on platforms, jumping, and separation of overlapping
//! bodies. Resolution happens in the collision phase through the area's
//! `CollideUpdate` events; integration happens in the update pass.

use std::cell::Cell;

use log::trace;

use crate::core::config::DEFAULT_JUMP_FORCE;
use crate::ecs::{Component, EntityId, Hooks, Value, World};
use crate::events::{EventArgs, EventKind};
use crate::foundation::math::{vec2, Vec2};
use crate::physics::collision::Collision;
use crate::{EngineError, EngineResult};

use super::{expect_bool, expect_number};

/// Platformer physics ("body"); requires `pos` and `area`
#[derive(Debug)]
pub struct Body {
    vel: Cell<f32>,
    platform: Cell<Option<EntityId>>,
    last_platform_pos: Cell<Option<Vec2>>,
    want_fall: Cell<bool>,
    is_static: Cell<bool>,
    gravity_scale: Cell<f32>,
    jump_force: Cell<Option<f32>>,
    max_velocity: Cell<Option<f32>>,
    stick_to_platform: Cell<bool>,
}

impl Body {
    /// Dynamic body affected by gravity
    pub fn new() -> Self {
        Self {
            vel: Cell::new(0.0),
            platform: Cell::new(None),
            last_platform_pos: Cell::new(None),
            want_fall: Cell::new(false),
            is_static: Cell::new(false),
            gravity_scale: Cell::new(1.0),
            jump_force: Cell::new(None),
            max_velocity: Cell::new(None),
            stick_to_platform: Cell::new(true),
        }
    }

    /// Static body: never moves, only pushes others
    pub fn new_static() -> Self {
        Self::new().with_static(true)
    }

    /// Set whether the body is static
    pub fn with_static(self, is_static: bool) -> Self {
        self.is_static.set(is_static);
        self
    }

    /// Multiplier on scene gravity
    pub fn with_gravity_scale(self, scale: f32) -> Self {
        self.gravity_scale.set(scale);
        self
    }

    /// Impulse used by [`jump_default`](Self::jump_default)
    pub fn with_jump_force(self, force: f32) -> Self {
        self.jump_force.set(Some(force));
        self
    }

    /// Terminal fall velocity
    pub fn with_max_velocity(self, velocity: f32) -> Self {
        self.max_velocity.set(Some(velocity));
        self
    }

    /// Whether a grounded body follows its platform's movement
    pub fn with_stick_to_platform(self, stick: bool) -> Self {
        self.stick_to_platform.set(stick);
        self
    }

    /// Vertical velocity, positive downward
    pub fn velocity(&self) -> f32 {
        self.vel.get()
    }

    /// Whether the body is static
    pub fn is_static(&self) -> bool {
        self.is_static.get()
    }

    /// Platform the body stands on
    pub fn cur_platform(&self) -> Option<EntityId> {
        self.platform.get()
    }

    /// Standing on a platform
    pub fn is_grounded(&self) -> bool {
        self.platform.get().is_some()
    }

    /// Moving down
    pub fn is_falling(&self) -> bool {
        self.vel.get() > 0.0
    }

    /// Moving up
    pub fn is_jumping(&self) -> bool {
        self.vel.get() < 0.0
    }

    /// Leave the platform with an upward impulse. Static bodies ignore it.
    pub fn jump(&self, force: f32) {
        if self.is_static.get() {
            return;
        }
        self.platform.set(None);
        self.last_platform_pos.set(None);
        self.vel.set(-force);
    }

    /// Jump with the configured force
    pub fn jump_default(&self) {
        self.jump(self.jump_force.get().unwrap_or(DEFAULT_JUMP_FORCE));
    }

    fn land(&self, world: &mut World, entity: EntityId, platform: EntityId) -> EngineResult<()> {
        let reconfirmed = self.want_fall.get() && self.platform.get() == Some(platform);
        self.vel.set(0.0);
        self.platform.set(Some(platform));
        self.last_platform_pos.set(Some(world.pos(platform)));
        self.want_fall.set(false);
        if reconfirmed {
            return Ok(());
        }
        trace!("{entity:?} grounded on {platform:?}");
        world.trigger(entity, EventKind::Ground, EventArgs::Entity(platform))
    }

    /// Follow the platform or notice it is gone. Returns whether the body is still grounded.
    fn track_platform(&self, world: &mut World, entity: EntityId, platform: EntityId) -> EngineResult<bool> {
        let supported = world.exists(platform) && world.has(platform, "body") && world.is_touching(entity, platform)?;
        if !supported {
            self.want_fall.set(true);
            return Ok(false);
        }
        let now = world.pos(platform);
        if let Some(last) = self.last_platform_pos.get() {
            if now != last && self.stick_to_platform.get() {
                world.move_by(entity, now - last)?;
            }
        }
        self.last_platform_pos.set(Some(now));
        Ok(true)
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::new()
    }
}

/// Separate a body pair once per frame.
///
/// Static bodies never move; between two dynamic bodies the other side
/// of the record is moved.
fn resolve(world: &mut World, entity: EntityId, col: &Collision) -> EngineResult<()> {
    let other = col.target;
    if col.is_resolved() || !world.has(other, "body") {
        return Ok(());
    }
    let is_static = |world: &World, e: EntityId| world.component::<Body>(e).is_some_and(|b| b.is_static());
    let (this_static, other_static) = (is_static(world, entity), is_static(world, other));
    if this_static && other_static {
        return Ok(());
    }

    let col2 = if !this_static && other_static { col.clone() } else { col.reverse() };
    world.trigger(col2.source, EventKind::BeforePhysicsResolve, EventArgs::Collision(col2.clone()))?;
    world.trigger(col2.target, EventKind::BeforePhysicsResolve, EventArgs::Collision(col2.reverse()))?;
    if col.is_resolved() {
        return Ok(());
    }

    world.move_by(col2.source, col2.displacement)?;
    world.update_transform(col2.source);
    col.set_resolved();
    world.trigger(col2.source, EventKind::PhysicsResolve, EventArgs::Collision(col2.clone()))?;
    world.trigger(col2.target, EventKind::PhysicsResolve, EventArgs::Collision(col2.reverse()))
}

impl Component for Body {
    fn id(&self) -> &str {
        "body"
    }

    fn require(&self) -> Vec<&str> {
        vec!["pos", "area"]
    }

    fn properties(&self) -> Vec<&str> {
        vec!["jumpForce", "gravityScale", "isStatic", "maxVelocity", "vel"]
    }

    fn methods(&self) -> Vec<&str> {
        vec!["jump", "isGrounded", "isFalling", "isJumping", "curPlatform"]
    }

    fn hooks(&self) -> Hooks {
        Hooks::ADD | Hooks::UPDATE
    }

    fn get(&self, key: &str) -> Option<Value> {
        match key {
            "jumpForce" => Some(Value::Number(self.jump_force.get().unwrap_or(DEFAULT_JUMP_FORCE))),
            "gravityScale" => Some(Value::Number(self.gravity_scale.get())),
            "isStatic" => Some(Value::Bool(self.is_static.get())),
            "maxVelocity" => Some(self.max_velocity.get().map_or(Value::Null, Value::Number)),
            "vel" => Some(Value::Number(self.vel.get())),
            _ => None,
        }
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        match key {
            "isStatic" => self.is_static.set(expect_bool(self.id(), key, &value)?),
            "jumpForce" => self.jump_force.set(Some(expect_number(self.id(), key, &value)?)),
            "gravityScale" => self.gravity_scale.set(expect_number(self.id(), key, &value)?),
            "maxVelocity" => match value {
                Value::Null => self.max_velocity.set(None),
                other => self.max_velocity.set(Some(expect_number(self.id(), key, &other)?)),
            },
            "vel" => self.vel.set(expect_number(self.id(), key, &value)?),
            _ => return Err(EngineError::StateAssertion(format!("body has no property {key}"))),
        }
        Ok(())
    }

    fn call(&self, _world: &mut World, _entity: EntityId, method: &str, args: &[Value]) -> EngineResult<Value> {
        Ok(match method {
            "jump" => {
                match args.first().and_then(Value::as_number) {
                    Some(force) => self.jump(force),
                    None => self.jump_default(),
                }
                Value::Null
            }
            "isGrounded" => Value::Bool(self.is_grounded()),
            "isFalling" => Value::Bool(self.is_falling()),
            "isJumping" => Value::Bool(self.is_jumping()),
            "curPlatform" => self.platform.get().map_or(Value::Null, Value::Entity),
            _ => return Err(EngineError::StateAssertion(format!("body has no method {method}"))),
        })
    }

    fn on_add(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        if self.jump_force.get().is_none() {
            self.jump_force.set(Some(world.config().default_jump_force));
        }

        world.on_component(entity, "body", EventKind::CollideUpdate, |world, entity, args| {
            match args.collision() {
                Some(col) => resolve(world, entity, col),
                None => Ok(()),
            }
        })?;

        world.on_component(entity, "body", EventKind::PhysicsResolve, |world, entity, args| {
            let (Some(col), Some(body)) = (args.collision(), world.component::<Body>(entity)) else {
                return Ok(());
            };
            if world.gravity() == 0.0 {
                return Ok(());
            }
            if col.is_bottom() && body.is_falling() {
                body.land(world, entity, col.target)?;
            } else if col.is_top() && body.is_jumping() {
                body.vel.set(0.0);
                world.trigger(entity, EventKind::Headbutt, EventArgs::Entity(col.target))?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn on_update(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        let gravity = world.gravity();
        if gravity == 0.0 || self.is_static.get() {
            return Ok(());
        }

        if self.want_fall.get() {
            self.platform.set(None);
            self.last_platform_pos.set(None);
            self.want_fall.set(false);
            world.trigger(entity, EventKind::FallOff, EventArgs::None)?;
        }

        if let Some(platform) = self.platform.get() {
            if self.track_platform(world, entity, platform)? {
                return Ok(());
            }
        }

        let prev = self.vel.get();
        let max = self.max_velocity.get().unwrap_or(world.config().max_fall_velocity);
        let vel = (prev + gravity * self.gravity_scale.get() * world.dt()).min(max);
        self.vel.set(vel);
        if prev < 0.0 && vel >= 0.0 {
            world.trigger(entity, EventKind::Fall, EventArgs::None)?;
        }
        world.move_by(entity, vec2(0.0, vel * world.dt()))
    }

    fn inspect(&self) -> Option<String> {
        Some(format!("vel {:.2}, grounded {}", self.vel.get(), self.is_grounded()))
    }
}
