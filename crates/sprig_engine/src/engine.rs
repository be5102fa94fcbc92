//! Frame scheduler
//!
//! [`Engine`] owns the world and drives it one frame at a time:
//! input latch, update pass, collision pass, draw pass, frame end, then the
//! scene transitions and arena cleanup deferred to the end of the frame.

use std::path::Path;

use log::{debug, info};
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::core::config::EngineConfig;
use crate::ecs::{Value, World};
use crate::events::{EventArgs, EventKind};
use crate::foundation::time::Timer;
use crate::physics::CollisionSystem;

/// Engine-level errors.
///
/// All of them are programmer errors surfaced synchronously from the call
/// that caused them. The engine never retries or recovers on its own.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Two component ids claim the same property on one entity
    #[error("Property '{property}' is already defined by component '{owner}', cannot add '{component}'")]
    DuplicateProperty {
        /// Conflicting key
        property: String,
        /// Component currently owning it
        owner: String,
        /// Component being attached
        component: String,
    },

    /// A required component is absent when the entity becomes live
    #[error("Component '{component}' requires component '{dependency}'")]
    MissingDependency {
        /// Component with the requirement
        component: String,
        /// Missing component id
        dependency: String,
    },

    /// Scene id was never registered
    #[error("Scene not found: {0}")]
    UnknownScene(String),

    /// Geometry that the narrow phase cannot work with
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// Entity tree invariant violated
    #[error("State assertion failed: {0}")]
    StateAssertion(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result alias used across the engine
pub type EngineResult<T> = Result<T, EngineError>;

/// Main engine struct
///
/// Holds the world, the collision pipeline and the frame clock. The host
/// calls [`frame`](Engine::frame) with its own delta or [`tick`](Engine::tick)
/// to measure it.
pub struct Engine {
    world: World,
    collision: CollisionSystem,
    timer: Timer,
    time_scale: f32,
    debug_paused: bool,
}

impl Engine {
    /// Create an engine from a validated configuration
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        info!(
            "Initializing engine (grid {}, time scale {})",
            config.hash_grid_size, config.time_scale
        );
        Ok(Self {
            collision: CollisionSystem::new(config.hash_grid_size),
            time_scale: config.time_scale,
            world: World::with_config(config),
            timer: Timer::new(),
            debug_paused: false,
        })
    }

    /// Create an engine from a `.toml` or `.ron` configuration file
    pub fn from_config_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let config = EngineConfig::load_from_file(path)?;
        Self::new(config)
    }

    /// The world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The world, mutably
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The collision pipeline
    pub fn collision(&self) -> &CollisionSystem {
        &self.collision
    }

    /// Frames run so far
    pub fn frame_count(&self) -> u64 {
        self.timer.frame_count()
    }

    /// Scene time elapsed so far, before time scaling
    pub fn total_time(&self) -> f32 {
        self.timer.total_time()
    }

    /// Skip the update pass while still running collision and draw
    pub fn set_debug_paused(&mut self, paused: bool) {
        self.debug_paused = paused;
    }

    /// Whether the update pass is skipped
    pub fn is_debug_paused(&self) -> bool {
        self.debug_paused
    }

    /// Register a scene factory
    pub fn scene<F>(&mut self, id: &str, factory: F)
    where
        F: Fn(&mut World, &[Value]) -> EngineResult<()> + 'static,
    {
        self.world.scene(id, factory);
    }

    /// Request a scene transition; it runs at the end of the next frame
    pub fn go(&mut self, id: &str, args: Vec<Value>) -> EngineResult<()> {
        self.world.go(id, args)
    }

    /// Run one frame of `dt` seconds
    pub fn frame(&mut self, dt: f32) -> EngineResult<()> {
        let dt = self.timer.advance(dt);
        self.run_frame(dt)
    }

    /// Run one frame, measuring the delta from the wall clock
    pub fn tick(&mut self) -> EngineResult<()> {
        let dt = self.timer.update();
        self.run_frame(dt)
    }

    fn run_frame(&mut self, dt: f32) -> EngineResult<()> {
        self.world.set_dt(dt * self.time_scale);

        self.world.trigger_event(EventKind::Input, EventArgs::None)?;
        if !self.debug_paused {
            self.world.update_pass()?;
        }
        self.collision.check_frame(&mut self.world)?;
        self.world.draw_pass()?;

        self.world.trigger_event(EventKind::FrameEnd, EventArgs::None)?;
        self.world.run_scene_transitions()?;
        self.world.collect_garbage();
        debug!(
            "Frame {} done: {} entities",
            self.timer.frame_count(),
            self.world.entity_count()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components;
    use crate::ecs::components::Pos;
    use crate::foundation::math::vec2;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig::default().with_hash_grid_size(0.0);
        assert!(matches!(Engine::new(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_frame_phase_order() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let order = Rc::new(RefCell::new(Vec::new()));
        let world = engine.world_mut();
        let e = world.spawn(components![Pos::default()]).unwrap();
        for kind in [EventKind::Input, EventKind::FrameEnd] {
            let order = Rc::clone(&order);
            let name = kind.name().to_string();
            world.on_event(kind, move |_, _, _| {
                order.borrow_mut().push(name.clone());
                Ok(())
            });
        }
        for kind in [EventKind::Update, EventKind::Draw] {
            let order = Rc::clone(&order);
            let name = kind.name().to_string();
            world
                .on_entity(e, kind, move |_, _, _| {
                    order.borrow_mut().push(name.clone());
                    Ok(())
                })
                .unwrap();
        }
        engine.frame(0.016).unwrap();
        assert_eq!(*order.borrow(), ["input", "update", "draw", "frameEnd"]);
        assert_eq!(engine.frame_count(), 1);
    }

    #[test]
    fn test_time_scale_and_negative_dt() {
        let config = EngineConfig::default().with_time_scale(0.5);
        let mut engine = Engine::new(config).unwrap();
        engine.frame(0.2).unwrap();
        assert_relative_eq!(engine.world().dt(), 0.1);
        engine.frame(-1.0).unwrap();
        assert_relative_eq!(engine.world().dt(), 0.0);
    }

    #[test]
    fn test_debug_pause_skips_update_only() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let world = engine.world_mut();
        let e = world
            .spawn(components![
                Pos::default(),
                crate::ecs::components::Move::new(vec2(1.0, 0.0), 10.0)
            ])
            .unwrap();
        engine.set_debug_paused(true);
        engine.frame(1.0).unwrap();
        assert_relative_eq!(engine.world().pos(e).x, 0.0);
        engine.set_debug_paused(false);
        engine.frame(1.0).unwrap();
        assert_relative_eq!(engine.world().pos(e).x, 10.0);
    }
}
