//! # Sprig Engine
//!
//! Runtime object model and collision engine for 2D games: a tree of
//! entities that gain behavior from components attached at runtime, a
//! spatial-hash broad phase with SAT narrow phase, and a platformer body
//! built on top of it.
//!
//! ## Features
//!
//! - **Dynamic composition**: components merge properties and methods into
//!   their entity and may require other components
//! - **Entity tree**: cached world transforms, depth-sorted queries,
//!   deterministic update order that tolerates mid-frame mutation
//! - **Collision**: spatial hash grid, SAT over convex polygons, enter,
//!   update and exit events per pair
//! - **Platformer physics**: gravity, grounding, jumping, one resolution
//!   per colliding pair per frame
//! - **Scenes**: named factories with transitions deferred to frame end
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sprig_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut engine = Engine::new(EngineConfig::default())?;
//!     engine.scene("main", |world, _args| {
//!         world.set_gravity(1600.0);
//!         world.spawn(components![
//!             Pos::new(vec2(0.0, 0.0)),
//!             RectShape::new(16.0, 16.0),
//!             Area::new(),
//!             Body::new(),
//!             "player",
//!         ])?;
//!         Ok(())
//!     });
//!     engine.go("main", Vec::new())?;
//!     for _ in 0..60 {
//!         engine.frame(1.0 / 60.0)?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod config;
pub mod core;

pub mod ecs;
pub mod events;
pub mod foundation;
pub mod physics;
pub mod scene;
pub mod spatial;

mod engine;

pub use engine::{Engine, EngineError, EngineResult};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        components,
        core::config::{Config, EngineConfig},
        ecs::components::{
            Anchor, AnchorPoint, Area, Body, CircleShape, Follow, Health, Lifespan, Move, PolygonShape, Pos,
            RectShape, Rotate, Scale, Stay, Timer, Z,
        },
        ecs::{Component, Custom, EntityId, Hooks, Query, Tag, Value, World},
        events::{EventArgs, EventController, EventKind},
        foundation::math::{vec2, Mat3, Vec2},
        physics::{Collision, Shape},
        Engine, EngineError, EngineResult,
    };
}
