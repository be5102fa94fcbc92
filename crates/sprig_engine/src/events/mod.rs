//! Event system
//!
//! One generic publisher type backs both the per-entity bus and the world
//! buses. Key principles:
//! - Topic -> ordered list of cancellable subscriptions
//! - Synchronous delivery in registration order
//! - Dispatch works on a snapshot, so listeners may subscribe, cancel or
//!   mutate the world while an event is being delivered
//! - Cancellation is an idempotent handle, safe to call from the listener itself

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use crate::ecs::{EntityId, Value, World};
use crate::physics::collision::Collision;
use crate::EngineResult;

/// Engine event identification
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Entity joined the tree
    Add,
    /// Per-frame update of a live, unpaused entity
    Update,
    /// Draw pass visit of a visible entity
    Draw,
    /// Entity was removed from the tree
    Destroy,
    /// An overlapping pair was first seen
    Collide,
    /// An overlapping pair was seen this frame
    CollideUpdate,
    /// A tracked pair stopped overlapping
    CollideEnd,
    /// A body pair is about to be separated; resolution can be vetoed
    BeforePhysicsResolve,
    /// A body pair was separated
    PhysicsResolve,
    /// Body landed on a platform
    Ground,
    /// Body passed the apex of its jump
    Fall,
    /// Body lost its platform
    FallOff,
    /// Body hit something above while rising
    Headbutt,
    /// Health decreased
    Hurt,
    /// Health increased
    Heal,
    /// Health reached zero
    Death,
    /// Start of frame, after the host latched its input
    Input,
    /// End of frame, before scene transitions run
    FrameEnd,
    /// User-defined event
    Custom(String),
}

impl EventKind {
    /// Lifecycle names a component key may not claim as a callable method
    pub const LIFECYCLE: [&'static str; 4] = ["add", "update", "draw", "destroy"];

    /// Name used in logs and for string lookups
    pub fn name(&self) -> &str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Draw => "draw",
            Self::Destroy => "destroy",
            Self::Collide => "collide",
            Self::CollideUpdate => "collideUpdate",
            Self::CollideEnd => "collideEnd",
            Self::BeforePhysicsResolve => "beforePhysicsResolve",
            Self::PhysicsResolve => "physicsResolve",
            Self::Ground => "ground",
            Self::Fall => "fall",
            Self::FallOff => "fallOff",
            Self::Headbutt => "headbutt",
            Self::Hurt => "hurt",
            Self::Heal => "heal",
            Self::Death => "death",
            Self::Input => "input",
            Self::FrameEnd => "frameEnd",
            Self::Custom(name) => name,
        }
    }

    /// Lifecycle kind for a reserved key, if it is one
    pub fn lifecycle(name: &str) -> Option<Self> {
        match name {
            "add" => Some(Self::Add),
            "update" => Some(Self::Update),
            "draw" => Some(Self::Draw),
            "destroy" => Some(Self::Destroy),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        Self::Custom(name.to_string())
    }
}

/// Event payload
#[derive(Debug, Clone)]
pub enum EventArgs {
    /// No payload
    None,
    /// Another entity (the parent on add, the platform on ground, ...)
    Entity(EntityId),
    /// A collision record
    Collision(Collision),
    /// A numeric amount (damage, healing)
    Amount(f32),
    /// Arbitrary value for custom events
    Value(Value),
}

impl EventArgs {
    /// Collision payload if present
    pub fn collision(&self) -> Option<&Collision> {
        match self {
            Self::Collision(col) => Some(col),
            _ => None,
        }
    }

    /// Entity payload if present
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Self::Entity(e) => Some(*e),
            _ => None,
        }
    }

    /// Amount payload if present
    pub fn amount(&self) -> Option<f32> {
        match self {
            Self::Amount(n) => Some(*n),
            _ => None,
        }
    }
}

/// Listener callback: the world, the entity the event fired on, the payload
pub type Listener = dyn Fn(&mut World, EntityId, &EventArgs) -> EngineResult<()>;

/// Handle to one subscription (or a group of them)
#[derive(Debug, Clone, Default)]
pub struct EventController {
    cancelled: Rc<Cell<bool>>,
    paused: Rc<Cell<bool>>,
}

impl EventController {
    /// Create a live, unpaused controller
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop delivery for good. Calling it again does nothing.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// Whether [`cancel`](Self::cancel) was called
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Temporarily skip or resume delivery
    pub fn set_paused(&self, paused: bool) {
        self.paused.set(paused);
    }

    /// Whether delivery is paused
    pub fn is_paused(&self) -> bool {
        self.paused.get()
    }
}

/// A registered listener
pub struct Subscription {
    controller: EventController,
    callback: Box<Listener>,
}

impl Subscription {
    fn is_live(&self) -> bool {
        !self.controller.is_cancelled()
    }
}

/// Topic-keyed publisher
pub struct EventHandler<K> {
    handlers: HashMap<K, Vec<Rc<Subscription>>>,
}

impl<K: Eq + Hash + Clone> EventHandler<K> {
    /// Create an empty handler
    pub fn new() -> Self {
        Self { handlers: HashMap::new() }
    }

    /// Subscribe `callback` to `kind`
    pub fn on<F>(&mut self, kind: K, callback: F) -> EventController
    where
        F: Fn(&mut World, EntityId, &EventArgs) -> EngineResult<()> + 'static,
    {
        self.insert(kind, EventController::new(), Box::new(callback))
    }

    /// Subscribe `callback` for a single delivery
    pub fn on_once<F>(&mut self, kind: K, callback: F) -> EventController
    where
        F: Fn(&mut World, EntityId, &EventArgs) -> EngineResult<()> + 'static,
    {
        let controller = EventController::new();
        let handle = controller.clone();
        self.insert(
            kind,
            controller,
            Box::new(move |world, entity, args| {
                handle.cancel();
                callback(world, entity, args)
            }),
        )
    }

    fn insert(&mut self, kind: K, controller: EventController, callback: Box<Listener>) -> EventController {
        let list = self.handlers.entry(kind).or_default();
        list.retain(|sub| sub.is_live());
        list.push(Rc::new(Subscription {
            controller: controller.clone(),
            callback,
        }));
        controller
    }

    /// Snapshot of the live subscriptions for `kind`, in registration order
    pub fn listeners(&mut self, kind: &K) -> Vec<Rc<Subscription>> {
        match self.handlers.get_mut(kind) {
            Some(list) => {
                list.retain(|sub| sub.is_live());
                list.clone()
            }
            None => Vec::new(),
        }
    }

    /// Cancel and drop every subscription to `kind`
    pub fn remove(&mut self, kind: &K) {
        if let Some(list) = self.handlers.remove(kind) {
            for sub in list {
                sub.controller.cancel();
            }
        }
    }

    /// Cancel and drop every subscription
    pub fn clear(&mut self) {
        for (_, list) in self.handlers.drain() {
            for sub in list {
                sub.controller.cancel();
            }
        }
    }

    /// Number of live subscriptions to `kind`
    pub fn num_listeners(&self, kind: &K) -> usize {
        self.handlers
            .get(kind)
            .map_or(0, |list| list.iter().filter(|sub| sub.is_live()).count())
    }
}

impl<K: Eq + Hash + Clone> Default for EventHandler<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deliver an event to a snapshot of subscriptions.
///
/// Subscriptions cancelled or paused by an earlier listener in the same
/// delivery are skipped. Listeners may trigger further events, including
/// ones that reach themselves. The first error stops delivery.
pub fn dispatch(
    world: &mut World,
    subscriptions: &[Rc<Subscription>],
    entity: EntityId,
    args: &EventArgs,
) -> EngineResult<()> {
    for sub in subscriptions {
        if sub.controller.is_cancelled() || sub.controller.is_paused() {
            continue;
        }
        (sub.callback)(world, entity, args)?;
    }
    Ok(())
}
