//! World: the entity tree and the context every frame phase runs against
//!
//! The world owns an arena of entity nodes keyed by generational ids. The
//! tree owns children through id lists; every other entity reference (a
//! body's platform, a follow target, a collision partner) is a plain id
//! checked against the arena before use. Scene state that would otherwise be
//! global (gravity, the time step, the scene buses) lives here too and is
//! reset on scene transition.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::rc::Rc;

use log::{debug, trace};
use slotmap::SlotMap;

use crate::core::config::EngineConfig;
use crate::events::{dispatch, EventArgs, EventController, EventHandler, EventKind};
use crate::foundation::math::{local_transform, Mat3, Vec2};
use crate::physics::collision::Collision;
use crate::scene::{SceneFactory, SceneManager};
use crate::{EngineError, EngineResult};

use super::component::{Component, Custom, Hooks, IntoComponent};
use super::components::Stay;
use super::entity::{BindingKind, ComponentSlot, EntityId, EntityNode};
use super::query::Query;
use super::value::Value;

/// Entity tree plus per-scene state
pub struct World {
    entities: SlotMap<EntityId, EntityNode>,
    root: EntityId,
    /// Scene-level bus: input, frame end, user events
    events: EventHandler<EventKind>,
    /// Fired after the entity's own bus for every entity-level trigger
    object_events: EventHandler<EventKind>,
    scenes: SceneManager,
    config: EngineConfig,
    gravity: f32,
    dt: f32,
    garbage: Vec<EntityId>,
}

impl World {
    /// Create a world with default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a world with the given configuration
    pub fn with_config(config: EngineConfig) -> Self {
        let mut entities = SlotMap::with_key();
        let root = entities.insert(EntityNode::new());
        Self {
            entities,
            root,
            events: EventHandler::new(),
            object_events: EventHandler::new(),
            scenes: SceneManager::new(),
            gravity: config.gravity,
            config,
            dt: 0.0,
            garbage: Vec::new(),
        }
    }

    /// The root entity; always live, never destroyed
    pub fn root(&self) -> EntityId {
        self.root
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Time step of the current frame, after time scale
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Set the time step; the engine does this at the start of every frame
    pub fn set_dt(&mut self, dt: f32) {
        self.dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    }

    /// Current scene gravity
    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    /// Change scene gravity
    pub fn set_gravity(&mut self, gravity: f32) {
        self.gravity = gravity;
    }

    // ------------------------------------------------------------------
    // Construction and the tree

    /// Build an entity that is not part of the tree yet.
    ///
    /// Requirements of its components are checked when it is added.
    pub fn make(&mut self, components: Vec<Rc<dyn Component>>) -> EngineResult<EntityId> {
        let entity = self.entities.insert(EntityNode::new());
        for component in components {
            if let Err(err) = self.attach_shared(entity, component) {
                self.entities.remove(entity);
                return Err(err);
            }
        }
        Ok(entity)
    }

    /// Build an entity and add it under `parent`
    pub fn add(&mut self, parent: EntityId, components: Vec<Rc<dyn Component>>) -> EngineResult<EntityId> {
        let entity = self.make(components)?;
        self.add_entity(parent, entity)
    }

    /// Build an entity and add it under the root
    pub fn spawn(&mut self, components: Vec<Rc<dyn Component>>) -> EngineResult<EntityId> {
        self.add(self.root, components)
    }

    /// Add an unparented entity under `parent`.
    ///
    /// Computes its world transform from the parent's cached one, then fires
    /// `add` on the entity and on the object bus.
    pub fn add_entity(&mut self, parent: EntityId, entity: EntityId) -> EngineResult<EntityId> {
        let Some(parent_transform) = self.entities.get(parent).map(|node| node.transform) else {
            return Err(EngineError::StateAssertion(format!("parent {parent:?} does not exist")));
        };
        match self.entities.get(entity) {
            None => return Err(EngineError::StateAssertion(format!("entity {entity:?} does not exist"))),
            Some(node) if node.parent.is_some() => {
                return Err(EngineError::StateAssertion(format!("entity {entity:?} already has a parent")))
            }
            Some(_) => {}
        }
        if entity == self.root || self.is_ancestor(entity, parent) {
            return Err(EngineError::StateAssertion(format!(
                "adding {entity:?} under {parent:?} would create a cycle"
            )));
        }

        let transform = parent_transform * self.local_transform(entity);
        if let Some(node) = self.entities.get_mut(entity) {
            node.parent = Some(parent);
            node.transform = transform;
        }
        if let Some(node) = self.entities.get_mut(parent) {
            node.children.push(entity);
        }
        debug!("Added {entity:?} under {parent:?}");

        self.trigger(entity, EventKind::Add, EventArgs::Entity(parent))?;
        Ok(entity)
    }

    /// Detach `entity` from `parent`, firing `destroy` on it alone.
    ///
    /// Its subtree becomes unreachable at once and is released from the arena
    /// at the end of the frame. Returns whether `entity` was a child of `parent`.
    pub fn remove(&mut self, parent: EntityId, entity: EntityId) -> EngineResult<bool> {
        let Some(parent_node) = self.entities.get_mut(parent) else {
            return Ok(false);
        };
        let Some(index) = parent_node.children.iter().position(|c| *c == entity) else {
            return Ok(false);
        };
        parent_node.children.remove(index);
        if let Some(node) = self.entities.get_mut(entity) {
            node.parent = None;
        }
        self.garbage.push(entity);
        debug!("Removed {entity:?} from {parent:?}");

        self.trigger(entity, EventKind::Destroy, EventArgs::None)?;
        Ok(true)
    }

    /// Remove `entity` from its parent
    pub fn destroy(&mut self, entity: EntityId) -> EngineResult<()> {
        if let Some(parent) = self.parent(entity) {
            self.remove(parent, entity)?;
        }
        Ok(())
    }

    /// Destroy every direct child of the root matching `query`
    pub fn destroy_all(&mut self, query: impl Into<Query>) -> EngineResult<()> {
        let root = self.root;
        for entity in self.get(root, query) {
            if self.parent(entity) == Some(root) {
                self.remove(root, entity)?;
            }
        }
        Ok(())
    }

    /// Move `entity` to the end of its parent's child list
    pub fn readd(&mut self, parent: EntityId, entity: EntityId) -> EngineResult<()> {
        let node = self
            .entities
            .get_mut(parent)
            .ok_or_else(|| EngineError::StateAssertion(format!("parent {parent:?} does not exist")))?;
        let index = node
            .children
            .iter()
            .position(|c| *c == entity)
            .ok_or_else(|| EngineError::StateAssertion(format!("{entity:?} is not a child of {parent:?}")))?;
        node.children.remove(index);
        node.children.push(entity);
        Ok(())
    }

    /// Parent of `entity`, if attached
    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.entities.get(entity).and_then(|node| node.parent)
    }

    /// Children of `entity` in list order
    pub fn children(&self, entity: EntityId) -> Vec<EntityId> {
        self.entities
            .get(entity)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// Whether `entity` is reachable from the root
    pub fn exists(&self, entity: EntityId) -> bool {
        let mut current = entity;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Whether `entity` is still allocated, attached or not
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.contains_key(entity)
    }

    fn is_ancestor(&self, ancestor: EntityId, entity: EntityId) -> bool {
        let mut current = Some(entity);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether `entity` carries `tag`; `"*"` matches every entity
    pub fn is(&self, entity: EntityId, tag: &str) -> bool {
        if tag == "*" {
            return self.entities.contains_key(entity);
        }
        self.has(entity, tag)
    }

    /// Whether `entity` carries every tag in `tags`
    pub fn is_all(&self, entity: EntityId, tags: &[&str]) -> bool {
        tags.iter().all(|tag| self.is(entity, tag))
    }

    /// Direct children matching `query`, stably sorted by `z`
    pub fn get(&self, parent: EntityId, query: impl Into<Query>) -> Vec<EntityId> {
        let query = query.into();
        let mut found: Vec<EntityId> = self
            .children(parent)
            .into_iter()
            .filter(|child| query.matches(self, *child))
            .collect();
        self.sort_by_z(&mut found);
        found
    }

    /// Descendants matching `query`, depth first, each level sorted by `z`
    pub fn get_all(&self, parent: EntityId, query: impl Into<Query>) -> Vec<EntityId> {
        let query = query.into();
        let mut found = Vec::new();
        self.collect_descendants(parent, &query, &mut found);
        found
    }

    fn collect_descendants(&self, parent: EntityId, query: &Query, found: &mut Vec<EntityId>) {
        let mut children = self.children(parent);
        self.sort_by_z(&mut children);
        for child in children {
            if query.matches(self, child) {
                found.push(child);
            }
            self.collect_descendants(child, query, found);
        }
    }

    fn sort_by_z(&self, entities: &mut [EntityId]) {
        entities.sort_by(|a, b| {
            let za = self.number(*a, "z").unwrap_or(0.0);
            let zb = self.number(*b, "z").unwrap_or(0.0);
            za.partial_cmp(&zb).unwrap_or(Ordering::Equal)
        });
    }

    /// Pause or resume an entity; paused entities skip update and collision
    pub fn set_paused(&mut self, entity: EntityId, paused: bool) {
        if let Some(node) = self.entities.get_mut(entity) {
            node.paused = paused;
        }
    }

    /// Whether an entity is paused
    pub fn is_paused(&self, entity: EntityId) -> bool {
        self.entities.get(entity).is_some_and(|node| node.paused)
    }

    /// Hide or show an entity and its subtree in the draw pass
    pub fn set_hidden(&mut self, entity: EntityId, hidden: bool) {
        if let Some(node) = self.entities.get_mut(entity) {
            node.hidden = hidden;
        }
    }

    /// Whether an entity is hidden
    pub fn is_hidden(&self, entity: EntityId) -> bool {
        self.entities.get(entity).is_some_and(|node| node.hidden)
    }

    // ------------------------------------------------------------------
    // Components

    /// Attach a component, a bare tag, or a shared component
    pub fn attach(&mut self, entity: EntityId, component: impl IntoComponent) -> EngineResult<()> {
        self.attach_shared(entity, component.into_component())
    }

    /// Attach an already shared component.
    ///
    /// An existing component with the same id is detached first. Every
    /// property and method name must be free or already owned by this id.
    /// On a live entity the requirements are checked before anything
    /// changes; otherwise they are checked when the entity is added.
    pub fn attach_shared(&mut self, entity: EntityId, component: Rc<dyn Component>) -> EngineResult<()> {
        let id = component.id().to_string();
        if !self.entities.contains_key(entity) {
            return Err(EngineError::StateAssertion(format!("entity {entity:?} does not exist")));
        }
        if self.has(entity, &id) {
            self.detach(entity, &id)?;
        }

        let live = self.exists(entity);
        let requires: Vec<String> = component.require().into_iter().map(str::to_string).collect();
        let properties: Vec<String> = component.properties().into_iter().map(str::to_string).collect();
        let methods: Vec<String> = component.methods().into_iter().map(str::to_string).collect();

        let node = self
            .entities
            .get_mut(entity)
            .ok_or_else(|| EngineError::StateAssertion(format!("entity {entity:?} vanished during attach")))?;
        for key in properties.iter().chain(&methods) {
            node.bindings.check(&id, key)?;
        }
        if live {
            if let Some(missing) = requires.iter().find(|dep| !node.has(dep)) {
                return Err(EngineError::MissingDependency {
                    component: id,
                    dependency: missing.clone(),
                });
            }
        }

        for key in &properties {
            node.bindings.bind(&id, key, BindingKind::Property)?;
        }
        for key in &methods {
            node.bindings.bind(&id, key, BindingKind::Method)?;
        }

        let mut cleanups = Vec::new();
        if !live && !requires.is_empty() {
            let owner = id.clone();
            cleanups.push(node.events.on(EventKind::Add, move |world, entity, _| {
                match requires.iter().find(|dep| !world.has(entity, dep)) {
                    Some(missing) => Err(EngineError::MissingDependency {
                        component: owner.clone(),
                        dependency: missing.clone(),
                    }),
                    None => Ok(()),
                }
            }));
        }

        let hooks = component.hooks();
        if hooks.contains(Hooks::ADD) && !live {
            let c = Rc::clone(&component);
            cleanups.push(node.events.on(EventKind::Add, move |world, entity, _| c.on_add(world, entity)));
        }
        if hooks.contains(Hooks::UPDATE) {
            let c = Rc::clone(&component);
            cleanups.push(node.events.on(EventKind::Update, move |world, entity, _| c.on_update(world, entity)));
        }
        if hooks.contains(Hooks::DRAW) {
            let c = Rc::clone(&component);
            cleanups.push(node.events.on(EventKind::Draw, move |world, entity, _| c.on_draw(world, entity)));
        }
        if hooks.contains(Hooks::DESTROY) {
            let c = Rc::clone(&component);
            cleanups.push(node.events.on(EventKind::Destroy, move |world, entity, _| c.on_destroy(world, entity)));
        }

        node.components.push(ComponentSlot {
            id: id.clone(),
            component: Rc::clone(&component),
            cleanups,
        });
        debug!("Attached '{id}' to {entity:?}");

        if live && hooks.contains(Hooks::ADD) {
            component.on_add(self, entity)?;
        }
        Ok(())
    }

    /// Detach a component by id: cancel its listeners, drop its names, run its destroy hook
    pub fn detach(&mut self, entity: EntityId, id: &str) -> EngineResult<()> {
        let Some(node) = self.entities.get_mut(entity) else {
            return Ok(());
        };
        let Some(index) = node.components.iter().position(|slot| slot.id == id) else {
            return Ok(());
        };
        let slot = node.components.remove(index);
        for cleanup in &slot.cleanups {
            cleanup.cancel();
        }
        node.bindings.unbind_owner(id);
        debug!("Detached '{id}' from {entity:?}");

        if slot.component.hooks().contains(Hooks::DESTROY) {
            slot.component.on_destroy(self, entity)?;
        }
        Ok(())
    }

    /// Whether a component id is attached
    pub fn has(&self, entity: EntityId, id: &str) -> bool {
        self.entities.get(entity).is_some_and(|node| node.has(id))
    }

    /// Ids of the attached components, in attach order
    pub fn component_ids(&self, entity: EntityId) -> Vec<String> {
        self.entities
            .get(entity)
            .map(|node| node.components.iter().map(|slot| slot.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Typed access to an attached component
    pub fn component<C: Component>(&self, entity: EntityId) -> Option<Rc<C>> {
        let node = self.entities.get(entity)?;
        node.components
            .iter()
            .find_map(|slot| Rc::clone(&slot.component).into_any_rc().downcast::<C>().ok())
    }

    /// Shared handle to an attached component by id
    pub fn component_by_id(&self, entity: EntityId, id: &str) -> Option<Rc<dyn Component>> {
        self.entities
            .get(entity)
            .and_then(|node| node.slot(id))
            .map(|slot| Rc::clone(&slot.component))
    }

    /// Local-space shape from the first component that provides one
    pub fn render_area(&self, entity: EntityId) -> Option<crate::physics::collision::Shape> {
        self.entities
            .get(entity)?
            .components
            .iter()
            .find_map(|slot| slot.component.render_area())
    }

    /// Per-component debug summaries
    pub fn inspect(&self, entity: EntityId) -> Vec<(String, Option<String>)> {
        self.entities
            .get(entity)
            .map(|node| {
                node.components
                    .iter()
                    .map(|slot| (slot.id.clone(), slot.component.inspect()))
                    .collect()
            })
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Properties and methods

    fn owner_of(&self, entity: EntityId, key: &str, kind: BindingKind) -> Option<Rc<dyn Component>> {
        let node = self.entities.get(entity)?;
        let binding = node.bindings.get(key).filter(|b| b.kind == kind)?;
        node.slot(&binding.owner).map(|slot| Rc::clone(&slot.component))
    }

    /// Read an entity property
    pub fn prop(&self, entity: EntityId, key: &str) -> Option<Value> {
        self.owner_of(entity, key, BindingKind::Property)?.get(key)
    }

    /// Write an entity property; unknown keys are a state assertion
    pub fn set_prop(&mut self, entity: EntityId, key: &str, value: impl Into<Value>) -> EngineResult<()> {
        let owner = self
            .owner_of(entity, key, BindingKind::Property)
            .ok_or_else(|| EngineError::StateAssertion(format!("{entity:?} has no property {key}")))?;
        owner.set(key, value.into())
    }

    /// Read a number property
    pub fn number(&self, entity: EntityId, key: &str) -> Option<f32> {
        self.prop(entity, key).and_then(|v| v.as_number())
    }

    /// Read a vector property
    pub fn vec2(&self, entity: EntityId, key: &str) -> Option<Vec2> {
        self.prop(entity, key).and_then(|v| v.as_vec2())
    }

    /// Read a boolean property
    pub fn flag(&self, entity: EntityId, key: &str) -> Option<bool> {
        self.prop(entity, key).and_then(|v| v.as_bool())
    }

    /// Invoke an entity method by name
    pub fn call(&mut self, entity: EntityId, method: &str, args: &[Value]) -> EngineResult<Value> {
        let owner = self
            .owner_of(entity, method, BindingKind::Method)
            .ok_or_else(|| EngineError::StateAssertion(format!("{entity:?} has no method {method}")))?;
        owner.call(self, entity, method, args)
    }

    /// Position of an entity, zero if it has none
    pub fn pos(&self, entity: EntityId) -> Vec2 {
        self.vec2(entity, "pos").unwrap_or_else(Vec2::zeros)
    }

    /// Translate an entity's `pos`
    pub fn move_by(&mut self, entity: EntityId, delta: Vec2) -> EngineResult<()> {
        let pos = self
            .vec2(entity, "pos")
            .ok_or_else(|| EngineError::StateAssertion(format!("{entity:?} has no pos")))?;
        self.set_prop(entity, "pos", pos + delta)
    }

    // ------------------------------------------------------------------
    // Transforms

    /// Local transform from the `pos`, `scale` and `angle` properties
    pub fn local_transform(&self, entity: EntityId) -> Mat3 {
        let pos = self.vec2(entity, "pos").unwrap_or_else(Vec2::zeros);
        let scale = self.vec2(entity, "scale").unwrap_or_else(|| Vec2::new(1.0, 1.0));
        let angle = self.number(entity, "angle").unwrap_or(0.0);
        local_transform(pos, scale, angle)
    }

    /// Cached world transform
    pub fn transform(&self, entity: EntityId) -> Option<Mat3> {
        self.entities.get(entity).map(|node| node.transform)
    }

    pub(crate) fn set_transform(&mut self, entity: EntityId, transform: Mat3) {
        if let Some(node) = self.entities.get_mut(entity) {
            node.transform = transform;
        }
    }

    /// Recompute one entity's cached transform from its parent's cached one
    pub fn update_transform(&mut self, entity: EntityId) {
        let parent = self
            .parent(entity)
            .and_then(|p| self.transform(p))
            .unwrap_or_else(Mat3::identity);
        let transform = parent * self.local_transform(entity);
        self.set_transform(entity, transform);
    }

    // ------------------------------------------------------------------
    // Events

    /// Fire an event on one entity, then on the object bus
    pub fn trigger(&mut self, entity: EntityId, kind: EventKind, args: EventArgs) -> EngineResult<()> {
        let local = match self.entities.get_mut(entity) {
            Some(node) => node.events.listeners(&kind),
            None => return Ok(()),
        };
        trace!("{kind} on {entity:?}");
        dispatch(self, &local, entity, &args)?;
        let global = self.object_events.listeners(&kind);
        dispatch(self, &global, entity, &args)
    }

    /// Listen to an event on one entity
    pub fn on_entity<F>(&mut self, entity: EntityId, kind: EventKind, callback: F) -> EngineResult<EventController>
    where
        F: Fn(&mut World, EntityId, &EventArgs) -> EngineResult<()> + 'static,
    {
        let node = self
            .entities
            .get_mut(entity)
            .ok_or_else(|| EngineError::StateAssertion(format!("entity {entity:?} does not exist")))?;
        Ok(node.events.on(kind, callback))
    }

    /// Listen on behalf of an attached component; detaching it cancels the listener
    pub fn on_component<F>(
        &mut self,
        entity: EntityId,
        owner: &str,
        kind: EventKind,
        callback: F,
    ) -> EngineResult<EventController>
    where
        F: Fn(&mut World, EntityId, &EventArgs) -> EngineResult<()> + 'static,
    {
        let node = self
            .entities
            .get_mut(entity)
            .ok_or_else(|| EngineError::StateAssertion(format!("entity {entity:?} does not exist")))?;
        let controller = node.events.on(kind, callback);
        match node.components.iter_mut().find(|slot| slot.id == owner) {
            Some(slot) => slot.cleanups.push(controller.clone()),
            None => {
                controller.cancel();
                return Err(EngineError::StateAssertion(format!(
                    "'{owner}' is not attached to {entity:?}"
                )));
            }
        }
        Ok(controller)
    }

    /// Listen to `kind` on every entity carrying `tag`
    pub fn on<F>(&mut self, kind: EventKind, tag: &str, callback: F) -> EventController
    where
        F: Fn(&mut World, EntityId, &EventArgs) -> EngineResult<()> + 'static,
    {
        let tag = tag.to_string();
        self.object_events.on(kind, move |world, entity, args| {
            if world.is(entity, &tag) {
                callback(world, entity, args)
            } else {
                Ok(())
            }
        })
    }

    /// Run `callback` whenever an entity carrying `tag` joins the tree
    pub fn on_add<F>(&mut self, tag: &str, callback: F) -> EventController
    where
        F: Fn(&mut World, EntityId) -> EngineResult<()> + 'static,
    {
        self.on(EventKind::Add, tag, move |world, entity, _| callback(world, entity))
    }

    /// Run `callback` whenever an entity carrying `tag` is destroyed
    pub fn on_destroy<F>(&mut self, tag: &str, callback: F) -> EventController
    where
        F: Fn(&mut World, EntityId) -> EngineResult<()> + 'static,
    {
        self.on(EventKind::Destroy, tag, move |world, entity, _| callback(world, entity))
    }

    /// Run `callback` every update of each entity carrying `tag`
    pub fn on_update<F>(&mut self, tag: &str, callback: F) -> EventController
    where
        F: Fn(&mut World, EntityId) -> EngineResult<()> + 'static,
    {
        self.on(EventKind::Update, tag, move |world, entity, _| callback(world, entity))
    }

    /// Run `callback` when an entity tagged `tag` starts touching one tagged `other`
    pub fn on_collide<F>(&mut self, tag: &str, other: &str, callback: F) -> EventController
    where
        F: Fn(&mut World, EntityId, EntityId, &Collision) -> EngineResult<()> + 'static,
    {
        let other = other.to_string();
        self.on(EventKind::Collide, tag, move |world, entity, args| match args.collision() {
            Some(col) if world.is(col.target, &other) => callback(world, entity, col.target, col),
            _ => Ok(()),
        })
    }

    /// Listen on the scene bus (input, frame end, user events)
    pub fn on_event<F>(&mut self, kind: EventKind, callback: F) -> EventController
    where
        F: Fn(&mut World, EntityId, &EventArgs) -> EngineResult<()> + 'static,
    {
        self.events.on(kind, callback)
    }

    /// Fire an event on the scene bus
    pub fn trigger_event(&mut self, kind: EventKind, args: EventArgs) -> EngineResult<()> {
        let listeners = self.events.listeners(&kind);
        let root = self.root;
        dispatch(self, &listeners, root, &args)
    }

    // ------------------------------------------------------------------
    // Timers

    /// Run `action` once after `seconds` of scene time.
    ///
    /// Backed by a timer entity under the root; cancelling the controller
    /// removes it on its next update.
    pub fn wait<F>(&mut self, seconds: f32, action: F) -> EngineResult<EventController>
    where
        F: FnOnce(&mut World) -> EngineResult<()> + 'static,
    {
        let controller = EventController::new();
        let handle = controller.clone();
        let elapsed = Cell::new(0.0_f32);
        let action = RefCell::new(Some(action));
        let timer = Custom::new("wait").with_update(move |world, entity| {
            if handle.is_cancelled() {
                return world.destroy(entity);
            }
            if handle.is_paused() {
                return Ok(());
            }
            elapsed.set(elapsed.get() + world.dt());
            if elapsed.get() < seconds {
                return Ok(());
            }
            handle.cancel();
            world.destroy(entity)?;
            let action = action.borrow_mut().take();
            match action {
                Some(action) => action(world),
                None => Ok(()),
            }
        });
        self.spawn(vec![Rc::new(timer) as Rc<dyn Component>])?;
        Ok(controller)
    }

    /// Run `action` every `seconds` of scene time until cancelled
    pub fn loop_every<F>(&mut self, seconds: f32, action: F) -> EngineResult<EventController>
    where
        F: FnMut(&mut World) -> EngineResult<()> + 'static,
    {
        let controller = EventController::new();
        let handle = controller.clone();
        let elapsed = Cell::new(0.0_f32);
        let action = RefCell::new(action);
        let period = seconds.max(f32::EPSILON);
        let timer = Custom::new("loop").with_update(move |world, entity| {
            if handle.is_cancelled() {
                return world.destroy(entity);
            }
            if handle.is_paused() {
                return Ok(());
            }
            elapsed.set(elapsed.get() + world.dt());
            while elapsed.get() >= period && !handle.is_cancelled() {
                elapsed.set(elapsed.get() - period);
                let mut action = action.borrow_mut();
                (&mut *action)(world)?;
            }
            Ok(())
        });
        self.spawn(vec![Rc::new(timer) as Rc<dyn Component>])?;
        Ok(controller)
    }

    // ------------------------------------------------------------------
    // Scenes

    /// Register a scene factory
    pub fn scene<F>(&mut self, id: &str, factory: F)
    where
        F: Fn(&mut World, &[Value]) -> EngineResult<()> + 'static,
    {
        let factory: SceneFactory = Rc::new(factory);
        self.scenes.register(id, factory);
    }

    /// Request a transition to scene `id` at the end of this frame
    pub fn go(&mut self, id: &str, args: Vec<Value>) -> EngineResult<()> {
        self.scenes.request(id, args)
    }

    /// Scene most recently entered
    pub fn current_scene(&self) -> Option<&str> {
        self.scenes.current()
    }

    /// Run the transitions queued so far.
    ///
    /// For each: clear both buses, remove every root child without a `stay`
    /// that keeps it in the target scene, clear the root's listeners, reset
    /// gravity, then run the factory.
    pub fn run_scene_transitions(&mut self) -> EngineResult<()> {
        for request in self.scenes.take_pending() {
            let factory = self.scenes.factory(&request.id)?;
            debug!("Entering scene '{}'", request.id);

            self.events.clear();
            self.object_events.clear();

            let root = self.root;
            for child in self.children(root) {
                let keep = self
                    .component::<Stay>(child)
                    .is_some_and(|stay| stay.keeps_for(&request.id));
                if !keep {
                    self.remove(root, child)?;
                }
            }
            if let Some(node) = self.entities.get_mut(root) {
                node.events.clear();
            }
            self.gravity = self.config.gravity;
            self.scenes.set_current(&request.id);

            factory(self, &request.args)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Frame passes

    /// Update pass: post-order, each child list visited last to first.
    ///
    /// Works on a snapshot of each child list; children destroyed earlier in
    /// the pass are skipped and children added during it first update next
    /// frame.
    pub(crate) fn update_pass(&mut self) -> EngineResult<()> {
        let root = self.root;
        self.update_node(root)
    }

    fn update_node(&mut self, entity: EntityId) -> EngineResult<()> {
        let children = match self.entities.get(entity) {
            Some(node) if !node.paused => node.children.clone(),
            _ => return Ok(()),
        };
        for child in children.into_iter().rev() {
            if self.parent(child) == Some(entity) && self.exists(child) {
                self.update_node(child)?;
            }
        }
        if entity != self.root && self.exists(entity) {
            self.trigger(entity, EventKind::Update, EventArgs::None)?;
        }
        Ok(())
    }

    /// Draw pass: pre-order in depth order, skipping hidden subtrees
    pub(crate) fn draw_pass(&mut self) -> EngineResult<()> {
        let root = self.root;
        self.draw_node(root)
    }

    fn draw_node(&mut self, entity: EntityId) -> EngineResult<()> {
        match self.entities.get(entity) {
            Some(node) if !node.hidden => {}
            _ => return Ok(()),
        }
        if entity != self.root {
            self.trigger(entity, EventKind::Draw, EventArgs::None)?;
        }
        for child in self.get(entity, Query::All) {
            if self.parent(child) == Some(entity) {
                self.draw_node(child)?;
            }
        }
        Ok(())
    }

    /// Release subtrees destroyed since the last call
    pub fn collect_garbage(&mut self) {
        for entity in std::mem::take(&mut self.garbage) {
            if self.entities.get(entity).map_or(true, |node| node.parent.is_some()) {
                continue;
            }
            let mut stack = vec![entity];
            while let Some(id) = stack.pop() {
                if let Some(node) = self.entities.remove(id) {
                    stack.extend(node.children);
                }
            }
        }
    }

    /// Number of allocated entities, including the root and unattached ones
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
