//! Component trait and the ad-hoc component types
//!
//! A component is a named bundle of state, lifecycle hooks and methods.
//! Attaching it to an entity merges its property and method names into the
//! entity namespace and binds its declared hooks as event listeners. State
//! lives inside the component behind `Cell`/`RefCell`, so hooks take `&self`
//! and components can be shared with the listeners bound on their behalf.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use bitflags::bitflags;

use crate::events::EventKind;
use crate::physics::collision::Shape;
use crate::{EngineError, EngineResult};

use super::entity::EntityId;
use super::value::Value;
use super::world::World;

bitflags! {
    /// Lifecycle hooks a component wants bound
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Hooks: u8 {
        /// Run once when the entity joins the tree (or on attach if it already has)
        const ADD = 1;
        /// Run every update pass
        const UPDATE = 1 << 1;
        /// Run every draw pass
        const DRAW = 1 << 2;
        /// Run when the entity is destroyed or the component detached
        const DESTROY = 1 << 3;
    }
}

/// Conversion of a shared component into `Rc<dyn Any>` for typed lookup
pub trait AsAnyRc: Any {
    /// Upcast, keeping the allocation
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Any> AsAnyRc for T {
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Behavior bundle attachable to an entity
#[allow(unused_variables)]
pub trait Component: AsAnyRc {
    /// Unique id; at most one component per id per entity
    fn id(&self) -> &str;

    /// Ids that must be attached before this one becomes live
    fn require(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Property names exposed on the entity
    fn properties(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Method names exposed on the entity
    fn methods(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Hooks to bind as listeners
    fn hooks(&self) -> Hooks {
        Hooks::empty()
    }

    /// Read a property
    fn get(&self, key: &str) -> Option<Value> {
        None
    }

    /// Write a property
    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        Err(EngineError::StateAssertion(format!(
            "component {} has no writable property {key}",
            self.id()
        )))
    }

    /// Invoke a method by name
    fn call(&self, world: &mut World, entity: EntityId, method: &str, args: &[Value]) -> EngineResult<Value> {
        Err(EngineError::StateAssertion(format!(
            "component {} has no method {method}",
            self.id()
        )))
    }

    /// Entity joined the tree
    fn on_add(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        Ok(())
    }

    /// Update pass
    fn on_update(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        Ok(())
    }

    /// Draw pass
    fn on_draw(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        Ok(())
    }

    /// Entity destroyed or component detached
    fn on_destroy(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        Ok(())
    }

    /// Local-space shape for areas without an explicit one
    fn render_area(&self) -> Option<Shape> {
        None
    }

    /// Debug summary
    fn inspect(&self) -> Option<String> {
        None
    }
}

/// Anything that can be attached: components, bare tags, shared components
pub trait IntoComponent {
    /// Box the value into a shared component
    fn into_component(self) -> Rc<dyn Component>;
}

impl<C: Component> IntoComponent for C {
    fn into_component(self) -> Rc<dyn Component> {
        Rc::new(self)
    }
}

impl IntoComponent for &str {
    fn into_component(self) -> Rc<dyn Component> {
        Rc::new(Tag::new(self))
    }
}

impl IntoComponent for String {
    fn into_component(self) -> Rc<dyn Component> {
        Rc::new(Tag::new(self))
    }
}

impl IntoComponent for Rc<dyn Component> {
    fn into_component(self) -> Rc<dyn Component> {
        self
    }
}

/// Build a component list from components and bare tags
///
/// ```ignore
/// world.spawn(components![Pos::new(vec2(0.0, 0.0)), RectShape::new(8.0, 8.0), Area::new(), "player"])?;
/// ```
#[macro_export]
macro_rules! components {
    ($($component:expr),* $(,)?) => {
        vec![$($crate::ecs::IntoComponent::into_component($component)),*]
    };
}

/// Bare tag: a component with nothing but an id
#[derive(Debug, Clone)]
pub struct Tag {
    name: String,
}

impl Tag {
    /// Create a tag
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Component for Tag {
    fn id(&self) -> &str {
        &self.name
    }
}

type HookFn = Rc<dyn Fn(&mut World, EntityId) -> EngineResult<()>>;
type MethodFn = Rc<dyn Fn(&mut World, EntityId, &[Value]) -> EngineResult<Value>>;

/// Component assembled at runtime from properties, requirements and closures.
///
/// A method registered under a lifecycle name (`add`, `update`, `draw`,
/// `destroy`) becomes that hook instead of a callable method.
pub struct Custom {
    id: String,
    require: Vec<String>,
    keys: Vec<String>,
    values: RefCell<HashMap<String, Value>>,
    methods: Vec<(String, MethodFn)>,
    add: Option<HookFn>,
    update: Option<HookFn>,
    draw: Option<HookFn>,
    destroy: Option<HookFn>,
}

impl Custom {
    /// Create an empty component with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            require: Vec::new(),
            keys: Vec::new(),
            values: RefCell::new(HashMap::new()),
            methods: Vec::new(),
            add: None,
            update: None,
            draw: None,
            destroy: None,
        }
    }

    /// Require another component id
    pub fn with_require(mut self, id: impl Into<String>) -> Self {
        self.require.push(id.into());
        self
    }

    /// Expose a property with an initial value
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !self.keys.contains(&key) {
            self.keys.push(key.clone());
        }
        self.values.get_mut().insert(key, value.into());
        self
    }

    /// Expose a method; lifecycle names become hooks
    pub fn with_method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut World, EntityId, &[Value]) -> EngineResult<Value> + 'static,
    {
        let name = name.into();
        match EventKind::lifecycle(&name) {
            Some(kind) => {
                let hook: HookFn = Rc::new(move |world, entity| f(world, entity, &[]).map(|_| ()));
                self.set_hook(&kind, hook);
            }
            None => self.methods.push((name, Rc::new(f))),
        }
        self
    }

    /// Run `f` when the entity joins the tree
    pub fn with_add<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut World, EntityId) -> EngineResult<()> + 'static,
    {
        self.add = Some(Rc::new(f));
        self
    }

    /// Run `f` every update pass
    pub fn with_update<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut World, EntityId) -> EngineResult<()> + 'static,
    {
        self.update = Some(Rc::new(f));
        self
    }

    /// Run `f` every draw pass
    pub fn with_draw<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut World, EntityId) -> EngineResult<()> + 'static,
    {
        self.draw = Some(Rc::new(f));
        self
    }

    /// Run `f` on destroy or detach
    pub fn with_destroy<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut World, EntityId) -> EngineResult<()> + 'static,
    {
        self.destroy = Some(Rc::new(f));
        self
    }

    fn set_hook(&mut self, kind: &EventKind, hook: HookFn) {
        match kind {
            EventKind::Add => self.add = Some(hook),
            EventKind::Update => self.update = Some(hook),
            EventKind::Draw => self.draw = Some(hook),
            EventKind::Destroy => self.destroy = Some(hook),
            _ => {}
        }
    }

    fn run(hook: Option<&HookFn>, world: &mut World, entity: EntityId) -> EngineResult<()> {
        match hook {
            Some(hook) => hook(world, entity),
            None => Ok(()),
        }
    }
}

impl Component for Custom {
    fn id(&self) -> &str {
        &self.id
    }

    fn require(&self) -> Vec<&str> {
        self.require.iter().map(String::as_str).collect()
    }

    fn properties(&self) -> Vec<&str> {
        self.keys.iter().map(String::as_str).collect()
    }

    fn methods(&self) -> Vec<&str> {
        self.methods.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn hooks(&self) -> Hooks {
        let mut hooks = Hooks::empty();
        hooks.set(Hooks::ADD, self.add.is_some());
        hooks.set(Hooks::UPDATE, self.update.is_some());
        hooks.set(Hooks::DRAW, self.draw.is_some());
        hooks.set(Hooks::DESTROY, self.destroy.is_some());
        hooks
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        let mut values = self.values.borrow_mut();
        match values.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(EngineError::StateAssertion(format!(
                "component {} has no property {key}",
                self.id
            ))),
        }
    }

    fn call(&self, world: &mut World, entity: EntityId, method: &str, args: &[Value]) -> EngineResult<Value> {
        let f = self
            .methods
            .iter()
            .find(|(name, _)| name == method)
            .map(|(_, f)| Rc::clone(f))
            .ok_or_else(|| EngineError::StateAssertion(format!("component {} has no method {method}", self.id)))?;
        f(world, entity, args)
    }

    fn on_add(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        Self::run(self.add.as_ref(), world, entity)
    }

    fn on_update(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        Self::run(self.update.as_ref(), world, entity)
    }

    fn on_draw(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        Self::run(self.draw.as_ref(), world, entity)
    }

    fn on_destroy(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        Self::run(self.destroy.as_ref(), world, entity)
    }

    fn inspect(&self) -> Option<String> {
        let values = self.values.borrow();
        if values.is_empty() {
            return None;
        }
        let mut keys: Vec<_> = values.keys().collect();
        keys.sort();
        Some(
            keys.iter()
                .map(|k| format!("{k}: {:?}", values[*k]))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}
