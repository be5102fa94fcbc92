//! Entity implementation
//!
//! An entity is a node in the world tree: a parent link, an ordered list of
//! owned children, a cached world transform, and the components attached to
//! it together with the names they expose.

use std::collections::HashMap;
use std::rc::Rc;

use crate::events::{EventController, EventHandler, EventKind};
use crate::foundation::math::Mat3;
use crate::{EngineError, EngineResult};

use super::component::Component;

slotmap::new_key_type! {
    /// Generational entity identifier; stale ids resolve to nothing
    pub struct EntityId;
}

/// What an entity-visible name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Readable and writable value
    Property,
    /// Invocable through [`World::call`](super::World::call)
    Method,
}

/// Owner of one entity-visible name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Id of the component that introduced the name
    pub owner: String,
    /// Property or method
    pub kind: BindingKind,
}

/// Per-entity namespace: every name maps to exactly one component
#[derive(Debug, Default)]
pub struct BindingTable {
    entries: HashMap<String, Binding>,
}

impl BindingTable {
    /// Fail if `key` already belongs to a component other than `owner`
    pub fn check(&self, owner: &str, key: &str) -> EngineResult<()> {
        match self.entries.get(key) {
            Some(existing) if existing.owner != owner => Err(EngineError::DuplicateProperty {
                property: key.to_string(),
                owner: existing.owner.clone(),
                component: owner.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Claim `key` for `owner`
    pub fn bind(&mut self, owner: &str, key: &str, kind: BindingKind) -> EngineResult<()> {
        self.check(owner, key)?;
        self.entries.insert(
            key.to_string(),
            Binding {
                owner: owner.to_string(),
                kind,
            },
        );
        Ok(())
    }

    /// Release every name owned by `owner`
    pub fn unbind_owner(&mut self, owner: &str) {
        self.entries.retain(|_, binding| binding.owner != owner);
    }

    /// Look up a name
    pub fn get(&self, key: &str) -> Option<&Binding> {
        self.entries.get(key)
    }

    /// Number of bound names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is bound
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One attached component
pub(crate) struct ComponentSlot {
    pub id: String,
    pub component: Rc<dyn Component>,
    /// Listeners registered on the component's behalf
    pub cleanups: Vec<EventController>,
}

/// Tree node stored in the world arena
pub(crate) struct EntityNode {
    pub parent: Option<EntityId>,
    pub children: Vec<EntityId>,
    pub transform: Mat3,
    pub paused: bool,
    pub hidden: bool,
    pub components: Vec<ComponentSlot>,
    pub bindings: BindingTable,
    pub events: EventHandler<EventKind>,
}

impl EntityNode {
    pub fn new() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            transform: Mat3::identity(),
            paused: false,
            hidden: false,
            components: Vec::new(),
            bindings: BindingTable::default(),
            events: EventHandler::new(),
        }
    }

    pub fn slot(&self, id: &str) -> Option<&ComponentSlot> {
        self.components.iter().find(|slot| slot.id == id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.slot(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_table_single_owner() {
        let mut table = BindingTable::default();
        table.bind("health", "hp", BindingKind::Property).unwrap();
        // Same owner may rebind its own name
        table.bind("health", "hp", BindingKind::Property).unwrap();

        let err = table.bind("shield", "hp", BindingKind::Property).unwrap_err();
        match err {
            EngineError::DuplicateProperty { property, owner, component } => {
                assert_eq!(property, "hp");
                assert_eq!(owner, "health");
                assert_eq!(component, "shield");
            }
            other => panic!("unexpected error {other:?}"),
        }

        table.unbind_owner("health");
        assert!(table.is_empty());
        table.bind("shield", "hp", BindingKind::Property).unwrap();
        assert_eq!(table.get("hp").map(|b| b.owner.as_str()), Some("shield"));
    }
}
