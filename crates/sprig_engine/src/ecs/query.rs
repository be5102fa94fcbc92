//! Child queries
//!
//! Queries select among an entity's children (or all descendants) by tag,
//! by a set of tags, or by an arbitrary predicate.

use std::fmt;
use std::rc::Rc;

use super::entity::EntityId;
use super::world::World;

/// Selection criterion for [`World::get`] and [`World::get_all`]
#[derive(Clone)]
pub enum Query {
    /// Every entity
    All,
    /// Entities carrying one tag (component id)
    Tag(String),
    /// Entities carrying every listed tag
    Tags(Vec<String>),
    /// Entities accepted by a predicate
    Predicate(Rc<dyn Fn(&World, EntityId) -> bool>),
}

impl Query {
    /// Build a predicate query
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&World, EntityId) -> bool + 'static,
    {
        Self::Predicate(Rc::new(f))
    }

    /// Whether `entity` is selected
    pub fn matches(&self, world: &World, entity: EntityId) -> bool {
        match self {
            Self::All => true,
            Self::Tag(tag) => world.is(entity, tag),
            Self::Tags(tags) => tags.iter().all(|tag| world.is(entity, tag)),
            Self::Predicate(f) => f(world, entity),
        }
    }
}

impl From<&str> for Query {
    fn from(tag: &str) -> Self {
        if tag == "*" {
            Self::All
        } else {
            Self::Tag(tag.to_string())
        }
    }
}

impl From<&[&str]> for Query {
    fn from(tags: &[&str]) -> Self {
        Self::Tags(tags.iter().map(|t| (*t).to_string()).collect())
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            Self::Tags(tags) => f.debug_tuple("Tags").field(tags).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}
