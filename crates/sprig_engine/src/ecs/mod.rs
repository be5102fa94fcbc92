//! Entity tree and runtime component composition
//!
//! Entities live in a generational arena owned by [`World`]; each gains
//! behavior only from the [`Component`]s attached to it.

pub mod component;
pub mod components;
pub mod entity;
pub mod query;
pub mod value;
pub mod world;

pub use component::{Component, Custom, Hooks, IntoComponent, Tag};
pub use entity::{BindingKind, EntityId};
pub use query::Query;
pub use value::Value;
pub use world::World;
