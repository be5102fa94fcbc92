//! Tagged values carried by entity properties

use crate::foundation::math::Vec2;
use crate::physics::collision::Shape;

use super::entity::EntityId;

/// A property value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value, also the result of methods with nothing to return
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(f32),
    /// 2D vector
    Vec2(Vec2),
    /// String
    Text(String),
    /// List of strings (tags, scene ids)
    List(Vec<String>),
    /// Non-owning entity reference
    Entity(EntityId),
    /// Geometry
    Shape(Shape),
}

impl Value {
    /// Short type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Vec2(_) => "vec2",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Entity(_) => "entity",
            Self::Shape(_) => "shape",
        }
    }

    /// Number payload
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Vector payload
    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Self::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text payload
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// List payload
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Entity payload
    pub fn as_entity(&self) -> Option<EntityId> {
        match self {
            Self::Entity(e) => Some(*e),
            _ => None,
        }
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec2> for Value {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<EntityId> for Value {
    fn from(e: EntityId) -> Self {
        Self::Entity(e)
    }
}
