//! Built-in components
//!
//! Every component here is an ordinary [`Component`](crate::ecs::Component):
//! it is attached by id, exposes its state through entity properties, and
//! can be swapped for a user-defined component with the same id.

pub mod body;
pub mod collision;
pub mod lifecycle;
pub mod movement;
pub mod renderable;
pub mod timer;
pub mod transform;

pub use body::Body;
pub use collision::Area;
pub use lifecycle::{Health, Lifespan, Stay};
pub use movement::{Follow, Move};
pub use renderable::{CircleShape, PolygonShape, RectShape};
pub use timer::Timer;
pub use transform::{Anchor, AnchorPoint, Pos, Rotate, Scale, Z};

use crate::ecs::Value;
use crate::foundation::math::Vec2;
use crate::{EngineError, EngineResult};

fn mismatch(component: &str, key: &str, expected: &str, value: &Value) -> EngineError {
    EngineError::StateAssertion(format!(
        "{component}.{key} expects {expected}, got {}",
        value.type_name()
    ))
}

pub(crate) fn expect_vec2(component: &str, key: &str, value: &Value) -> EngineResult<Vec2> {
    value.as_vec2().ok_or_else(|| mismatch(component, key, "vec2", value))
}

pub(crate) fn expect_number(component: &str, key: &str, value: &Value) -> EngineResult<f32> {
    value.as_number().ok_or_else(|| mismatch(component, key, "number", value))
}

pub(crate) fn expect_bool(component: &str, key: &str, value: &Value) -> EngineResult<bool> {
    value.as_bool().ok_or_else(|| mismatch(component, key, "bool", value))
}

fn arg<'a>(method: &str, args: &'a [Value], index: usize) -> EngineResult<&'a Value> {
    args.get(index)
        .ok_or_else(|| EngineError::StateAssertion(format!("{method} is missing argument {index}")))
}

pub(crate) fn arg_vec2(method: &str, args: &[Value], index: usize) -> EngineResult<Vec2> {
    let value = arg(method, args, index)?;
    value.as_vec2().ok_or_else(|| mismatch(method, &index.to_string(), "vec2", value))
}

pub(crate) fn arg_number(method: &str, args: &[Value], index: usize) -> EngineResult<f32> {
    let value = arg(method, args, index)?;
    value.as_number().ok_or_else(|| mismatch(method, &index.to_string(), "number", value))
}
