//! Scene management
//!
//! Scenes hold no state of their own; state lives in the entity tree and is
//! pruned of every entity without a `stay` component on transition.

mod scene_manager;

pub use scene_manager::{SceneFactory, SceneManager, SceneRequest};
