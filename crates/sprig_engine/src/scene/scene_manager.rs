//! Scene registry and deferred transitions
//!
//! A scene is a named factory that populates the world. Switching scenes is
//! never immediate: [`SceneManager::request`] queues the transition and the
//! frame scheduler drains the queue once, at the very end of the frame, so
//! no listener ever observes a half torn-down tree.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use log::{debug, info};

use crate::ecs::{Value, World};
use crate::{EngineError, EngineResult};

/// Scene factory: builds the scene's entities from the transition arguments
pub type SceneFactory = Rc<dyn Fn(&mut World, &[Value]) -> EngineResult<()>>;

/// A queued transition
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRequest {
    /// Target scene id
    pub id: String,
    /// Arguments handed to the factory
    pub args: Vec<Value>,
}

/// Scene registry plus the one-shot transition queue
#[derive(Default)]
pub struct SceneManager {
    scenes: HashMap<String, SceneFactory>,
    pending: VecDeque<SceneRequest>,
    current: Option<String>,
}

impl SceneManager {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a scene
    pub fn register(&mut self, id: impl Into<String>, factory: SceneFactory) {
        let id = id.into();
        info!("Registered scene '{id}'");
        self.scenes.insert(id, factory);
    }

    /// Whether a scene id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.scenes.contains_key(id)
    }

    /// Factory for a scene
    pub fn factory(&self, id: &str) -> EngineResult<SceneFactory> {
        self.scenes
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownScene(id.to_string()))
    }

    /// Queue a transition to run at the end of the current frame
    pub fn request(&mut self, id: &str, args: Vec<Value>) -> EngineResult<()> {
        if !self.contains(id) {
            return Err(EngineError::UnknownScene(id.to_string()));
        }
        debug!("Scene transition to '{id}' queued");
        self.pending.push_back(SceneRequest { id: id.to_string(), args });
        Ok(())
    }

    /// Take the transitions queued so far; requests made while these run wait for the next frame
    pub fn take_pending(&mut self) -> Vec<SceneRequest> {
        self.pending.drain(..).collect()
    }

    /// Number of queued transitions
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Scene most recently entered
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub(crate) fn set_current(&mut self, id: &str) {
        self.current = Some(id.to_string());
    }
}

impl fmt::Debug for SceneManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.scenes.keys().collect();
        ids.sort();
        f.debug_struct("SceneManager")
            .field("scenes", &ids)
            .field("pending", &self.pending)
            .field("current", &self.current)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> SceneFactory {
        Rc::new(|_, _| Ok(()))
    }

    #[test]
    fn test_unknown_scene_is_rejected() {
        let mut scenes = SceneManager::new();
        assert!(matches!(scenes.request("nowhere", vec![]), Err(EngineError::UnknownScene(id)) if id == "nowhere"));
        assert!(scenes.factory("nowhere").is_err());
    }

    #[test]
    fn test_requests_queue_in_order() {
        let mut scenes = SceneManager::new();
        scenes.register("menu", noop());
        scenes.register("level", noop());
        scenes.request("menu", vec![]).unwrap();
        scenes.request("level", vec![Value::Number(2.0)]).unwrap();
        assert_eq!(scenes.pending_count(), 2);

        let pending = scenes.take_pending();
        assert_eq!(pending[0].id, "menu");
        assert_eq!(pending[1].args, vec![Value::Number(2.0)]);
        assert_eq!(scenes.pending_count(), 0);
    }
}
