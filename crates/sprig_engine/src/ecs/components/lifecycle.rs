//! Lifecycle components: scene persistence, health and timed destruction

use std::cell::{Cell, RefCell};

use crate::ecs::{Component, EntityId, Hooks, Value, World};
use crate::events::{EventArgs, EventKind};
use crate::{EngineError, EngineResult};

use super::{arg_number, expect_number};

/// Survive scene transitions ("stay")
#[derive(Debug, Default)]
pub struct Stay {
    scenes: RefCell<Option<Vec<String>>>,
}

impl Stay {
    /// Stay in every scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Stay only when entering one of `scenes`
    pub fn only<I, S>(scenes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scenes: RefCell::new(Some(scenes.into_iter().map(Into::into).collect())),
        }
    }

    /// Whether the entity survives a transition into `scene`
    pub fn keeps_for(&self, scene: &str) -> bool {
        self.scenes
            .borrow()
            .as_ref()
            .map_or(true, |scenes| scenes.iter().any(|s| s == scene))
    }
}

impl Component for Stay {
    fn id(&self) -> &str {
        "stay"
    }

    fn properties(&self) -> Vec<&str> {
        vec!["scenesToStay"]
    }

    fn get(&self, key: &str) -> Option<Value> {
        (key == "scenesToStay").then(|| self.scenes.borrow().clone().map_or(Value::Null, Value::List))
    }

    fn set(&self, _key: &str, value: Value) -> EngineResult<()> {
        *self.scenes.borrow_mut() = match value {
            Value::Null => None,
            Value::List(scenes) => Some(scenes),
            other => {
                return Err(EngineError::StateAssertion(format!(
                    "stay.scenesToStay expects a list, got {}",
                    other.type_name()
                )))
            }
        };
        Ok(())
    }
}

/// Hit points ("health")
#[derive(Debug)]
pub struct Health {
    hp: Cell<f32>,
}

impl Health {
    /// Start with `hp`
    pub fn new(hp: f32) -> Self {
        Self { hp: Cell::new(hp) }
    }

    /// Current hit points
    pub fn hp(&self) -> f32 {
        self.hp.get()
    }

    /// Set hit points; fires `Death` at zero or below
    pub fn set_hp(&self, world: &mut World, entity: EntityId, hp: f32) -> EngineResult<()> {
        self.hp.set(hp);
        if hp <= 0.0 {
            world.trigger(entity, EventKind::Death, EventArgs::None)?;
        }
        Ok(())
    }

    /// Lose `amount` hit points and fire `Hurt`
    pub fn hurt(&self, world: &mut World, entity: EntityId, amount: f32) -> EngineResult<()> {
        self.set_hp(world, entity, self.hp() - amount)?;
        world.trigger(entity, EventKind::Hurt, EventArgs::Amount(amount))
    }

    /// Gain `amount` hit points and fire `Heal`
    pub fn heal(&self, world: &mut World, entity: EntityId, amount: f32) -> EngineResult<()> {
        self.set_hp(world, entity, self.hp() + amount)?;
        world.trigger(entity, EventKind::Heal, EventArgs::Amount(amount))
    }
}

impl Component for Health {
    fn id(&self) -> &str {
        "health"
    }

    fn properties(&self) -> Vec<&str> {
        vec!["hp"]
    }

    fn methods(&self) -> Vec<&str> {
        vec!["hurt", "heal", "setHP"]
    }

    fn get(&self, key: &str) -> Option<Value> {
        (key == "hp").then(|| Value::Number(self.hp()))
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        self.hp.set(expect_number(self.id(), key, &value)?);
        Ok(())
    }

    fn call(&self, world: &mut World, entity: EntityId, method: &str, args: &[Value]) -> EngineResult<Value> {
        let amount = || if args.is_empty() { Ok(1.0) } else { arg_number(method, args, 0) };
        match method {
            "hurt" => self.hurt(world, entity, amount()?)?,
            "heal" => self.heal(world, entity, amount()?)?,
            "setHP" => self.set_hp(world, entity, arg_number(method, args, 0)?)?,
            _ => return Err(EngineError::StateAssertion(format!("health has no method {method}"))),
        }
        Ok(Value::Null)
    }

    fn inspect(&self) -> Option<String> {
        Some(self.hp().to_string())
    }
}

/// Destroy the entity after a duration ("lifespan")
#[derive(Debug)]
pub struct Lifespan {
    seconds: f32,
    elapsed: Cell<f32>,
}

impl Lifespan {
    /// Live for `seconds` of update time
    pub fn new(seconds: f32) -> Self {
        Self {
            seconds,
            elapsed: Cell::new(0.0),
        }
    }

    /// Seconds left
    pub fn remaining(&self) -> f32 {
        (self.seconds - self.elapsed.get()).max(0.0)
    }
}

impl Component for Lifespan {
    fn id(&self) -> &str {
        "lifespan"
    }

    fn hooks(&self) -> Hooks {
        Hooks::UPDATE
    }

    fn on_update(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        self.elapsed.set(self.elapsed.get() + world.dt());
        if self.elapsed.get() >= self.seconds {
            world.destroy(entity)?;
        }
        Ok(())
    }

    fn inspect(&self) -> Option<String> {
        Some(format!("{:.2}s left", self.remaining()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components;
    use std::rc::Rc;

    #[test]
    fn test_stay_scene_filter() {
        assert!(Stay::new().keeps_for("anything"));
        let stay = Stay::only(["game"]);
        assert!(stay.keeps_for("game"));
        assert!(!stay.keeps_for("menu"));
    }

    #[test]
    fn test_health_events() {
        let mut world = World::new();
        let e = world.spawn(components![Health::new(2.0)]).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        for kind in [EventKind::Hurt, EventKind::Heal, EventKind::Death] {
            let log = Rc::clone(&log);
            let name = kind.name().to_string();
            world
                .on_entity(e, kind, move |_, _, _| {
                    log.borrow_mut().push(name.clone());
                    Ok(())
                })
                .unwrap();
        }
        world.call(e, "hurt", &[]).unwrap();
        world.call(e, "heal", &[Value::Number(3.0)]).unwrap();
        world.call(e, "hurt", &[Value::Number(10.0)]).unwrap();
        assert_eq!(world.number(e, "hp"), Some(-6.0));
        assert_eq!(*log.borrow(), ["hurt", "heal", "death", "hurt"]);
    }

    #[test]
    fn test_lifespan_destroys_entity() {
        let mut world = World::new();
        world.set_dt(0.25);
        let e = world.spawn(components![Lifespan::new(0.5)]).unwrap();
        world.update_pass().unwrap();
        assert!(world.exists(e));
        world.update_pass().unwrap();
        assert!(!world.exists(e));
    }
}
