//! Per-entity timers ("timer")

use std::cell::RefCell;

use crate::ecs::{Component, EntityId, Hooks, World};
use crate::events::EventController;
use crate::EngineResult;

type TimerAction = Box<dyn FnOnce(&mut World, EntityId) -> EngineResult<()>>;

struct Pending {
    controller: EventController,
    remaining: f32,
    action: TimerAction,
}

/// Timers ticked in the entity's update, so pausing the entity pauses them
#[derive(Default)]
pub struct Timer {
    pending: RefCell<Vec<Pending>>,
}

impl Timer {
    /// Component with no timers
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` once after `seconds`
    pub fn wait<F>(&self, seconds: f32, action: F) -> EventController
    where
        F: FnOnce(&mut World, EntityId) -> EngineResult<()> + 'static,
    {
        let controller = EventController::new();
        self.pending.borrow_mut().push(Pending {
            controller: controller.clone(),
            remaining: seconds,
            action: Box::new(action),
        });
        controller
    }

    /// Timers not yet fired or cancelled
    pub fn num_pending(&self) -> usize {
        self.pending
            .borrow()
            .iter()
            .filter(|p| !p.controller.is_cancelled())
            .count()
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer").field("pending", &self.num_pending()).finish()
    }
}

impl Component for Timer {
    fn id(&self) -> &str {
        "timer"
    }

    fn hooks(&self) -> Hooks {
        Hooks::UPDATE
    }

    fn on_update(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        let dt = world.dt();
        // Actions may schedule new timers, so take the due ones out first.
        let due: Vec<Pending> = {
            let mut pending = self.pending.borrow_mut();
            pending.retain(|p| !p.controller.is_cancelled());
            for p in pending.iter_mut().filter(|p| !p.controller.is_paused()) {
                p.remaining -= dt;
            }
            let (due, waiting): (Vec<Pending>, Vec<Pending>) = std::mem::take(&mut *pending)
                .into_iter()
                .partition(|p| p.remaining <= 0.0 && !p.controller.is_paused());
            *pending = waiting;
            due
        };
        for p in due {
            p.controller.cancel();
            (p.action)(world, entity)?;
        }
        Ok(())
    }

    fn inspect(&self) -> Option<String> {
        Some(format!("{} pending", self.num_pending()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_wait_fires_once_after_duration() {
        let mut world = World::new();
        world.set_dt(0.25);
        let timer = Rc::new(Timer::new());
        let e = world.spawn(components![Rc::clone(&timer) as Rc<dyn Component>]).unwrap();
        let fired = Rc::new(Cell::new(0));
        let f = Rc::clone(&fired);
        timer.wait(0.5, move |_, _| {
            f.set(f.get() + 1);
            Ok(())
        });
        world.update_pass().unwrap();
        assert_eq!(fired.get(), 0);
        world.update_pass().unwrap();
        world.update_pass().unwrap();
        assert_eq!(fired.get(), 1);
        assert_eq!(timer.num_pending(), 0);
        assert!(world.exists(e));
    }

    #[test]
    fn test_cancelled_and_paused_timers_do_not_fire() {
        let mut world = World::new();
        world.set_dt(1.0);
        let timer = Rc::new(Timer::new());
        world.spawn(components![Rc::clone(&timer) as Rc<dyn Component>]).unwrap();
        let fired = Rc::new(Cell::new(0));
        let (a, b) = (Rc::clone(&fired), Rc::clone(&fired));
        let cancelled = timer.wait(0.5, move |_, _| {
            a.set(a.get() + 1);
            Ok(())
        });
        let paused = timer.wait(0.5, move |_, _| {
            b.set(b.get() + 10);
            Ok(())
        });
        cancelled.cancel();
        paused.set_paused(true);
        world.update_pass().unwrap();
        assert_eq!(fired.get(), 0);
        paused.set_paused(false);
        world.update_pass().unwrap();
        assert_eq!(fired.get(), 10);
    }
}
