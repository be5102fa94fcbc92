//! Composition, tree mutation and scene transitions through the public API

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use sprig_engine::prelude::*;

type Log = Rc<RefCell<Vec<String>>>;

fn logged(log: &Log, entry: &'static str) -> impl Fn(&mut World, EntityId) -> EngineResult<()> {
    let log = Rc::clone(log);
    move |_, _| {
        log.borrow_mut().push(entry.to_string());
        Ok(())
    }
}

#[test]
fn test_reattaching_id_replaces_instance_in_order() {
    let mut world = World::new();
    let log: Log = Rc::default();
    let e = world.spawn(components!["thing"]).unwrap();

    world
        .attach(e, Custom::new("x").with_add(logged(&log, "add 1")).with_destroy(logged(&log, "destroy 1")))
        .unwrap();
    world
        .attach(e, Custom::new("x").with_add(logged(&log, "add 2")).with_destroy(logged(&log, "destroy 2")))
        .unwrap();

    assert_eq!(*log.borrow(), ["add 1", "destroy 1", "add 2"]);
    assert_eq!(world.component_ids(e).iter().filter(|id| *id == "x").count(), 1);
}

#[test]
fn test_duplicate_property_across_components() {
    let mut world = World::new();
    let e = world.spawn(components![Custom::new("a").with_prop("speed", 1.0_f32)]).unwrap();
    let err = world.attach(e, Custom::new("b").with_prop("speed", 2.0_f32)).unwrap_err();
    assert!(matches!(err, EngineError::DuplicateProperty { ref property, .. } if property == "speed"));
    assert!(!world.has(e, "b"));
    assert_eq!(world.number(e, "speed"), Some(1.0));
}

#[test]
fn test_missing_dependency_on_live_entity() {
    let mut world = World::new();
    let e = world.spawn(components!["thing"]).unwrap();
    let err = world.attach(e, Custom::new("y").with_require("x")).unwrap_err();
    assert!(matches!(err, EngineError::MissingDependency { ref dependency, .. } if dependency == "x"));
    assert!(!world.has(e, "y"));

    world.attach(e, Custom::new("x")).unwrap();
    world.attach(e, Custom::new("y").with_require("x")).unwrap();
    assert!(world.has(e, "y"));
}

#[test]
fn test_missing_dependency_is_deferred_until_added() {
    let mut world = World::new();
    let e = world.make(components![Custom::new("y").with_require("x")]).unwrap();
    let root = world.root();
    assert!(matches!(
        world.add_entity(root, e),
        Err(EngineError::MissingDependency { .. })
    ));

    let ok = world.make(components![Custom::new("y").with_require("x")]).unwrap();
    world.attach(ok, Custom::new("x")).unwrap();
    world.add_entity(root, ok).unwrap();
    assert!(world.exists(ok));
}

#[test]
fn test_destroy_self_during_update() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let updates = Rc::new(Cell::new(0));
    let world = engine.world_mut();
    for _ in 0..3 {
        let u = Rc::clone(&updates);
        world
            .spawn(components![
                Custom::new("doomed").with_update(move |world, e| {
                    u.set(u.get() + 1);
                    world.destroy(e)
                }),
                "victim"
            ])
            .unwrap();
    }
    let survivor = world.spawn(components![Pos::default(), Move::new(vec2(1.0, 0.0), 60.0)]).unwrap();

    engine.frame(1.0 / 60.0).unwrap();
    assert_eq!(updates.get(), 3);
    let world = engine.world();
    assert!(world.get(world.root(), "victim").is_empty());
    assert!(world.pos(survivor).x > 0.0);

    engine.frame(1.0 / 60.0).unwrap();
    assert_eq!(updates.get(), 3);
    assert_eq!(engine.world().entity_count(), 2);
}

#[test]
fn test_entity_added_during_update_runs_next_frame() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let spawned_updates = Rc::new(Cell::new(0));
    let s = Rc::clone(&spawned_updates);
    let once = Cell::new(false);
    engine
        .world_mut()
        .spawn(components![Custom::new("spawner").with_update(move |world, _| {
            if once.replace(true) {
                return Ok(());
            }
            let s = Rc::clone(&s);
            world.spawn(components![Custom::new("child").with_update(move |_, _| {
                s.set(s.get() + 1);
                Ok(())
            })])?;
            Ok(())
        })])
        .unwrap();

    engine.frame(1.0 / 60.0).unwrap();
    assert_eq!(spawned_updates.get(), 0);
    engine.frame(1.0 / 60.0).unwrap();
    assert_eq!(spawned_updates.get(), 1);
}

#[test]
fn test_scene_transition_is_deferred_and_keeps_stay() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    engine.scene("level", |world, _| {
        world.spawn(components!["plain"])?;
        world.spawn(components![Stay::new(), "hud"])?;
        world.spawn(components![Stay::only(["menu"]), "music"])?;
        world.spawn(components![Custom::new("exit").with_update(|world, _| world.go("gameover", Vec::new()))])?;
        Ok(())
    });
    let seen_mid_frame = Rc::new(Cell::new(0));
    let seen = Rc::clone(&seen_mid_frame);
    engine.scene("gameover", move |world, args| {
        assert!(args.is_empty());
        seen.set(world.get(world.root(), "*").len());
        Ok(())
    });

    engine.go("level", Vec::new()).unwrap();
    engine.frame(1.0 / 60.0).unwrap();
    assert_eq!(engine.world().current_scene(), Some("level"));
    assert_eq!(engine.world().get(engine.world().root(), "plain").len(), 1);

    engine.frame(1.0 / 60.0).unwrap();
    assert_eq!(engine.world().current_scene(), Some("gameover"));
    let world = engine.world();
    let root = world.root();
    assert_eq!(world.get(root, "hud").len(), 1);
    assert!(world.get(root, "plain").is_empty());
    assert!(world.get(root, "music").is_empty());
    assert_eq!(seen_mid_frame.get(), 1);
}

#[test]
fn test_scene_transition_runs_once_at_frame_end() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let entered = Rc::new(Cell::new(0));
    let e = Rc::clone(&entered);
    engine.scene("main", move |world, _| {
        e.set(e.get() + 1);
        world.set_gravity(500.0);
        Ok(())
    });
    engine.go("main", Vec::new()).unwrap();
    assert_eq!(entered.get(), 0);
    engine.frame(1.0 / 60.0).unwrap();
    engine.frame(1.0 / 60.0).unwrap();
    assert_eq!(entered.get(), 1);
    assert!((engine.world().gravity() - 500.0).abs() < f32::EPSILON);
}

#[test]
fn test_unknown_scene() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    assert!(matches!(engine.go("nowhere", Vec::new()), Err(EngineError::UnknownScene(ref id)) if id == "nowhere"));
}

#[test]
fn test_global_timers() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let waits = Rc::new(Cell::new(0));
    let loops = Rc::new(Cell::new(0));
    let (w, l) = (Rc::clone(&waits), Rc::clone(&loops));
    let world = engine.world_mut();
    world
        .wait(0.5, move |_| {
            w.set(w.get() + 1);
            Ok(())
        })
        .unwrap();
    let looping = world
        .loop_every(0.25, move |_| {
            l.set(l.get() + 1);
            Ok(())
        })
        .unwrap();

    for _ in 0..4 {
        engine.frame(0.25).unwrap();
    }
    assert_eq!(waits.get(), 1);
    assert_eq!(loops.get(), 4);

    looping.cancel();
    engine.frame(0.25).unwrap();
    assert_eq!(loops.get(), 4);
}
