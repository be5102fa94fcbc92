//! End-to-end collision tests: broad phase, narrow phase, enter/update/exit

use std::cell::Cell;
use std::rc::Rc;

use approx::assert_relative_eq;
use sprig_engine::physics::collision::{sat, Polygon, Rect};
use sprig_engine::prelude::*;

fn counter(world: &mut World, entity: EntityId, kind: EventKind) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    world
        .on_entity(entity, kind, move |_, _, _| {
            c.set(c.get() + 1);
            Ok(())
        })
        .unwrap();
    count
}

fn boxed(world: &mut World, x: f32, y: f32) -> EntityId {
    world
        .spawn(components![Pos::new(vec2(x, y)), RectShape::new(10.0, 10.0), Area::new()])
        .unwrap()
}

#[test]
fn test_sat_symmetry_on_sheared_polygons() {
    let a = Polygon::new(vec![vec2(0.0, 0.0), vec2(12.0, 2.0), vec2(9.0, 11.0), vec2(-1.0, 8.0)]).unwrap();
    let b = Polygon::new(vec![vec2(6.0, 5.0), vec2(16.0, 7.0), vec2(11.0, 15.0)]).unwrap();
    let ab = sat(&a, &b).unwrap();
    let ba = sat(&b, &a).unwrap();
    assert_relative_eq!(ab.x, -ba.x, epsilon = 1e-4);
    assert_relative_eq!(ab.y, -ba.y, epsilon = 1e-4);

    let far = Rect::new(vec2(40.0, 40.0), 5.0, 5.0).to_polygon();
    assert!(sat(&a, &far).is_none());
    assert!(sat(&far, &a).is_none());
}

#[test]
fn test_pair_sharing_many_cells_updates_once_per_frame() {
    let config = EngineConfig::default().with_hash_grid_size(8.0);
    let mut engine = Engine::new(config).unwrap();
    let world = engine.world_mut();
    let a = boxed(world, 0.0, 0.0);
    let b = boxed(world, 4.0, 4.0);
    let (ua, ub) = (
        counter(world, a, EventKind::CollideUpdate),
        counter(world, b, EventKind::CollideUpdate),
    );

    for frame in 1..=3 {
        engine.frame(1.0 / 60.0).unwrap();
        assert_eq!(ua.get(), frame);
        assert_eq!(ub.get(), frame);
    }
}

#[test]
fn test_enter_update_exit_sequence() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let world = engine.world_mut();
    let a = boxed(world, 0.0, 0.0);
    let b = boxed(world, 5.0, 0.0);
    let entered = counter(world, a, EventKind::Collide);
    let updated = counter(world, a, EventKind::CollideUpdate);
    let ended = counter(world, a, EventKind::CollideEnd);

    for _ in 0..3 {
        engine.frame(1.0 / 60.0).unwrap();
    }
    assert_eq!((entered.get(), updated.get(), ended.get()), (1, 3, 0));

    engine.world_mut().set_prop(b, "pos", vec2(100.0, 0.0)).unwrap();
    engine.frame(1.0 / 60.0).unwrap();
    assert_eq!((entered.get(), updated.get(), ended.get()), (1, 3, 1));

    engine.frame(1.0 / 60.0).unwrap();
    assert_eq!(ended.get(), 1);
}

#[test]
fn test_destroyed_partner_ends_collision() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let world = engine.world_mut();
    let a = boxed(world, 0.0, 0.0);
    let b = boxed(world, 5.0, 0.0);
    let ended = counter(world, a, EventKind::CollideEnd);

    engine.frame(1.0 / 60.0).unwrap();
    engine.world_mut().destroy(b).unwrap();
    engine.frame(1.0 / 60.0).unwrap();
    assert_eq!(ended.get(), 1);
    assert!(engine.world().colliding_with(a).is_empty());
}

#[test]
fn test_collision_ignore_skips_pair() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let world = engine.world_mut();
    let a = world
        .spawn(components![
            Pos::new(vec2(0.0, 0.0)),
            RectShape::new(10.0, 10.0),
            Area::new().with_collision_ignore(["bullet"])
        ])
        .unwrap();
    let b = world
        .spawn(components![Pos::new(vec2(5.0, 0.0)), RectShape::new(10.0, 10.0), Area::new(), "bullet"])
        .unwrap();
    let (ua, ub) = (
        counter(world, a, EventKind::CollideUpdate),
        counter(world, b, EventKind::CollideUpdate),
    );
    engine.frame(1.0 / 60.0).unwrap();
    assert_eq!((ua.get(), ub.get()), (0, 0));
}

#[test]
fn test_on_collide_by_tag() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let hits = Rc::new(Cell::new(0));
    let world = engine.world_mut();
    let h = Rc::clone(&hits);
    world.on_collide("player", "coin", move |world, _, coin, _| {
        h.set(h.get() + 1);
        world.destroy(coin)
    });
    world
        .spawn(components![Pos::new(vec2(0.0, 0.0)), RectShape::new(10.0, 10.0), Area::new(), "player"])
        .unwrap();
    let coin = world
        .spawn(components![Pos::new(vec2(4.0, 4.0)), RectShape::new(4.0, 4.0), Area::new(), "coin"])
        .unwrap();

    engine.frame(1.0 / 60.0).unwrap();
    engine.frame(1.0 / 60.0).unwrap();
    assert_eq!(hits.get(), 1);
    assert!(!engine.world().exists(coin));
}
