//! Per-frame collision pipeline
//!
//! Runs once per frame after the update pass:
//! 1. Walk the tree, refreshing every cached world transform
//! 2. Insert each active area into the broad phase and SAT-test the
//!    candidates it reports, firing `CollideUpdate` on both sides
//! 3. Sweep every area for tracked pairs that no longer overlap and fire
//!    `CollideEnd`
//!
//! Bodies resolve inside step 2 through their `CollideUpdate` listeners,
//! so an entity pushed out by an earlier pair is tested at its new place.

use log::trace;

use crate::ecs::components::Area;
use crate::ecs::{EntityId, World};
use crate::events::{EventArgs, EventKind};
use crate::foundation::math::utils::is_zero;
use crate::foundation::math::Mat3;
use crate::physics::collision::{overlap, Collision};
use crate::spatial::{BroadPhase, SpatialHashGrid};
use crate::EngineResult;

/// Broad phase plus narrow phase plus exit bookkeeping
pub struct CollisionSystem {
    broad_phase: Box<dyn BroadPhase>,
    pairs_tested: usize,
}

impl CollisionSystem {
    /// Collision system over a spatial hash grid with `cell_size` cells
    pub fn new(cell_size: f32) -> Self {
        Self::with_broad_phase(Box::new(SpatialHashGrid::new(cell_size)))
    }

    /// Collision system over any broad phase
    pub fn with_broad_phase(broad_phase: Box<dyn BroadPhase>) -> Self {
        Self {
            broad_phase,
            pairs_tested: 0,
        }
    }

    /// The broad phase as filled by the last frame
    pub fn broad_phase(&self) -> &dyn BroadPhase {
        self.broad_phase.as_ref()
    }

    /// Narrow-phase tests run during the last frame
    pub fn pairs_tested(&self) -> usize {
        self.pairs_tested
    }

    /// Run the whole pipeline for one frame
    pub fn check_frame(&mut self, world: &mut World) -> EngineResult<()> {
        self.broad_phase.clear();
        self.pairs_tested = 0;
        let root = world.root();
        self.visit(world, root, Mat3::identity())?;
        trace!(
            "Collision frame: {} areas, {} pairs tested",
            self.broad_phase.entity_count(),
            self.pairs_tested
        );
        sweep_exits(world)
    }

    fn visit(&mut self, world: &mut World, entity: EntityId, parent: Mat3) -> EngineResult<()> {
        let transform = if entity == world.root() {
            Mat3::identity()
        } else {
            parent * world.local_transform(entity)
        };
        world.set_transform(entity, transform);

        if entity != world.root() && !world.is_paused(entity) && world.has(entity, "area") {
            self.check_entity(world, entity)?;
        }

        for child in world.children(entity) {
            if world.parent(child) != Some(entity) {
                continue;
            }
            let Some(transform) = world.transform(entity) else {
                break;
            };
            self.visit(world, child, transform)?;
        }
        Ok(())
    }

    fn check_entity(&mut self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        let Some(bbox) = world.world_area(entity)?.map(|area| area.bbox()) else {
            return Ok(());
        };
        if !bbox.is_finite() {
            trace!("Skipping {entity:?}: non-finite bounds");
            return Ok(());
        }

        for other in self.broad_phase.insert(entity, &bbox) {
            if !world.exists(entity) {
                break;
            }
            if !world.exists(other) || world.ignores(entity, other) {
                continue;
            }
            // Resolution of an earlier pair may have moved `entity`
            let (Some(area), Some(other_area)) = (world.world_area(entity)?, world.world_area(other)?) else {
                continue;
            };
            self.pairs_tested += 1;
            let Some(displacement) = overlap(&area, &other_area)? else {
                continue;
            };
            if is_zero(&displacement) {
                continue;
            }
            let col = Collision::new(entity, other, displacement);
            let reverse = col.reverse();
            world.trigger(entity, EventKind::CollideUpdate, EventArgs::Collision(col))?;
            world.trigger(other, EventKind::CollideUpdate, EventArgs::Collision(reverse))?;
        }
        Ok(())
    }
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new(crate::core::config::DEFAULT_HASH_GRID_SIZE)
    }
}

/// Drop tracked pairs that stopped overlapping and fire `CollideEnd` for each
fn sweep_exits(world: &mut World) -> EngineResult<()> {
    for entity in world.area_entities() {
        if world.is_paused(entity) {
            continue;
        }
        let Some(area) = world.component::<Area>(entity) else {
            continue;
        };
        for other in area.colliding_with() {
            if world.check_collision(entity, other)?.is_some() {
                continue;
            }
            if let Some(col) = area.forget(other) {
                world.trigger(entity, EventKind::CollideEnd, EventArgs::Collision(col))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components;
    use crate::ecs::components::{Pos, RectShape};
    use crate::foundation::math::vec2;
    use std::cell::Cell;
    use std::rc::Rc;

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
    fn test_pair_spanning_many_cells_fires_once_per_side() {
        let mut world = World::new();
        let a = boxed(&mut world, 0.0, 0.0);
        let b = boxed(&mut world, 5.0, 5.0);
        let (ca, cb) = (
            counter(&mut world, a, EventKind::CollideUpdate),
            counter(&mut world, b, EventKind::CollideUpdate),
        );
        let mut system = CollisionSystem::new(2.0);
        system.check_frame(&mut world).unwrap();
        assert_eq!((ca.get(), cb.get()), (1, 1));
        assert_eq!(system.pairs_tested(), 1);
    }

    #[test]
    fn test_touching_pair_is_not_reported() {
        let mut world = World::new();
        let a = boxed(&mut world, 0.0, 0.0);
        boxed(&mut world, 10.0, 0.0);
        let ca = counter(&mut world, a, EventKind::CollideUpdate);
        CollisionSystem::new(64.0).check_frame(&mut world).unwrap();
        assert_eq!(ca.get(), 0);
    }

    #[test]
    fn test_paused_area_is_skipped() {
        let mut world = World::new();
        let a = boxed(&mut world, 0.0, 0.0);
        let b = boxed(&mut world, 5.0, 0.0);
        world.set_paused(b, true);
        let ca = counter(&mut world, a, EventKind::CollideUpdate);
        CollisionSystem::default().check_frame(&mut world).unwrap();
        assert_eq!(ca.get(), 0);
    }

    #[test]
    fn test_exit_sweep_fires_collide_end() {
        let mut world = World::new();
        let a = boxed(&mut world, 0.0, 0.0);
        let b = boxed(&mut world, 5.0, 0.0);
        let ended = counter(&mut world, a, EventKind::CollideEnd);
        let mut system = CollisionSystem::default();
        system.check_frame(&mut world).unwrap();
        assert_eq!(world.colliding_with(a), vec![b]);

        world.set_prop(b, "pos", vec2(50.0, 0.0)).unwrap();
        system.check_frame(&mut world).unwrap();
        assert_eq!(ended.get(), 1);
        assert!(world.colliding_with(a).is_empty());
    }

    #[test]
    fn test_children_collide_in_world_space() {
        let mut world = World::new();
        let parent = world.spawn(components![Pos::new(vec2(100.0, 0.0))]).unwrap();
        let child = world
            .add(parent, components![Pos::new(vec2(0.0, 0.0)), RectShape::new(10.0, 10.0), Area::new()])
            .unwrap();
        let other = boxed(&mut world, 105.0, 0.0);
        let hits = counter(&mut world, child, EventKind::CollideUpdate);
        world.set_prop(parent, "pos", vec2(100.0, 0.0)).unwrap();
        CollisionSystem::default().check_frame(&mut world).unwrap();
        assert_eq!(hits.get(), 1);
        assert!(world.is_colliding(child, other).unwrap());
    }
}
