//! Abstract broad-phase interface
//!
//! Spatial partitioning culls pairs of entities that cannot possibly be
//! colliding before the exact SAT test runs. The collision system only talks
//! to this trait, so the partitioning scheme can be swapped without touching
//! the frame pipeline.

use std::any::Any;

use crate::ecs::EntityId;
use crate::physics::collision::Rect;

/// Incremental broad phase rebuilt once per frame.
///
/// Entities are inserted one at a time; each insertion reports the entities
/// already present that share space with the new one. A pair is reported at
/// most once per frame, when its second member is inserted.
pub trait BroadPhase {
    /// Insert `entity` covering `bbox`, returning earlier occupants it may touch.
    ///
    /// Each candidate appears once, in the order first encountered, even
    /// when the two entities share several cells.
    fn insert(&mut self, entity: EntityId, bbox: &Rect) -> Vec<EntityId>;

    /// Forget every entity
    fn clear(&mut self);

    /// Number of entities inserted since the last clear
    fn entity_count(&self) -> usize;

    /// Downcast to Any for type-specific access
    fn as_any(&self) -> &dyn Any;
}
