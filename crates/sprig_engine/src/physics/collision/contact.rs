//! Collision records exchanged between the broad phase, areas and bodies

use std::cell::Cell;
use std::rc::Rc;

use crate::ecs::EntityId;
use crate::foundation::math::Vec2;
use crate::foundation::math::utils::is_zero;

/// One side of an overlapping pair.
///
/// `displacement` moves `source` out of `target`. A record and its
/// [`reverse`](Collision::reverse) share one `resolved` flag, so whichever
/// side resolves the pair first settles it for both.
#[derive(Debug, Clone)]
pub struct Collision {
    /// Entity this record is delivered to
    pub source: EntityId,
    /// The other entity of the pair
    pub target: EntityId,
    /// Minimum translation vector for `source`
    pub displacement: Vec2,
    resolved: Rc<Cell<bool>>,
}

impl Collision {
    /// Creates an unresolved record
    pub fn new(source: EntityId, target: EntityId, displacement: Vec2) -> Self {
        Self {
            source,
            target,
            displacement,
            resolved: Rc::new(Cell::new(false)),
        }
    }

    /// The same contact seen from the target, sharing the resolved flag
    pub fn reverse(&self) -> Self {
        Self {
            source: self.target,
            target: self.source,
            displacement: -self.displacement,
            resolved: Rc::clone(&self.resolved),
        }
    }

    /// Whether the pair has been resolved this frame
    pub fn is_resolved(&self) -> bool {
        self.resolved.get()
    }

    /// Mark the pair resolved
    pub fn set_resolved(&self) {
        self.resolved.set(true);
    }

    /// Veto physics resolution for this pair
    pub fn prevent_resolve(&self) {
        self.set_resolved();
    }

    /// Contact on the source's left side
    pub fn is_left(&self) -> bool {
        self.displacement.x > 0.0
    }

    /// Contact on the source's right side
    pub fn is_right(&self) -> bool {
        self.displacement.x < 0.0
    }

    /// Contact on the source's top side
    pub fn is_top(&self) -> bool {
        self.displacement.y > 0.0
    }

    /// Contact on the source's bottom side
    pub fn is_bottom(&self) -> bool {
        self.displacement.y < 0.0
    }

    /// Whether the shapes merely touch
    pub fn is_touching_only(&self) -> bool {
        is_zero(&self.displacement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::vec2;
    use slotmap::SlotMap;

    #[test]
    fn test_reverse_negates_and_shares_resolved() {
        let mut ids: SlotMap<EntityId, ()> = SlotMap::with_key();
        let (a, b) = (ids.insert(()), ids.insert(()));
        let col = Collision::new(a, b, vec2(0.0, -3.0));
        let rev = col.reverse();
        assert_eq!(rev.source, b);
        assert_eq!(rev.target, a);
        assert!(col.is_bottom());
        assert!(rev.is_top());

        rev.prevent_resolve();
        assert!(col.is_resolved());
    }
}
