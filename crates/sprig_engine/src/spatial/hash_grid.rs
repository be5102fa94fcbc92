//! Uniform spatial hash grid
//!
//! World space is divided into square cells of a configurable size. An
//! entity occupies every cell its bounding box touches, from
//! `floor(min / size)` to `floor(max / size)` inclusive on each axis.

use std::any::Any;
use std::collections::{HashMap, HashSet};

use log::warn;

use crate::ecs::EntityId;
use crate::physics::collision::Rect;

use super::spatial_query::BroadPhase;

/// Integer cell coordinates
pub type CellCoord = (i32, i32);

/// Spatial hash grid broad phase
pub struct SpatialHashGrid {
    cell_size: f32,
    cells: HashMap<CellCoord, Vec<EntityId>>,
    entity_count: usize,
}

impl SpatialHashGrid {
    /// Create a grid with the given cell size; non-positive sizes fall back to 64
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size > 0.0 && cell_size.is_finite() {
            cell_size
        } else {
            warn!("Invalid hash grid cell size {cell_size}, using 64");
            64.0
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            entity_count: 0,
        }
    }

    /// Side length of a cell
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Inclusive cell range covered by a bounding box
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_range(&self, bbox: &Rect) -> (CellCoord, CellCoord) {
        let min = bbox.min();
        let max = bbox.max();
        let to_cell = |v: f32| (v / self.cell_size).floor() as i32;
        ((to_cell(min.x), to_cell(min.y)), (to_cell(max.x), to_cell(max.y)))
    }

    /// Entities stored in one cell
    pub fn occupants(&self, cell: CellCoord) -> &[EntityId] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

impl Default for SpatialHashGrid {
    fn default() -> Self {
        Self::new(crate::core::config::DEFAULT_HASH_GRID_SIZE)
    }
}

impl BroadPhase for SpatialHashGrid {
    fn insert(&mut self, entity: EntityId, bbox: &Rect) -> Vec<EntityId> {
        if !bbox.is_finite() {
            warn!("Skipping broad phase insert of {entity:?}: non-finite bounds {bbox:?}");
            return Vec::new();
        }

        let ((x0, y0), (x1, y1)) = self.cell_range(bbox);
        let mut checked = HashSet::new();
        let mut candidates = Vec::new();

        for x in x0..=x1 {
            for y in y0..=y1 {
                let cell = self.cells.entry((x, y)).or_default();
                for &other in cell.iter() {
                    if checked.insert(other) {
                        candidates.push(other);
                    }
                }
                cell.push(entity);
            }
        }

        self.entity_count += 1;
        candidates
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.entity_count = 0;
    }

    fn entity_count(&self) -> usize {
        self.entity_count
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::vec2;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<EntityId> {
        let mut map: SlotMap<EntityId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_cell_range_uses_floor() {
        let grid = SpatialHashGrid::new(64.0);
        let range = grid.cell_range(&Rect::new(vec2(-1.0, 10.0), 70.0, 10.0));
        assert_eq!(range, ((-1, 0), (1, 0)));
    }

    #[test]
    fn test_pair_reported_once_across_shared_cells() {
        let e = ids(2);
        let mut grid = SpatialHashGrid::new(8.0);
        let first = grid.insert(e[0], &Rect::new(vec2(0.0, 0.0), 20.0, 20.0));
        assert!(first.is_empty());
        let second = grid.insert(e[1], &Rect::new(vec2(4.0, 4.0), 20.0, 20.0));
        assert_eq!(second, vec![e[0]]);
        assert!(grid.cell_count() > 4);
    }

    #[test]
    fn test_distant_entities_are_not_candidates() {
        let e = ids(2);
        let mut grid = SpatialHashGrid::new(64.0);
        grid.insert(e[0], &Rect::new(vec2(0.0, 0.0), 10.0, 10.0));
        let found = grid.insert(e[1], &Rect::new(vec2(500.0, 500.0), 10.0, 10.0));
        assert!(found.is_empty());
    }

    #[test]
    fn test_clear_resets() {
        let e = ids(2);
        let mut grid = SpatialHashGrid::default();
        grid.insert(e[0], &Rect::new(vec2(0.0, 0.0), 10.0, 10.0));
        grid.clear();
        assert_eq!(grid.entity_count(), 0);
        assert!(grid.insert(e[1], &Rect::new(vec2(0.0, 0.0), 10.0, 10.0)).is_empty());
    }

    #[test]
    fn test_non_finite_bounds_are_skipped() {
        let e = ids(1);
        let mut grid = SpatialHashGrid::default();
        assert!(grid.insert(e[0], &Rect::new(vec2(f32::NAN, 0.0), 1.0, 1.0)).is_empty());
        assert_eq!(grid.entity_count(), 0);
    }
}
