//! Area component and world collision queries
//!
//! An [`Area`] gives its entity a collision shape in local space and keeps a
//! record of every entity it currently overlaps. The broad phase feeds it
//! `CollideUpdate` events; the exit sweep in
//! [`CollisionSystem`](crate::physics::CollisionSystem) removes pairs that
//! stopped overlapping.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::ecs::{Component, EntityId, Hooks, Value, World};
use crate::events::{EventArgs, EventController, EventKind};
use crate::foundation::math::utils::is_zero;
use crate::foundation::math::{vec2, Mat3, Vec2};
use crate::physics::collision::{overlap, Collision, Shape};
use crate::{EngineError, EngineResult};

use super::{expect_vec2, Anchor};

/// Collision area ("area")
#[derive(Debug)]
pub struct Area {
    shape: RefCell<Option<Shape>>,
    scale: Cell<Vec2>,
    offset: Cell<Vec2>,
    collision_ignore: RefCell<Vec<String>>,
    colliding: Rc<RefCell<HashMap<EntityId, Collision>>>,
}

impl Area {
    /// Area using the shape of the entity's render component
    pub fn new() -> Self {
        Self {
            shape: RefCell::new(None),
            scale: Cell::new(vec2(1.0, 1.0)),
            offset: Cell::new(Vec2::zeros()),
            collision_ignore: RefCell::new(Vec::new()),
            colliding: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Use an explicit local-space shape
    pub fn with_shape(self, shape: impl Into<Shape>) -> Self {
        *self.shape.borrow_mut() = Some(shape.into());
        self
    }

    /// Scale the shape relative to the entity
    pub fn with_scale(self, scale: Vec2) -> Self {
        self.scale.set(scale);
        self
    }

    /// Shift the shape in local space
    pub fn with_offset(self, offset: Vec2) -> Self {
        self.offset.set(offset);
        self
    }

    /// Never collide with entities carrying any of these tags
    pub fn with_collision_ignore<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.collision_ignore.borrow_mut() = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Explicit shape, if one was configured
    pub fn shape(&self) -> Option<Shape> {
        self.shape.borrow().clone()
    }

    /// Tags this area ignores
    pub fn collision_ignore(&self) -> Vec<String> {
        self.collision_ignore.borrow().clone()
    }

    /// Entities currently tracked as overlapping
    pub fn colliding_with(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.colliding.borrow().keys().copied().collect();
        ids.sort();
        ids
    }

    /// Latest record for `other`, if tracked
    pub fn collision_with(&self, other: EntityId) -> Option<Collision> {
        self.colliding.borrow().get(&other).cloned()
    }

    pub(crate) fn forget(&self, other: EntityId) -> Option<Collision> {
        self.colliding.borrow_mut().remove(&other)
    }

    fn ignores_any(&self, world: &World, other: EntityId) -> bool {
        self.collision_ignore.borrow().iter().any(|tag| world.is(other, tag))
    }
}

impl Default for Area {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Area {
    fn id(&self) -> &str {
        "area"
    }

    fn properties(&self) -> Vec<&str> {
        vec!["collisionIgnore", "areaShape", "areaScale", "areaOffset"]
    }

    fn methods(&self) -> Vec<&str> {
        vec!["isColliding", "isTouching", "checkCollision", "hasPoint", "pushOut"]
    }

    fn hooks(&self) -> Hooks {
        Hooks::ADD | Hooks::DESTROY
    }

    fn get(&self, key: &str) -> Option<Value> {
        match key {
            "collisionIgnore" => Some(Value::List(self.collision_ignore())),
            "areaShape" => Some(self.shape().map_or(Value::Null, Value::Shape)),
            "areaScale" => Some(Value::Vec2(self.scale.get())),
            "areaOffset" => Some(Value::Vec2(self.offset.get())),
            _ => None,
        }
    }

    fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        match (key, value) {
            ("collisionIgnore", Value::List(tags)) => *self.collision_ignore.borrow_mut() = tags,
            ("areaShape", Value::Shape(shape)) => *self.shape.borrow_mut() = Some(shape),
            ("areaShape", Value::Null) => *self.shape.borrow_mut() = None,
            ("areaScale", Value::Number(n)) => self.scale.set(vec2(n, n)),
            ("areaScale", value) => self.scale.set(expect_vec2(self.id(), key, &value)?),
            ("areaOffset", value) => self.offset.set(expect_vec2(self.id(), key, &value)?),
            (key, value) => {
                return Err(EngineError::StateAssertion(format!(
                    "area.{key} cannot be set from {}",
                    value.type_name()
                )))
            }
        }
        Ok(())
    }

    fn call(&self, world: &mut World, entity: EntityId, method: &str, args: &[Value]) -> EngineResult<Value> {
        if method == "hasPoint" {
            let point = super::arg_vec2(method, args, 0)?;
            return world.has_point(entity, point).map(Value::Bool);
        }
        let other = args
            .first()
            .and_then(Value::as_entity)
            .ok_or_else(|| EngineError::StateAssertion(format!("{method} expects an entity")))?;
        match method {
            "isColliding" => world.is_colliding(entity, other).map(Value::Bool),
            "isTouching" => world.is_touching(entity, other).map(Value::Bool),
            "checkCollision" => Ok(world.check_collision(entity, other)?.map_or(Value::Null, Value::Vec2)),
            "pushOut" => world.push_out(entity, other).map(|_| Value::Null),
            _ => Err(EngineError::StateAssertion(format!("area has no method {method}"))),
        }
    }

    fn on_add(&self, world: &mut World, entity: EntityId) -> EngineResult<()> {
        let colliding = Rc::clone(&self.colliding);
        world.on_component(entity, "area", EventKind::CollideUpdate, move |world, entity, args| {
            let Some(col) = args.collision() else {
                return Ok(());
            };
            let entered = colliding.borrow_mut().insert(col.target, col.clone()).is_none();
            if entered {
                world.trigger(entity, EventKind::Collide, EventArgs::Collision(col.clone()))?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn on_destroy(&self, _world: &mut World, _entity: EntityId) -> EngineResult<()> {
        self.colliding.borrow_mut().clear();
        Ok(())
    }

    fn inspect(&self) -> Option<String> {
        Some(format!("colliding with {}", self.colliding.borrow().len()))
    }
}

impl World {
    /// The entity's area mapped to world space through its cached transform.
    ///
    /// `None` when the entity has no area. An area with neither an explicit
    /// shape nor a shape-providing component is an invalid shape. Circles
    /// come back as polygons sampled on the transformed ellipse.
    pub fn world_area(&self, entity: EntityId) -> EngineResult<Option<Shape>> {
        let Some(area) = self.component::<Area>(entity) else {
            return Ok(None);
        };
        let local = area
            .shape()
            .or_else(|| self.render_area(entity))
            .ok_or_else(|| EngineError::InvalidShape(format!("{entity:?} has an area but no shape")))?;

        let mut m: Mat3 = self.transform(entity).unwrap_or_else(Mat3::identity)
            * Mat3::new_nonuniform_scaling(&area.scale.get())
            * Mat3::new_translation(&area.offset.get());
        if let Shape::Rect(rect) = &local {
            let anchor = self
                .component::<Anchor>(entity)
                .map_or_else(|| vec2(-1.0, -1.0), |a| a.offset());
            let shift = (anchor + vec2(1.0, 1.0)) * -0.5;
            m *= Mat3::new_translation(&vec2(shift.x * rect.width, shift.y * rect.height));
        }
        Ok(Some(local.transform(&m, self.config().ellipse_segments)))
    }

    /// SAT between two areas: the displacement that moves `a` out of `b`.
    ///
    /// `None` when either side has no area or no longer exists.
    pub fn check_collision(&self, a: EntityId, b: EntityId) -> EngineResult<Option<Vec2>> {
        if !self.exists(a) || !self.exists(b) {
            return Ok(None);
        }
        match (self.world_area(a)?, self.world_area(b)?) {
            (Some(sa), Some(sb)) => overlap(&sa, &sb),
            _ => Ok(None),
        }
    }

    /// Whether the areas overlap with a non-zero displacement
    pub fn is_colliding(&self, a: EntityId, b: EntityId) -> EngineResult<bool> {
        Ok(self.check_collision(a, b)?.is_some_and(|d| !is_zero(&d)))
    }

    /// Whether the areas overlap or share an edge
    pub fn is_touching(&self, a: EntityId, b: EntityId) -> EngineResult<bool> {
        Ok(self.check_collision(a, b)?.is_some())
    }

    /// Whether a world-space point lies inside the entity's area
    pub fn has_point(&self, entity: EntityId, point: Vec2) -> EngineResult<bool> {
        Ok(self.world_area(entity)?.is_some_and(|shape| shape.contains_point(point)))
    }

    /// Move `a` out of `b` if they overlap
    pub fn push_out(&mut self, a: EntityId, b: EntityId) -> EngineResult<()> {
        if let Some(d) = self.check_collision(a, b)? {
            if !is_zero(&d) {
                self.move_by(a, d)?;
                self.update_transform(a);
            }
        }
        Ok(())
    }

    /// Move `entity` out of every other area in the tree
    pub fn push_out_all(&mut self, entity: EntityId) -> EngineResult<()> {
        let root = self.root();
        for other in self.get_all(root, "area") {
            if other != entity && !self.ignores(entity, other) {
                self.push_out(entity, other)?;
            }
        }
        Ok(())
    }

    /// Whether either area ignores a tag the other carries
    pub fn ignores(&self, a: EntityId, b: EntityId) -> bool {
        let one_way = |x: EntityId, y: EntityId| {
            self.component::<Area>(x)
                .is_some_and(|area| area.ignores_any(self, y))
        };
        one_way(a, b) || one_way(b, a)
    }

    /// Entities the area of `entity` currently tracks as overlapping
    pub fn colliding_with(&self, entity: EntityId) -> Vec<EntityId> {
        self.component::<Area>(entity)
            .map(|area| area.colliding_with())
            .unwrap_or_default()
    }

    /// All entities with an area, in tree order
    pub fn area_entities(&self) -> Vec<EntityId> {
        let root = self.root();
        self.get_all(root, "area")
    }

    /// Run `callback` when the area of `entity` starts overlapping one tagged `tag`
    pub fn on_area_collide<F>(&mut self, entity: EntityId, tag: Option<&str>, callback: F) -> EngineResult<EventController>
    where
        F: Fn(&mut World, EntityId, &Collision) -> EngineResult<()> + 'static,
    {
        self.on_area_event(entity, EventKind::Collide, tag, callback)
    }

    /// Run `callback` every frame the area of `entity` overlaps one tagged `tag`
    pub fn on_area_collide_update<F>(
        &mut self,
        entity: EntityId,
        tag: Option<&str>,
        callback: F,
    ) -> EngineResult<EventController>
    where
        F: Fn(&mut World, EntityId, &Collision) -> EngineResult<()> + 'static,
    {
        self.on_area_event(entity, EventKind::CollideUpdate, tag, callback)
    }

    /// Run `callback` when the area of `entity` stops overlapping one tagged `tag`
    pub fn on_area_collide_end<F>(
        &mut self,
        entity: EntityId,
        tag: Option<&str>,
        callback: F,
    ) -> EngineResult<EventController>
    where
        F: Fn(&mut World, EntityId, &Collision) -> EngineResult<()> + 'static,
    {
        self.on_area_event(entity, EventKind::CollideEnd, tag, callback)
    }

    fn on_area_event<F>(
        &mut self,
        entity: EntityId,
        kind: EventKind,
        tag: Option<&str>,
        callback: F,
    ) -> EngineResult<EventController>
    where
        F: Fn(&mut World, EntityId, &Collision) -> EngineResult<()> + 'static,
    {
        let tag = tag.map(str::to_string);
        self.on_entity(entity, kind, move |world, entity, args| match args.collision() {
            Some(col) if tag.as_deref().map_or(true, |t| world.is(col.target, t)) => {
                callback(world, entity, col)
            }
            _ => Ok(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components;
    use crate::ecs::components::{AnchorPoint, CircleShape, Pos, RectShape};
    use crate::physics::collision::Rect;
    use approx::assert_relative_eq;

    fn boxed(world: &mut World, x: f32, y: f32, tag: &str) -> EntityId {
        world
            .spawn(components![Pos::new(vec2(x, y)), RectShape::new(10.0, 10.0), Area::new(), tag])
            .unwrap()
    }

    #[test]
    fn test_world_area_uses_top_left_anchor_by_default() {
        let mut world = World::new();
        let e = boxed(&mut world, 5.0, 5.0, "a");
        let bbox = world.world_area(e).unwrap().unwrap().bbox();
        assert_relative_eq!(bbox.pos.x, 5.0);
        assert_relative_eq!(bbox.pos.y, 5.0);
        assert_relative_eq!(bbox.width, 10.0);
    }

    #[test]
    fn test_world_area_centers_with_center_anchor() {
        let mut world = World::new();
        let e = world
            .spawn(components![
                Pos::new(vec2(0.0, 0.0)),
                RectShape::new(10.0, 4.0),
                Anchor::new(AnchorPoint::Center),
                Area::new()
            ])
            .unwrap();
        let bbox = world.world_area(e).unwrap().unwrap().bbox();
        assert_relative_eq!(bbox.pos.x, -5.0);
        assert_relative_eq!(bbox.pos.y, -2.0);
    }

    #[test]
    fn test_world_area_applies_area_scale_and_offset() {
        let mut world = World::new();
        let area = Area::new()
            .with_shape(Rect::new(Vec2::zeros(), 4.0, 4.0))
            .with_scale(vec2(2.0, 2.0))
            .with_offset(vec2(1.0, 0.0));
        let e = world.spawn(components![Pos::new(vec2(10.0, 0.0)), area]).unwrap();
        let bbox = world.world_area(e).unwrap().unwrap().bbox();
        assert_relative_eq!(bbox.pos.x, 12.0);
        assert_relative_eq!(bbox.width, 8.0);
    }

    #[test]
    fn test_circle_area_becomes_polygon() {
        let mut world = World::new();
        let e = world.spawn(components![Pos::new(vec2(0.0, 0.0)), CircleShape::new(5.0), Area::new()]).unwrap();
        match world.world_area(e).unwrap() {
            Some(Shape::Polygon(poly)) => assert_eq!(poly.points().len(), world.config().ellipse_segments),
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn test_area_without_shape_is_invalid() {
        let mut world = World::new();
        let e = world.spawn(components![Area::new()]).unwrap();
        assert!(matches!(world.world_area(e), Err(EngineError::InvalidShape(_))));
    }

    #[test]
    fn test_collision_queries() {
        let mut world = World::new();
        let a = boxed(&mut world, 0.0, 0.0, "a");
        let b = boxed(&mut world, 5.0, 0.0, "b");
        let c = boxed(&mut world, 10.0, 0.0, "c");
        let d = boxed(&mut world, 40.0, 0.0, "d");
        assert!(world.is_colliding(a, b).unwrap());
        assert!(!world.is_colliding(a, c).unwrap());
        assert!(world.is_touching(a, c).unwrap());
        assert!(!world.is_touching(a, d).unwrap());
        assert!(world.has_point(a, vec2(3.0, 3.0)).unwrap());
        assert!(!world.has_point(a, vec2(30.0, 3.0)).unwrap());
    }

    #[test]
    fn test_push_out_separates() {
        let mut world = World::new();
        let a = boxed(&mut world, 0.0, 0.0, "a");
        let b = boxed(&mut world, 8.0, 0.0, "b");
        world.push_out(a, b).unwrap();
        assert_relative_eq!(world.pos(a).x, -2.0);
        assert!(!world.is_colliding(a, b).unwrap());
    }

    #[test]
    fn test_ignore_is_checked_both_ways() {
        let mut world = World::new();
        let a = world
            .spawn(components![
                Pos::new(vec2(0.0, 0.0)),
                RectShape::new(10.0, 10.0),
                Area::new().with_collision_ignore(["ghost"])
            ])
            .unwrap();
        let b = boxed(&mut world, 5.0, 0.0, "ghost");
        let c = boxed(&mut world, 5.0, 0.0, "solid");
        assert!(world.ignores(a, b));
        assert!(world.ignores(b, a));
        assert!(!world.ignores(a, c));
    }

    #[test]
    fn test_collide_fires_on_first_update_only() {
        let mut world = World::new();
        let a = boxed(&mut world, 0.0, 0.0, "a");
        let b = boxed(&mut world, 5.0, 0.0, "b");
        let entered = Rc::new(Cell::new(0));
        let e = Rc::clone(&entered);
        world
            .on_area_collide(a, Some("b"), move |_, _, _| {
                e.set(e.get() + 1);
                Ok(())
            })
            .unwrap();
        let col = Collision::new(a, b, vec2(-5.0, 0.0));
        for _ in 0..3 {
            world.trigger(a, EventKind::CollideUpdate, EventArgs::Collision(col.clone())).unwrap();
        }
        assert_eq!(entered.get(), 1);
        assert_eq!(world.colliding_with(a), vec![b]);
    }
}
