//! Separating Axis Theorem narrow phase
//!
//! Each edge normal of both polygons is a candidate separating axis. If any
//! axis shows a gap the shapes are disjoint; otherwise the axis with the
//! smallest penetration yields the minimum translation vector (MTV) that
//! pushes the first shape out of the second.

use crate::foundation::math::{edge_normal, Vec2};
use crate::{EngineError, EngineResult};

use super::primitives::Polygon;
use super::shape::Shape;

/// SAT test between two convex polygons.
///
/// Returns `None` when the polygons are disjoint, otherwise the
/// displacement that moves `a` out of `b`. Touching polygons yield a zero
/// vector. Zero-length edges are skipped; if no edge produced an axis the
/// pair is treated as disjoint. Ties keep the earliest axis, visiting the
/// edges of `a` in order, then those of `b`.
pub fn sat(a: &Polygon, b: &Polygon) -> Option<Vec2> {
    let mut overlap = f32::INFINITY;
    let mut result = None;

    for poly in [a, b] {
        for (start, end) in poly.edges() {
            let Some(axis) = edge_normal(start, end) else {
                continue;
            };
            let (min1, max1) = a.project(axis);
            let (min2, max2) = b.project(axis);
            let o = max1.min(max2) - min1.max(min2);
            if o < 0.0 {
                return None;
            }
            if o < overlap.abs() {
                let o1 = max2 - min1;
                let o2 = min2 - max1;
                overlap = if o1.abs() < o2.abs() { o1 } else { o2 };
                result = Some(axis * overlap);
            }
        }
    }

    result
}

/// SAT between two shapes.
///
/// Only rects and polygons take part; circles must be converted to polygons
/// first and lines have no area.
pub fn overlap(a: &Shape, b: &Shape) -> EngineResult<Option<Vec2>> {
    let pa = as_polygon(a)?;
    let pb = as_polygon(b)?;
    Ok(sat(&pa, &pb))
}

fn as_polygon(shape: &Shape) -> EngineResult<Polygon> {
    match shape {
        Shape::Rect(rect) => Ok(rect.to_polygon()),
        Shape::Polygon(poly) => Ok(poly.clone()),
        Shape::Circle(_) => Err(EngineError::InvalidShape(
            "circles must be converted to polygons before SAT".to_string(),
        )),
        Shape::Line(_) => Err(EngineError::InvalidShape("SAT needs a shape with area, got a line".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::vec2;
    use crate::physics::collision::primitives::{Circle, Line, Rect};
    use approx::assert_relative_eq;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Polygon {
        Rect::new(vec2(x, y), w, h).to_polygon()
    }

    #[test]
    fn test_sat_overlapping_rects() {
        // Equal depth on every axis: the first edge of `a` wins
        let mtv = sat(&rect(0.0, 0.0, 10.0, 10.0), &rect(5.0, 5.0, 10.0, 10.0)).unwrap();
        assert_relative_eq!(mtv.x, 0.0);
        assert_relative_eq!(mtv.y, -5.0);
    }

    #[test]
    fn test_sat_tie_prefers_axes_of_first_shape() {
        // 4 units deep along the triangle's vertical edge and along the rect's top edge
        let tri = Polygon::new(vec![vec2(0.0, 0.0), vec2(0.0, 20.0), vec2(-20.0, 10.0)]).unwrap();
        let r = rect(-4.0, 16.0, 20.0, 20.0);

        let mtv = sat(&tri, &r).unwrap();
        assert_relative_eq!(mtv.x, -4.0);
        assert_relative_eq!(mtv.y, 0.0);

        let mtv = sat(&r, &tri).unwrap();
        assert_relative_eq!(mtv.x, 0.0);
        assert_relative_eq!(mtv.y, 4.0);
    }

    #[test]
    fn test_sat_disjoint_rects() {
        assert!(sat(&rect(0.0, 0.0, 10.0, 10.0), &rect(20.0, 0.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn test_sat_picks_lesser_penetration_axis() {
        // 2 units deep along x, 8 along y
        let mtv = sat(&rect(0.0, 0.0, 10.0, 10.0), &rect(8.0, 2.0, 10.0, 10.0)).unwrap();
        assert_relative_eq!(mtv.x, -2.0);
        assert_relative_eq!(mtv.y, 0.0);
    }

    #[test]
    fn test_sat_pushes_first_shape_up_off_platform() {
        let body = rect(0.0, 11.0, 10.0, 10.0);
        let platform = rect(-50.0, 20.0, 100.0, 10.0);
        let mtv = sat(&body, &platform).unwrap();
        assert_relative_eq!(mtv.x, 0.0);
        assert_relative_eq!(mtv.y, -1.0);
    }

    #[test]
    fn test_sat_touching_is_zero() {
        let mtv = sat(&rect(0.0, 0.0, 10.0, 10.0), &rect(10.0, 0.0, 10.0, 10.0)).unwrap();
        assert_relative_eq!(mtv.norm(), 0.0);
    }

    #[test]
    fn test_sat_symmetry() {
        let a = Polygon::new(vec![vec2(0.0, 0.0), vec2(6.0, 1.0), vec2(2.0, 7.0)]).unwrap();
        let b = rect(3.0, 2.0, 9.0, 4.0);
        let ab = sat(&a, &b).unwrap();
        let ba = sat(&b, &a).unwrap();
        assert_relative_eq!(ab.x, -ba.x, epsilon = 1e-5);
        assert_relative_eq!(ab.y, -ba.y, epsilon = 1e-5);

        let far = rect(30.0, 30.0, 1.0, 1.0);
        assert!(sat(&a, &far).is_none());
        assert!(sat(&far, &a).is_none());
    }

    #[test]
    fn test_sat_skips_degenerate_edges() {
        let a = Polygon::new(vec![
            vec2(0.0, 0.0),
            vec2(0.0, 0.0),
            vec2(10.0, 0.0),
            vec2(10.0, 10.0),
            vec2(0.0, 10.0),
        ])
        .unwrap();
        let mtv = sat(&a, &rect(8.0, 2.0, 10.0, 10.0)).unwrap();
        assert_relative_eq!(mtv.x, -2.0);
    }

    #[test]
    fn test_sat_fully_degenerate_polygons_do_not_overlap() {
        let dot = Polygon::new(vec![vec2(1.0, 1.0); 3]).unwrap();
        assert!(sat(&dot, &dot).is_none());
    }

    #[test]
    fn test_overlap_rejects_lines_and_raw_circles() {
        let r = Shape::Rect(Rect::new(Vec2::zeros(), 1.0, 1.0));
        let line = Shape::Line(Line::new(Vec2::zeros(), vec2(1.0, 1.0)));
        let circle = Shape::Circle(Circle::new(Vec2::zeros(), 1.0));
        assert!(matches!(overlap(&r, &line), Err(EngineError::InvalidShape(_))));
        assert!(matches!(overlap(&circle, &r), Err(EngineError::InvalidShape(_))));
        assert!(overlap(&r, &r).unwrap().is_some());
    }
}
