#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::HIT_SLOP_PX;
use crate::object::{ObjectId, ObjectKind, SceneObject};
use crate::viewport::Point;

/// Topmost selectable object under `pt`, searching in reverse paint order.
#[must_use]
pub fn hit_test(pt: Point, objects: &[SceneObject]) -> Option<ObjectId> {
    if !pt.is_finite() {
        return None;
    }
    objects
        .iter()
        .rev()
        .filter(|obj| obj.selectable)
        .find(|obj| contains(obj, pt))
        .map(|obj| obj.id)
}

/// Whether `pt` falls on the painted area of `obj`.
#[must_use]
pub fn contains(obj: &SceneObject, pt: Point) -> bool {
    match &obj.kind {
        ObjectKind::Rectangle | ObjectKind::Text { .. } | ObjectKind::Image { .. } => obj.bounds_contain(pt, 0.0),
        ObjectKind::Circle => in_ellipse(obj, pt),
        ObjectKind::Triangle => in_triangle(obj, pt),
        ObjectKind::Path { points, .. } => near_polyline(points, pt, obj.style.stroke_width / 2.0 + HIT_SLOP_PX),
    }
}

fn in_ellipse(obj: &SceneObject, pt: Point) -> bool {
    let rx = obj.width / 2.0;
    let ry = obj.height / 2.0;
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    let c = obj.center();
    let nx = (pt.x - c.x) / rx;
    let ny = (pt.y - c.y) / ry;
    nx * nx + ny * ny <= 1.0
}

fn in_triangle(obj: &SceneObject, pt: Point) -> bool {
    let a = Point::new(obj.x + obj.width / 2.0, obj.y);
    let b = Point::new(obj.x + obj.width, obj.y + obj.height);
    let c = Point::new(obj.x, obj.y + obj.height);

    let d1 = edge_sign(pt, a, b);
    let d2 = edge_sign(pt, b, c);
    let d3 = edge_sign(pt, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

fn edge_sign(p: Point, a: Point, b: Point) -> f64 {
    (p.x - b.x) * (a.y - b.y) - (a.x - b.x) * (p.y - b.y)
}

fn near_polyline(points: &[Point], pt: Point, tolerance: f64) -> bool {
    match points {
        [] => false,
        [only] => only.distance_to(pt) <= tolerance,
        _ => points
            .windows(2)
            .any(|seg| distance_to_segment(pt, seg[0], seg[1]) <= tolerance),
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(Point::new(a.x + t * dx, a.y + t * dy))
}
