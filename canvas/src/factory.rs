//! Object factory: pure builders for scene objects with canonical defaults.
//!
//! Nothing here touches the scene. The engine calls a builder, hands the
//! result to [`crate::scene::Scene::add`], and commits once.

#[cfg(test)]
#[path = "factory_test.rs"]
mod factory_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    CIRCLE_FILL, CIRCLE_LEFT, CIRCLE_RADIUS, CIRCLE_TOP, DEFAULT_FONT_SIZE, IMAGE_MAX_FRACTION, RECT_FILL, RECT_HEIGHT,
    RECT_LEFT, RECT_TOP, RECT_WIDTH, TEXT_ADVANCE_RATIO, TEXT_LINE_HEIGHT, TRIANGLE_FILL, TRIANGLE_LEFT, TRIANGLE_SIZE,
    TRIANGLE_TOP,
};
use crate::glyph;
use crate::object::{Color, ImageData, ObjectKind, SceneObject, Style};
use crate::tool::Brush;
use crate::viewport::{Point, Viewport};

/// The basic shapes the toolbar can insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Triangle,
}

/// Placement of a new shape: top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Where a shape lands when the caller doesn't say.
#[must_use]
pub fn default_geometry(kind: ShapeKind) -> Geometry {
    match kind {
        ShapeKind::Rectangle => Geometry::new(RECT_LEFT, RECT_TOP, RECT_WIDTH, RECT_HEIGHT),
        ShapeKind::Circle => Geometry::new(CIRCLE_LEFT, CIRCLE_TOP, CIRCLE_RADIUS * 2.0, CIRCLE_RADIUS * 2.0),
        ShapeKind::Triangle => Geometry::new(TRIANGLE_LEFT, TRIANGLE_TOP, TRIANGLE_SIZE, TRIANGLE_SIZE),
    }
}

fn default_fill(kind: ShapeKind) -> Color {
    match kind {
        ShapeKind::Rectangle => RECT_FILL,
        ShapeKind::Circle => CIRCLE_FILL,
        ShapeKind::Triangle => TRIANGLE_FILL,
    }
}

/// Build a shape with its canonical fill, at `geometry` or the default placement.
#[must_use]
pub fn shape(kind: ShapeKind, geometry: Option<Geometry>) -> SceneObject {
    let g = geometry.unwrap_or_else(|| default_geometry(kind));
    let object_kind = match kind {
        ShapeKind::Rectangle => ObjectKind::Rectangle,
        ShapeKind::Circle => ObjectKind::Circle,
        ShapeKind::Triangle => ObjectKind::Triangle,
    };
    SceneObject::new(object_kind, g.x, g.y, g.width, g.height, Style::filled(default_fill(kind)))
}

/// Box for `content` at `font_size`: widest shaped line by line count ×
/// line height. Falls back to an average-advance estimate without a face.
#[must_use]
pub fn text_bounds(content: &str, font_size: f64) -> (f64, f64) {
    if let Some(size) = glyph::measure(content, font_size) {
        return size;
    }
    let lines = content.split('\n');
    let (count, widest) = lines.fold((0_u32, 0_usize), |(n, w), line| (n + 1, w.max(line.chars().count())));
    #[allow(clippy::cast_precision_loss)]
    let width = widest as f64 * font_size * TEXT_ADVANCE_RATIO;
    let height = f64::from(count) * font_size * TEXT_LINE_HEIGHT;
    (width, height)
}

/// Black text at the default font size, centered on the canvas midpoint.
#[must_use]
pub fn text(content: &str, canvas: Viewport) -> SceneObject {
    let (width, height) = text_bounds(content, DEFAULT_FONT_SIZE);
    let c = canvas.center();
    SceneObject::new(
        ObjectKind::Text { content: content.to_string(), font_size: DEFAULT_FONT_SIZE },
        c.x - width / 2.0,
        c.y - height / 2.0,
        width,
        height,
        Style::filled(Color::BLACK),
    )
}

/// Displayed size for a `width` × `height` image on a canvas.
///
/// The longer side is limited to half the shorter canvas edge; landscape
/// images are limited by width, everything else by height. Aspect ratio is
/// preserved and images that already fit are left alone.
#[must_use]
pub fn fit_image(width: f64, height: f64, canvas_width: f64, canvas_height: f64) -> (f64, f64) {
    let max = IMAGE_MAX_FRACTION * canvas_width.min(canvas_height);
    if width > height && width > max {
        (max, height * max / width)
    } else if height > max {
        (width * max / height, max)
    } else {
        (width, height)
    }
}

/// An image scaled by [`fit_image`] and centered on the canvas midpoint.
#[must_use]
pub fn image(image: ImageData, canvas: Viewport) -> SceneObject {
    let (width, height) = fit_image(f64::from(image.width), f64::from(image.height), canvas.width, canvas.height);
    let c = canvas.center();
    SceneObject::new(
        ObjectKind::Image { image },
        c.x - width / 2.0,
        c.y - height / 2.0,
        width,
        height,
        Style { fill: None, stroke: None, stroke_width: 0.0 },
    )
}

/// A freehand stroke through `points`, painted with `brush`.
///
/// The bounding box covers the points grown by half the brush width. Returns
/// `None` when there are no finite points to draw.
#[must_use]
pub fn stroke(points: Vec<Point>, brush: Brush) -> Option<SceneObject> {
    let points: Vec<Point> = points.into_iter().filter(|p| p.is_finite()).collect();
    let first = points.first()?;
    let (mut min, mut max) = (*first, *first);
    for p in &points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    let half = brush.width / 2.0;
    Some(SceneObject::new(
        ObjectKind::Path { points, compositing: brush.compositing },
        min.x - half,
        min.y - half,
        max.x - min.x + brush.width,
        max.y - min.y + brush.width,
        Style::stroked(brush.color, brush.width),
    ))
}
