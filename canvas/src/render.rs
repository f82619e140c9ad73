//! Rendering: rasterizes scene state into a `tiny-skia` pixmap.
//!
//! This module receives read-only views of scene state and produces pixels;
//! it never mutates the scene. Painting happens in three layers:
//!
//! 1. the opaque background color,
//! 2. the object layer, drawn in sequence order onto a transparent pixmap so
//!    subtractive strokes can punch holes in earlier objects (destination-out),
//! 3. overlay chrome for the live surface: the in-progress stroke and the
//!    selection outline.
//!
//! Text is filled from glyph outlines (see [`crate::glyph`]).

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use tiny_skia::{
    BlendMode, FilterQuality, IntSize, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    StrokeDash, Transform,
};
use tracing::trace;

use crate::glyph;
use crate::object::{Color, Compositing, ImageData, ObjectKind, SceneObject};
use crate::scene::SceneState;
use crate::surface::SurfaceError;
use crate::tool::Brush;
use crate::viewport::Point;

/// Selection outline color.
const SELECTION_COLOR: Color = Color::rgb(0x21, 0x96, 0xf3);

/// Selection dash segment length in canvas pixels.
const SELECTION_DASH_PX: f32 = 4.0;

/// Transient chrome painted over the objects on the live surface only.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overlay<'a> {
    /// Object to outline as the active selection.
    pub selected: Option<&'a SceneObject>,
    /// Stroke being drawn, not yet part of the scene.
    pub stroke: Option<(&'a [Point], Brush)>,
}

/// Paint `state` into `pixmap` at `scale` pixels per canvas unit.
///
/// # Errors
///
/// Returns [`SurfaceError::InvalidSize`] if the object layer cannot be allocated.
pub fn draw_scene(pixmap: &mut Pixmap, state: &SceneState, scale: f64, overlay: &Overlay<'_>) -> Result<(), SurfaceError> {
    let transform = Transform::from_scale(to_f32(scale), to_f32(scale));

    // Layer 1: background.
    pixmap.fill(sk_color(state.background));

    // Layer 2: objects in paint order.
    let (width, height) = (pixmap.width(), pixmap.height());
    let mut layer = Pixmap::new(width, height).ok_or(SurfaceError::InvalidSize { width, height })?;
    for obj in &state.objects {
        draw_object(&mut layer, obj, transform);
    }
    if let Some((points, brush)) = overlay.stroke {
        draw_stroke(&mut layer, points, brush.color, brush.width, brush.compositing, transform);
    }
    pixmap.draw_pixmap(0, 0, layer.as_ref(), &PixmapPaint::default(), Transform::identity(), None);

    // Layer 3: selection chrome.
    if let Some(obj) = overlay.selected {
        draw_selection(pixmap, obj, transform);
    }
    Ok(())
}

// =============================================================
// Object dispatch
// =============================================================

fn draw_object(layer: &mut Pixmap, obj: &SceneObject, transform: Transform) {
    match &obj.kind {
        ObjectKind::Rectangle => {
            if let Some(path) = bounds_rect(obj).map(PathBuilder::from_rect) {
                fill_and_stroke(layer, &path, obj, transform);
            }
        }
        ObjectKind::Circle => {
            if let Some(path) = bounds_rect(obj).and_then(PathBuilder::from_oval) {
                fill_and_stroke(layer, &path, obj, transform);
            }
        }
        ObjectKind::Triangle => {
            if let Some(path) = triangle_path(obj) {
                fill_and_stroke(layer, &path, obj, transform);
            }
        }
        ObjectKind::Text { content, font_size } => draw_text(layer, obj, content, *font_size, transform),
        ObjectKind::Image { image } => draw_image(layer, obj, image, transform),
        ObjectKind::Path { points, compositing } => {
            let color = obj.style.stroke.unwrap_or(Color::BLACK);
            draw_stroke(layer, points, color, obj.style.stroke_width, *compositing, transform);
        }
    }
}

fn bounds_rect(obj: &SceneObject) -> Option<Rect> {
    Rect::from_xywh(to_f32(obj.x), to_f32(obj.y), to_f32(obj.width), to_f32(obj.height))
}

fn triangle_path(obj: &SceneObject) -> Option<Path> {
    let (x, y, w, h) = (to_f32(obj.x), to_f32(obj.y), to_f32(obj.width), to_f32(obj.height));
    let mut pb = PathBuilder::new();
    pb.move_to(x + w / 2.0, y);
    pb.line_to(x + w, y + h);
    pb.line_to(x, y + h);
    pb.close();
    pb.finish()
}

fn fill_and_stroke(layer: &mut Pixmap, path: &Path, obj: &SceneObject, transform: Transform) {
    if let Some(fill) = obj.style.fill {
        let paint = solid(fill, Compositing::Normal);
        layer.fill_path(path, &paint, tiny_skia::FillRule::Winding, transform, None);
    }
    if let Some(outline) = obj.style.stroke.filter(|_| obj.style.stroke_width > 0.0) {
        let stroke = Stroke { width: to_f32(obj.style.stroke_width), ..Default::default() };
        layer.stroke_path(path, &solid(outline, Compositing::Normal), &stroke, transform, None);
    }
}

// =============================================================
// Text
// =============================================================

fn draw_text(layer: &mut Pixmap, obj: &SceneObject, content: &str, font_size: f64, transform: Transform) {
    let Some(path) = glyph::outline(content, font_size, obj.x, obj.y) else {
        trace!(id = %obj.id, "text has no visible glyphs");
        return;
    };
    let fill = obj.style.fill.unwrap_or(Color::BLACK);
    layer.fill_path(&path, &solid(fill, Compositing::Normal), tiny_skia::FillRule::Winding, transform, None);
}

// =============================================================
// Strokes
// =============================================================

fn draw_stroke(layer: &mut Pixmap, points: &[Point], color: Color, width: f64, compositing: Compositing, transform: Transform) {
    let paint = solid(color, compositing);
    match points {
        [] => {}
        // A click without movement leaves a round dot.
        [p] => {
            if let Some(dot) = PathBuilder::from_circle(to_f32(p.x), to_f32(p.y), to_f32(width / 2.0)) {
                layer.fill_path(&dot, &paint, tiny_skia::FillRule::Winding, transform, None);
            }
        }
        [first, rest @ ..] => {
            let mut pb = PathBuilder::new();
            pb.move_to(to_f32(first.x), to_f32(first.y));
            for p in rest {
                pb.line_to(to_f32(p.x), to_f32(p.y));
            }
            if let Some(path) = pb.finish() {
                let stroke =
                    Stroke { width: to_f32(width), line_cap: LineCap::Round, line_join: LineJoin::Round, ..Default::default() };
                layer.stroke_path(&path, &paint, &stroke, transform, None);
            }
        }
    }
}

// =============================================================
// Images
// =============================================================

fn draw_image(layer: &mut Pixmap, obj: &SceneObject, image: &ImageData, transform: Transform) {
    let Some(source) = premultiplied_pixmap(image) else {
        trace!(id = %obj.id, "image buffer unusable; skipped");
        return;
    };
    let sx = to_f32(obj.width / f64::from(image.width));
    let sy = to_f32(obj.height / f64::from(image.height));
    let placement = Transform::from_row(sx, 0.0, 0.0, sy, to_f32(obj.x), to_f32(obj.y)).post_concat(transform);
    let paint = PixmapPaint { quality: FilterQuality::Bilinear, ..Default::default() };
    layer.draw_pixmap(0, 0, source.as_ref(), &paint, placement, None);
}

/// Convert straight RGBA into the premultiplied layout `tiny-skia` expects.
fn premultiplied_pixmap(image: &ImageData) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width, image.height)?;
    let mut data = image.rgba().to_vec();
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = premultiply(*c, a);
        }
    }
    Pixmap::from_vec(data, size)
}

#[allow(clippy::cast_possible_truncation)]
fn premultiply(channel: u8, alpha: u16) -> u8 {
    ((u16::from(channel) * alpha + 127) / 255) as u8
}

// =============================================================
// Selection
// =============================================================

fn draw_selection(pixmap: &mut Pixmap, obj: &SceneObject, transform: Transform) {
    let Some(path) = bounds_rect(obj).map(PathBuilder::from_rect) else {
        return;
    };
    let stroke = Stroke {
        width: 1.0,
        dash: StrokeDash::new(vec![SELECTION_DASH_PX, SELECTION_DASH_PX], 0.0),
        ..Default::default()
    };
    pixmap.stroke_path(&path, &solid(SELECTION_COLOR, Compositing::Normal), &stroke, transform, None);
}

// =============================================================
// Helpers
// =============================================================

fn solid(color: Color, compositing: Compositing) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    if compositing == Compositing::Subtractive {
        paint.blend_mode = BlendMode::DestinationOut;
    }
    paint
}

fn sk_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

#[allow(clippy::cast_possible_truncation)]
fn to_f32(v: f64) -> f32 {
    v as f32
}
