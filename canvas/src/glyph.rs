//! Text shaping and glyph outlines.
//!
//! Text is shaped with `rustybuzz` against the bundled DejaVu Sans face and
//! turned into a single `tiny-skia` path, so it rasterizes at any export
//! multiplier without resampling. Lines are separated by `\n`; each line
//! advances by [`TEXT_LINE_HEIGHT`] × font size.

#[cfg(test)]
#[path = "glyph_test.rs"]
mod glyph_test;

use std::sync::OnceLock;

use rustybuzz::{GlyphBuffer, UnicodeBuffer, ttf_parser};
use tiny_skia::{Path, PathBuilder};
use tracing::{trace, warn};

use crate::consts::TEXT_LINE_HEIGHT;

static FACE_DATA: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// The parsed face, or `None` if the bundled data is unusable.
fn face() -> Option<&'static rustybuzz::Face<'static>> {
    static FACE: OnceLock<Option<rustybuzz::Face<'static>>> = OnceLock::new();
    FACE.get_or_init(|| {
        let face = rustybuzz::Face::from_slice(FACE_DATA, 0);
        if face.is_none() {
            warn!(bytes = FACE_DATA.len(), "bundled font face failed to parse");
        }
        face
    })
    .as_ref()
}

fn shape_line(face: &rustybuzz::Face<'static>, line: &str) -> GlyphBuffer {
    let mut buffer = UnicodeBuffer::new();
    buffer.push_str(line);
    rustybuzz::shape(face, &[], buffer)
}

/// Canvas units per font unit at `font_size`.
fn units_scale(face: &rustybuzz::Face<'static>, font_size: f64) -> f64 {
    let outlines: &ttf_parser::Face<'static> = face.as_ref();
    font_size / f64::from(outlines.units_per_em())
}

/// Shaped size of `content`: widest line advance by line count × line height.
#[must_use]
pub fn measure(content: &str, font_size: f64) -> Option<(f64, f64)> {
    let face = face()?;
    let scale = units_scale(face, font_size);
    let (lines, widest) = content.split('\n').fold((0_u32, 0_i64), |(n, widest), line| {
        let glyphs = shape_line(face, line);
        let advance: i64 = glyphs.glyph_positions().iter().map(|p| i64::from(p.x_advance)).sum();
        (n + 1, widest.max(advance))
    });
    #[allow(clippy::cast_precision_loss)]
    let width = widest as f64 * scale;
    Some((width, f64::from(lines) * font_size * TEXT_LINE_HEIGHT))
}

/// Outline of `content` with its first line's box top-left at
/// (`left`, `top`), in canvas units. `None` when nothing is visible.
#[must_use]
pub fn outline(content: &str, font_size: f64, left: f64, top: f64) -> Option<Path> {
    let face = face()?;
    let outlines: &ttf_parser::Face<'static> = face.as_ref();
    let scale = units_scale(face, font_size);
    let line_height = font_size * TEXT_LINE_HEIGHT;
    // Center the em box vertically inside each line.
    let ascent = f64::from(outlines.ascender()) * scale;
    let descent = f64::from(outlines.descender()) * scale;
    let leading = (line_height - (ascent - descent)) / 2.0;

    let mut sink = PathSink { builder: PathBuilder::new(), scale: to_f32(scale), x: 0.0, y: 0.0 };
    for (row, line) in content.split('\n').enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let baseline = top + row as f64 * line_height + leading + ascent;
        let mut pen = left;
        let glyphs = shape_line(face, line);
        for (info, pos) in glyphs.glyph_infos().iter().zip(glyphs.glyph_positions()) {
            sink.x = to_f32(pen + f64::from(pos.x_offset) * scale);
            sink.y = to_f32(baseline - f64::from(pos.y_offset) * scale);
            match u16::try_from(info.glyph_id) {
                Ok(id) => {
                    if outlines.outline_glyph(ttf_parser::GlyphId(id), &mut sink).is_none() {
                        trace!(glyph = id, "glyph has no outline");
                    }
                }
                Err(_) => trace!(glyph = info.glyph_id, "glyph id out of range"),
            }
            pen += f64::from(pos.x_advance) * scale;
        }
    }
    sink.builder.finish()
}

/// Feeds font-unit outlines (y up) into a canvas-space path (y down).
struct PathSink {
    builder: PathBuilder,
    scale: f32,
    x: f32,
    y: f32,
}

impl PathSink {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.x + x * self.scale, self.y - y * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for PathSink {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_f32(v: f64) -> f32 {
    v as f32
}
