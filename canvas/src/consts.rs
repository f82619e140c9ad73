//! Shared numeric constants and canonical defaults for the canvas crate.

use crate::object::Color;

// ── Viewport ────────────────────────────────────────────────────

/// Upper bound on the canvas width in pixels.
pub const MAX_CANVAS_WIDTH: f64 = 1200.0;

/// Upper bound on the canvas height in pixels.
pub const MAX_CANVAS_HEIGHT: f64 = 800.0;

/// Horizontal space reserved around the canvas inside its container.
pub const CONTAINER_INSET_X: f64 = 60.0;

/// Vertical space reserved for the toolbar and status line.
pub const CONTAINER_INSET_Y: f64 = 180.0;

/// Smallest canvas edge the viewport will ever report.
pub const MIN_CANVAS_EDGE: f64 = 1.0;

// ── Shapes ──────────────────────────────────────────────────────

pub const RECT_LEFT: f64 = 50.0;
pub const RECT_TOP: f64 = 50.0;
pub const RECT_WIDTH: f64 = 100.0;
pub const RECT_HEIGHT: f64 = 60.0;
pub const RECT_FILL: Color = Color::rgb(0x4c, 0xaf, 0x50);

pub const CIRCLE_LEFT: f64 = 100.0;
pub const CIRCLE_TOP: f64 = 100.0;
pub const CIRCLE_RADIUS: f64 = 50.0;
pub const CIRCLE_FILL: Color = Color::rgb(0xff, 0x57, 0x22);

pub const TRIANGLE_LEFT: f64 = 150.0;
pub const TRIANGLE_TOP: f64 = 150.0;
pub const TRIANGLE_SIZE: f64 = 80.0;
pub const TRIANGLE_FILL: Color = Color::rgb(0x3f, 0x51, 0xb5);

// ── Text ────────────────────────────────────────────────────────

pub const DEFAULT_TEXT: &str = "Editable Text";
pub const DEFAULT_FONT_SIZE: f64 = 24.0;

/// Average glyph advance as a fraction of the font size, used for text bounds.
pub const TEXT_ADVANCE_RATIO: f64 = 0.6;

/// Line height as a multiple of the font size.
pub const TEXT_LINE_HEIGHT: f64 = 1.16;

// ── Images ──────────────────────────────────────────────────────

/// Inserted images are fitted into this fraction of the shorter canvas edge.
pub const IMAGE_MAX_FRACTION: f64 = 0.5;

// ── Brush ───────────────────────────────────────────────────────

pub const DEFAULT_BRUSH_COLOR: Color = Color::BLACK;
pub const DEFAULT_BRUSH_WIDTH: f64 = 2.0;
pub const MIN_BRUSH_WIDTH: f64 = 1.0;
pub const MAX_BRUSH_WIDTH: f64 = 20.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Extra slop in pixels around thin strokes.
pub const HIT_SLOP_PX: f64 = 4.0;

// ── Export ──────────────────────────────────────────────────────

/// Scale factor applied to canvas dimensions for exported bitmaps.
pub const EXPORT_MULTIPLIER: f64 = 2.0;

pub const RASTER_FILENAME: &str = "certificate.png";
pub const DOCUMENT_FILENAME: &str = "certificate.pdf";

/// A4 page edges in millimetres.
pub const A4_SHORT_MM: f64 = 210.0;
pub const A4_LONG_MM: f64 = 297.0;

/// Offset of the embedded image from the top-left page corner.
pub const PAGE_MARGIN_MM: f64 = 10.0;

/// Embedded image width per orientation.
pub const LANDSCAPE_CONTENT_WIDTH_MM: f64 = 277.0;
pub const PORTRAIT_CONTENT_WIDTH_MM: f64 = 190.0;

/// PDF user-space points per millimetre.
pub const PT_PER_MM: f64 = 72.0 / 25.4;
