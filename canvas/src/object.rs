//! Scene objects: colors, styles, the tagged object variant, and sparse patches.
//!
//! This module defines what can live on the canvas (`SceneObject`,
//! `ObjectKind`), how it is painted (`Style`, `Color`, `Compositing`), decoded
//! image payloads (`ImageData`), and a sparse-update type for edits made after
//! creation (`ObjectPatch`).
//!
//! Every type here is `Serialize + Deserialize` so a full scene can be captured
//! into a snapshot and restored without loss. Image pixels are carried as
//! base64 in the serialized form.

#[cfg(test)]
#[path = "object_test.rs"]
mod object_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::viewport::Point;

/// Unique identifier for a scene object.
pub type ObjectId = Uuid;

// =============================================================
// Color
// =============================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("invalid color {0:?}: expected #rgb, #rrggbb or #rrggbbaa")]
    Invalid(String),
}

/// An 8-bit RGBA color. Serialized as a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(0xff, 0xff, 0xff);

    /// An opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    ///
    /// # Errors
    ///
    /// Returns [`ColorError::Invalid`] for anything else.
    pub fn parse_hex(raw: &str) -> Result<Self, ColorError> {
        let invalid = || ColorError::Invalid(raw.to_string());
        let hex = raw.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        match hex.len() {
            3 => {
                let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).map(|n| n * 17).map_err(|_| invalid());
                Ok(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Ok(Self::rgb(pair(0)?, pair(2)?, pair(4)?)),
            8 => Ok(Self::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
            _ => Err(invalid()),
        }
    }

    /// `#rrggbb` for opaque colors, `#rrggbbaa` otherwise.
    #[must_use]
    pub fn to_hex(&self) -> String {
        if self.a == 0xff {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================
// Style
// =============================================================

/// How a stroke is composited onto what is already painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compositing {
    /// Paint over existing pixels (source-over).
    #[default]
    Normal,
    /// Remove existing object pixels (destination-out), revealing the background.
    Subtractive,
}

/// Fill and stroke paint for an object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
}

impl Style {
    /// Solid fill, no outline.
    #[must_use]
    pub fn filled(fill: Color) -> Self {
        Self { fill: Some(fill), stroke: None, stroke_width: 0.0 }
    }

    /// Outline only.
    #[must_use]
    pub fn stroked(stroke: Color, width: f64) -> Self {
        Self { fill: None, stroke: Some(stroke), stroke_width: width }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::filled(Color::BLACK)
    }
}

// =============================================================
// Images
// =============================================================

#[derive(Debug, thiserror::Error)]
pub enum ImageDataError {
    #[error("unsupported image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has no pixels")]
    Empty,
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// A decoded bitmap in straight (non-premultiplied) RGBA8.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    #[serde(with = "base64_bytes")]
    rgba: Vec<u8>,
}

impl ImageData {
    /// Wrap a raw RGBA buffer, checking its length against the dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error for zero-sized images or mismatched buffers.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, ImageDataError> {
        if width == 0 || height == 0 {
            return Err(ImageDataError::Empty);
        }
        let expected = (width as usize) * (height as usize) * 4;
        if rgba.len() != expected {
            return Err(ImageDataError::BufferSize { expected, actual: rgba.len() });
        }
        Ok(Self { width, height, rgba })
    }

    /// Decode an encoded image file (PNG, JPEG, GIF, BMP, WebP).
    ///
    /// # Errors
    ///
    /// Returns [`ImageDataError::Decode`] when the bytes are not a supported image.
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageDataError> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = decoded.dimensions();
        Self::from_rgba(width, height, decoded.into_raw())
    }

    #[must_use]
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Buffer length matches the dimensions; deserialized data may not.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.width > 0 && self.height > 0 && self.rgba.len() == (self.width as usize) * (self.height as usize) * 4
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        STANDARD.decode(raw).map_err(serde::de::Error::custom)
    }
}

// =============================================================
// Scene objects
// =============================================================

/// What an object is, with the data only that variant carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    /// Axis-aligned rectangle filling the bounding box.
    Rectangle,
    /// Circle (ellipse) inscribed in the bounding box.
    Circle,
    /// Isosceles triangle: apex at top-center, base along the bottom edge.
    Triangle,
    /// Single- or multi-line text anchored at the bounding box.
    Text { content: String, font_size: f64 },
    /// Raster image scaled to the bounding box.
    Image { image: ImageData },
    /// Freehand stroke through absolute canvas points.
    Path { points: Vec<Point>, compositing: Compositing },
}

impl ObjectKind {
    /// Short lowercase name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Triangle => "triangle",
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Path { .. } => "path",
        }
    }
}

/// A drawable object owned by the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Stable identity; survives snapshots.
    pub id: ObjectId,
    /// Left edge of the bounding box.
    pub x: f64,
    /// Top edge of the bounding box.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub style: Style,
    /// Whether pointer hit-testing may select this object.
    pub selectable: bool,
    pub kind: ObjectKind,
}

impl SceneObject {
    /// Create a selectable object with a fresh id.
    #[must_use]
    pub fn new(kind: ObjectKind, x: f64, y: f64, width: f64, height: f64, style: Style) -> Self {
        Self { id: Uuid::new_v4(), x, y, width, height, style, selectable: true, kind }
    }

    /// Center of the bounding box.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether `pt` lies inside the bounding box grown by `slop` on every side.
    #[must_use]
    pub fn bounds_contain(&self, pt: Point, slop: f64) -> bool {
        pt.x >= self.x - slop
            && pt.x <= self.x + self.width + slop
            && pt.y >= self.y - slop
            && pt.y <= self.y + self.height + slop
    }

    /// Move the object, carrying path points along.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        if let ObjectKind::Path { points, .. } = &mut self.kind {
            for p in points {
                p.x += dx;
                p.y += dy;
            }
        }
    }

    /// All geometry is finite and the bounding box is non-negative.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let geometry = [self.x, self.y, self.width, self.height, self.style.stroke_width];
        if geometry.iter().any(|v| !v.is_finite()) || self.width < 0.0 || self.height < 0.0 {
            return false;
        }
        match &self.kind {
            ObjectKind::Text { font_size, .. } => font_size.is_finite() && *font_size > 0.0,
            ObjectKind::Path { points, .. } => !points.is_empty() && points.iter().all(|p| p.is_finite()),
            ObjectKind::Image { image } => image.is_consistent(),
            ObjectKind::Rectangle | ObjectKind::Circle | ObjectKind::Triangle => true,
        }
    }
}

// =============================================================
// Patches
// =============================================================

/// Sparse update for a scene object. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    /// Replacement content; only valid for text objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ObjectPatch {
    /// No field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to `obj`. Returns false, leaving `obj` untouched, when a value is
    /// non-finite or negative where a size is expected, or when text is
    /// patched onto a non-text object.
    pub fn apply(&self, obj: &mut SceneObject) -> bool {
        let numbers = [self.x, self.y, self.width, self.height, self.stroke_width];
        if numbers.iter().flatten().any(|v| !v.is_finite()) {
            return false;
        }
        let sizes = [self.width, self.height, self.stroke_width];
        if sizes.iter().flatten().any(|v| *v < 0.0) {
            return false;
        }
        if self.text.is_some() && !matches!(obj.kind, ObjectKind::Text { .. }) {
            return false;
        }

        let dx = self.x.map_or(0.0, |x| x - obj.x);
        let dy = self.y.map_or(0.0, |y| y - obj.y);
        obj.translate(dx, dy);

        if self.width.is_some() || self.height.is_some() {
            let new_w = self.width.unwrap_or(obj.width);
            let new_h = self.height.unwrap_or(obj.height);
            if let ObjectKind::Path { points, .. } = &mut obj.kind {
                let sx = if obj.width > 0.0 { new_w / obj.width } else { 1.0 };
                let sy = if obj.height > 0.0 { new_h / obj.height } else { 1.0 };
                for p in points {
                    p.x = obj.x + (p.x - obj.x) * sx;
                    p.y = obj.y + (p.y - obj.y) * sy;
                }
            }
            obj.width = new_w;
            obj.height = new_h;
        }

        if let Some(fill) = self.fill {
            obj.style.fill = Some(fill);
        }
        if let Some(stroke) = self.stroke {
            obj.style.stroke = Some(stroke);
        }
        if let Some(w) = self.stroke_width {
            obj.style.stroke_width = w;
        }
        if let (Some(text), ObjectKind::Text { content, .. }) = (&self.text, &mut obj.kind) {
            content.clone_from(text);
        }
        true
    }
}
