//! Export pipeline: scene state to bitmap, PNG bytes, and an A4 PDF.
//!
//! Export is a pure read of [`SceneState`]. The bitmap is rendered through
//! [`crate::render::draw_scene`] at `multiplier` × the canvas dimensions;
//! the PNG artifact encodes that bitmap directly, and the PDF artifact
//! embeds it on a single A4 page at a fixed margin from the top-left corner.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use serde::{Deserialize, Serialize};
use tiny_skia::Pixmap;
use tracing::info;

use crate::consts::{
    A4_LONG_MM, A4_SHORT_MM, DOCUMENT_FILENAME, LANDSCAPE_CONTENT_WIDTH_MM, PAGE_MARGIN_MM, PORTRAIT_CONTENT_WIDTH_MM,
    PT_PER_MM, RASTER_FILENAME,
};
use crate::render::{self, Overlay};
use crate::scene::SceneState;
use crate::surface::{SurfaceError, pixel_size};
use crate::viewport::Viewport;

/// Name of the page's image resource.
const PAGE_IMAGE: &str = "Im0";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("export multiplier {0} is not a positive number")]
    InvalidMultiplier(f64),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("PNG encoding failed: {0}")]
    Png(#[from] image::ImageError),
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("export write failed: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================
// Artifacts
// =============================================================

/// A file ready for the host to save.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifact")
            .field("filename", &self.filename)
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Where the host puts saved artifacts (a download, a directory, memory).
pub trait ArtifactSink {
    /// Persist one artifact.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the artifact could not be stored.
    fn save(&mut self, artifact: &Artifact) -> std::io::Result<()>;
}

/// Collects artifacts in memory.
impl ArtifactSink for Vec<Artifact> {
    fn save(&mut self, artifact: &Artifact) -> std::io::Result<()> {
        self.push(artifact.clone());
        Ok(())
    }
}

// =============================================================
// Bitmap
// =============================================================

/// Straight (non-premultiplied) RGBA8 pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Rasterize every object in paint order over an opaque background at
/// `multiplier` × the canvas dimensions.
///
/// # Errors
///
/// Returns an error for a non-positive multiplier or an unallocatable size.
pub fn to_bitmap(state: &SceneState, multiplier: f64) -> Result<Bitmap, ExportError> {
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return Err(ExportError::InvalidMultiplier(multiplier));
    }
    let (width, height) = pixel_size(Viewport::new(state.width * multiplier, state.height * multiplier));
    let mut pixmap = Pixmap::new(width, height).ok_or(SurfaceError::InvalidSize { width, height })?;
    render::draw_scene(&mut pixmap, state, multiplier, &Overlay::default())?;
    let rgba = pixmap
        .pixels()
        .iter()
        .flat_map(|px| {
            let c = px.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    Ok(Bitmap { width, height, rgba })
}

/// Encode a bitmap as PNG.
///
/// # Errors
///
/// Returns [`ExportError::Png`] if encoding fails.
pub fn encode_png(bitmap: &Bitmap) -> Result<Vec<u8>, ExportError> {
    let (width, height) = (bitmap.width, bitmap.height);
    let img = RgbaImage::from_raw(width, height, bitmap.rgba.clone())
        .ok_or(SurfaceError::InvalidSize { width, height })?;
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

// =============================================================
// Page layout
// =============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Placement of the canvas image on an A4 page, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub orientation: Orientation,
    pub page_width: f64,
    pub page_height: f64,
    pub content_width: f64,
    pub content_height: f64,
    /// Offset of the image from the left and top page edges.
    pub margin: f64,
}

impl PageLayout {
    /// Landscape when the canvas is wider than tall, portrait otherwise. The
    /// image keeps the canvas aspect ratio at the orientation's fixed width.
    #[must_use]
    pub fn for_canvas(width: f64, height: f64) -> Self {
        let (orientation, page_width, page_height, content_width) = if width > height {
            (Orientation::Landscape, A4_LONG_MM, A4_SHORT_MM, LANDSCAPE_CONTENT_WIDTH_MM)
        } else {
            (Orientation::Portrait, A4_SHORT_MM, A4_LONG_MM, PORTRAIT_CONTENT_WIDTH_MM)
        };
        Self {
            orientation,
            page_width,
            page_height,
            content_width,
            content_height: content_width * (height / width),
            margin: PAGE_MARGIN_MM,
        }
    }
}

/// Build a one-page PDF with `bitmap` placed per `layout`.
///
/// # Errors
///
/// Returns [`ExportError::Pdf`] if the page content cannot be encoded and
/// [`ExportError::Io`] if serializing the document fails.
#[allow(clippy::cast_possible_truncation)]
pub fn encode_pdf(bitmap: &Bitmap, layout: &PageLayout) -> Result<Vec<u8>, ExportError> {
    let pt = |mm: f64| Object::Real((mm * PT_PER_MM) as f32);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    // PDF images carry no alpha here; the bitmap background is opaque.
    let rgb: Vec<u8> = bitmap.rgba.chunks_exact(4).flat_map(|px| [px[0], px[1], px[2]]).collect();
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(bitmap.width),
            "Height" => i64::from(bitmap.height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb,
    ));

    // PDF user space has its origin at the bottom-left.
    let bottom = layout.page_height - layout.margin - layout.content_height;
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![pt(layout.content_width), 0.into(), 0.into(), pt(layout.content_height), pt(layout.margin), pt(bottom)],
            ),
            Operation::new("Do", vec![Object::Name(PAGE_IMAGE.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { PAGE_IMAGE => image_id },
        },
        "MediaBox" => vec![0.into(), 0.into(), pt(layout.page_width), pt(layout.page_height)],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

// =============================================================
// Export entry points
// =============================================================

/// Render the scene and encode it as `certificate.png`.
///
/// # Errors
///
/// Propagates rasterization and PNG encoding failures.
pub fn export_raster(state: &SceneState, multiplier: f64) -> Result<Artifact, ExportError> {
    let bitmap = to_bitmap(state, multiplier)?;
    let bytes = encode_png(&bitmap)?;
    info!(width = bitmap.width, height = bitmap.height, bytes = bytes.len(), "raster export ready");
    Ok(Artifact { filename: RASTER_FILENAME.to_string(), mime: "image/png", bytes })
}

/// Render the scene and embed it in `certificate.pdf`.
///
/// # Errors
///
/// Propagates rasterization and PDF encoding failures.
pub fn export_document(state: &SceneState, multiplier: f64) -> Result<Artifact, ExportError> {
    let bitmap = to_bitmap(state, multiplier)?;
    let layout = PageLayout::for_canvas(state.width, state.height);
    let bytes = encode_pdf(&bitmap, &layout)?;
    info!(orientation = ?layout.orientation, bytes = bytes.len(), "document export ready");
    Ok(Artifact { filename: DOCUMENT_FILENAME.to_string(), mime: "application/pdf", bytes })
}
