//! The drawing surface: one live pixel buffer per editing session.
//!
//! A `Surface` is acquired when the host reports its container ready and is
//! released when dropped. Each acquisition gets a new generation number so
//! logs can tell successive surfaces apart after a reinitialize.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use tiny_skia::Pixmap;
use tracing::{debug, info};

use crate::viewport::Viewport;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("cannot allocate a {width}x{height} surface")]
    InvalidSize { width: u32, height: u32 },
}

/// Pixel dimensions for a viewport, rounded up to whole pixels.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn pixel_size(viewport: Viewport) -> (u32, u32) {
    let edge = |v: f64| if v.is_finite() && v >= 1.0 { v.ceil().min(f64::from(u32::MAX)) as u32 } else { 1 };
    (edge(viewport.width), edge(viewport.height))
}

/// Owned pixel buffer the live scene is rendered into.
#[derive(Debug)]
pub struct Surface {
    generation: u64,
    pixmap: Pixmap,
}

impl Surface {
    /// Allocate a transparent surface.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::InvalidSize`] for zero or oversized dimensions.
    pub fn acquire(generation: u64, width: u32, height: u32) -> Result<Self, SurfaceError> {
        let pixmap = Pixmap::new(width, height).ok_or(SurfaceError::InvalidSize { width, height })?;
        info!(generation, width, height, "surface acquired");
        Ok(Self { generation, pixmap })
    }

    /// Reallocate the buffer at a new size. Contents are discarded; the next
    /// render repaints them. The old buffer is kept if allocation fails.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::InvalidSize`] for zero or oversized dimensions.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        if width == self.pixmap.width() && height == self.pixmap.height() {
            return Ok(());
        }
        self.pixmap = Pixmap::new(width, height).ok_or(SurfaceError::InvalidSize { width, height })?;
        debug!(generation = self.generation, width, height, "surface resized");
        Ok(())
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Premultiplied RGBA8 pixels, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        info!(generation = self.generation, "surface released");
    }
}
