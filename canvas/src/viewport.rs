//! Points and viewport sizing.
//!
//! The canvas is sized from its container: the host reports the container
//! width and the window height, and [`Viewport::fit`] derives the drawable
//! area by subtracting the reserved chrome and clamping to the configured
//! maximum. Recomputing a viewport never touches scene content.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

use crate::consts::{CONTAINER_INSET_X, CONTAINER_INSET_Y, MIN_CANVAS_EDGE};

/// A point in canvas space (pixels, origin at the top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite numbers.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Size of the element hosting the canvas, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSize {
    /// Inner width of the wrapping element in CSS pixels.
    pub width: f64,
    /// Height of the window in CSS pixels.
    pub window_height: f64,
}

impl ContainerSize {
    #[must_use]
    pub fn new(width: f64, window_height: f64) -> Self {
        Self { width, window_height }
    }
}

/// Drawable canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Derive the canvas size for a container, bounded by `max_width` × `max_height`.
    ///
    /// Non-finite or undersized inputs collapse to a 1px edge rather than
    /// producing an unusable surface.
    #[must_use]
    pub fn fit(container: ContainerSize, max_width: f64, max_height: f64) -> Self {
        Self {
            width: fit_edge(container.width - CONTAINER_INSET_X, max_width),
            height: fit_edge(container.window_height - CONTAINER_INSET_Y, max_height),
        }
    }

    /// Canvas midpoint.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

fn fit_edge(available: f64, max: f64) -> f64 {
    if !available.is_finite() {
        return MIN_CANVAS_EDGE;
    }
    available.min(max).max(MIN_CANVAS_EDGE)
}
