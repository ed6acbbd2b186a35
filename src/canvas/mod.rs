//! The canvas geometry engine: pan, zoom and grid state, plus the
//! screen-to-canvas transform. Pointer sessions (drag and resize) live in
//! [`drag`]. The engine is pure geometry and knows nothing about node
//! semantics.

use crate::graph::Rect;
use serde::{Deserialize, Serialize};

mod drag;

pub use drag::{DragSession, NudgeStep, ResizeHandle, ResizeSession, nudge};

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;
pub const ZOOM_STEP: f64 = 0.1;
pub const DEFAULT_GRID: i32 = 16;

pub const MIN_WIDTH: i32 = 120;
pub const MAX_WIDTH: i32 = 2000;
pub const MIN_HEIGHT: i32 = 80;
pub const MAX_HEIGHT: i32 = 2000;

/// A point in either screen or canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Viewport state: pan offset, zoom factor and grid size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub pan: Point,
    pub zoom: f64,
    pub grid: i32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            pan: Point::default(),
            zoom: 1.0,
            grid: DEFAULT_GRID,
        }
    }
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a screen position into canvas space:
    /// `(screen - origin - pan) / zoom`.
    pub fn to_canvas(&self, screen: Point, origin: Point) -> Point {
        Point {
            x: (screen.x - origin.x - self.pan.x) / self.zoom,
            y: (screen.y - origin.y - self.pan.y) / self.zoom,
        }
    }

    /// Sets the zoom factor, rounded to the 0.1 step and clamped to
    /// [`MIN_ZOOM`]..=[`MAX_ZOOM`].
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = ((zoom * 10.0).round() / 10.0).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_STEP);
    }

    /// Pans the viewport by a screen-space delta. Node positions are not
    /// affected.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan.x += dx;
        self.pan.y += dy;
    }

    /// Rounds a canvas coordinate to the nearest grid multiple.
    pub fn snap(&self, value: i32) -> i32 {
        let grid = f64::from(self.grid);
        ((f64::from(value) / grid).round() * grid) as i32
    }

    /// Frames the given rects in a viewport of the given screen size,
    /// adjusting zoom (within its clamp) and pan.
    pub fn zoom_to_fit(&mut self, rects: &[Rect], viewport_width: f64, viewport_height: f64) {
        let Some(first) = rects.first() else {
            self.set_zoom(1.0);
            self.pan = Point::default();
            return;
        };

        let mut min_x = first.x;
        let mut min_y = first.y;
        let mut max_x = first.right();
        let mut max_y = first.bottom();
        for rect in &rects[1..] {
            min_x = min_x.min(rect.x);
            min_y = min_y.min(rect.y);
            max_x = max_x.max(rect.right());
            max_y = max_y.max(rect.bottom());
        }

        let padding = 50.0;
        let content_width = f64::from(max_x - min_x) + padding * 2.0;
        let content_height = f64::from(max_y - min_y) + padding * 2.0;
        let fit = (viewport_width / content_width).min(viewport_height / content_height);
        self.set_zoom(fit);
        self.pan = Point {
            x: -(f64::from(min_x) - padding) * self.zoom,
            y: -(f64::from(min_y) - padding) * self.zoom,
        };
    }
}
