use super::{Canvas, MAX_HEIGHT, MAX_WIDTH, MIN_HEIGHT, MIN_WIDTH, Point};
use crate::graph::Rect;

/// A node drag in progress. Created on pointer-down over a node header with
/// the node's original rect and the canvas-space pointer position; each
/// pointer-move produces a snapped position. Dropping the session ends the
/// drag; no further snapping occurs after release.
#[derive(Debug, Clone)]
pub struct DragSession {
    origin: Rect,
    anchor: Point,
}

impl DragSession {
    pub fn begin(origin: Rect, pointer: Point) -> Self {
        Self { origin, anchor: pointer }
    }

    /// The snapped node position for the current canvas-space pointer.
    pub fn position(&self, canvas: &Canvas, pointer: Point) -> (i32, i32) {
        let dx = (pointer.x - self.anchor.x).round() as i32;
        let dy = (pointer.y - self.anchor.y).round() as i32;
        (
            canvas.snap(self.origin.x + dx),
            canvas.snap(self.origin.y + dy),
        )
    }
}

/// The eight resize handles. East/south handles grow the rect in place;
/// west/north handles move the coordinate as well so the opposite edge
/// stays fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl ResizeHandle {
    fn west(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }
    fn east(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }
    fn north(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }
    fn south(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }
}

/// A node resize in progress, anchored on one of the eight handles.
#[derive(Debug, Clone)]
pub struct ResizeSession {
    origin: Rect,
    anchor: Point,
    handle: ResizeHandle,
}

impl ResizeSession {
    pub fn begin(origin: Rect, pointer: Point, handle: ResizeHandle) -> Self {
        Self {
            origin,
            anchor: pointer,
            handle,
        }
    }

    /// The resized rect for the current canvas-space pointer. Width and
    /// height are clamped to their bounds and then snapped to the grid;
    /// west/north handles keep the opposite edge fixed.
    pub fn rect(&self, canvas: &Canvas, pointer: Point) -> Rect {
        let dx = (pointer.x - self.anchor.x).round() as i32;
        let dy = (pointer.y - self.anchor.y).round() as i32;
        let mut rect = self.origin;

        if self.handle.east() {
            rect.width = self.origin.width + dx;
        } else if self.handle.west() {
            rect.width = self.origin.width - dx;
        }
        if self.handle.south() {
            rect.height = self.origin.height + dy;
        } else if self.handle.north() {
            rect.height = self.origin.height - dy;
        }

        rect.width = canvas.snap(rect.width.clamp(MIN_WIDTH, MAX_WIDTH));
        rect.height = canvas.snap(rect.height.clamp(MIN_HEIGHT, MAX_HEIGHT));

        if self.handle.west() {
            rect.x = self.origin.right() - rect.width;
        }
        if self.handle.north() {
            rect.y = self.origin.bottom() - rect.height;
        }
        rect
    }
}

/// Keyboard nudge step: one canvas unit, or one grid step with the
/// modifier held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeStep {
    Unit,
    Grid,
}

/// Moves a rect by one nudge step in the given direction (each of `dx`,
/// `dy` in -1..=1) and snaps the result.
pub fn nudge(canvas: &Canvas, rect: Rect, dx: i32, dy: i32, step: NudgeStep) -> Rect {
    let amount = match step {
        NudgeStep::Unit => 1,
        NudgeStep::Grid => canvas.grid,
    };
    Rect {
        x: canvas.snap(rect.x + dx * amount),
        y: canvas.snap(rect.y + dy * amount),
        ..rect
    }
}
