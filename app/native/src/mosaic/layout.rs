//! Grid layout planning for the mosaic canvas.
//!
//! Tiles are square. The tile edge is the largest integer that fits both axes,
//! and whatever slack is left on an axis is spread as one uniform gap between
//! neighbouring tiles. Everything is integer floor arithmetic, so a canvas and
//! a grid always produce the same rectangles.

use serde::Serialize;

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self { Self { width, height } }
}

/// An axis-aligned pixel rectangle on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Exclusive right edge.
    #[must_use]
    pub const fn right(&self) -> u32 { self.x + self.width }

    /// Exclusive bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> u32 { self.y + self.height }

    /// Returns true if the two rectangles share at least one pixel.
    #[cfg(test)]
    pub(crate) const fn intersects(&self, other: &Self) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Result of planning a grid: the shared tile edge, the gaps, and the
/// rectangles in row-major order (`index = row * cols + col`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridPlan {
    pub rows: u32,
    pub cols: u32,
    pub tile_size: u32,
    pub gap_x: u32,
    pub gap_y: u32,
    pub tiles: Vec<Rect>,
}

/// Computes the tile rectangles for a `rows` x `cols` grid on `canvas`.
///
/// Callers validate that every input is positive. A zero row or column
/// count is treated as one so the function never divides by zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn plan_grid(canvas: CanvasSize, rows: u32, cols: u32) -> GridPlan {
    let rows = rows.max(1);
    let cols = cols.max(1);

    let width = i64::from(canvas.width);
    let height = i64::from(canvas.height);
    let (rows_i, cols_i) = (i64::from(rows), i64::from(cols));

    let mut base = (width / cols_i).min(height / rows_i);
    let mut slack_w = width - base * cols_i;
    let mut slack_h = height - base * rows_i;

    // The two shrink steps are independent; both may apply.
    if slack_w < 0 {
        base -= 1;
        slack_w = width - base * cols_i;
    }
    if slack_h < 0 {
        base -= 1;
        slack_h = height - base * rows_i;
    }

    let base = base.max(0);
    let gap_x = if cols > 1 { slack_w.max(0) / (cols_i - 1) } else { 0 };
    let gap_y = if rows > 1 { slack_h.max(0) / (rows_i - 1) } else { 0 };

    let tiles = (0..rows * cols)
        .map(|index| {
            let row = i64::from(index / cols);
            let col = i64::from(index % cols);
            Rect::new(
                (col * (base + gap_x)) as u32,
                (row * (base + gap_y)) as u32,
                base as u32,
                base as u32,
            )
        })
        .collect();

    GridPlan {
        rows,
        cols,
        tile_size: base as u32,
        gap_x: gap_x as u32,
        gap_y: gap_y as u32,
        tiles,
    }
}
