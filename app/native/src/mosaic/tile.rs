//! Tiles: fixed canvas regions, each showing one cover.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::layout::{GridPlan, Rect};

/// One cell of the mosaic.
///
/// Tiles live in a row-major `Vec` and are referred to by index; the rect
/// never changes after the grid is planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub index: usize,
    pub rect: Rect,
    pub cover: Option<PathBuf>,
    pub last_update: Option<Instant>,
}

impl Tile {
    #[must_use]
    pub const fn new(index: usize, rect: Rect) -> Self {
        Self { index, rect, cover: None, last_update: None }
    }

    /// Current cover path, if one has been assigned.
    #[must_use]
    pub fn cover(&self) -> Option<&Path> { self.cover.as_deref() }

    /// A tile may be refreshed if it was never updated or its last update is
    /// at least `window` old.
    #[must_use]
    pub fn is_eligible(&self, now: Instant, window: Duration) -> bool {
        self.last_update
            .is_none_or(|last| now.saturating_duration_since(last) >= window)
    }
}

/// Builds the tile list from a grid plan.
#[must_use]
pub fn tiles_from_plan(plan: &GridPlan) -> Vec<Tile> {
    plan.tiles.iter().enumerate().map(|(index, rect)| Tile::new(index, *rect)).collect()
}
