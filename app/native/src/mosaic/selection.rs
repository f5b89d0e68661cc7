//! Randomized choices made by each cycle: which tiles refresh, which covers
//! they get, and how long until the next cycle.
//!
//! Everything takes the RNG as a parameter so the engine can own one seeded
//! generator and tests can replay a sequence exactly.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rand::Rng;
use rand::seq::SliceRandom;

use super::tile::Tile;

/// Smallest batch a steady-state cycle refreshes when enough tiles are eligible.
pub const MIN_BATCH: usize = 3;

/// Indices of the tiles that may be refreshed at `now`.
#[must_use]
pub fn eligible_tiles(tiles: &[Tile], now: Instant, window: Duration) -> Vec<usize> {
    tiles
        .iter()
        .filter(|tile| tile.is_eligible(now, window))
        .map(|tile| tile.index)
        .collect()
}

/// Number of tiles a steady-state cycle refreshes.
///
/// With three or fewer candidates every candidate is refreshed. Otherwise
/// the count is drawn from `[3, min(candidates, total / 4) + 1)`; when that
/// range is empty or holds a single value the count is exactly 3.
pub fn update_count<R: Rng + ?Sized>(rng: &mut R, candidates: usize, total_tiles: usize) -> usize {
    if candidates <= MIN_BATCH {
        return candidates;
    }

    let upper = candidates.min(total_tiles / 4) + 1;
    if upper <= MIN_BATCH + 1 {
        return MIN_BATCH;
    }

    rng.random_range(MIN_BATCH..upper)
}

/// Shuffles `candidates` and keeps the first `count`.
pub fn choose_tiles<R: Rng + ?Sized>(rng: &mut R, mut candidates: Vec<usize>, count: usize) -> Vec<usize> {
    candidates.shuffle(rng);
    candidates.truncate(count);
    candidates
}

/// Covers still free to hand out during one cycle.
///
/// Starts as the catalog minus every cover currently shown; each draw removes
/// the drawn path, so a cycle never hands the same cover out twice.
#[derive(Debug, Clone)]
pub struct CoverDraw {
    available: Vec<PathBuf>,
}

impl CoverDraw {
    #[must_use]
    pub fn new<'a>(catalog: &[PathBuf], in_use: impl IntoIterator<Item = &'a Path>) -> Self {
        let in_use: HashSet<&Path> = in_use.into_iter().collect();
        let available = catalog
            .iter()
            .filter(|path| !in_use.contains(path.as_path()))
            .cloned()
            .collect();
        Self { available }
    }

    /// Draws one cover uniformly at random, or `None` once the pool is empty.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<PathBuf> {
        if self.available.is_empty() {
            return None;
        }
        let index = rng.random_range(0..self.available.len());
        Some(self.available.swap_remove(index))
    }

    #[cfg(test)]
    pub(crate) fn remaining(&self) -> usize { self.available.len() }
}

/// Delay before the next cycle: a whole number of seconds in
/// `[min_secs, max_secs]`, both ends included.
pub fn next_delay<R: Rng + ?Sized>(rng: &mut R, min_secs: u64, max_secs: u64) -> Duration {
    Duration::from_secs(rng.random_range(min_secs..=max_secs.max(min_secs)))
}
