//! Bounded cache of decoded cover images.
//!
//! Decoding a full-size JPEG is the most expensive step of a cycle, and covers
//! come back around often on small catalogs. The cache keeps the most recently
//! used decodes and evicts the least recently used one once it is full. The
//! storage is a `moka` cache with its LRU policy; pending housekeeping is run
//! after every access so the entry count and eviction order are exact.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use image::{DynamicImage, ImageReader};
use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use super::error::{CompositeError, CycleError};

/// Hit and miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
}

/// LRU cache of decoded covers, keyed by path.
pub struct ImageCache {
    capacity: usize,
    entries: Cache<PathBuf, Arc<DynamicImage>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("capacity", &self.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}

impl ImageCache {
    /// Creates a cache holding at most `capacity` decoded images (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let entries = Cache::builder()
            .max_capacity(capacity as u64)
            .eviction_policy(EvictionPolicy::lru())
            .eviction_listener(|path: Arc<PathBuf>, _, cause| {
                tracing::trace!(path = %path.display(), ?cause, "evicted cover from cache");
            })
            .build();

        Self {
            capacity,
            entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize { self.capacity }

    /// Returns the decoded image at `path`, decoding it on a blocking worker
    /// on a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or decoded.
    pub async fn get(&self, path: &Path) -> Result<Arc<DynamicImage>, CycleError> {
        if let Some(image) = self.entries.get(path) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            // Apply the recency update now so eviction order stays exact.
            self.entries.run_pending_tasks();
            return Ok(image);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let owned = path.to_path_buf();
        let image = tokio::task::spawn_blocking(move || decode_cover(&owned)).await??;
        let image = Arc::new(image);

        self.entries.insert(path.to_path_buf(), Arc::clone(&image));
        self.entries.run_pending_tasks();
        Ok(image)
    }

    /// Returns true if `path` is currently cached.
    #[cfg(test)]
    pub(crate) fn contains(&self, path: &Path) -> bool { self.entries.contains_key(path) }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            len: usize::try_from(self.entries.entry_count()).unwrap_or(usize::MAX),
        }
    }

    /// Drops every cached image.
    pub fn clear(&self) {
        let keys: Vec<Arc<PathBuf>> = self.entries.iter().map(|(key, _)| key).collect();
        for key in keys {
            self.entries.invalidate(key.as_path());
        }
        self.entries.run_pending_tasks();
    }
}

/// Decodes an image, sniffing the format from content rather than extension.
fn decode_cover(path: &Path) -> Result<DynamicImage, CompositeError> {
    ImageReader::open(path)
        .map_err(|err| CompositeError::open(path, err))?
        .with_guessed_format()
        .map_err(|err| CompositeError::open(path, err))?
        .decode()
        .map_err(|err| CompositeError::decode(path, err))
}
