//! Cover catalog: the candidate images a tile may display.
//!
//! The source folder is listed once, non-recursively. Only whitelisted image
//! extensions are kept, and the engine's own output file is skipped so the
//! mosaic never ends up containing itself.

use std::fs;
use std::path::{Path, PathBuf};

use natord::compare;

use crate::constants::OUTPUT_FILE_NAME;

/// Supported cover file extensions (compared case-insensitively).
const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// Number of listing attempts before giving up on a refresh.
pub const MAX_SCAN_ATTEMPTS: usize = 3;

/// Errors that can occur while listing the cover folder.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The folder itself could not be opened.
    #[error("Failed to read cover folder {path}: {source}")]
    ReadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// An entry could not be read while iterating the folder.
    #[error("Failed to read entry in cover folder {path}: {source}")]
    ReadEntry {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Checks if a path looks like a usable cover image.
#[must_use]
pub fn is_cover_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    if name.to_lowercase().ends_with(OUTPUT_FILE_NAME) {
        return false;
    }

    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Lists the cover candidates directly inside `dir`, in natural order.
///
/// # Errors
///
/// Returns an error if the folder or one of its entries cannot be read.
pub fn list_covers(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let entries = fs::read_dir(dir).map_err(|source| CatalogError::ReadDir {
        path: dir.display().to_string(),
        source,
    })?;

    let mut covers = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CatalogError::ReadEntry {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && is_cover_candidate(&path) {
            covers.push(path);
        }
    }

    covers.sort_by(|a, b| compare(a.to_string_lossy().as_ref(), b.to_string_lossy().as_ref()));
    Ok(covers)
}

/// The set of cover paths the engine draws from.
///
/// Built once when the engine starts. Files added to the folder afterwards
/// are not seen until the engine is started again.
#[derive(Debug, Clone, Default)]
pub struct CoverCatalog {
    folder: PathBuf,
    covers: Vec<PathBuf>,
}

impl CoverCatalog {
    /// Creates an empty catalog bound to `folder`.
    #[must_use]
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self { folder: folder.into(), covers: Vec::new() }
    }

    /// Creates a catalog and performs the initial scan.
    #[must_use]
    pub fn scan(folder: impl Into<PathBuf>) -> Self {
        let mut catalog = Self::new(folder);
        catalog.refresh();
        catalog
    }

    /// Re-lists the folder, retrying up to [`MAX_SCAN_ATTEMPTS`] times.
    ///
    /// On failure the previously obtained list is kept. Returns whether the
    /// listing succeeded.
    pub fn refresh(&mut self) -> bool { self.refresh_with(list_covers) }

    fn refresh_with<F>(&mut self, mut lister: F) -> bool
    where F: FnMut(&Path) -> Result<Vec<PathBuf>, CatalogError> {
        for attempt in 1..=MAX_SCAN_ATTEMPTS {
            match lister(&self.folder) {
                Ok(covers) => {
                    self.covers = covers;
                    tracing::info!(
                        count = self.covers.len(),
                        folder = %self.folder.display(),
                        "cover catalog loaded"
                    );
                    return true;
                }
                Err(err) => {
                    tracing::warn!(error = %err, attempt, "failed to list cover folder");
                }
            }
        }

        tracing::error!(
            folder = %self.folder.display(),
            kept = self.covers.len(),
            "giving up on cover folder, keeping previous catalog"
        );
        false
    }

    /// Returns the folder this catalog lists.
    #[must_use]
    pub fn folder(&self) -> &Path { &self.folder }

    /// Returns the cover paths.
    #[must_use]
    pub fn covers(&self) -> &[PathBuf] { &self.covers }

    #[must_use]
    pub fn len(&self) -> usize { self.covers.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.covers.is_empty() }
}
