//! Error types for the mosaic engine.
//!
//! # Error Categories
//!
//! - **Composite errors**: decoding a cover, encoding or persisting the canvas
//! - **Desktop errors**: the OS refused the new wallpaper (logged only)
//! - **Cycle errors**: anything that ends a cycle early; caught per cycle so
//!   the loop keeps running

use std::path::Path;

/// Result type alias for a single update cycle.
pub type CycleResult<T> = Result<T, CycleError>;

/// Errors raised while turning covers into the persisted wallpaper.
#[derive(Debug, thiserror::Error)]
pub enum CompositeError {
    /// The cover could not be opened or its format sniffed.
    #[error("Failed to open cover {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The cover could not be decoded.
    #[error("Failed to decode cover {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    /// The canvas could not be encoded.
    #[error("Failed to encode wallpaper {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    /// Writing or renaming the output file failed.
    #[error("Failed to write wallpaper {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CompositeError {
    pub(crate) fn open(path: &Path, source: std::io::Error) -> Self {
        Self::Open { path: path.display().to_string(), source }
    }

    pub(crate) fn decode(path: &Path, source: image::ImageError) -> Self {
        Self::Decode { path: path.display().to_string(), source }
    }

    pub(crate) fn encode(path: &Path, source: image::ImageError) -> Self {
        Self::Encode { path: path.display().to_string(), source }
    }

    pub(crate) fn persist(path: &Path, source: std::io::Error) -> Self {
        Self::Persist { path: path.display().to_string(), source }
    }
}

/// Errors from the OS wallpaper collaborator.
#[derive(Debug, thiserror::Error)]
pub enum DesktopError {
    /// The wallpaper file does not exist.
    #[error("Wallpaper file not found: {0}")]
    FileNotFound(String),
    /// The platform call failed.
    #[error("Failed to set wallpaper: {0}")]
    SetWallpaperFailed(String),
}

/// Anything that aborts a cycle before it completes.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Composite(#[from] CompositeError),
    /// A blocking worker panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for CycleError {
    fn from(err: tokio::task::JoinError) -> Self { Self::Task(err.to_string()) }
}
