//! Desktop wallpaper assignment.
//!
//! The engine only needs "make this file the desktop background". The system
//! implementation goes through the `wallpaper` crate, which covers Windows,
//! macOS and the common Linux desktops.

use std::path::Path;

use super::error::DesktopError;

/// Something that can set the desktop background from an image file.
pub trait DesktopBackground: Send + Sync {
    /// Sets `path` as the desktop background.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or the platform call fails.
    fn set_wallpaper(&self, path: &Path) -> Result<(), DesktopError>;
}

/// Sets the wallpaper through the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDesktop;

impl DesktopBackground for SystemDesktop {
    fn set_wallpaper(&self, path: &Path) -> Result<(), DesktopError> {
        if !path.exists() {
            return Err(DesktopError::FileNotFound(path.display().to_string()));
        }

        let path_str = path.display().to_string();

        wallpaper::set_from_path(&path_str)
            .map_err(|e| DesktopError::SetWallpaperFailed(e.to_string()))
    }
}

/// Leaves the desktop alone and only logs what would have been applied.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedDesktop;

impl DesktopBackground for DetachedDesktop {
    fn set_wallpaper(&self, path: &Path) -> Result<(), DesktopError> {
        tracing::debug!(path = %path.display(), "wallpaper written, not applied");
        Ok(())
    }
}
