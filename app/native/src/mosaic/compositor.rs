//! Compositing covers into the shared canvas and publishing the result.
//!
//! The compositor never touches the canvas on its own: the engine hands it
//! a mutable borrow while holding the cycle lock, one tile at a time.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;

use super::cache::{CacheStats, ImageCache};
use super::desktop::DesktopBackground;
use super::error::{CompositeError, CycleResult};
use super::layout::Rect;
use super::paint::{fit_cover, place_tile};

/// Paints tiles, writes the wallpaper file and hands it to the desktop.
pub struct Compositor {
    cache: ImageCache,
    desktop: Arc<dyn DesktopBackground>,
    output_path: PathBuf,
    jpeg_quality: u8,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("cache", &self.cache)
            .field("output_path", &self.output_path)
            .field("jpeg_quality", &self.jpeg_quality)
            .finish_non_exhaustive()
    }
}

impl Compositor {
    #[must_use]
    pub fn new(
        cache: ImageCache,
        desktop: Arc<dyn DesktopBackground>,
        output_path: PathBuf,
        jpeg_quality: u8,
    ) -> Self {
        Self {
            cache,
            desktop,
            output_path,
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Path of the wallpaper file this compositor writes.
    #[must_use]
    pub fn output_path(&self) -> &Path { &self.output_path }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats { self.cache.stats() }

    /// Drops every cached decode.
    pub fn release_cache(&self) { self.cache.clear(); }

    /// Paints `cover` into `canvas` at `rect`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cover cannot be decoded or the resize worker fails.
    pub async fn paint(&self, canvas: &mut RgbImage, rect: Rect, cover: &Path) -> CycleResult<()> {
        let image = self.cache.get(cover).await?;
        let tile =
            tokio::task::spawn_blocking(move || fit_cover(&image, rect.width, rect.height)).await?;
        place_tile(canvas, &tile, rect);
        Ok(())
    }

    /// Encodes `canvas` as JPEG and atomically replaces the output file.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding, writing or renaming fails.
    pub async fn persist(&self, canvas: &RgbImage) -> CycleResult<PathBuf> {
        let snapshot = canvas.clone();
        let target = self.output_path.clone();
        let quality = self.jpeg_quality;

        tokio::task::spawn_blocking(move || write_jpeg_atomically(&snapshot, &target, quality))
            .await??;

        Ok(self.output_path.clone())
    }

    /// Sets `path` as the desktop background. Failures are logged and
    /// reported as `false`, never propagated.
    pub async fn apply(&self, path: &Path) -> bool {
        let desktop = Arc::clone(&self.desktop);
        let owned = path.to_path_buf();

        match tokio::task::spawn_blocking(move || desktop.set_wallpaper(&owned)).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "failed to set desktop wallpaper");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "desktop wallpaper worker failed");
                false
            }
        }
    }
}

/// Writes `canvas` next to `target` under a temporary name, then renames it
/// over `target` so readers never see a half-written file.
fn write_jpeg_atomically(canvas: &RgbImage, target: &Path, quality: u8) -> Result<(), CompositeError> {
    let dir = target.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|err| CompositeError::persist(dir, err))?;

    let tmp = tempfile::Builder::new()
        .prefix(".tessera-")
        .suffix(".jpg")
        .tempfile_in(dir)
        .map_err(|err| CompositeError::persist(target, err))?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
        canvas
            .write_with_encoder(encoder)
            .map_err(|err| CompositeError::encode(target, err))?;
        writer.flush().map_err(|err| CompositeError::persist(target, err))?;
    }

    tmp.persist(target).map_err(|err| CompositeError::persist(target, err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::{GenericImageView, Rgb};
    use parking_lot::Mutex;
    use tempfile::TempDir;

    use super::*;
    use crate::mosaic::error::{CycleError, DesktopError};

    #[derive(Default)]
    struct RecordingDesktop {
        applied: Mutex<Vec<PathBuf>>,
        fail: bool,
    }

    impl DesktopBackground for RecordingDesktop {
        fn set_wallpaper(&self, path: &Path) -> Result<(), DesktopError> {
            self.applied.lock().push(path.to_path_buf());
            if self.fail {
                Err(DesktopError::SetWallpaperFailed("no desktop".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn compositor(dir: &Path, desktop: Arc<RecordingDesktop>) -> Compositor {
        Compositor::new(ImageCache::new(4), desktop, dir.join("wallpaper.jpg"), 90)
    }

    #[tokio::test]
    async fn test_paint_fills_tile_rect() {
        let dir = TempDir::new().unwrap();
        let cover = dir.path().join("red.png");
        RgbImage::from_pixel(8, 8, Rgb([250, 0, 0])).save(&cover).unwrap();

        let compositor = compositor(dir.path(), Arc::default());
        let mut canvas = RgbImage::new(40, 20);
        compositor.paint(&mut canvas, Rect::new(20, 0, 20, 20), &cover).await.unwrap();

        let painted = canvas.get_pixel(30, 10).0;
        assert!(painted[0] > 240 && painted[1] < 10 && painted[2] < 10, "{painted:?}");
        assert_eq!(canvas.get_pixel(10, 10), &Rgb([0, 0, 0]));
    }

    #[tokio::test]
    async fn test_paint_missing_cover_fails() {
        let dir = TempDir::new().unwrap();
        let compositor = compositor(dir.path(), Arc::default());
        let mut canvas = RgbImage::new(10, 10);

        let result =
            compositor.paint(&mut canvas, Rect::new(0, 0, 10, 10), &dir.path().join("gone.jpg")).await;
        assert!(matches!(result, Err(CycleError::Composite(_))));
    }

    #[tokio::test]
    async fn test_persist_writes_and_overwrites_jpeg() {
        let dir = TempDir::new().unwrap();
        let compositor = compositor(dir.path(), Arc::default());

        let first = RgbImage::from_pixel(16, 9, Rgb([0, 0, 0]));
        let path = compositor.persist(&first).await.unwrap();
        assert_eq!(path, dir.path().join("wallpaper.jpg"));

        let second = RgbImage::from_pixel(16, 9, Rgb([255, 255, 255]));
        compositor.persist(&second).await.unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.dimensions(), (16, 9));
        assert!(decoded.to_rgb8().get_pixel(8, 4).0[0] > 200);

        // Only the final file remains; temp files are renamed away.
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tessera-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_apply_reports_success_and_failure() {
        let dir = TempDir::new().unwrap();
        let ok = Arc::new(RecordingDesktop::default());
        let compositor_ok = compositor(dir.path(), Arc::clone(&ok));
        assert!(compositor_ok.apply(&dir.path().join("wallpaper.jpg")).await);
        assert_eq!(ok.applied.lock().len(), 1);

        let failing = Arc::new(RecordingDesktop { fail: true, ..Default::default() });
        let compositor_fail = compositor(dir.path(), Arc::clone(&failing));
        assert!(!compositor_fail.apply(&dir.path().join("wallpaper.jpg")).await);
        assert_eq!(failing.applied.lock().len(), 1);
    }

    #[test]
    fn test_quality_is_clamped() {
        let dir = TempDir::new().unwrap();
        let c = Compositor::new(
            ImageCache::new(1),
            Arc::new(RecordingDesktop::default()),
            dir.path().join("w.jpg"),
            0,
        );
        assert_eq!(c.jpeg_quality, 1);
    }
}
