//! The mosaic engine: owns the canvas and tiles, and drives the update loop.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──► start() ──► [cycle ─► wait(delay)]* ──► stop()
//!                 \                                   ▲
//!                  run_cycle_now() (manual) ──────────┘
//! ```
//!
//! Every cycle runs with the state lock held from selection until the
//! wallpaper has been handed to the desktop, so cycles never overlap. The next
//! delay is drawn before the lock is released. `stop()` disarms the loop and
//! waits for the in-flight cycle to finish before returning.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use image::RgbImage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use super::cache::{CacheStats, ImageCache};
use super::catalog::CoverCatalog;
use super::compositor::Compositor;
use super::desktop::DesktopBackground;
use super::error::CycleResult;
use super::layout::{CanvasSize, GridPlan, Rect, plan_grid};
use super::selection::{CoverDraw, choose_tiles, eligible_tiles, next_delay, update_count};
use super::tile::{Tile, tiles_from_plan};
use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_INTERVAL_SECS,
    DEFAULT_MIN_INTERVAL_SECS, ELIGIBILITY_WINDOW, OUTPUT_FILE_NAME,
};

/// Construction parameters, validated by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Folder scanned for covers.
    pub cover_folder: PathBuf,
    /// Folder the wallpaper file is written to.
    pub output_dir: PathBuf,
    pub canvas: CanvasSize,
    pub rows: u32,
    pub cols: u32,
    pub min_interval_secs: u64,
    pub max_interval_secs: u64,
    pub cache_capacity: usize,
    pub jpeg_quality: u8,
}

impl EngineSettings {
    /// Settings with the default intervals, cache capacity and JPEG quality.
    #[must_use]
    pub fn new(
        cover_folder: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        canvas: CanvasSize,
        rows: u32,
        cols: u32,
    ) -> Self {
        Self {
            cover_folder: cover_folder.into(),
            output_dir: output_dir.into(),
            canvas,
            rows,
            cols,
            min_interval_secs: DEFAULT_MIN_INTERVAL_SECS,
            max_interval_secs: DEFAULT_MAX_INTERVAL_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    #[must_use]
    pub const fn with_intervals(mut self, min_secs: u64, max_secs: u64) -> Self {
        self.min_interval_secs = min_secs;
        self.max_interval_secs = max_secs;
        self
    }

    /// Full path of the wallpaper file.
    #[must_use]
    pub fn output_path(&self) -> PathBuf { self.output_dir.join(OUTPUT_FILE_NAME) }

    /// Grid computed from the canvas size and tile counts.
    #[must_use]
    pub fn grid(&self) -> GridPlan { plan_grid(self.canvas, self.rows, self.cols) }
}

/// Outcome of one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Whether this was the initial all-tiles cycle.
    pub first_cycle: bool,
    /// Tile indices chosen for refresh, in processing order.
    pub selected: Vec<usize>,
    /// Tile indices that actually received a new cover.
    pub updated: Vec<usize>,
    /// Covers ran out before every selected tile was processed.
    pub exhausted: bool,
    pub output: PathBuf,
    /// Whether the desktop accepted the new wallpaper.
    pub applied: bool,
}

/// Point-in-time view of one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSnapshot {
    pub index: usize,
    pub rect: Rect,
    pub cover: Option<PathBuf>,
    pub last_update: Option<Instant>,
}

/// Point-in-time view of the engine, for the CLI and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    /// Total tile paints into the canvas since construction.
    pub tiles_painted: u64,
    pub catalog_size: usize,
    pub first_cycle_pending: bool,
    pub last_delay: Option<Duration>,
    pub cache: CacheStats,
    pub tiles: Vec<TileSnapshot>,
}

struct MosaicState {
    canvas: RgbImage,
    tiles: Vec<Tile>,
    catalog: CoverCatalog,
    catalog_loaded: bool,
    first_cycle: bool,
    last_delay: Option<Duration>,
    rng: StdRng,
}

#[derive(Default)]
struct Counters {
    cycles_completed: AtomicU64,
    cycles_failed: AtomicU64,
    tiles_painted: AtomicU64,
}

struct Shared {
    settings: EngineSettings,
    compositor: Compositor,
    state: Mutex<MosaicState>,
    disposed: AtomicBool,
    shutdown: watch::Sender<bool>,
    counters: Counters,
}

/// Drives the living mosaic.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct Engine {
    shared: Arc<Shared>,
    task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("settings", &self.shared.settings)
            .field("disposed", &self.is_disposed())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Creates an engine whose randomness is seeded from the OS.
    #[must_use]
    pub fn new(settings: EngineSettings, desktop: Arc<dyn DesktopBackground>) -> Self {
        Self::with_rng(settings, desktop, StdRng::from_rng(&mut rand::rng()))
    }

    /// Creates an engine with a fixed seed, replaying the same choices.
    #[must_use]
    pub fn with_seed(settings: EngineSettings, desktop: Arc<dyn DesktopBackground>, seed: u64) -> Self {
        Self::with_rng(settings, desktop, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: EngineSettings, desktop: Arc<dyn DesktopBackground>, rng: StdRng) -> Self {
        let plan = settings.grid();
        let compositor = Compositor::new(
            ImageCache::new(settings.cache_capacity),
            desktop,
            settings.output_path(),
            settings.jpeg_quality,
        );
        let state = MosaicState {
            canvas: RgbImage::new(settings.canvas.width, settings.canvas.height),
            tiles: tiles_from_plan(&plan),
            catalog: CoverCatalog::new(settings.cover_folder.clone()),
            catalog_loaded: false,
            first_cycle: true,
            last_delay: None,
            rng,
        };

        tracing::debug!(
            rows = settings.rows,
            cols = settings.cols,
            tile_size = plan.tile_size,
            gap_x = plan.gap_x,
            gap_y = plan.gap_y,
            "mosaic grid planned"
        );

        let (shutdown, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                settings,
                compositor,
                state: Mutex::new(state),
                disposed: AtomicBool::new(false),
                shutdown,
                counters: Counters::default(),
            }),
            task: parking_lot::Mutex::new(None),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings { &self.shared.settings }

    #[must_use]
    pub fn output_path(&self) -> &Path { self.shared.compositor.output_path() }

    #[must_use]
    pub fn is_disposed(&self) -> bool { self.shared.disposed.load(Ordering::SeqCst) }

    /// Whether the update loop has been started and not yet stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.lock().as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Spawns the update loop on the current Tokio runtime, beginning with
    /// the all-tiles cycle.
    ///
    /// Returns `false` if the loop is already running or the engine was
    /// stopped.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(&self) -> bool {
        if self.is_disposed() {
            tracing::debug!("start ignored: engine stopped");
            return false;
        }

        let mut task = self.task.lock();
        if task.is_some() {
            return false;
        }

        *task = Some(tokio::spawn(run_loop(Arc::clone(&self.shared))));
        tracing::info!(
            folder = %self.shared.settings.cover_folder.display(),
            output = %self.output_path().display(),
            "mosaic engine started"
        );
        true
    }

    /// Runs one cycle right away, waiting for any in-flight cycle first.
    ///
    /// Returns `Ok(None)` once the engine has been stopped.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the cycle. The failure is also counted
    /// in the snapshot.
    pub async fn run_cycle_now(&self) -> CycleResult<Option<CycleReport>> {
        match self.shared.run_cycle().await {
            Some((outcome, _)) => outcome.map(Some),
            None => Ok(None),
        }
    }

    /// Disarms the loop and waits for an in-flight cycle to finish, then
    /// releases decoded images. Idempotent.
    pub async fn stop(&self) {
        if self.shared.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shared.shutdown.send_replace(true);

        let handle = self.task.lock().take();
        let joined = match handle {
            Some(handle) => handle.await,
            None => Ok(()),
        };
        if let Err(err) = joined {
            tracing::warn!(error = %err, "mosaic loop ended abnormally");
        }

        // The loop may not have been running; wait out a manual cycle too.
        drop(self.shared.state.lock().await);
        self.shared.compositor.release_cache();
        tracing::info!("mosaic engine stopped");
    }

    /// Captures counters and per-tile state.
    pub async fn snapshot(&self) -> EngineSnapshot {
        let state = self.shared.state.lock().await;
        let counters = &self.shared.counters;

        EngineSnapshot {
            cycles_completed: counters.cycles_completed.load(Ordering::SeqCst),
            cycles_failed: counters.cycles_failed.load(Ordering::SeqCst),
            tiles_painted: counters.tiles_painted.load(Ordering::SeqCst),
            catalog_size: state.catalog.len(),
            first_cycle_pending: state.first_cycle,
            last_delay: state.last_delay,
            cache: self.shared.compositor.cache_stats(),
            tiles: state
                .tiles
                .iter()
                .map(|tile| TileSnapshot {
                    index: tile.index,
                    rect: tile.rect,
                    cover: tile.cover.clone(),
                    last_update: tile.last_update,
                })
                .collect(),
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shared.disposed.store(true, Ordering::SeqCst);
        self.shared.shutdown.send_replace(true);
    }
}

async fn run_loop(shared: Arc<Shared>) {
    let mut shutdown = shared.shutdown.subscribe();

    while let Some((_, delay)) = shared.run_cycle().await {
        if shared.disposed.load(Ordering::SeqCst) {
            break;
        }

        tracing::debug!(delay_secs = delay.as_secs(), "next mosaic cycle scheduled");
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => break,
        }
    }

    tracing::debug!("mosaic loop exited");
}

impl Shared {
    /// Runs one cycle and draws the following delay under the same lock,
    /// whether or not the cycle succeeded. Yields `None` once stopped.
    async fn run_cycle(&self) -> Option<(CycleResult<CycleReport>, Duration)> {
        self.run_cycle_with(Instant::now).await
    }

    /// Runs one cycle at a fixed `now`.
    #[cfg(test)]
    async fn run_cycle_at(&self, now: Instant) -> Option<(CycleResult<CycleReport>, Duration)> {
        self.run_cycle_with(|| now).await
    }

    /// The cycle time is read only once the lock is held, so a cycle queued
    /// behind another stamps tiles with the time it actually painted them.
    async fn run_cycle_with<F>(&self, clock: F) -> Option<(CycleResult<CycleReport>, Duration)>
    where F: FnOnce() -> Instant {
        let mut state = self.state.lock().await;
        if self.disposed.load(Ordering::SeqCst) {
            return None;
        }

        let now = clock();
        let started = Instant::now();
        let outcome = self.cycle(&mut state, now).await;
        let delay = self.draw_delay(&mut state);

        match &outcome {
            Ok(report) => {
                self.counters.cycles_completed.fetch_add(1, Ordering::SeqCst);
                tracing::debug!(
                    first_cycle = report.first_cycle,
                    selected = report.selected.len(),
                    updated = report.updated.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "mosaic cycle complete"
                );
            }
            Err(err) => {
                self.counters.cycles_failed.fetch_add(1, Ordering::SeqCst);
                tracing::warn!(error = %err, "mosaic cycle failed");
            }
        }

        Some((outcome, delay))
    }

    fn draw_delay(&self, state: &mut MosaicState) -> Duration {
        let delay = next_delay(
            &mut state.rng,
            self.settings.min_interval_secs,
            self.settings.max_interval_secs,
        );
        state.last_delay = Some(delay);
        delay
    }

    async fn cycle(&self, state: &mut MosaicState, now: Instant) -> CycleResult<CycleReport> {
        // Enumerated once per engine, on the first cycle, even if the scan
        // worker dies.
        if !state.catalog_loaded {
            state.catalog_loaded = true;
            let folder = self.settings.cover_folder.clone();
            state.catalog = tokio::task::spawn_blocking(move || CoverCatalog::scan(folder)).await?;
        }

        let first_cycle = state.first_cycle;
        let selected = if first_cycle {
            (0..state.tiles.len()).collect()
        } else {
            let candidates = eligible_tiles(&state.tiles, now, ELIGIBILITY_WINDOW);
            let count = update_count(&mut state.rng, candidates.len(), state.tiles.len());
            choose_tiles(&mut state.rng, candidates, count)
        };
        state.first_cycle = false;

        let mut draw = CoverDraw::new(
            state.catalog.covers(),
            state.tiles.iter().filter_map(Tile::cover),
        );
        let mut updated = Vec::with_capacity(selected.len());
        let mut exhausted = false;

        for &index in &selected {
            let Some(cover) = draw.draw(&mut state.rng) else {
                exhausted = true;
                tracing::info!(
                    updated = updated.len(),
                    skipped = selected.len() - updated.len(),
                    "cover pool exhausted, skipping remaining tiles"
                );
                break;
            };

            let MosaicState { canvas, tiles, .. } = &mut *state;
            let Some(tile) = tiles.get_mut(index) else { continue };
            tile.cover = Some(cover.clone());
            self.compositor.paint(canvas, tile.rect, &cover).await?;
            tile.last_update = Some(now);

            self.counters.tiles_painted.fetch_add(1, Ordering::SeqCst);
            updated.push(index);
        }

        let output = self.compositor.persist(&state.canvas).await?;
        let applied = self.compositor.apply(&output).await;

        Ok(CycleReport { first_cycle, selected, updated, exhausted, output, applied })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use image::Rgb;
    use tempfile::TempDir;

    use super::*;
    use crate::mosaic::error::{CycleError, DesktopError};

    #[derive(Default)]
    struct RecordingDesktop {
        applied: parking_lot::Mutex<Vec<PathBuf>>,
    }

    impl DesktopBackground for RecordingDesktop {
        fn set_wallpaper(&self, path: &Path) -> Result<(), DesktopError> {
            self.applied.lock().push(path.to_path_buf());
            Ok(())
        }
    }

    struct Fixture {
        covers: TempDir,
        output: TempDir,
        desktop: Arc<RecordingDesktop>,
    }

    impl Fixture {
        fn new(cover_count: usize) -> Self {
            let covers = TempDir::new().unwrap();
            for i in 0..cover_count {
                let shade = u8::try_from(i * 7 % 256).unwrap();
                RgbImage::from_pixel(12, 12, Rgb([shade, 255 - shade, 128]))
                    .save(covers.path().join(format!("cover{i:02}.png")))
                    .unwrap();
            }
            Self {
                covers,
                output: TempDir::new().unwrap(),
                desktop: Arc::default(),
            }
        }

        fn settings(&self, rows: u32, cols: u32) -> EngineSettings {
            EngineSettings::new(
                self.covers.path(),
                self.output.path(),
                CanvasSize::new(cols * 20, rows * 20),
                rows,
                cols,
            )
        }

        fn engine(&self, rows: u32, cols: u32) -> Engine {
            Engine::with_seed(self.settings(rows, cols), self.desktop.clone(), 42)
        }
    }

    fn assert_unique_covers(tiles: &[Tile]) {
        let mut seen = HashSet::new();
        for cover in tiles.iter().filter_map(Tile::cover) {
            assert!(seen.insert(cover.to_path_buf()), "{} shown twice", cover.display());
        }
    }

    #[tokio::test]
    async fn test_first_cycle_updates_every_tile_once() {
        let fx = Fixture::new(12);
        let engine = fx.engine(2, 3);
        let now = Instant::now();

        let (report, delay) = engine.shared.run_cycle_at(now).await.unwrap();
        let report = report.unwrap();

        assert!(report.first_cycle);
        assert_eq!(report.updated, (0..6).collect::<Vec<_>>());
        assert!(!report.exhausted);
        assert!(report.applied);
        assert!(report.output.ends_with(OUTPUT_FILE_NAME));
        assert!(report.output.exists());
        assert_eq!(fx.desktop.applied.lock().as_slice(), [report.output.clone()]);

        assert!(delay >= Duration::from_secs(3) && delay <= Duration::from_secs(10));

        let state = engine.shared.state.lock().await;
        assert!(!state.first_cycle);
        assert!(state.tiles.iter().all(|t| t.last_update == Some(now) && t.cover.is_some()));
        assert_unique_covers(&state.tiles);
    }

    #[tokio::test]
    async fn test_steady_state_with_five_candidates_updates_three() {
        let fx = Fixture::new(20);
        let engine = fx.engine(2, 4);
        let t0 = Instant::now();
        engine.shared.run_cycle_at(t0).await.unwrap().0.unwrap();

        let t1 = t0 + Duration::from_secs(30);
        {
            let mut state = engine.shared.state.lock().await;
            for tile in &mut state.tiles[..3] {
                tile.last_update = Some(t1 - Duration::from_secs(2));
            }
        }

        let (report, _) = engine.shared.run_cycle_at(t1).await.unwrap();
        let report = report.unwrap();
        assert!(!report.first_cycle);
        assert_eq!(report.selected.len(), 3);
        assert_eq!(report.updated.len(), 3);
        assert!(report.updated.iter().all(|i| *i >= 3));

        let state = engine.shared.state.lock().await;
        for tile in &state.tiles {
            let expected = if report.updated.contains(&tile.index) {
                t1
            } else if tile.index < 3 {
                t1 - Duration::from_secs(2)
            } else {
                t0
            };
            assert_eq!(tile.last_update, Some(expected));
        }
        assert_unique_covers(&state.tiles);
    }

    #[tokio::test]
    async fn test_recently_updated_tiles_are_not_selected() {
        let fx = Fixture::new(20);
        let engine = fx.engine(2, 4);
        let t0 = Instant::now();
        engine.shared.run_cycle_at(t0).await.unwrap().0.unwrap();

        let (report, _) = engine.shared.run_cycle_at(t0 + Duration::from_secs(9)).await.unwrap();
        let report = report.unwrap();
        assert!(report.selected.is_empty());
        assert!(report.updated.is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_pool_keeps_partial_progress() {
        let fx = Fixture::new(5);
        let engine = fx.engine(2, 3);
        let now = Instant::now();

        let (report, _) = engine.shared.run_cycle_at(now).await.unwrap();
        let report = report.unwrap();
        assert!(report.exhausted);
        assert_eq!(report.updated.len(), 5);
        assert!(report.output.exists());

        let state = engine.shared.state.lock().await;
        let untouched: Vec<_> = state.tiles.iter().filter(|t| t.cover.is_none()).collect();
        assert_eq!(untouched.len(), 1);
        assert_eq!(untouched[0].last_update, None);
        assert_unique_covers(&state.tiles);
    }

    #[tokio::test]
    async fn test_covers_stay_unique_across_many_cycles() {
        let fx = Fixture::new(12);
        let engine = fx.engine(2, 4);
        let mut now = Instant::now();

        for _ in 0..25 {
            engine.shared.run_cycle_at(now).await.unwrap().0.unwrap();
            assert_unique_covers(&engine.shared.state.lock().await.tiles);
            now += Duration::from_secs(11);
        }
        assert_eq!(engine.snapshot().await.cycles_completed, 25);
    }

    #[tokio::test]
    async fn test_undecodable_cover_fails_cycle_without_touching_last_update() {
        let fx = Fixture::new(0);
        std::fs::write(fx.covers.path().join("broken.jpg"), b"not a jpeg").unwrap();
        let engine = fx.engine(1, 1);

        let err = engine.run_cycle_now().await.unwrap_err();
        assert!(matches!(err, CycleError::Composite(_)));

        let snapshot = engine.snapshot().await;
        assert_eq!(snapshot.cycles_failed, 1);
        assert_eq!(snapshot.cycles_completed, 0);
        assert_eq!(snapshot.tiles_painted, 0);
        assert!(snapshot.tiles[0].cover.is_some());
        assert_eq!(snapshot.tiles[0].last_update, None);
        assert!(fx.desktop.applied.lock().is_empty());
    }

    #[tokio::test]
    async fn test_empty_catalog_still_persists_black_canvas() {
        let fx = Fixture::new(0);
        let engine = fx.engine(1, 2);

        let report = engine.run_cycle_now().await.unwrap().unwrap();
        assert!(report.exhausted);
        assert!(report.updated.is_empty());

        let written = image::open(&report.output).unwrap().to_rgb8();
        assert_eq!(written.dimensions(), (40, 20));
        assert!(written.pixels().all(|p| p.0.iter().all(|c| *c < 8)));
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_disables_everything() {
        let fx = Fixture::new(4);
        let engine = fx.engine(1, 2);

        engine.stop().await;
        engine.stop().await;

        assert!(engine.is_disposed());
        assert!(!engine.start());
        assert!(engine.run_cycle_now().await.unwrap().is_none());
        assert_eq!(engine.snapshot().await.cycles_completed, 0);
    }

    #[tokio::test]
    async fn test_loop_stops_mutating_after_stop() {
        let fx = Fixture::new(10);
        let settings = fx.settings(1, 2).with_intervals(0, 0);
        let engine = Engine::with_seed(settings, fx.desktop.clone(), 1);

        assert!(engine.start());
        assert!(!engine.start());

        let deadline = Instant::now() + Duration::from_secs(10);
        while engine.snapshot().await.cycles_completed < 3 {
            assert!(Instant::now() < deadline, "loop made no progress");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        engine.stop().await;
        assert!(!engine.is_running());

        let before = engine.snapshot().await;
        let applied_before = fx.desktop.applied.lock().len();
        tokio::time::sleep(Duration::from_millis(200)).await;
        let after = engine.snapshot().await;

        assert_eq!(before, after);
        assert_eq!(fx.desktop.applied.lock().len(), applied_before);
        assert_eq!(after.cache.len, 0);
    }

    #[tokio::test]
    async fn test_seeded_engines_make_identical_choices() {
        let fx_a = Fixture::new(15);
        let fx_b = Fixture::new(15);
        let a = fx_a.engine(2, 4);
        let b = fx_b.engine(2, 4);
        let t0 = Instant::now();

        for step in 0..5 {
            let now = t0 + Duration::from_secs(11 * step);
            let (ra, _) = a.shared.run_cycle_at(now).await.unwrap();
            let (rb, _) = b.shared.run_cycle_at(now).await.unwrap();
            assert_eq!(ra.unwrap().updated, rb.unwrap().updated);
        }
    }

    /// Counts how many wallpaper applications overlap.
    #[derive(Default)]
    struct SlowDesktop {
        in_flight: AtomicU64,
        max_in_flight: AtomicU64,
        calls: AtomicU64,
    }

    impl DesktopBackground for SlowDesktop {
        fn set_wallpaper(&self, _path: &Path) -> Result<(), DesktopError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_concurrent_cycles_never_overlap() {
        let fx = Fixture::new(12);
        let desktop = Arc::new(SlowDesktop::default());
        let settings = fx.settings(1, 3).with_intervals(0, 0);
        let engine = Engine::with_seed(settings, desktop.clone(), 7);

        assert!(engine.start());
        let (a, b, c) =
            tokio::join!(engine.run_cycle_now(), engine.run_cycle_now(), engine.run_cycle_now());
        for outcome in [a, b, c] {
            assert!(outcome.unwrap().is_some());
        }
        engine.stop().await;

        assert!(desktop.calls.load(Ordering::SeqCst) >= 3);
        assert_eq!(desktop.max_in_flight.load(Ordering::SeqCst), 1);
        assert_unique_covers(&engine.shared.state.lock().await.tiles);
    }

    #[tokio::test]
    async fn test_queued_cycle_reads_clock_after_lock() {
        let fx = Fixture::new(6);
        let engine = fx.engine(1, 2);

        let guard = engine.shared.state.lock().await;
        let queued = engine.run_cycle_now();
        tokio::pin!(queued);
        // Let the manual cycle reach the lock and wait on it.
        assert!(poll_once(queued.as_mut()).await.is_none());
        tokio::time::sleep(Duration::from_millis(50)).await;
        let released_at = Instant::now();
        drop(guard);

        queued.await.unwrap().unwrap();
        let snapshot = engine.snapshot().await;
        for tile in &snapshot.tiles {
            assert!(tile.last_update.is_some_and(|at| at >= released_at));
        }
    }

    /// Polls `future` once, returning its output if it was already ready.
    async fn poll_once<F: Future + Unpin>(mut future: F) -> Option<F::Output> {
        std::future::poll_fn(|cx| {
            std::task::Poll::Ready(match std::pin::Pin::new(&mut future).poll(cx) {
                std::task::Poll::Ready(output) => Some(output),
                std::task::Poll::Pending => None,
            })
        })
        .await
    }

    #[tokio::test]
    async fn test_catalog_is_scanned_once() {
        let fx = Fixture::new(3);
        let engine = fx.engine(1, 2);
        engine.run_cycle_now().await.unwrap().unwrap();

        RgbImage::from_pixel(12, 12, Rgb([1, 2, 3]))
            .save(fx.covers.path().join("late.png"))
            .unwrap();
        engine.run_cycle_now().await.unwrap().unwrap();

        let snapshot = engine.snapshot().await;
        assert_eq!(snapshot.catalog_size, 3);
        let mut shown = snapshot.tiles.iter().filter_map(|t| t.cover.as_deref());
        assert!(shown.all(|path| !path.ends_with("late.png")));
    }
}
