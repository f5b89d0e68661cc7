//! Living mosaic wallpaper.
//!
//! A fixed grid of square tiles over a canvas; each tile shows one cover image
//! and a few tiles are swapped for fresh covers every cycle. The result is
//! written to disk and set as the desktop background.

pub mod cache;
pub mod catalog;
pub mod compositor;
pub mod desktop;
pub mod engine;
pub mod error;
pub mod layout;
pub mod paint;
pub mod selection;
pub mod tile;

pub use catalog::CoverCatalog;
pub use desktop::{DesktopBackground, DetachedDesktop, SystemDesktop};
pub use engine::{CycleReport, Engine, EngineSettings, EngineSnapshot, TileSnapshot};
pub use error::{CompositeError, CycleError, DesktopError};
pub use layout::{CanvasSize, GridPlan, Rect, plan_grid};
