//! Tessera - a living mosaic wallpaper.
//!
//! A grid of square tiles, each showing one cover image from a folder. Every
//! few seconds a handful of tiles swap to covers not currently on screen; the
//! composed image is written to disk and set as the desktop background.

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod mosaic;
pub mod platform;
