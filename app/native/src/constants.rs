//! Application-wide constants.

use std::time::Duration;

/// Application name, used for the config directory and log prefixes.
pub const APP_NAME: &str = "tessera";

/// File name of the composed wallpaper written into the destination folder.
pub const OUTPUT_FILE_NAME: &str = "wallpaper.jpg";

/// Minimum time a tile keeps its cover before it may be picked again.
pub const ELIGIBILITY_WINDOW: Duration = Duration::from_secs(10);

/// Default number of decoded covers kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 10;

/// Default lower bound of the delay between cycles, in seconds.
pub const DEFAULT_MIN_INTERVAL_SECS: u64 = 3;

/// Default upper bound of the delay between cycles, in seconds.
pub const DEFAULT_MAX_INTERVAL_SECS: u64 = 10;

/// Default JPEG quality for the composed wallpaper.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;
