//! Configuration types for Tessera.
//!
//! The configuration file supports JSONC format (JSON with comments).
//! Keys are camelCase; everything except the two folders has a default.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_INTERVAL_SECS,
    DEFAULT_MIN_INTERVAL_SECS,
};
use crate::mosaic::{CanvasSize, EngineSettings};
use crate::platform::path::expand_and_resolve;

/// Errors that can occur when loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No configuration file existed; a template was written for the user.
    #[error("No configuration file found. A template was written to {path}; edit it and run again")]
    NotFound { path: String },
    /// No configuration file existed and there is nowhere to put a template.
    #[error("No configuration file found and no configuration directory is available")]
    NoConfigDir,
    /// The configuration file exists but could not be read or written.
    #[error("Failed to access configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// The configuration parsed but describes something the engine cannot run.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.display().to_string(), source }
    }

    pub(crate) fn parse(path: &Path, source: serde_json::Error) -> Self {
        Self::Parse { path: path.display().to_string(), source }
    }
}

const fn default_min_interval() -> u64 { DEFAULT_MIN_INTERVAL_SECS }

const fn default_max_interval() -> u64 { DEFAULT_MAX_INTERVAL_SECS }

const fn default_cache_capacity() -> usize { DEFAULT_CACHE_CAPACITY }

const fn default_jpeg_quality() -> u8 { DEFAULT_JPEG_QUALITY }

/// Root configuration for Tessera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TesseraConfig {
    /// Folder containing the cover images (jpg, jpeg, png, bmp).
    /// Supports `~`; relative paths are resolved against the config file's folder.
    #[serde(default)]
    pub folder_path: String,

    /// Folder the composed `wallpaper.jpg` is written to.
    /// Supports `~`; relative paths are resolved against the config file's folder.
    #[serde(default)]
    pub dest_folder: String,

    /// Wallpaper width in pixels.
    #[serde(default)]
    pub width: u32,

    /// Wallpaper height in pixels.
    #[serde(default)]
    pub height: u32,

    /// Number of tile rows.
    #[serde(default)]
    pub rows: u32,

    /// Number of tile columns.
    #[serde(default)]
    pub cols: u32,

    /// Shortest wait between two update cycles, in seconds.
    /// Default: 3
    #[serde(default = "default_min_interval")]
    pub min_interval: u64,

    /// Longest wait between two update cycles, in seconds (inclusive).
    /// Default: 10
    #[serde(default = "default_max_interval")]
    pub max_interval: u64,

    /// Number of decoded covers kept in memory.
    /// Default: 10
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// JPEG quality of the written wallpaper, 1 to 100.
    /// Default: 95
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for TesseraConfig {
    fn default() -> Self {
        Self {
            folder_path: String::new(),
            dest_folder: String::new(),
            width: 0,
            height: 0,
            rows: 0,
            cols: 0,
            min_interval: DEFAULT_MIN_INTERVAL_SECS,
            max_interval: DEFAULT_MAX_INTERVAL_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl TesseraConfig {
    /// Parses a JSONC document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the text is not a valid configuration.
    pub fn from_jsonc(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let reader = json_comments::StripComments::new(text.as_bytes());
        serde_json::from_reader(reader).map_err(|err| ConfigError::parse(origin, err))
    }

    /// Rewrites both folder paths: `~` is expanded and relative paths are
    /// resolved against `base_dir`.
    #[must_use]
    pub fn resolved(mut self, base_dir: &Path) -> Self {
        if !self.folder_path.trim().is_empty() {
            self.folder_path =
                expand_and_resolve(&self.folder_path, base_dir).display().to_string();
        }
        if !self.dest_folder.trim().is_empty() {
            self.dest_folder =
                expand_and_resolve(&self.dest_folder, base_dir).display().to_string();
        }
        self
    }

    #[must_use]
    pub fn folder_path(&self) -> PathBuf { PathBuf::from(self.folder_path.trim()) }

    #[must_use]
    pub fn dest_folder(&self) -> PathBuf { PathBuf::from(self.dest_folder.trim()) }

    /// Checks everything the engine assumes about its parameters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.folder_path.trim().is_empty() {
            return Err(ConfigError::Invalid("source folder path must not be empty".into()));
        }
        if !self.folder_path().is_dir() {
            return Err(ConfigError::Invalid(format!(
                "source folder {} does not exist",
                self.folder_path.trim()
            )));
        }
        if self.dest_folder.trim().is_empty() || !self.dest_folder().is_dir() {
            return Err(ConfigError::Invalid(format!(
                "destination folder '{}' is empty or does not exist",
                self.dest_folder.trim()
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid("width and height must be greater than 0".into()));
        }
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::Invalid("rows and cols must be greater than 0".into()));
        }
        if self.min_interval > self.max_interval {
            return Err(ConfigError::Invalid(format!(
                "minInterval ({}) must not exceed maxInterval ({})",
                self.min_interval, self.max_interval
            )));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid("cacheCapacity must be greater than 0".into()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpegQuality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    /// Engine parameters described by this configuration.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            cover_folder: self.folder_path(),
            output_dir: self.dest_folder(),
            canvas: CanvasSize::new(self.width, self.height),
            rows: self.rows,
            cols: self.cols,
            min_interval_secs: self.min_interval,
            max_interval_secs: self.max_interval,
            cache_capacity: self.cache_capacity,
            jpeg_quality: self.jpeg_quality,
        }
    }
}
