//! Configuration module for Tessera.
//!
//! This module provides configuration types, loading, validation, and the
//! backup that lets a broken or deleted config fall back to the last good one.
//!
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.

pub mod schema;
pub mod template;
pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

pub use types::{ConfigError, TesseraConfig};

use crate::constants::APP_NAME;

/// Configuration file names to search for (in priority order).
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Copy of the last configuration that loaded and validated.
pub const BACKUP_FILE_NAME: &str = "config_backup.json";

/// A validated configuration and the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TesseraConfig,
    pub path: PathBuf,
}

/// Returns the possible configuration file paths in priority order.
///
/// 1. `$XDG_CONFIG_HOME/tessera/config.jsonc` or `config.json`, if the variable is set
/// 2. `~/.config/tessera/config.jsonc` or `config.json`
/// 3. The platform config directory (`dirs::config_dir()`), same file names
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut dirs_in_order = Vec::new();

    if let Some(xdg_config) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        dirs_in_order.push(PathBuf::from(xdg_config).join(APP_NAME));
    }
    if let Some(home) = dirs::home_dir() {
        dirs_in_order.push(home.join(".config").join(APP_NAME));
    }
    if let Some(config_dir) = dirs::config_dir() {
        dirs_in_order.push(config_dir.join(APP_NAME));
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for dir in dirs_in_order {
        for filename in CONFIG_FILE_NAMES {
            let path = dir.join(filename);
            // XDG_CONFIG_HOME is often ~/.config itself.
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    paths
}

/// Path of the backup kept next to `config_path`.
#[must_use]
pub fn backup_path(config_path: &Path) -> PathBuf {
    config_path.parent().unwrap_or_else(|| Path::new(".")).join(BACKUP_FILE_NAME)
}

/// Loads, resolves and validates the configuration.
///
/// With `custom` set only that file is considered; otherwise the default
/// search paths are tried in order. A missing file is restored from its
/// backup when one exists. If nothing can be found a commented template is
/// written where the config is expected and `ConfigError::NotFound` names it.
///
/// # Errors
///
/// Returns an error if no configuration exists, it cannot be read or parsed,
/// or it fails validation.
pub fn load(custom: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let candidates = custom.map_or_else(config_paths, |path| vec![path.to_path_buf()]);
    load_from_candidates(&candidates)
}

fn load_from_candidates(candidates: &[PathBuf]) -> Result<LoadedConfig, ConfigError> {
    let path = locate(candidates)?;
    let config = load_config_from_path(&path)?;

    if let Err(err) = write_backup(&path) {
        tracing::warn!(error = %err, "failed to back up configuration");
    }

    Ok(LoadedConfig { config, path })
}

/// Finds the first existing candidate, then the first restorable backup.
fn locate(candidates: &[PathBuf]) -> Result<PathBuf, ConfigError> {
    if let Some(existing) = candidates.iter().find(|path| path.is_file()) {
        return Ok(existing.clone());
    }

    for path in candidates {
        if restore_backup(path)? {
            tracing::info!(path = %path.display(), "configuration restored from backup");
            return Ok(path.clone());
        }
    }

    let Some(preferred) = candidates.first() else {
        return Err(ConfigError::NoConfigDir);
    };
    template::create_config_file(preferred).map_err(|err| ConfigError::io(preferred, err))?;
    tracing::info!(path = %preferred.display(), "created configuration template");

    Err(ConfigError::NotFound { path: preferred.display().to_string() })
}

/// Reads, parses, resolves and validates one configuration file.
///
/// Relative folder paths are resolved against the file's own directory.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub fn load_config_from_path(path: &Path) -> Result<TesseraConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|err| ConfigError::io(path, err))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let config = TesseraConfig::from_jsonc(&text, path)?.resolved(base_dir);
    config.validate()?;

    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

fn write_backup(config_path: &Path) -> Result<(), ConfigError> {
    let backup = backup_path(config_path);
    fs::copy(config_path, &backup).map_err(|err| ConfigError::io(&backup, err))?;
    Ok(())
}

/// Copies the backup over a missing config. Returns whether a backup existed.
fn restore_backup(config_path: &Path) -> Result<bool, ConfigError> {
    let backup = backup_path(config_path);
    if !backup.is_file() {
        return Ok(false);
    }
    fs::copy(&backup, config_path).map_err(|err| ConfigError::io(config_path, err))?;
    Ok(true)
}
