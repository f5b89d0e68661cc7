//! Shell-like path expansion for user-supplied folders.
//!
//! Config values such as `folderPath` may use `~` or be relative to the
//! config file; these helpers turn them into paths the engine can open.

use std::path::{Path, PathBuf};

/// Expands a leading `~` to the home directory.
///
/// The path can be:
/// - Absolute: returned as-is
/// - Home-relative (starts with `~`): expanded to the user's home directory
/// - Relative: returned as-is (see [`expand_and_resolve`] to anchor it)
///
/// Surrounding whitespace is trimmed; an empty input yields an empty path.
///
/// # Arguments
///
/// * `path` - The folder as written in the configuration
///
/// # Returns
///
/// The expanded path, or an empty `PathBuf` for blank input.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use tessera_lib::platform::path::expand;
///
/// assert_eq!(expand(" /srv/covers "), PathBuf::from("/srv/covers"));
/// assert_eq!(expand("covers"), PathBuf::from("covers"));
/// assert_eq!(expand(""), PathBuf::new());
/// ```
#[must_use]
pub fn expand(path: &str) -> PathBuf {
    let path = path.trim();
    if path.is_empty() {
        return PathBuf::new();
    }

    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Expands `~`, then resolves a still-relative result against `base_dir`.
///
/// # Arguments
///
/// * `path` - The folder as written in the configuration
/// * `base_dir` - Directory relative folders are anchored to, normally the
///   one holding the config file
///
/// # Returns
///
/// An absolute path when `path` was absolute, home-relative, or `base_dir` is
/// absolute. Blank input stays empty so validation can report it.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use tessera_lib::platform::path::expand_and_resolve;
///
/// let base = Path::new("/home/me/.config/tessera");
/// assert_eq!(expand_and_resolve("covers", base), base.join("covers"));
/// assert_eq!(expand_and_resolve("/srv/out", base), PathBuf::from("/srv/out"));
/// assert_eq!(expand_and_resolve("  ", base), PathBuf::new());
/// ```
#[must_use]
pub fn expand_and_resolve(path: &str, base_dir: &Path) -> PathBuf {
    let expanded = expand(path);
    if expanded.as_os_str().is_empty() || expanded.is_absolute() {
        return expanded;
    }

    base_dir.join(expanded)
}
