//! Configuration template generation.
//!
//! Written the first time Tessera runs without a configuration file, so the
//! user has something to fill in.

use std::fs;
use std::path::Path;

/// Generates the commented configuration template.
///
/// The template parses as-is but leaves the folders and sizes empty, so it
/// fails validation until the user fills them in.
#[must_use]
pub fn generate_config_template() -> String {
    r#"// Tessera Configuration File
// ==========================
// This file uses JSONC format (JSON with comments).
// Fill in the folders and the wallpaper size, then run `tessera` again.
// Run `tessera schema` for the full JSON Schema.

{
  // Folder containing the cover images (jpg, jpeg, png, bmp).
  // `~` is expanded; relative paths are resolved against this file's folder.
  "folderPath": "",

  // Folder the composed wallpaper.jpg is written to.
  "destFolder": "",

  // Wallpaper size in pixels, usually your screen resolution.
  "width": 0,
  "height": 0,

  // Grid of square tiles. Leftover space becomes black gaps.
  "rows": 0,
  "cols": 0,

  // Seconds between update cycles, picked at random in [minInterval, maxInterval].
  "minInterval": 3,
  "maxInterval": 10

  // Number of decoded covers kept in memory (default: 10)
  // "cacheCapacity": 10,

  // JPEG quality of the written wallpaper, 1 to 100 (default: 95)
  // "jpegQuality": 95
}
"#
    .to_string()
}

/// Creates a configuration file with the template content.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn create_config_file(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, generate_config_template())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, TesseraConfig};

    #[test]
    fn test_template_parses_with_defaults() {
        let config =
            TesseraConfig::from_jsonc(&generate_config_template(), Path::new("t.jsonc")).unwrap();
        assert_eq!(config, TesseraConfig::default());
    }

    #[test]
    fn test_template_fails_validation_until_edited() {
        let config =
            TesseraConfig::from_jsonc(&generate_config_template(), Path::new("t.jsonc")).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_template_mentions_every_key() {
        let template = generate_config_template();
        for key in [
            "folderPath",
            "destFolder",
            "width",
            "height",
            "rows",
            "cols",
            "minInterval",
            "maxInterval",
            "cacheCapacity",
            "jpegQuality",
        ] {
            assert!(template.contains(key), "template is missing {key}");
        }
    }

    #[test]
    fn test_create_config_file_creates_parents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("config.jsonc");
        create_config_file(&path).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), generate_config_template());
    }
}
