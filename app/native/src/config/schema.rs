//! JSON Schema for the configuration file.

use super::TesseraConfig;

/// Generates a JSON Schema for the Tessera configuration.
#[must_use]
pub fn generate_schema() -> schemars::Schema {
    let mut schema = schemars::schema_for!(TesseraConfig);

    if let Some(obj) = schema.as_object_mut() {
        obj.insert(
            "$id".to_string(),
            serde_json::json!("https://raw.githubusercontent.com/tessera-wallpaper/tessera/main/tessera.schema.json"),
        );
    }

    schema
}

/// Generates the schema as pretty-printed JSON.
#[must_use]
pub fn generate_schema_json() -> String {
    serde_json::to_string_pretty(&generate_schema()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_describes_config_keys() {
        let parsed: serde_json::Value = serde_json::from_str(&generate_schema_json()).unwrap();

        assert!(parsed["$id"].as_str().unwrap().contains("tessera.schema.json"));
        assert_eq!(parsed["title"], "TesseraConfig");
        for key in ["folderPath", "destFolder", "width", "rows", "minInterval", "jpegQuality"] {
            assert!(parsed["properties"][key].is_object(), "missing {key}");
        }
    }
}
