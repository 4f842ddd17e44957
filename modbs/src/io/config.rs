//! Build configuration loaded for `modbs plan` / `modbs apply`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::types::{JsonMap, MissingConfigField};

/// Run configuration.
///
/// Kept as an opaque JSON object: the planner echoes it verbatim into the plan
/// and only the typed accessors below interpret individual keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildConfig(JsonMap);

impl BuildConfig {
    pub fn from_map(map: JsonMap) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &JsonMap {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Workspace root from `paths.root`.
    pub fn root_path(&self) -> Result<PathBuf, MissingConfigField> {
        self.0
            .get("paths")
            .and_then(|paths| non_empty_str(paths.get("root")))
            .map(PathBuf::from)
            .ok_or_else(|| missing("paths.root"))
    }

    pub fn profile_name(&self) -> Result<String, MissingConfigField> {
        non_empty_str(self.0.get("profile_name"))
            .map(str::to_string)
            .ok_or_else(|| missing("profile_name"))
    }

    /// LOOT mode from `loot.mode`, or a flat `"loot.mode"` key.
    pub fn loot_mode(&self) -> Result<String, MissingConfigField> {
        self.0
            .get("loot")
            .and_then(|loot| non_empty_str(loot.get("mode")))
            .or_else(|| non_empty_str(self.0.get("loot.mode")))
            .map(str::to_string)
            .ok_or_else(|| missing("loot.mode"))
    }

    /// `paths` object, or empty when absent.
    pub fn paths(&self) -> JsonMap {
        self.0
            .get("paths")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
}

fn missing(field: &str) -> MissingConfigField {
    MissingConfigField {
        field: field.to_string(),
    }
}

/// Configuration file that could not be read as a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidConfigError {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for InvalidConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid config {}: {}", self.path.display(), self.reason)
    }
}

impl std::error::Error for InvalidConfigError {}

/// Load a build config from a `.json` or `.toml` file.
pub fn load_config(path: &Path) -> Result<BuildConfig> {
    debug!(path = %path.display(), "loading build config");
    let invalid = |reason: String| InvalidConfigError {
        path: path.to_path_buf(),
        reason,
    };

    let contents = fs::read_to_string(path).map_err(|err| invalid(err.to_string()))?;
    let value: Value = if is_toml(path) {
        let table: toml::Table =
            toml::from_str(&contents).map_err(|err| invalid(err.to_string()))?;
        serde_json::to_value(table).context("convert toml config to json")?
    } else {
        serde_json::from_str(&contents).map_err(|err| invalid(err.to_string()))?
    };

    match value {
        Value::Object(map) => Ok(BuildConfig(map)),
        _ => Err(invalid("top level must be an object".to_string()).into()),
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> BuildConfig {
        serde_json::from_value(value).expect("config")
    }

    #[test]
    fn accessors_read_nested_keys() {
        let cfg = config(json!({
            "profile_name": "MVP",
            "paths": {"root": "/srv/build"},
            "loot": {"mode": "mock"}
        }));
        assert_eq!(cfg.root_path().expect("root"), PathBuf::from("/srv/build"));
        assert_eq!(cfg.profile_name().expect("profile"), "MVP");
        assert_eq!(cfg.loot_mode().expect("mode"), "mock");
        assert_eq!(cfg.paths()["root"], "/srv/build");
    }

    #[test]
    fn loot_mode_falls_back_to_flat_key() {
        let cfg = config(json!({"loot.mode": "blocked"}));
        assert_eq!(cfg.loot_mode().expect("mode"), "blocked");
    }

    #[test]
    fn missing_fields_are_named() {
        let cfg = config(json!({"profile_name": "", "paths": "nope"}));
        assert_eq!(cfg.root_path().unwrap_err().field, "paths.root");
        assert_eq!(cfg.profile_name().unwrap_err().field, "profile_name");
        assert_eq!(cfg.loot_mode().unwrap_err().field, "loot.mode");
        assert!(cfg.paths().is_empty());
    }

    #[test]
    fn loads_json_and_toml() {
        let temp = tempfile::tempdir().expect("tempdir");
        let json_path = temp.path().join("config.json");
        fs::write(
            &json_path,
            r#"{"profile_name":"MVP","loot":{"mode":"mock"}}"#,
        )
        .expect("write json");
        let toml_path = temp.path().join("config.toml");
        fs::write(
            &toml_path,
            "profile_name = \"MVP\"\n\n[loot]\nmode = \"mock\"\n",
        )
        .expect("write toml");

        let from_json = load_config(&json_path).expect("json");
        let from_toml = load_config(&toml_path).expect("toml");
        assert_eq!(from_json, from_toml);
    }

    /// Ensures unreadable or non-object configs surface as typed errors.
    #[test]
    fn invalid_configs_are_typed_errors() {
        let temp = tempfile::tempdir().expect("tempdir");
        let array_path = temp.path().join("array.json");
        fs::write(&array_path, "[1, 2]").expect("write");
        let broken_path = temp.path().join("broken.json");
        fs::write(&broken_path, "{not json").expect("write");

        for path in [
            array_path,
            broken_path,
            temp.path().join("missing.json"),
        ] {
            let err = load_config(&path).unwrap_err();
            let invalid = err
                .downcast_ref::<InvalidConfigError>()
                .expect("invalid config error");
            assert_eq!(invalid.path, path);
        }
    }
}
