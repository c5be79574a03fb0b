//! Project configuration for collection annotation

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::assertion::MergeStrategy;
use crate::matcher::MatchPolicy;
use crate::walker::Options;

/// Project configuration. Every field can be overridden on the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Postman collection to annotate (JSON or YAML)
    #[serde(default)]
    pub collection: Option<PathBuf>,

    /// OpenAPI / Swagger specification (JSON or YAML)
    #[serde(default)]
    pub spec: Option<PathBuf>,

    /// Directory for the annotated collection (default: current directory)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Also write the run report as JSON to this path
    #[serde(default)]
    pub summary: Option<PathBuf>,

    /// Add status-code assertions next to schema assertions
    #[serde(default)]
    pub status_code_check: bool,

    /// "strict" (default) or "prefix"
    #[serde(default)]
    pub match_policy: MatchPolicy,

    /// "append" (default) or "replace"
    #[serde(default)]
    pub merge: MergeStrategy,
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from default location (.posv.toml)
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".posv.toml", ".posv.json", "posv.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Walker options derived from this config.
    #[must_use]
    pub fn options(&self) -> Options {
        Options {
            status_code_check: self.status_code_check,
            match_policy: self.match_policy,
            merge: self.merge,
        }
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# posv configuration

# Postman collection to annotate (JSON or YAML)
collection = "postman-collection.json"

# OpenAPI 3.x or Swagger 2.0 specification (JSON or YAML)
spec = "openapi.yaml"

# Where <collection>_with_validation.json is written (default: current directory)
# output_dir = "dist"

# Also write the run report as JSON
# summary = "dist/summary.json"

# Add status-code assertions for the declared 2xx codes
status_code_check = false

# Path matching: "strict" (same segment count) or "prefix" (one path may extend the other)
match_policy = "strict"

# Earlier injected blocks: "append" (keep, add again) or "replace" (swap in place)
merge = "append"
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.collection.is_none());
        assert!(!config.status_code_check);
        assert_eq!(config.options(), Options::default());
    }

    #[test]
    fn parse_toml() {
        let toml = r#"
collection = "pets.postman.json"
spec = "pets.yaml"
output_dir = "dist"
status_code_check = true
match_policy = "prefix"
merge = "replace"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.collection, Some(PathBuf::from("pets.postman.json")));
        assert_eq!(config.spec, Some(PathBuf::from("pets.yaml")));
        assert_eq!(config.output_dir, Some(PathBuf::from("dist")));
        let options = config.options();
        assert!(options.status_code_check);
        assert_eq!(options.match_policy, MatchPolicy::Prefix);
        assert_eq!(options.merge, MergeStrategy::Replace);
    }

    #[test]
    fn example_parses() {
        let config: Config = toml::from_str(Config::example()).unwrap();
        assert_eq!(config.spec, Some(PathBuf::from("openapi.yaml")));
        assert_eq!(config.match_policy, MatchPolicy::Strict);
    }

    #[test]
    fn load_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posv.json");
        std::fs::write(&path, r#"{"spec": "api.json", "status_code_check": true}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.spec, Some(PathBuf::from("api.json")));
        assert!(config.status_code_check);
    }

    #[test]
    fn load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/.posv.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }

    #[test]
    fn unknown_policy_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".posv.toml");
        std::fs::write(&path, "match_policy = \"fuzzy\"\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }
}
