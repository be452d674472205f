//! Project configuration for contract runs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::spec::RequestDefaults;

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the service under test
    pub base_url: String,

    /// HTTP headers sent with every request (API keys, etc.)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Transport timeout per request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Allowed distance between a server timestamp and the local clock
    #[serde(default = "default_timestamp_tolerance_secs")]
    pub timestamp_tolerance_secs: u64,

    /// Run scenarios on parallel threads
    #[serde(default)]
    pub parallel: bool,

    /// Dump all request/response pairs to JSONL files
    #[serde(default)]
    pub dump: bool,

    /// Directory for dump files (default: ".apicontract/dumps")
    #[serde(default)]
    pub dump_dir: Option<PathBuf>,
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_timestamp_tolerance_secs() -> u64 {
    24 * 60 * 60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://reqres.in".to_string(),
            headers: BTreeMap::new(),
            timeout_secs: default_timeout_secs(),
            timestamp_tolerance_secs: default_timestamp_tolerance_secs(),
            parallel: false,
            dump: false,
            dump_dir: None,
        }
    }
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

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "json" => serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string())),
            "yaml" | "yml" => {
                serde_yml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            _ => toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Load from default location (.apicontract.toml)
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_from_dir(Path::new("."))
    }

    /// Look for a config file in `dir`, falling back to defaults.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let candidates = [
            ".apicontract.toml",
            ".apicontract.json",
            ".apicontract.yaml",
            "apicontract.toml",
        ];

        for name in candidates {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }

        // No config file, return default
        Ok(Self::default())
    }

    /// Base request layer every call is resolved against.
    #[must_use]
    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            base_url: Some(self.base_url.clone()),
            headers: self.headers.clone(),
            ..RequestDefaults::default()
        }
    }

    /// Dump directory, defaulting to `.apicontract/dumps`
    #[must_use]
    pub fn dump_path(&self) -> PathBuf {
        self.dump_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".apicontract/dumps"))
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# apicontract configuration

# Service under test
base_url = "https://reqres.in"

# Per-request transport timeout in seconds
timeout_secs = 10

# Allowed skew between server timestamps (e.g. updatedAt) and the local clock
timestamp_tolerance_secs = 86400

# Run scenarios on parallel threads
# parallel = true

# Dump all request/response pairs to JSONL files (default: false)
# dump = true
# dump_dir = ".apicontract/dumps"

# Headers sent with every request
[headers]
# x-api-key = "reqres-free-v1"
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
        assert_eq!(config.base_url, "https://reqres.in");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.timestamp_tolerance_secs, 86_400);
        assert!(!config.parallel);
    }

    #[test]
    fn parse_toml() {
        let toml = r#"
base_url = "http://localhost:3000"
timeout_secs = 3

[headers]
x-api-key = "reqres-free-v1"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.timestamp_tolerance_secs, 86_400);
        assert_eq!(
            config.headers.get("x-api-key"),
            Some(&"reqres-free-v1".to_string())
        );
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.toml");
        std::fs::write(&path, "timestamp_tolerance_secs = -5\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn example_config_parses() {
        let config: Config = toml::from_str(Config::example()).unwrap();
        assert_eq!(config.base_url, "https://reqres.in");
        assert!(config.headers.is_empty());
    }

    #[test]
    fn load_json_and_yaml_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("cfg.json");
        std::fs::write(&json_path, r#"{"base_url": "http://json.local", "parallel": true}"#).unwrap();
        let config = Config::load(&json_path).unwrap();
        assert_eq!(config.base_url, "http://json.local");
        assert!(config.parallel);

        let yaml_path = dir.path().join("cfg.yaml");
        std::fs::write(&yaml_path, "base_url: http://yaml.local\ndump: true\n").unwrap();
        let config = Config::load(&yaml_path).unwrap();
        assert_eq!(config.base_url, "http://yaml.local");
        assert!(config.dump);
    }

    #[test]
    fn load_from_dir_prefers_first_candidate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".apicontract.toml"),
            "base_url = \"http://toml.local\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(".apicontract.json"),
            r#"{"base_url": "http://json.local"}"#,
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.base_url, "http://toml.local");
    }

    #[test]
    fn load_from_empty_dir_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.base_url, "https://reqres.in");
    }

    #[test]
    fn load_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "base_url = ").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_, _)));
    }

    #[test]
    fn request_defaults_carry_base_url_and_headers() {
        let mut config = Config::default();
        config.headers.insert("x-api-key".into(), "k".into());
        let defaults = config.request_defaults();
        assert_eq!(defaults.base_url.as_deref(), Some("https://reqres.in"));
        assert_eq!(defaults.headers["x-api-key"], "k");
        assert_eq!(defaults.path, None);
    }

    #[test]
    fn parse_toml_ignores_unknown_keys() {
        let toml = r#"
base_url = "http://localhost:3000"
spec = "openapi.yaml"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.base_url, "http://localhost:3000");
    }
}
