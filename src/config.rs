//! Run configuration
//!
//! An optional YAML file collecting what would otherwise be passed on the
//! command line.
//!
//! ## Configuration Format
//!
//! ```yaml
//! files:
//!   - tests/*.description.json
//! timeout: 5s
//! max_concurrency: 16
//! follow_redirects: false
//! description:
//!   baseurl: http://localhost:3000
//!   ok:
//!     - /
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::description::DescriptionDocument;
use crate::harness::HarnessOptions;

/// Errors that can occur during configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Description files or globs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,

    /// Per-request timeout
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,

    /// Maximum requests in flight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,

    /// Follow redirects (absent = follow)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_redirects: Option<bool>,

    /// Inline description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<DescriptionDocument>,
}

impl RunConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write configuration to a YAML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Generate a starter configuration
    pub fn default_config() -> Self {
        RunConfig {
            files: vec!["*.description.json".to_string()],
            timeout: Some(Duration::from_secs(10)),
            max_concurrency: None,
            follow_redirects: None,
            description: None,
        }
    }

    /// Convert to harness options
    pub fn to_harness_options(&self) -> HarnessOptions {
        HarnessOptions {
            file: None,
            files: self.files.clone(),
            description: self.description.clone(),
            descriptions: Vec::new(),
            timeout: self.timeout,
            max_concurrency: self.max_concurrency,
            follow_redirects: self.follow_redirects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{DescriptionError, merge};

    const SAMPLE_CONFIG: &str = r"
files:
  - tests/*.description.json
  - smoke.json
timeout: 1500ms
max_concurrency: 4
follow_redirects: false
description:
  baseurl: http://localhost:3000
  endpoints:
    /admin: 401
  ok:
    - /
";

    #[test]
    fn test_parse_config() {
        let config = RunConfig::from_yaml(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.files, vec!["tests/*.description.json", "smoke.json"]);
        assert_eq!(config.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.max_concurrency, Some(4));
        assert_eq!(config.follow_redirects, Some(false));

        let description = config.description.unwrap();
        assert_eq!(description.baseurl, "http://localhost:3000");
        assert_eq!(description.endpoints.unwrap().get("/admin"), Some(&401));
    }

    #[test]
    fn test_empty_config() {
        let config = RunConfig::from_yaml("{}").unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn test_bad_timeout() {
        assert!(RunConfig::from_yaml("timeout: soon").is_err());
    }

    #[test]
    fn test_harness_options() {
        let options = RunConfig::from_yaml(SAMPLE_CONFIG)
            .unwrap()
            .to_harness_options();
        assert!(options.file.is_none());
        assert_eq!(options.files.len(), 2);
        assert_eq!(options.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(options.follow_redirects, Some(false));
        assert!(options.description.is_some());
    }

    #[test]
    fn test_roundtrip() {
        let config = RunConfig::default_config();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("timeout: 10s"));
        assert_eq!(RunConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_inline_description_status_checked_at_merge() {
        let config = RunConfig::from_yaml(
            r"
description:
  baseurl: http://localhost:3000
  endpoints:
    /x: 42
",
        )
        .unwrap();

        let err = merge(config.description.as_ref()).unwrap_err();
        assert!(matches!(
            err,
            DescriptionError::InvalidStatus { status: 42, .. }
        ));
    }

    #[test]
    fn test_write_starter_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pageup.yaml");

        RunConfig::default_config().to_file(&path).unwrap();

        let loaded = RunConfig::from_file(&path).unwrap();
        assert_eq!(loaded, RunConfig::default_config());
        assert_eq!(loaded.files, vec!["*.description.json"]);
    }
}
