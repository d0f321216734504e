use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ConfigError;

/// Declarative description of one version's commit range.
///
/// Fields the pipeline does not interpret are kept in `extra` so that they
/// survive into the published version index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionConfig {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
    #[serde(default)]
    pub from_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_tag: Option<String>,
    #[serde(default)]
    pub releases: Vec<ReleaseConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named sub-release boundary within a version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseConfig {
    pub name: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
    #[serde(default)]
    pub from_ref: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VersionConfig {
    /// File name of the config for a given owner, repository and version.
    #[must_use]
    pub fn file_name(owner: &str, repo: &str, version: &str) -> String {
        format!("{owner}.{repo}.{version}.json")
    }

    /// Split a config file name into `(owner, repo, version)`.
    #[must_use]
    pub fn parse_file_name(file_name: &str) -> Option<(&str, &str, &str)> {
        let stem = file_name.strip_suffix(".json")?;
        let mut parts = stem.splitn(3, '.');
        let owner = parts.next().filter(|s| !s.is_empty())?;
        let repo = parts.next().filter(|s| !s.is_empty())?;
        let version = parts.next().filter(|s| !s.is_empty())?;
        Some((owner, repo, version))
    }

    /// Load the config for a version from `configs_dir`.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read or parsed
    /// * If the config does not name a `ref`, or its releases are malformed
    pub fn load(
        configs_dir: &Path,
        owner: &str,
        repo: &str,
        version: &str,
    ) -> Result<Self, ConfigError> {
        let path = configs_dir.join(Self::file_name(owner, repo, version));
        let mut config = Self::load_from_path(&path)?;
        if config.name.is_empty() {
            config.name = version.to_string();
        }
        Ok(config)
    }

    /// Load and validate a config file.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read or parsed
    /// * If the config does not name a `ref`, or its releases are malformed
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        log::debug!("Loading version config from {display}");

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: display.clone(),
            source,
        })?;

        config.validate().map_err(|message| ConfigError::Invalid {
            path: display,
            message,
        })?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.ref_name.is_empty() {
            return Err("`ref` cannot be empty".to_string());
        }

        for (i, release) in self.releases.iter().enumerate() {
            if release.name.is_empty() {
                return Err(format!("release #{i} has no name"));
            }
            if self.releases[..i].iter().any(|r| r.name == release.name) {
                return Err(format!("release \"{}\" is declared twice", release.name));
            }
        }

        Ok(())
    }

    /// The branch or tag to clone; defaults to `ref`.
    #[must_use]
    pub fn git_tag(&self) -> &str {
        self.git_tag
            .as_deref()
            .filter(|tag| !tag.is_empty())
            .unwrap_or(&self.ref_name)
    }
}

/// Numeric ordering key for a dotted version name.
///
/// The first four components are read as base-100 digits, missing components
/// count as zero, so `4.3` sorts above `4.2.1`.
#[must_use]
pub fn version_sort_key(version: &str) -> u64 {
    let mut components = version.split('.');

    (0..4).fold(0, |value, _| {
        let component = components
            .next()
            .and_then(|c| c.trim().parse::<u64>().ok())
            .unwrap_or(0)
            .min(99);
        value * 100 + component
    })
}
