//! Unified per-repository version index.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use changes_config::{VersionConfig, version_sort_key};

use crate::store::{StoreError, write_json_atomic};

#[must_use]
pub fn versions_file_name(owner: &str, repo: &str) -> String {
    format!("{owner}.{repo}.versions.json")
}

/// Publish one version index per repository found in `configs_dir`.
///
/// Every `<owner>.<repo>.<version>.json` config is loaded and grouped by
/// owner and repository. Each group is written to `out_dir` sorted from the
/// newest version to the oldest, with every version's releases reversed so
/// the latest release comes first.
///
/// # Returns
///
/// The paths of the written index files.
///
/// # Errors
///
/// Returns an error if a config cannot be loaded or an index cannot be
/// written.
pub fn publish_version_index(
    configs_dir: &Path,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, StoreError> {
    let entries = fs::read_dir(configs_dir).map_err(|source| StoreError::Read {
        path: configs_dir.display().to_string(),
        source,
    })?;

    let mut grouped: BTreeMap<(String, String), Vec<VersionConfig>> = BTreeMap::new();
    let mut config_count = 0;

    for entry in entries {
        let entry = entry.map_err(|source| StoreError::Read {
            path: configs_dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        let Some((owner, repo, version)) = VersionConfig::parse_file_name(&file_name) else {
            continue;
        };

        let mut config = VersionConfig::load_from_path(&path)?;
        if config.name.is_empty() {
            config.name = version.to_string();
        }

        grouped
            .entry((owner.to_string(), repo.to_string()))
            .or_default()
            .push(config);
        config_count += 1;
    }
    log::info!("    Found {config_count} config files.");

    let mut written = Vec::with_capacity(grouped.len());
    for ((owner, repo), mut versions) in grouped {
        versions.sort_by(|a, b| {
            version_sort_key(&b.name)
                .cmp(&version_sort_key(&a.name))
                .then_with(|| b.name.cmp(&a.name))
        });
        for config in &mut versions {
            config.releases.reverse();
        }

        let path = out_dir.join(versions_file_name(&owner, &repo));
        write_json_atomic(&path, &versions)?;
        log::info!("    Published version config for \"{owner}/{repo}\".");
        written.push(path);
    }

    Ok(written)
}
