use std::collections::BTreeMap;

use changes_config::VersionConfig;
use changes_db_models::Commit;

/// Shortest ref treated as an abbreviated commit hash.
const MIN_ABBREVIATED_HASH: usize = 7;

/// Whether `reference` names the commit `hash`.
///
/// A ref of at least seven hex digits also matches as a hash prefix.
#[must_use]
pub fn refs_match(reference: &str, hash: &str) -> bool {
    if reference.is_empty() {
        return false;
    }
    if reference == hash {
        return true;
    }

    reference.len() >= MIN_ABBREVIATED_HASH
        && reference.len() < hash.len()
        && reference.bytes().all(|b| b.is_ascii_hexdigit())
        && hash.starts_with(&reference.to_ascii_lowercase())
}

/// Resolved boundaries of one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseBounds {
    pub name: String,
    pub from_ref: String,
    pub ref_name: String,
}

/// Resolve the boundaries of every release in `config`.
///
/// An empty `from_ref` continues from the previous release's `ref`; for the
/// first release it falls back to the version's `from_ref`.
#[must_use]
pub fn release_bounds(config: &VersionConfig) -> Vec<ReleaseBounds> {
    let mut previous_ref = config.from_ref.as_str();

    config
        .releases
        .iter()
        .map(|release| {
            let from_ref = if release.from_ref.is_empty() {
                previous_ref
            } else {
                release.from_ref.as_str()
            };
            previous_ref = release.ref_name.as_str();

            ReleaseBounds {
                name: release.name.clone(),
                from_ref: from_ref.to_string(),
                ref_name: release.ref_name.clone(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Window {
    Pending,
    Open,
    Closed,
}

struct Walk<'a> {
    bounds: &'a ReleaseBounds,
    window: Window,
    closes_at_end: bool,
    hashes: Vec<String>,
}

/// Commit logs of the releases of one version.
///
/// Releases whose boundaries do not appear in the version log are reported
/// by `unlocated` and must be filled in with `resolve`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseIndex {
    logs: BTreeMap<String, Vec<String>>,
    unlocated: Vec<ReleaseBounds>,
}

impl ReleaseIndex {
    /// Assign the commits of `log` to the releases of `config`.
    ///
    /// `log` must be ordered oldest first. Merge commits, as flagged in
    /// `commits`, are left out of every release.
    ///
    /// A release whose `from_ref` is the version's own `from_ref` opens at the
    /// first commit; any other release opens right after the commit its
    /// `from_ref` names. An open release takes every commit up to and
    /// including the one its `ref` names, or up to the end of the log when its
    /// `ref` is the version's own `ref`.
    #[must_use]
    pub fn build(
        config: &VersionConfig,
        log: &[String],
        commits: &BTreeMap<String, Commit>,
    ) -> Self {
        let bounds = release_bounds(config);
        let mut walks: Vec<Walk<'_>> = bounds
            .iter()
            .map(|bounds| Walk {
                bounds,
                window: if bounds.from_ref == config.from_ref {
                    Window::Open
                } else {
                    Window::Pending
                },
                closes_at_end: bounds.ref_name == config.ref_name,
                hashes: Vec::new(),
            })
            .collect();

        let last = log.len().saturating_sub(1);
        for (position, hash) in log.iter().enumerate() {
            let is_merge = commits.get(hash).is_some_and(|commit| commit.is_merge);

            for walk in &mut walks {
                match walk.window {
                    Window::Open => {
                        if !is_merge {
                            walk.hashes.push(hash.clone());
                        }
                        if refs_match(&walk.bounds.ref_name, hash)
                            || (walk.closes_at_end && position == last)
                        {
                            walk.window = Window::Closed;
                        }
                    }
                    Window::Pending => {
                        if refs_match(&walk.bounds.from_ref, hash) {
                            walk.window = Window::Open;
                        }
                    }
                    Window::Closed => {}
                }
            }
        }

        let mut index = Self::default();
        for walk in walks {
            if walk.window == Window::Closed {
                index.logs.insert(walk.bounds.name.clone(), walk.hashes);
            } else {
                log::debug!(
                    "Release \"{}\" ({}..{}) is not contained in the version log",
                    walk.bounds.name,
                    walk.bounds.from_ref,
                    walk.bounds.ref_name
                );
                index.unlocated.push(walk.bounds.clone());
            }
        }
        index
    }

    /// Releases the walk could not place.
    #[must_use]
    pub fn unlocated(&self) -> &[ReleaseBounds] {
        &self.unlocated
    }

    #[must_use]
    pub const fn release_logs(&self) -> &BTreeMap<String, Vec<String>> {
        &self.logs
    }

    /// Provide the log of an unlocated release.
    ///
    /// `hashes` are the release's commits in any order git lists them; merge
    /// commits known to `commits` are dropped.
    pub fn resolve(&mut self, name: &str, hashes: Vec<String>, commits: &BTreeMap<String, Commit>) {
        let hashes = hashes
            .into_iter()
            .filter(|hash| !commits.get(hash).is_some_and(|commit| commit.is_merge))
            .collect();

        self.unlocated.retain(|bounds| bounds.name != name);
        self.logs.insert(name.to_string(), hashes);
    }

    #[must_use]
    pub fn into_release_logs(self) -> BTreeMap<String, Vec<String>> {
        self.logs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(json: serde_json::Value) -> VersionConfig {
        serde_json::from_value(json).unwrap()
    }

    fn log(hashes: &[&str]) -> Vec<String> {
        hashes.iter().map(ToString::to_string).collect()
    }

    fn commits(hashes: &[&str], merges: &[&str]) -> BTreeMap<String, Commit> {
        hashes
            .iter()
            .map(|hash| {
                let mut commit = Commit::new(hash.to_string());
                commit.is_merge = merges.contains(hash);
                (hash.to_string(), commit)
            })
            .collect()
    }

    #[test]
    fn test_adjacent_releases_share_boundary_once() {
        let config = config(serde_json::json!({
            "ref": "h5",
            "from_ref": "h1",
            "releases": [
                { "name": "4.2-dev1", "ref": "h3", "from_ref": "h1" },
                { "name": "4.2-dev2", "ref": "h5", "from_ref": "h3" }
            ]
        }));
        let hashes = ["h1", "h2", "h3", "h4", "h5"];

        let index = ReleaseIndex::build(&config, &log(&hashes), &commits(&hashes, &[]));

        assert!(index.unlocated().is_empty());
        assert_eq!(index.release_logs()["4.2-dev1"], vec!["h1", "h2", "h3"]);
        assert_eq!(index.release_logs()["4.2-dev2"], vec!["h4", "h5"]);
    }

    #[test]
    fn test_terminal_release_closes_at_last_position() {
        let config = config(serde_json::json!({
            "ref": "4.2-stable",
            "from_ref": "4.1-stable",
            "releases": [
                { "name": "4.2-beta", "ref": "b2", "from_ref": "4.1-stable" },
                { "name": "4.2-stable", "ref": "4.2-stable", "from_ref": "b2" }
            ]
        }));
        let hashes = ["b1", "b2", "s1", "s2"];

        let index = ReleaseIndex::build(&config, &log(&hashes), &commits(&hashes, &[]));

        assert_eq!(index.release_logs()["4.2-beta"], vec!["b1", "b2"]);
        assert_eq!(index.release_logs()["4.2-stable"], vec!["s1", "s2"]);
    }

    #[test]
    fn test_merge_commits_are_excluded() {
        let config = config(serde_json::json!({
            "ref": "h4",
            "from_ref": "h0",
            "releases": [{ "name": "r", "ref": "h4", "from_ref": "h0" }]
        }));
        let hashes = ["h1", "m2", "h3", "h4"];

        let index = ReleaseIndex::build(&config, &log(&hashes), &commits(&hashes, &["m2"]));

        assert_eq!(index.release_logs()["r"], vec!["h1", "h3", "h4"]);
    }

    #[test]
    fn test_abbreviated_refs_match_by_prefix() {
        assert!(refs_match("46dc277", "46dc277917a93cbf601bbcf0d27d00f6feeec0d5"));
        assert!(refs_match("46DC277", "46dc277917a93cbf601bbcf0d27d00f6feeec0d5"));
        assert!(!refs_match("46dc27", "46dc277917a93cbf601bbcf0d27d00f6feeec0d5"));
        assert!(!refs_match("4.2-stable", "4.2-stable-extra"));
        assert!(!refs_match("", "46dc277917a93cbf601bbcf0d27d00f6feeec0d5"));

        let config = config(serde_json::json!({
            "ref": "end",
            "from_ref": "start",
            "releases": [{ "name": "r", "ref": "bbbbbbb", "from_ref": "aaaaaaa" }]
        }));
        let hashes = [
            "aaaaaaa1111111111111111111111111111111111",
            "ccccccc2222222222222222222222222222222222",
            "bbbbbbb3333333333333333333333333333333333",
        ];

        let index = ReleaseIndex::build(&config, &log(&hashes), &commits(&hashes, &[]));

        assert_eq!(index.release_logs()["r"], vec![hashes[1], hashes[2]]);
    }

    #[test]
    fn test_empty_from_ref_continues_previous_release() {
        let config = config(serde_json::json!({
            "ref": "h4",
            "from_ref": "h0",
            "releases": [
                { "name": "first", "ref": "h2", "from_ref": "" },
                { "name": "second", "ref": "h4", "from_ref": "" }
            ]
        }));

        let bounds = release_bounds(&config);
        assert_eq!(bounds[0].from_ref, "h0");
        assert_eq!(bounds[1].from_ref, "h2");

        let hashes = ["h1", "h2", "h3", "h4"];
        let index = ReleaseIndex::build(&config, &log(&hashes), &commits(&hashes, &[]));

        assert_eq!(index.release_logs()["first"], vec!["h1", "h2"]);
        assert_eq!(index.release_logs()["second"], vec!["h3", "h4"]);
    }

    #[test]
    fn test_releases_outside_the_log_are_unlocated() {
        let config = config(serde_json::json!({
            "ref": "h3",
            "from_ref": "h0",
            "releases": [
                { "name": "missing-start", "ref": "h2", "from_ref": "elsewhere" },
                { "name": "missing-end", "ref": "nowhere", "from_ref": "h0" }
            ]
        }));
        let hashes = ["h1", "h2", "h3"];
        let all = commits(&hashes, &[]);

        let mut index = ReleaseIndex::build(&config, &log(&hashes), &all);

        let names: Vec<&str> = index.unlocated().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["missing-start", "missing-end"]);
        assert!(index.release_logs().is_empty());

        index.resolve("missing-start", log(&["h2", "old"]), &all);
        assert_eq!(index.unlocated().len(), 1);
        assert_eq!(index.release_logs()["missing-start"], vec!["h2", "old"]);
    }

    #[test]
    fn test_resolve_drops_known_merges() {
        let mut index = ReleaseIndex::default();

        index.resolve("r", log(&["m1", "h1"]), &commits(&["m1", "h1"], &["m1"]));

        assert_eq!(index.into_release_logs()["r"], vec!["h1"]);
    }

    #[test]
    fn test_config_is_not_mutated() {
        let config = config(serde_json::json!({
            "ref": "h2",
            "from_ref": "h0",
            "releases": [{ "name": "r", "ref": "h2", "from_ref": "" }]
        }));
        let before = config.clone();

        let _ = ReleaseIndex::build(&config, &log(&["h1", "h2"]), &BTreeMap::new());

        assert_eq!(config, before);
    }
}
