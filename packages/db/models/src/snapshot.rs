use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Author, Commit, PullRequest};

/// One version's fully reconciled dataset, as written to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub generated_at: i64,
    #[serde(default)]
    pub log: Vec<String>,
    #[serde(default)]
    pub release_logs: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub authors: BTreeMap<String, Author>,
    #[serde(default)]
    pub commits: BTreeMap<String, Commit>,
    #[serde(default)]
    pub pulls: BTreeMap<u64, PullRequest>,
}
