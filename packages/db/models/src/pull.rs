use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequest {
    pub id: String,
    pub public_id: u64,
    pub url: String,
    pub diff_url: String,
    pub patch_url: String,

    pub title: String,
    pub state: PrState,
    pub is_draft: bool,
    pub authored_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub target_branch: String,
    #[serde(default)]
    pub labels: Vec<Label>,

    #[serde(default)]
    pub commits: Vec<String>,
}

impl PullRequest {
    /// Link another commit to this pull request.
    ///
    /// Returns `false` if the commit was already linked.
    pub fn link_commit(&mut self, hash: &str) -> bool {
        if self.commits.iter().any(|existing| existing == hash) {
            return false;
        }
        self.commits.push(hash.to_string());
        true
    }

    /// Returns `false` if the commit was not linked.
    pub fn unlink_commit(&mut self, hash: &str) -> bool {
        let before = self.commits.len();
        self.commits.retain(|existing| existing != hash);
        self.commits.len() != before
    }

    /// Sort labels by name, the order the front end lists them in.
    pub fn sort_labels(&mut self) {
        self.labels.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrState {
    Open,
    Closed,
    Merged,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Label {
    pub id: String,
    pub name: String,
    /// Hex color, including the leading `#`.
    pub color: String,
}
