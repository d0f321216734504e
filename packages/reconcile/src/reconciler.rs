use std::collections::{BTreeMap, BTreeSet};

use changes_db_models::{Author, Commit, Label, PullRequest, Snapshot};
use changes_github_models::{FetchedCommit, RawCommit, RawPullRequest, RawUser};
use changes_log_parser::ParsedLog;

/// Pick the pull request a commit is attributed to.
///
/// GitHub may associate a commit with pull requests in forks or unrelated
/// repositories, so only those targeting `target_repo` are considered. Of
/// those, the first one in API order wins.
#[must_use]
pub fn canonical_pull<'a>(commit: &'a RawCommit, target_repo: &str) -> Option<&'a RawPullRequest> {
    commit
        .associated_pull_requests
        .nodes()
        .find(|pull| pull.targets(target_repo))
}

/// Accumulates the maps of a snapshot.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    log: Vec<String>,
    release_logs: BTreeMap<String, Vec<String>>,
    authors: BTreeMap<String, Author>,
    commits: BTreeMap<String, Commit>,
    pulls: BTreeMap<u64, PullRequest>,
    prior: Option<Snapshot>,
}

impl Reconciler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a prior snapshot, for incremental updates.
    ///
    /// Every map is seeded from `prior`; later stages overwrite what they
    /// re-derive.
    #[must_use]
    pub fn with_prior(prior: Snapshot) -> Self {
        Self {
            log: prior.log.clone(),
            release_logs: prior.release_logs.clone(),
            authors: prior.authors.clone(),
            commits: prior.commits.clone(),
            pulls: prior.pulls.clone(),
            prior: Some(prior),
        }
    }

    #[must_use]
    pub const fn prior(&self) -> Option<&Snapshot> {
        self.prior.as_ref()
    }

    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    #[must_use]
    pub const fn commits(&self) -> &BTreeMap<String, Commit> {
        &self.commits
    }

    #[must_use]
    pub const fn authors(&self) -> &BTreeMap<String, Author> {
        &self.authors
    }

    #[must_use]
    pub const fn pulls(&self) -> &BTreeMap<u64, PullRequest> {
        &self.pulls
    }

    /// Reuse the log, release logs and commits of the prior snapshot as-is.
    pub fn consume_prior_log(&mut self) {
        let Some(prior) = &self.prior else {
            log::warn!("    No existing data to reuse the commit log from.");
            return;
        };
        self.log.clone_from(&prior.log);
        self.release_logs.clone_from(&prior.release_logs);
        self.commits.clone_from(&prior.commits);
    }

    /// Reuse the authors and pull requests of the prior snapshot as-is.
    pub fn consume_prior_pulls(&mut self) {
        let Some(prior) = &self.prior else {
            log::warn!("    No existing data to reuse authors and pull requests from.");
            return;
        };
        self.authors.clone_from(&prior.authors);
        self.pulls.clone_from(&prior.pulls);
    }

    /// Take over a freshly parsed log.
    ///
    /// The commit map becomes the parsed one. Parse with the prior commits so
    /// links made by earlier runs carry over.
    pub fn process_log(&mut self, parsed: ParsedLog) {
        self.log = parsed.log;
        self.commits = parsed.commits;
    }

    pub fn set_release_logs(&mut self, release_logs: BTreeMap<String, Vec<String>>) {
        self.release_logs = release_logs;
    }

    /// Hashes worth fetching metadata for: every non-merge commit, in log
    /// order, followed by commits only known as cherry-pick sources.
    #[must_use]
    pub fn commit_hashes(&self) -> Vec<String> {
        let in_log: BTreeSet<&str> = self.log.iter().map(String::as_str).collect();

        let logged = self.log.iter().filter_map(|hash| self.commits.get(hash));
        let extra = self
            .commits
            .values()
            .filter(|commit| !in_log.contains(commit.hash.as_str()));

        let mut seen = BTreeSet::new();
        logged
            .chain(extra)
            .filter(|commit| !commit.is_merge)
            .filter(|commit| seen.insert(commit.hash.as_str()))
            .map(|commit| commit.hash.clone())
            .collect()
    }

    /// Merge fetched metadata into the maps.
    ///
    /// Only pull requests opened against `target_repo` (`owner/name`) are
    /// linked. A commit that no longer resolves to the pull request it was
    /// linked to is dropped from that pull request's commit list.
    pub fn process_commits(&mut self, fetched: &[FetchedCommit], target_repo: &str) {
        for item in fetched {
            let Some(data) = &item.data else {
                log::warn!(
                    "    Requested data for a commit hash \"{}\", but received nothing.",
                    item.hash
                );
                continue;
            };
            if !self.commits.contains_key(&item.hash) {
                log::warn!(
                    "    Received data for a commit hash \"{}\", but this commit is unknown.",
                    item.hash
                );
                continue;
            }

            self.attribute_commit(&item.hash, data);

            let pull_number =
                canonical_pull(data, target_repo).map(|pull| self.link_pull(&item.hash, pull));

            let previous = self
                .commits
                .get_mut(&item.hash)
                .and_then(|commit| std::mem::replace(&mut commit.pull, pull_number));

            if let Some(stale) = previous.filter(|number| Some(*number) != pull_number)
                && let Some(record) = self.pulls.get_mut(&stale)
                && record.unlink_commit(&item.hash)
            {
                log::debug!(
                    "    Commit \"{}\" moved from pull request #{stale} to {pull_number:?}.",
                    item.hash
                );
            }
        }
    }

    /// Consume the reconciler into a snapshot stamped with `generated_at`.
    #[must_use]
    pub fn into_snapshot(self, generated_at: i64) -> Snapshot {
        Snapshot {
            generated_at,
            log: self.log,
            release_logs: self.release_logs,
            authors: self.authors,
            commits: self.commits,
            pulls: self.pulls,
        }
    }

    /// Record the authors of `hash` in API order.
    ///
    /// Every author node counts, so two unlinked co-authors yield the ghost
    /// twice. Commit counts only grow by the attributions the commit did not
    /// already carry, which keeps re-reconciling a commit idempotent.
    fn attribute_commit(&mut self, hash: &str, data: &RawCommit) {
        let authored_by: Vec<String> = data
            .authors
            .nodes()
            .map(|node| self.resolve_author(node.user.as_ref()))
            .collect();

        let Some(commit) = self.commits.get_mut(hash) else {
            return;
        };
        if commit.authored_by == authored_by {
            return;
        }

        let mut already_counted: BTreeMap<&str, usize> = BTreeMap::new();
        for id in &commit.authored_by {
            *already_counted.entry(id.as_str()).or_default() += 1;
        }
        for id in &authored_by {
            if let Some(remaining) = already_counted.get_mut(id.as_str())
                && *remaining > 0
            {
                *remaining -= 1;
                continue;
            }
            if let Some(author) = self.authors.get_mut(id) {
                author.commit_count += 1;
            }
        }

        commit.authored_by = authored_by;
    }

    /// Link `hash` to `pull`, creating the record on first sight.
    ///
    /// A known pull request keeps its first-seen metadata and only gains the
    /// commit.
    fn link_pull(&mut self, hash: &str, pull: &RawPullRequest) -> u64 {
        if let Some(existing) = self.pulls.get_mut(&pull.number) {
            if existing.id != pull.id {
                log::debug!(
                    "    Pull request #{} is recorded as {} and was fetched as {}.",
                    pull.number,
                    existing.id,
                    pull.id
                );
            }
            existing.link_commit(hash);
            return pull.number;
        }

        let author_id = self.resolve_author(pull.author.as_ref());
        if let Some(author) = self.authors.get_mut(&author_id) {
            author.pull_count += 1;
        }

        let mut record = PullRequest {
            id: pull.id.clone(),
            public_id: pull.number,
            url: pull.url.clone(),
            diff_url: format!("{}.diff", pull.url),
            patch_url: format!("{}.patch", pull.url),
            title: pull.title.clone(),
            state: pull.state,
            is_draft: pull.is_draft,
            authored_by: author_id,
            created_at: pull.created_at,
            updated_at: pull.updated_at,
            target_branch: pull
                .base_ref
                .as_ref()
                .map(|base| base.name.clone())
                .unwrap_or_default(),
            labels: labels_of(pull),
            commits: vec![hash.to_string()],
        };
        record.sort_labels();

        self.pulls.insert(pull.number, record);
        pull.number
    }

    /// Make sure an author record exists and return its id.
    ///
    /// A missing user resolves to the shared ghost record. Bot accounts carry
    /// no id and are keyed by login.
    fn resolve_author(&mut self, user: Option<&RawUser>) -> String {
        let Some(user) = user else {
            let ghost = Author::ghost();
            let id = ghost.id.clone();
            self.authors.entry(id.clone()).or_insert(ghost);
            return id;
        };

        let id = user.id.clone().unwrap_or_else(|| user.login.clone());
        self.authors
            .entry(id.clone())
            .and_modify(|author| {
                author.user.clone_from(&user.login);
                author.avatar.clone_from(&user.avatar_url);
                author.url.clone_from(&user.url);
            })
            .or_insert_with(|| {
                Author::new(
                    id.clone(),
                    user.login.clone(),
                    user.avatar_url.clone(),
                    user.url.clone(),
                )
            });
        id
    }
}

fn labels_of(pull: &RawPullRequest) -> Vec<Label> {
    pull.labels
        .nodes()
        .map(|label| Label {
            id: label.id.clone(),
            name: label.name.clone(),
            color: format!("#{}", label.color),
        })
        .collect()
}
