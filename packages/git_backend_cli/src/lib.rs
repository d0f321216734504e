#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `git` command-line implementation of the `GitBackend` trait.
//!
//! Partial clones (`--filter=tree:0`) are only available through the git
//! CLI, so every operation shells out to `git` and captures its output with a
//! hard ceiling on the number of bytes read.

mod command;

use std::path::{Path, PathBuf};

use changes_diagnostics::DiagnosticsLog;
use changes_git_backend::GitBackend;
use changes_git_backend_models::{CheckoutSpec, GitBackendError};

pub use command::run_command;

/// Largest amount of output accepted from a single git invocation.
pub const MAX_OUTPUT_BYTES: usize = 32 * 1024 * 1024;

/// Placeholder-based clone URL used when none is configured.
pub const DEFAULT_REPO_URL: &str = "https://github.com/{owner}/{repo}.git";

/// git CLI implementation of `GitBackend`.
#[derive(Debug, Clone)]
pub struct CliGitBackend {
    temp_dir: PathBuf,
    repo_url_template: String,
    diagnostics: DiagnosticsLog,
    max_output: usize,
}

impl CliGitBackend {
    /// Create a backend that clones into subdirectories of `temp_dir`.
    #[must_use]
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            repo_url_template: DEFAULT_REPO_URL.to_string(),
            diagnostics: DiagnosticsLog::disabled(),
            max_output: MAX_OUTPUT_BYTES,
        }
    }

    /// Override the clone URL. `{owner}` and `{repo}` are substituted.
    #[must_use]
    pub fn with_repo_url_template(mut self, template: impl Into<String>) -> Self {
        self.repo_url_template = template.into();
        self
    }

    /// Dump raw git output into the given side log.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticsLog) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Override the output ceiling.
    #[must_use]
    pub const fn with_max_output(mut self, max_output: usize) -> Self {
        self.max_output = max_output;
        self
    }

    #[must_use]
    pub fn repo_url(&self, owner: &str, repo: &str) -> String {
        self.repo_url_template
            .replace("{owner}", owner)
            .replace("{repo}", repo)
    }

    async fn git(&self, cwd: &Path, args: &[&str]) -> Result<String, GitBackendError> {
        run_command("git", args, Some(cwd), self.max_output).await
    }
}

#[async_trait::async_trait]
impl GitBackend for CliGitBackend {
    async fn checkout(&self, spec: &CheckoutSpec) -> Result<PathBuf, GitBackendError> {
        if tokio::fs::try_exists(&self.temp_dir).await? {
            tokio::fs::remove_dir_all(&self.temp_dir).await?;
        }
        tokio::fs::create_dir_all(&self.temp_dir).await?;

        let url = self.repo_url(&spec.owner, &spec.repo);
        log::info!("    Cloning {url} at {}", spec.git_tag);

        self.git(
            &self.temp_dir,
            &[
                "clone",
                "--filter=tree:0",
                "--branch",
                &spec.git_tag,
                "--single-branch",
                &url,
                &spec.repo,
            ],
        )
        .await?;

        let repo_dir = self.checkout_path(&spec.repo);

        if spec.needs_reset() {
            log::info!("    Resetting to {}", spec.commit);
            self.git(&repo_dir, &["reset", "--hard", &spec.commit])
                .await?;
        }

        Ok(repo_dir)
    }

    async fn count_commits(
        &self,
        repo_dir: &Path,
        from: &str,
        to: &str,
    ) -> Result<usize, GitBackendError> {
        let range = format!("{from}..{to}");
        let output = self
            .git(repo_dir, &["log", "--pretty=oneline", &range])
            .await?;
        self.diagnostics.record_raw("_commit_shortlog", &output);

        Ok(output.lines().filter(|line| !line.trim().is_empty()).count())
    }

    async fn commit_log(
        &self,
        repo_dir: &Path,
        from: &str,
        to: &str,
    ) -> Result<String, GitBackendError> {
        let range = format!("{from}..{to}");
        let output = self
            .git(repo_dir, &["log", "--no-decorate", "--pretty=full", &range])
            .await?;
        self.diagnostics.record_raw("_commit_history", &output);

        Ok(output)
    }

    async fn list_commits(
        &self,
        repo_dir: &Path,
        from: &str,
        to: &str,
    ) -> Result<Vec<String>, GitBackendError> {
        let range = format!("{from}..{to}");
        let output = self
            .git(repo_dir, &["log", "--pretty=format:%H", &range])
            .await?;
        self.diagnostics.record_raw("_commit_hashes", &output);

        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect())
    }

    fn checkout_path(&self, repo: &str) -> PathBuf {
        self.temp_dir.join(repo)
    }
}
