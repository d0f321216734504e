//! Git backend trait.

use std::path::{Path, PathBuf};

use changes_git_backend_models::{CheckoutSpec, GitBackendError};

/// Git operations used to extract a version's commit history.
///
/// Ranges follow git's `from..to` semantics: commits reachable from `to` but
/// not from `from`, newest first.
#[async_trait::async_trait]
pub trait GitBackend: Send + Sync {
    /// Prepare a fresh shallow clone of the repository.
    ///
    /// The managed checkout directory is cleared first. The clone is limited
    /// to the history of `spec.git_tag` and then hard-reset to `spec.commit`
    /// when the two differ.
    ///
    /// # Returns
    ///
    /// The path of the cloned working tree.
    ///
    /// # Errors
    ///
    /// Returns `GitBackendError::CommandFailed` if cloning or resetting fails,
    /// or `GitBackendError::Io` if the checkout directory cannot be prepared.
    async fn checkout(&self, spec: &CheckoutSpec) -> Result<PathBuf, GitBackendError>;

    /// Count the commits in `from..to`.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails or its output exceeds the buffer ceiling.
    async fn count_commits(
        &self,
        repo_dir: &Path,
        from: &str,
        to: &str,
    ) -> Result<usize, GitBackendError>;

    /// Extract the log of `from..to` in git's "full" pretty format.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails or its output exceeds the buffer ceiling.
    async fn commit_log(
        &self,
        repo_dir: &Path,
        from: &str,
        to: &str,
    ) -> Result<String, GitBackendError>;

    /// List the full hashes in `from..to`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails or its output exceeds the buffer ceiling.
    async fn list_commits(
        &self,
        repo_dir: &Path,
        from: &str,
        to: &str,
    ) -> Result<Vec<String>, GitBackendError>;

    /// Where `checkout` places the clone of `repo`.
    fn checkout_path(&self, repo: &str) -> PathBuf;
}
