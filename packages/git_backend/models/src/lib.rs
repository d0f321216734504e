#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Git backend models for `Changes`.
//!
//! This crate defines the inputs and errors of git backend operations,
//! abstracting over the specific git implementation.

/// What to clone and where to pin it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSpec {
    /// Repository owner (organization or user).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch or tag to clone.
    pub git_tag: String,
    /// Commit to reset the clone to.
    pub commit: String,
}

impl CheckoutSpec {
    /// Whether the clone must be reset after cloning `git_tag`.
    #[must_use]
    pub fn needs_reset(&self) -> bool {
        self.git_tag != self.commit
    }
}

/// Errors from git backend operations.
#[derive(Debug, thiserror::Error)]
pub enum GitBackendError {
    /// The git process could not be started.
    #[error("Failed to run `{command}`: {message}")]
    Spawn {
        /// The command line that was attempted.
        command: String,
        /// Error message from the operating system.
        message: String,
    },

    /// The git process exited unsuccessfully.
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        /// The command line that failed.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The git process produced more output than allowed.
    #[error("`{command}` produced more than {limit} bytes of output")]
    OutputLimitExceeded {
        /// The command line that was aborted.
        command: String,
        /// The output ceiling in bytes.
        limit: usize,
    },

    /// The git process produced output that is not valid UTF-8.
    #[error("`{command}` produced invalid UTF-8 output")]
    InvalidOutput {
        /// The command line whose output was rejected.
        command: String,
    },

    /// I/O error.
    #[error("I/O error: {message}")]
    Io {
        /// Error message.
        message: String,
    },
}

impl From<std::io::Error> for GitBackendError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}
