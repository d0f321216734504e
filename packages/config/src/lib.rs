#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Configuration for `Changes` pipeline runs.
//!
//! A run is parameterized by three inputs: the per-version config file that
//! declares the commit range and its sub-releases, the run tokens that select
//! the repository and toggle pipeline stages, and the API token taken from the
//! environment.

mod args;
mod token;
mod version;

pub use args::RunArgs;
pub use token::{ApiToken, FALLBACK_TOKEN_VAR, PRIMARY_TOKEN_VAR};
pub use version::{ReleaseConfig, VersionConfig, version_sort_key};

/// Errors that can occur while assembling the run configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required run token is missing or empty.
    #[error("owner, repo, and version cannot be empty (missing `{0}:`)")]
    MissingArgument(&'static str),

    /// Failed to read a config file.
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse a config file.
    #[error("Failed to parse config at {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    /// The config parsed but is unusable.
    #[error("Invalid config at {path}: {message}")]
    Invalid { path: String, message: String },

    /// Neither token variable is set.
    #[error(
        "Unable to find environment variable: `GRAPHQL_TOKEN` (or `GITHUB_TOKEN`). Did you forget to set it in your local environment?"
    )]
    MissingToken,
}
