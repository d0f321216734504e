#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! The `changes` command line.
//!
//! `compose` builds the snapshot for one repository version by chaining the
//! git backend, the log parser, the release indexer, the GraphQL fetcher and
//! the reconciler. `publish` writes the version index consumed by the site.

mod cli;
mod error;
mod pipeline;

pub use cli::{API_URL_VAR, Cli, Command, REPO_URL_VAR, run};
pub use error::{ExitCode, PipelineError};
pub use pipeline::Pipeline;
