#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Git backend trait abstraction for `Changes`.
//!
//! This crate defines the `GitBackend` trait that abstracts over the git
//! operations the pipeline needs (cloning, log extraction, range listing), so
//! the pipeline can be driven by a scripted backend in tests.

mod backend;

pub use backend::GitBackend;
pub use changes_git_backend_models::*;
