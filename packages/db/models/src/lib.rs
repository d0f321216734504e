#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Database models for `Changes`.
//!
//! These are the records persisted in a version snapshot and consumed by the
//! changelog front end: commits, their authors, and the pull requests they
//! were merged through.

pub mod author;
pub mod commit;
pub mod pull;
pub mod snapshot;

pub use author::{Author, GHOST_AVATAR, GHOST_ID, GHOST_URL, GHOST_USER};
pub use commit::Commit;
pub use pull::{Label, PrState, PullRequest};
pub use snapshot::Snapshot;
