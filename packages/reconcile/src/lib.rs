#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Reconciliation of commit history with GitHub metadata.
//!
//! Parsed commits, fetched pull request and author metadata, and optionally a
//! prior snapshot are merged into the author, commit and pull request maps of
//! a new snapshot. Re-reconciling data that is already part of the maps is
//! idempotent: counts are only bumped for new attributions, a commit is never
//! linked to a pull request twice, and a known pull request keeps the metadata
//! it was first recorded with.

mod reconciler;

pub use reconciler::{Reconciler, canonical_pull};
