#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! File storage for `Changes` snapshots and the published version index.

mod store;
mod versions;

pub use store::{SnapshotStore, StoreError};
pub use versions::{publish_version_index, versions_file_name};
