#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Per-release commit logs.
//!
//! A version spans `from_ref..ref` and is split into named releases, each with
//! its own boundaries. The release index assigns the version's commits to
//! those releases in a single walk over the log, without touching the
//! version config itself.

mod index;

pub use index::{ReleaseBounds, ReleaseIndex, refs_match, release_bounds};
