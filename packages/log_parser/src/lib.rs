#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Commit log parsing for `Changes`.
//!
//! Turns the output of `git log --pretty=full` into `Commit` records,
//! detecting merge commits and cherry-picks along the way.

pub mod parser;

pub use parser::{LogParseError, ParsedLog, parse_commit_log, parse_commit_log_with};
