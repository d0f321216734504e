#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! GitHub GraphQL fetcher for `Changes`.
//!
//! The GraphQL API cannot look up an arbitrary list of commits, but it does
//! accept many aliased sub-queries in a single request. Commit metadata is
//! therefore requested in batches with one `commit_<hash>` alias per commit,
//! paced to stay clear of the secondary rate limits.

pub mod client;
pub mod query;

pub use client::{
    API_DELAY, API_MAX_RETRIES, BatchSchedule, COMMITS_PER_PAGE, FetchError, GRAPHQL_URL,
    GraphQlClient, RetryPolicy,
};
