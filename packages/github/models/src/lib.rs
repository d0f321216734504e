#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! GitHub GraphQL API response models.
//!
//! Only the fields requested by the commit metadata query are modelled. Field
//! names follow the GraphQL schema through `camelCase` renaming.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use changes_db_models::PrState;

/// Envelope of every GraphQL response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQlError>,
}

/// An error the server reported alongside (partial) data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphQlError {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    pub limit: u64,
    pub cost: u64,
    pub node_count: u64,
    pub remaining: u64,
    pub reset_at: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitData {
    pub rate_limit: RateLimit,
}

/// A GraphQL connection, reduced to its edges.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

impl<T> Connection<T> {
    /// The nodes of the connection in API order.
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|edge| &edge.node)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Edge<T> {
    pub node: T,
}

/// A user or bot account.
///
/// Bots are not `User` objects, so the `id` fragment does not apply to them
/// and it comes back absent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUser {
    pub login: String,
    pub avatar_url: String,
    pub url: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// Commit authorship entry; `user` is null for unlinked emails.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawCommitAuthor {
    pub user: Option<RawUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRepository {
    pub name_with_owner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawBaseRef {
    pub name: String,
    pub repository: RawRepository,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawLabel {
    pub id: String,
    pub name: String,
    /// Hex color without the leading `#`.
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPullRequest {
    pub id: String,
    pub number: u64,
    pub url: String,
    pub title: String,
    pub state: PrState,
    #[serde(default)]
    pub is_draft: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Null once the base branch has been deleted.
    pub base_ref: Option<RawBaseRef>,
    pub author: Option<RawUser>,
    #[serde(default)]
    pub labels: Connection<RawLabel>,
}

impl RawPullRequest {
    /// Whether the pull request was opened against `name_with_owner`.
    #[must_use]
    pub fn targets(&self, name_with_owner: &str) -> bool {
        self.base_ref
            .as_ref()
            .is_some_and(|base| base.repository.name_with_owner == name_with_owner)
    }
}

/// Metadata of one commit as returned by the `object(expression:)` query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCommit {
    pub oid: String,
    pub commit_url: String,
    pub message_headline: String,
    pub message_body: String,
    pub authors: Connection<RawCommitAuthor>,
    pub associated_pull_requests: Connection<RawPullRequest>,
}

/// Wrapper the aliased `repository` sub-query resolves to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRepositoryObject {
    pub object: Option<RawCommit>,
}

/// Fetched metadata for a requested hash; `data` is `None` when the API
/// returned nothing for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedCommit {
    pub hash: String,
    pub data: Option<RawCommit>,
}
