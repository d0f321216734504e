//! GraphQL query text.

/// Prefix of the alias each commit sub-query is stored under.
pub const COMMIT_ALIAS_PREFIX: &str = "commit_";

pub const RATE_LIMIT_FIELDS: &str = "rateLimit { limit cost nodeCount remaining resetAt }";

#[must_use]
pub fn commit_alias(hash: &str) -> String {
    format!("{COMMIT_ALIAS_PREFIX}{hash}")
}

/// Query that only asks for the current rate limit status.
#[must_use]
pub fn rate_limit_query() -> String {
    format!("query {{ {RATE_LIMIT_FIELDS} }}")
}

/// Sub-query for one commit's authors and associated pull requests.
#[must_use]
pub fn commit_query(owner: &str, repo: &str, hash: &str) -> String {
    format!(
        r#"{alias}: repository(owner: "{owner}", name: "{repo}") {{
  object(expression: "{hash}") {{
    ... on Commit {{
      oid
      commitUrl
      messageHeadline
      messageBody
      authors(first: 12) {{
        edges {{ node {{ user {{ login avatarUrl url id }} }} }}
      }}
      associatedPullRequests(first: 20) {{
        edges {{
          node {{
            id
            number
            url
            title
            state
            isDraft
            createdAt
            updatedAt
            baseRef {{ name repository {{ nameWithOwner }} }}
            author {{ login avatarUrl url ... on User {{ id }} }}
            labels(first: 12) {{
              edges {{ node {{ id name color }} }}
            }}
          }}
        }}
      }}
    }}
  }}
}}"#,
        alias = commit_alias(hash)
    )
}

/// Aggregate query for a batch of commits plus the rate limit status.
#[must_use]
pub fn batch_query(owner: &str, repo: &str, hashes: &[String]) -> String {
    let mut query = format!("query {{\n{RATE_LIMIT_FIELDS}\n");
    for hash in hashes {
        query.push_str(&commit_query(owner, repo, hash));
        query.push('\n');
    }
    query.push('}');
    query
}

/// Render a query into the JSON request body.
#[must_use]
pub fn request_body(query: &str) -> serde_json::Value {
    serde_json::json!({ "query": query })
}
