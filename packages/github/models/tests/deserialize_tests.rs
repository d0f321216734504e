use changes_github_models::*;

#[test]
fn test_deserialize_commit_object() {
    let json = serde_json::json!({
        "oid": "46dc277917a93cbf601bbcf0d27d00f6feeec0d5",
        "commitUrl": "https://github.com/godotengine/godot/commit/46dc277",
        "messageHeadline": "Fix typo",
        "messageBody": "",
        "authors": {
            "edges": [
                { "node": { "user": { "login": "akien-mga", "avatarUrl": "https://a/1", "url": "https://github.com/akien-mga", "id": "MDQ6VXNlcjQ3MDE2Mzg=" } } },
                { "node": { "user": null } }
            ]
        },
        "associatedPullRequests": {
            "edges": [
                { "node": {
                    "id": "PR_kwDOAP",
                    "number": 42,
                    "url": "https://github.com/godotengine/godot/pull/42",
                    "title": "Fix typo",
                    "state": "MERGED",
                    "isDraft": false,
                    "createdAt": "2023-01-01T00:00:00Z",
                    "updatedAt": "2023-01-02T00:00:00Z",
                    "baseRef": { "name": "master", "repository": { "nameWithOwner": "godotengine/godot" } },
                    "author": { "login": "dependabot", "avatarUrl": "https://a/2", "url": "https://github.com/apps/dependabot" },
                    "labels": { "edges": [ { "node": { "id": "L1", "name": "bug", "color": "d73a4a" } } ] }
                } }
            ]
        }
    });

    let commit: RawCommit = serde_json::from_value(json).unwrap();

    let authors: Vec<_> = commit.authors.nodes().collect();
    assert_eq!(authors.len(), 2);
    assert_eq!(
        authors[0].user.as_ref().unwrap().id.as_deref(),
        Some("MDQ6VXNlcjQ3MDE2Mzg=")
    );
    assert!(authors[1].user.is_none());

    let pr = commit.associated_pull_requests.nodes().next().unwrap();
    assert_eq!(pr.number, 42);
    assert_eq!(pr.state, PrState::Merged);
    assert!(pr.targets("godotengine/godot"));
    assert!(!pr.targets("godotengine/godot-docs"));
    assert_eq!(pr.author.as_ref().unwrap().id, None);
    assert_eq!(pr.labels.nodes().next().unwrap().color, "d73a4a");
}

#[test]
fn test_non_commit_object_deserializes_empty() {
    let commit: RawCommit = serde_json::from_str("{}").unwrap();

    assert_eq!(commit.authors.nodes().count(), 0);
    assert_eq!(commit.associated_pull_requests.nodes().count(), 0);
}

#[test]
fn test_pull_request_without_base_ref_targets_nothing() {
    let pr: RawPullRequest = serde_json::from_value(serde_json::json!({
        "id": "PR_1",
        "number": 7,
        "url": "https://github.com/o/r/pull/7",
        "title": "Orphaned",
        "state": "CLOSED",
        "isDraft": true,
        "createdAt": "2023-01-01T00:00:00Z",
        "updatedAt": "2023-01-01T00:00:00Z",
        "baseRef": null,
        "author": null
    }))
    .unwrap();

    assert!(!pr.targets("o/r"));
    assert!(pr.labels.edges.is_empty());
}

#[test]
fn test_rate_limit_response() {
    let response: GraphQlResponse<RateLimitData> = serde_json::from_str(
        r#"{"data":{"rateLimit":{"limit":5000,"cost":1,"nodeCount":0,"remaining":4999,"resetAt":"2023-01-01T01:00:00Z"}}}"#,
    )
    .unwrap();

    let rate = response.data.unwrap().rate_limit;
    assert_eq!(rate.remaining, 4999);
    assert_eq!(rate.node_count, 0);
    assert!(response.errors.is_empty());
}

#[test]
fn test_error_type_is_optional() {
    let response: GraphQlResponse<RateLimitData> = serde_json::from_str(
        r#"{"data":null,"errors":[{"type":"NOT_FOUND","message":"gone"},{"message":"other"}]}"#,
    )
    .unwrap();

    assert!(response.data.is_none());
    assert_eq!(response.errors[0].kind.as_deref(), Some("NOT_FOUND"));
    assert_eq!(response.errors[1].kind, None);
}
