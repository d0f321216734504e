use std::fmt;
use std::time::Duration;

use changes_diagnostics::DiagnosticsLog;
use changes_github_models::{
    FetchedCommit, GraphQlError, GraphQlResponse, RateLimit, RateLimitData, RawRepositoryObject,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::query::{batch_query, commit_alias, rate_limit_query, request_body};

pub const GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Commits requested per aggregate query.
pub const COMMITS_PER_PAGE: usize = 150;

/// Pause between consecutive requests and between retries.
pub const API_DELAY: Duration = Duration::from_millis(2500);

pub const API_MAX_RETRIES: u32 = 10;

/// Errors from talking to the GraphQL API.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Every attempt failed.
    #[error("Request failed after {attempts} attempt(s): {last_error}")]
    RetriesExhausted {
        /// Attempts made, including the first one.
        attempts: u32,
        /// Why the last attempt failed.
        last_error: String,
    },

    /// The response had no `data` member.
    #[error("Response carried no data")]
    MissingData,

    /// A commit alias held something other than a commit object.
    #[error("Invalid data for commit {hash}: {source}")]
    InvalidCommit {
        /// Hash the alias was requested for.
        hash: String,
        /// Decoding error.
        #[source]
        source: serde_json::Error,
    },
}

/// How a failed request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// Fail on the first error.
    #[must_use]
    pub const fn no_retries() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: API_MAX_RETRIES,
            delay: API_DELAY,
        }
    }
}

/// Pacing of batched commit queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSchedule {
    pub batch_size: usize,
    /// Pause after every batch.
    pub delay: Duration,
    /// Extra cooldown once the upcoming page number is a multiple of this.
    pub cooldown_every: usize,
    pub cooldown_factor: u32,
}

impl BatchSchedule {
    #[must_use]
    pub const fn total_pages(&self, commits: usize) -> usize {
        if self.batch_size == 0 {
            return 0;
        }
        commits.div_ceil(self.batch_size)
    }

    /// Whether to cool down after finishing the 1-based `page`.
    #[must_use]
    pub const fn cooldown_after(&self, page: usize) -> bool {
        self.cooldown_every > 0 && (page + 1) % self.cooldown_every == 0
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.delay * self.cooldown_factor
    }
}

impl Default for BatchSchedule {
    fn default() -> Self {
        Self {
            batch_size: COMMITS_PER_PAGE,
            delay: API_DELAY,
            cooldown_every: 8,
            cooldown_factor: 4,
        }
    }
}

/// Why a single attempt failed.
enum AttemptError {
    Transport(reqwest::Error),
    Status(StatusCode),
    Body(String),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Status(status) => write!(f, "status {status}"),
            Self::Body(e) => write!(f, "invalid response body: {e}"),
        }
    }
}

/// Client for the commit metadata queries of one repository.
pub struct GraphQlClient {
    http_client: reqwest::Client,
    auth_token: Option<String>,
    endpoint: String,
    owner: String,
    repo: String,
    retry: RetryPolicy,
    schedule: BatchSchedule,
    diagnostics: DiagnosticsLog,
}

impl GraphQlClient {
    /// Create a client for `owner/repo` against the public GitHub endpoint.
    ///
    /// # Errors
    ///
    /// * If the `reqwest::Client` fails to build.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent("Changes")
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            http_client,
            auth_token: None,
            endpoint: GRAPHQL_URL.to_string(),
            owner: owner.into(),
            repo: repo.into(),
            retry: RetryPolicy::default(),
            schedule: BatchSchedule::default(),
            diagnostics: DiagnosticsLog::disabled(),
        })
    }

    #[must_use]
    pub fn with_token(mut self, token: String) -> Self {
        self.auth_token = Some(token);
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub const fn with_schedule(mut self, schedule: BatchSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticsLog) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    #[must_use]
    pub const fn schedule(&self) -> &BatchSchedule {
        &self.schedule
    }

    /// POST a query, retrying per `retry` until a well-formed response arrives.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::RetriesExhausted` once every attempt has failed
    /// with a transport error, a non-success status or an unparsable body.
    pub async fn post_query<T: DeserializeOwned>(
        &self,
        query: &str,
        retry: RetryPolicy,
    ) -> Result<GraphQlResponse<T>, FetchError> {
        let body = request_body(query);
        let mut attempt = 0;

        loop {
            match self.attempt(&body).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < retry.max_retries => {
                    log::warn!(
                        "    Failed with {e}, retrying ({attempt}/{})...",
                        retry.max_retries
                    );
                    tokio::time::sleep(retry.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::error!("    Failed to get data from {}: {e}", self.repository_id());
                    return Err(FetchError::RetriesExhausted {
                        attempts: attempt + 1,
                        last_error: e.to_string(),
                    });
                }
            }
        }
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        body: &Value,
    ) -> Result<GraphQlResponse<T>, AttemptError> {
        log::debug!("POST {}", self.endpoint);
        let mut request = self.http_client.post(&self.endpoint).json(body);

        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(AttemptError::Transport)?;
        let status = response.status();

        if !status.is_success() {
            if let Some(retry_after) = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
            {
                log::info!("    Retry after: {retry_after}");
            }
            return Err(AttemptError::Status(status));
        }

        let text = response.text().await.map_err(AttemptError::Transport)?;
        serde_json::from_str(&text).map_err(|e| AttemptError::Body(e.to_string()))
    }

    /// Query and log the current rate limit status.
    ///
    /// # Errors
    ///
    /// * `FetchError::RetriesExhausted` - the request failed
    /// * `FetchError::MissingData` - the response had no rate limit
    pub async fn check_rates(&self) -> Result<RateLimit, FetchError> {
        let response: GraphQlResponse<RateLimitData> = self
            .post_query(&rate_limit_query(), RetryPolicy::no_retries())
            .await?;

        self.diagnostics.record_json("_rate_limit", &response);
        log_data_errors(&response.errors);

        let rate_limit = response.data.ok_or(FetchError::MissingData)?.rate_limit;
        log::info!(
            "    [${}][{}] Available API calls: {}/{}; resets at {}",
            rate_limit.cost,
            rate_limit.node_count,
            rate_limit.remaining,
            rate_limit.limit,
            rate_limit.reset_at
        );

        Ok(rate_limit)
    }

    /// Fetch metadata for one batch of commits.
    ///
    /// The result holds one entry per requested hash, in request order.
    ///
    /// # Errors
    ///
    /// * `FetchError::RetriesExhausted` - the request failed
    /// * `FetchError::MissingData` - the response had no data
    /// * `FetchError::InvalidCommit` - an alias did not decode as a commit
    pub async fn fetch_commits(
        &self,
        hashes: &[String],
        page: usize,
        total_pages: usize,
    ) -> Result<Vec<FetchedCommit>, FetchError> {
        log::info!("    Requesting batch {page}/{total_pages} of commit and pull request data.");

        let query = batch_query(&self.owner, &self.repo, hashes);
        let response: GraphQlResponse<Map<String, Value>> =
            self.post_query(&query, self.retry).await?;

        self.diagnostics.record_json("data_commits", &response);
        log_data_errors(&response.errors);

        let mut data = response.data.ok_or(FetchError::MissingData)?;
        let mut received = 0;

        let commits = hashes
            .iter()
            .map(|hash| {
                let data = match data.remove(&commit_alias(hash)) {
                    None | Some(Value::Null) => None,
                    Some(value) => {
                        received += 1;
                        serde_json::from_value::<RawRepositoryObject>(value)
                            .map_err(|source| FetchError::InvalidCommit {
                                hash: hash.clone(),
                                source,
                            })?
                            .object
                    }
                };
                Ok(FetchedCommit {
                    hash: hash.clone(),
                    data,
                })
            })
            .collect::<Result<Vec<_>, FetchError>>()?;

        match data
            .remove("rateLimit")
            .and_then(|value| serde_json::from_value::<RateLimit>(value).ok())
        {
            Some(rate_limit) => log::info!(
                "    [${}][{}] Retrieved {received} commits.",
                rate_limit.cost,
                rate_limit.node_count
            ),
            None => log::info!("    Retrieved {received} commits."),
        }
        log::info!("    --");

        Ok(commits)
    }

    /// Fetch metadata for every hash, batch by batch.
    ///
    /// Batches run strictly one after another with the schedule's pauses in
    /// between.
    ///
    /// # Errors
    ///
    /// Returns the first batch failure; nothing fetched so far is returned.
    pub async fn fetch_all(&self, hashes: &[String]) -> Result<Vec<FetchedCommit>, FetchError> {
        let total_pages = self.schedule.total_pages(hashes.len());
        let mut fetched = Vec::with_capacity(hashes.len());

        for (index, batch) in hashes.chunks(self.schedule.batch_size.max(1)).enumerate() {
            let page = index + 1;
            fetched.extend(self.fetch_commits(batch, page, total_pages).await?);

            tokio::time::sleep(self.schedule.delay).await;

            if self.schedule.cooldown_after(page) {
                log::info!("[*] Waiting a bit for the API to cool down...");
                tokio::time::sleep(self.schedule.cooldown()).await;
            }
        }

        Ok(fetched)
    }

    fn repository_id(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

fn log_data_errors(errors: &[GraphQlError]) {
    if errors.is_empty() {
        return;
    }

    log::warn!("    Server handled the request, but there were errors:");
    for error in errors {
        log::warn!(
            "    [{}] {}",
            error.kind.as_deref().unwrap_or("UNKNOWN"),
            error.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> GraphQlClient {
        GraphQlClient::new("godotengine", "godot")
            .unwrap()
            .with_token("test-token".to_string())
            .with_endpoint(format!("{}/graphql", server.uri()))
            .with_retry_policy(RetryPolicy {
                max_retries: 2,
                delay: Duration::ZERO,
            })
            .with_schedule(BatchSchedule {
                batch_size: 2,
                delay: Duration::ZERO,
                cooldown_every: 8,
                cooldown_factor: 4,
            })
    }

    fn rate_limit_json() -> Value {
        serde_json::json!({
            "limit": 5000,
            "cost": 1,
            "nodeCount": 10,
            "remaining": 4990,
            "resetAt": "2023-01-01T01:00:00Z"
        })
    }

    fn commit_json(hash: &str) -> Value {
        serde_json::json!({
            "object": {
                "oid": hash,
                "commitUrl": format!("https://github.com/godotengine/godot/commit/{hash}"),
                "messageHeadline": "Headline",
                "messageBody": "",
                "authors": { "edges": [] },
                "associatedPullRequests": { "edges": [] }
            }
        })
    }

    #[test]
    fn test_schedule_pages_and_cooldowns() {
        let schedule = BatchSchedule::default();

        assert_eq!(schedule.total_pages(0), 0);
        assert_eq!(schedule.total_pages(150), 1);
        assert_eq!(schedule.total_pages(151), 2);

        let cooled: Vec<usize> = (1..=24).filter(|page| schedule.cooldown_after(*page)).collect();
        assert_eq!(cooled, vec![7, 15, 23]);
        assert_eq!(schedule.cooldown(), Duration::from_secs(10));
    }

    #[test_log::test(tokio::test)]
    async fn test_check_rates_sends_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_string_contains("rateLimit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "rateLimit": rate_limit_json() }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let rate_limit = test_client(&server).check_rates().await.unwrap();

        assert_eq!(rate_limit.remaining, 4990);
        assert_eq!(rate_limit.limit, 5000);
    }

    #[test_log::test(tokio::test)]
    async fn test_check_rates_does_not_retry() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let result = test_client(&server).check_rates().await;

        assert!(matches!(
            result,
            Err(FetchError::RetriesExhausted { attempts: 1, .. })
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_fetch_commits_keeps_request_order() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "rateLimit": rate_limit_json(),
                    "commit_bbb": commit_json("bbb"),
                    "commit_aaa": { "object": null }
                }
            })))
            .mount(&server)
            .await;

        let hashes = vec!["bbb".to_string(), "aaa".to_string(), "ccc".to_string()];
        let fetched = test_client(&server)
            .fetch_commits(&hashes, 1, 1)
            .await
            .unwrap();

        let order: Vec<&str> = fetched.iter().map(|c| c.hash.as_str()).collect();
        assert_eq!(order, vec!["bbb", "aaa", "ccc"]);
        assert_eq!(fetched[0].data.as_ref().unwrap().oid, "bbb");
        assert!(fetched[1].data.is_none());
        assert!(fetched[2].data.is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).insert_header("Retry-After", "60"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "rateLimit": rate_limit_json(), "commit_aaa": commit_json("aaa") }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fetched = test_client(&server)
            .fetch_commits(&["aaa".to_string()], 1, 1)
            .await
            .unwrap();

        assert!(fetched[0].data.is_some());
    }

    #[test_log::test(tokio::test)]
    async fn test_exhausted_retries_fail() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let result = test_client(&server)
            .fetch_commits(&["aaa".to_string()], 1, 1)
            .await;

        match result {
            Err(FetchError::RetriesExhausted {
                attempts,
                last_error,
            }) => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("500"));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_graphql_errors_do_not_stop_processing() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "commit_aaa": commit_json("aaa"), "commit_bad": null },
                "errors": [{ "type": "NOT_FOUND", "message": "Could not resolve to a commit" }]
            })))
            .mount(&server)
            .await;

        let fetched = test_client(&server)
            .fetch_commits(&["aaa".to_string(), "bad".to_string()], 1, 1)
            .await
            .unwrap();

        assert!(fetched[0].data.is_some());
        assert!(fetched[1].data.is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_missing_data_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": null,
                "errors": [{ "message": "Something went wrong" }]
            })))
            .mount(&server)
            .await;

        let result = test_client(&server)
            .fetch_commits(&["aaa".to_string()], 1, 1)
            .await;

        assert!(matches!(result, Err(FetchError::MissingData)));
    }

    #[test_log::test(tokio::test)]
    async fn test_responses_are_side_logged() {
        let server = MockServer::start().await;
        let logs = tempfile::tempdir().unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "rateLimit": rate_limit_json() }
            })))
            .mount(&server)
            .await;

        test_client(&server)
            .with_diagnostics(DiagnosticsLog::new(logs.path()))
            .check_rates()
            .await
            .unwrap();

        let content = std::fs::read_to_string(logs.path().join("_rate_limit.json")).unwrap();
        assert!(content.contains("\"remaining\": 4990"));
    }
}
