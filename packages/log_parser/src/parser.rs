//! Parser for git's "full" log format.
//!
//! Each record looks like this:
//!
//! ```text
//! commit <hash>
//! Merge: <parent> <parent>
//! Author: <name> <email>
//! Commit: <name> <email>
//!
//!     <summary>
//!
//!     <body, any number of lines>
//!
//!     (cherry picked from commit <hash>)
//! ```
//!
//! The `Merge:` line only appears on merge commits and the cherry-pick marker
//! only on cherry-picks.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use changes_db_models::Commit;
use regex::Regex;

static COMMIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^commit ([a-zA-Z0-9\-_]+)$").unwrap());
static MERGE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Merge: (.+) (.+)$").unwrap());
static AUTHOR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Author: (.+)$").unwrap());
static COMMITTER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Commit: (.+)$").unwrap());

/// Indented message line; the capture drops the indentation.
static BODY_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s{2,}(.*)$").unwrap());
static CHERRYPICK_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s{2,}\(cherry picked from commit ([a-zA-Z0-9\-_]+)\)$").unwrap()
});

/// Marker as it appears in a body once indentation is stripped.
static CHERRYPICK_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\(cherry picked from commit [a-zA-Z0-9\-_]+\)$").unwrap()
});

/// Errors from parsing a commit log.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LogParseError {
    /// The log does not follow the expected layout.
    #[error("Invalid format at line {line}: {message}")]
    InvalidFormat {
        /// 1-based line number.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// The log held a different number of records than the caller counted.
    #[error("Expected to receive {expected} commits, but got {actual} instead")]
    CountMismatch {
        /// Records the caller expected.
        expected: usize,
        /// Records actually parsed.
        actual: usize,
    },
}

/// Result of parsing a commit log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLog {
    /// Hashes in the order they appear in the log.
    pub log: Vec<String>,
    /// Every parsed commit, plus the sources of any cherry-picks.
    pub commits: BTreeMap<String, Commit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingHeader,
    InHeader,
    InBody,
}

/// Parse a log produced by `git log --pretty=full`.
///
/// # Errors
///
/// * `LogParseError::InvalidFormat` - a line is out of place
/// * `LogParseError::CountMismatch` - the number of records differs from
///   `expected`
pub fn parse_commit_log(raw: &str, expected: usize) -> Result<ParsedLog, LogParseError> {
    parse_commit_log_with(raw, expected, &BTreeMap::new())
}

/// Parse a log, starting each record from its counterpart in `prior`.
///
/// Fields derived from the log text are always overwritten. Fields that only
/// reconciliation fills in (`authored_by`, `pull`) carry over from `prior`.
///
/// # Errors
///
/// * `LogParseError::InvalidFormat` - a line is out of place
/// * `LogParseError::CountMismatch` - the number of records differs from
///   `expected`
pub fn parse_commit_log_with(
    raw: &str,
    expected: usize,
    prior: &BTreeMap<String, Commit>,
) -> Result<ParsedLog, LogParseError> {
    let mut parsed = ParsedLog::default();
    let mut state = State::AwaitingHeader;
    let mut current: Option<Commit> = None;

    for (index, line) in raw.lines().enumerate() {
        let line_number = index + 1;

        if let Some(captures) = COMMIT_REGEX.captures(line) {
            if let Some(commit) = current.take() {
                finish_commit(&mut parsed, commit, prior);
            }
            current = Some(start_commit(&captures[1], prior));
            state = State::InHeader;
            continue;
        }

        let Some(commit) = current.as_mut() else {
            return Err(invalid(line_number, "log does not start with a commit header"));
        };

        let header_field = if MERGE_REGEX.is_match(line) {
            Some(HeaderField::Merge)
        } else if let Some(captures) = AUTHOR_REGEX.captures(line) {
            Some(HeaderField::Author(captures[1].to_string()))
        } else {
            COMMITTER_REGEX
                .captures(line)
                .map(|captures| HeaderField::Committer(captures[1].to_string()))
        };

        if let Some(field) = header_field {
            if state == State::InBody {
                return Err(invalid(
                    line_number,
                    format!("header field after the message of {}", commit.hash),
                ));
            }
            match field {
                HeaderField::Merge => commit.is_merge = true,
                HeaderField::Author(raw) => commit.author_raw = raw,
                HeaderField::Committer(raw) => commit.committer_raw = raw,
            }
            continue;
        }

        if state == State::InHeader {
            if commit.author_raw.is_empty() || commit.committer_raw.is_empty() {
                return Err(invalid(
                    line_number,
                    format!("message of {} before its Author and Commit fields", commit.hash),
                ));
            }
            state = State::InBody;
        }

        let Some(captures) = BODY_LINE_REGEX.captures(line) else {
            if !commit.summary.is_empty() {
                commit.body.push('\n');
            }
            continue;
        };
        let text = &captures[1];

        if commit.summary.is_empty() {
            commit.summary = text.to_string();
            continue;
        }

        commit.body.push_str(text);
        commit.body.push('\n');

        if let Some(captures) = CHERRYPICK_LINE_REGEX.captures(line) {
            commit.is_cherrypick = true;
            commit.cherrypick_hash = captures[1].to_string();
        }
    }

    if let Some(commit) = current.take() {
        finish_commit(&mut parsed, commit, prior);
    }

    if parsed.log.len() != expected {
        return Err(LogParseError::CountMismatch {
            expected,
            actual: parsed.log.len(),
        });
    }

    log::debug!(
        "Parsed {} log records into {} commits",
        parsed.log.len(),
        parsed.commits.len()
    );

    Ok(parsed)
}

enum HeaderField {
    Merge,
    Author(String),
    Committer(String),
}

fn invalid(line: usize, message: impl Into<String>) -> LogParseError {
    LogParseError::InvalidFormat {
        line,
        message: message.into(),
    }
}

fn start_commit(hash: &str, prior: &BTreeMap<String, Commit>) -> Commit {
    let mut commit = prior
        .get(hash)
        .cloned()
        .unwrap_or_else(|| Commit::new(hash.to_string()));

    commit.is_merge = false;
    commit.author_raw.clear();
    commit.committer_raw.clear();
    commit.summary.clear();
    commit.body.clear();
    commit.is_cherrypick = false;
    commit.cherrypick_hash.clear();

    commit
}

fn strip_cherrypick_marker(body: &str) -> String {
    CHERRYPICK_MARKER_REGEX.replace_all(body, "").trim().to_string()
}

fn finish_commit(parsed: &mut ParsedLog, mut commit: Commit, prior: &BTreeMap<String, Commit>) {
    commit.body = if commit.is_cherrypick {
        strip_cherrypick_marker(&commit.body)
    } else {
        commit.body.trim().to_string()
    };

    if commit.is_cherrypick {
        let source_hash = commit.cherrypick_hash.clone();
        let mut source = parsed
            .commits
            .get(&source_hash)
            .or_else(|| prior.get(&source_hash))
            .cloned()
            .unwrap_or_else(|| Commit::new(source_hash.clone()));

        source.author_raw.clone_from(&commit.author_raw);
        source.committer_raw.clone_from(&commit.author_raw);
        source.summary.clone_from(&commit.summary);
        source.body.clone_from(&commit.body);

        parsed.commits.insert(source_hash, source);
    }

    parsed.log.push(commit.hash.clone());
    parsed.commits.insert(commit.hash.clone(), commit);
}
