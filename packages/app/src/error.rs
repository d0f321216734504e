use changes_config::ConfigError;
use changes_git_backend::GitBackendError;
use changes_github::FetchError;
use changes_log_parser::LogParseError;
use changes_store::StoreError;

/// Process exit codes, one per failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    RequestFailure = 1,
    ParseFailure = 2,
    ExecFailure = 3,
    IoFailure = 4,
}

impl ExitCode {
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// The first failure of a run. No later stage runs once one is raised.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Error loading configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Error running git: {0}")]
    Git(#[from] GitBackendError),

    #[error("Error parsing commit log: {0}")]
    Parse(#[from] LogParseError),

    #[error("Error fetching commit and pull request data: {0}")]
    Fetch(#[from] FetchError),

    #[error("Error accessing version database: {0}")]
    Store(#[from] StoreError),
}

impl PipelineError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Fetch(_) => ExitCode::RequestFailure,
            Self::Config(ConfigError::MissingToken) | Self::Parse(_) => ExitCode::ParseFailure,
            Self::Git(GitBackendError::Io { .. }) | Self::Config(_) | Self::Store(_) => {
                ExitCode::IoFailure
            }
            Self::Git(_) => ExitCode::ExecFailure,
        }
    }
}
