use std::path::PathBuf;

use changes_config::{ApiToken, RunArgs, VersionConfig};
use changes_diagnostics::DiagnosticsLog;
use changes_git_backend_cli::CliGitBackend;
use changes_github::GraphQlClient;
use changes_store::{SnapshotStore, publish_version_index};
use clap::{Parser, Subcommand};

use crate::{Pipeline, PipelineError};

/// Overrides the GraphQL endpoint.
pub const API_URL_VAR: &str = "CHANGES_API_URL";
/// Overrides the clone URL template.
pub const REPO_URL_VAR: &str = "CHANGES_REPO_URL";

#[derive(Debug, Parser)]
#[command(name = "changes")]
#[command(about = "Compose changelog data from a repository's history and GitHub metadata", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(
        about = "Build the snapshot for one version",
        after_help = "Tokens: owner:<org> repo:<name> version:<id> [dir:<path>] [update-data] [skip-checkout] [skip-gitlog] [skip-github]"
    )]
    Compose {
        #[arg(long, default_value = "./configs")]
        configs_dir: PathBuf,

        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        #[arg(long, default_value = "./logs")]
        logs_dir: PathBuf,

        #[arg(long, default_value = "./temp")]
        temp_dir: PathBuf,

        tokens: Vec<String>,
    },
    #[command(about = "Write the per-repository version index files")]
    Publish {
        #[arg(long, default_value = "./configs")]
        configs_dir: PathBuf,

        #[arg(long, default_value = "./out/data")]
        out_dir: PathBuf,
    },
}

/// Execute a parsed command line.
///
/// # Errors
///
/// Returns the error that ended the command; see
/// [`PipelineError::exit_code`] for how it maps to a process exit code.
pub async fn run(cli: Cli) -> Result<(), PipelineError> {
    match cli.command {
        Command::Compose {
            configs_dir,
            data_dir,
            logs_dir,
            temp_dir,
            tokens,
        } => {
            let args = RunArgs::parse(&tokens)?;
            let token = ApiToken::from_env()?;
            let config = VersionConfig::load(&configs_dir, &args.owner, &args.repo, &args.version)?;

            let diagnostics = DiagnosticsLog::new(logs_dir);

            let mut git = CliGitBackend::new(temp_dir).with_diagnostics(diagnostics.clone());
            if let Ok(template) = std::env::var(REPO_URL_VAR) {
                git = git.with_repo_url_template(template);
            }

            let mut github = GraphQlClient::new(&args.owner, &args.repo)?
                .with_token(token.as_str().to_string())
                .with_diagnostics(diagnostics);
            if let Ok(endpoint) = std::env::var(API_URL_VAR) {
                github = github.with_endpoint(endpoint);
            }

            let pipeline = Pipeline::new(args, config, git, github, SnapshotStore::new(data_dir));
            let path = pipeline.run().await?;
            log::info!("Wrote {}", path.display());
        }
        Command::Publish {
            configs_dir,
            out_dir,
        } => {
            let written = publish_version_index(&configs_dir, &out_dir)?;
            log::info!("[*] Published {} version index files.", written.len());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_collects_free_form_tokens() {
        let cli = Cli::try_parse_from([
            "changes",
            "compose",
            "--data-dir",
            "/tmp/data",
            "version:4.2",
            "owner:godotengine",
            "repo:godot",
            "skip-checkout",
        ])
        .unwrap();

        let Command::Compose {
            configs_dir,
            data_dir,
            tokens,
            ..
        } = cli.command
        else {
            panic!("expected the compose command");
        };

        assert_eq!(configs_dir, PathBuf::from("./configs"));
        assert_eq!(data_dir, PathBuf::from("/tmp/data"));
        assert_eq!(
            tokens,
            vec!["version:4.2", "owner:godotengine", "repo:godot", "skip-checkout"]
        );
    }

    #[test]
    fn test_publish_defaults() {
        let cli = Cli::try_parse_from(["changes", "publish"]).unwrap();

        let Command::Publish { out_dir, .. } = cli.command else {
            panic!("expected the publish command");
        };

        assert_eq!(out_dir, PathBuf::from("./out/data"));
    }

    #[test_log::test(tokio::test)]
    async fn test_compose_without_required_tokens_fails_before_any_work() {
        let cli = Cli::try_parse_from(["changes", "compose", "owner:godotengine"]).unwrap();

        let err = run(cli).await.unwrap_err();

        assert_eq!(err.exit_code().code(), 4);
    }
}
