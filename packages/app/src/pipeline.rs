//! The compose pipeline.
//!
//! Stages run strictly in order and the first failure ends the run before
//! anything is written:
//!
//! 1. load the prior snapshot (update runs only)
//! 2. check the API rate limits
//! 3. clone the repository
//! 4. extract and parse the commit log, then index the releases
//! 5. fetch commit and pull request metadata and reconcile it
//! 6. check the API rate limits again
//! 7. write the snapshot

use std::path::PathBuf;

use changes_config::{RunArgs, VersionConfig};
use changes_db_models::Snapshot;
use changes_git_backend::{CheckoutSpec, GitBackend};
use changes_github::GraphQlClient;
use changes_log_parser::parse_commit_log_with;
use changes_reconcile::Reconciler;
use changes_release_index::ReleaseIndex;
use changes_store::SnapshotStore;

use crate::PipelineError;

/// Everything a compose run needs, passed in explicitly.
pub struct Pipeline<G: GitBackend> {
    args: RunArgs,
    config: VersionConfig,
    git: G,
    github: GraphQlClient,
    store: SnapshotStore,
}

impl<G: GitBackend> Pipeline<G> {
    #[must_use]
    pub const fn new(
        args: RunArgs,
        config: VersionConfig,
        git: G,
        github: GraphQlClient,
        store: SnapshotStore,
    ) -> Self {
        Self {
            args,
            config,
            git,
            github,
            store,
        }
    }

    /// Run every stage and write the snapshot.
    ///
    /// # Returns
    ///
    /// The path of the written snapshot.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing stage; no snapshot is written
    /// in that case.
    pub async fn run(&self) -> Result<PathBuf, PipelineError> {
        let snapshot = self.compose().await?;

        log::info!("[*] Finalizing database.");
        let path = self.store.save(&self.args.database_name(), &snapshot)?;

        log::info!("[*] Database built.");
        Ok(path)
    }

    /// Run every stage up to, but excluding, writing the snapshot.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing stage.
    pub async fn compose(&self) -> Result<Snapshot, PipelineError> {
        let args = &self.args;
        log::info!(
            "[*] Configured for the \"{}\" repository; version {}.",
            args.name_with_owner(),
            args.version
        );

        let mut reconciler = if args.update_data {
            log::info!("[*] Loading existing data to perform an update.");
            Reconciler::with_prior(self.store.load(&args.database_name())?)
        } else {
            Reconciler::new()
        };

        log::info!("[*] Checking the rate limits before.");
        self.github.check_rates().await?;

        let repo_dir = self.prepare_checkout().await?;

        if args.skip_gitlog {
            log::info!("[*] Skipping the commit log extraction.");
            reconciler.consume_prior_log();
        } else {
            self.extract_log(&repo_dir, &mut reconciler).await?;
        }

        let hashes = reconciler.commit_hashes();

        if args.skip_github {
            log::info!("[*] Skipping the commit data fetching from GitHub.");
            reconciler.consume_prior_pulls();
        } else {
            log::info!("[*] Fetching commit data from GitHub.");
            let fetched = self.github.fetch_all(&hashes).await?;

            log::info!("[*] Processing {} commits.", fetched.len());
            reconciler.process_commits(&fetched, &args.name_with_owner());
        }

        log::info!("[*] Checking the rate limits after.");
        self.github.check_rates().await?;

        Ok(reconciler.into_snapshot(chrono::Utc::now().timestamp_millis()))
    }

    async fn prepare_checkout(&self) -> Result<PathBuf, PipelineError> {
        let args = &self.args;

        if args.skip_checkout {
            log::info!("[*] Skipping the repository checkout.");
        } else {
            log::info!(
                "[*] Checking out the repository at \"{}\".",
                self.config.ref_name
            );
            let spec = CheckoutSpec {
                owner: args.owner.clone(),
                repo: args.repo.clone(),
                git_tag: self.config.git_tag().to_string(),
                commit: self.config.ref_name.clone(),
            };
            let cloned = self.git.checkout(&spec).await?;
            if args.checkout_dir.is_none() {
                return Ok(cloned);
            }
        }

        match &args.checkout_dir {
            Some(dir) => {
                log::info!("[*] Using the local clone at \"{}\".", dir.display());
                Ok(dir.clone())
            }
            None => Ok(self.git.checkout_path(&args.repo)),
        }
    }

    async fn extract_log(
        &self,
        repo_dir: &std::path::Path,
        reconciler: &mut Reconciler,
    ) -> Result<(), PipelineError> {
        let config = &self.config;
        log::info!(
            "[*] Extracting the commit log between \"{}\" and \"{}\".",
            config.from_ref,
            config.ref_name
        );

        let expected = self
            .git
            .count_commits(repo_dir, &config.from_ref, &config.ref_name)
            .await?;
        let raw_log = self
            .git
            .commit_log(repo_dir, &config.from_ref, &config.ref_name)
            .await?;

        let parsed = parse_commit_log_with(&raw_log, expected, reconciler.commits())?;
        reconciler.process_log(parsed);

        log::info!("[*] Extracting commit logs for releases.");
        let oldest_first: Vec<String> = reconciler.log().iter().rev().cloned().collect();
        let mut index = ReleaseIndex::build(config, &oldest_first, reconciler.commits());

        for bounds in index.unlocated().to_vec() {
            log::info!(
                "    Extracting the commit log for \"{}\" (between \"{}\" and \"{}\").",
                bounds.name,
                bounds.from_ref,
                bounds.ref_name
            );
            let hashes = self
                .git
                .list_commits(repo_dir, &bounds.from_ref, &bounds.ref_name)
                .await?;
            index.resolve(&bounds.name, hashes, reconciler.commits());
        }

        reconciler.set_release_logs(index.into_release_logs());
        Ok(())
    }
}
