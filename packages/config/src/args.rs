use std::path::PathBuf;

use crate::ConfigError;

/// Options selecting the repository and version of a run, and which pipeline
/// stages to skip.
///
/// Parsed from free-form tokens in any order: `owner:<org>`, `repo:<name>`,
/// `version:<id>`, `dir:<path>`, plus the switches `update-data`,
/// `skip-checkout`, `skip-gitlog` and `skip-github`. Unknown tokens are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    pub owner: String,
    pub repo: String,
    pub version: String,
    /// Existing local clone to use instead of the managed checkout.
    pub checkout_dir: Option<PathBuf>,
    pub update_data: bool,
    pub skip_checkout: bool,
    pub skip_gitlog: bool,
    pub skip_github: bool,
}

impl RunArgs {
    /// # Errors
    ///
    /// * If any of `owner:`, `repo:` or `version:` is missing or empty
    pub fn parse<I, S>(tokens: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = Self::default();

        for token in tokens {
            let token = token.as_ref();

            if let Some(value) = token.strip_prefix("owner:") {
                args.owner = value.to_string();
            } else if let Some(value) = token.strip_prefix("repo:") {
                args.repo = value.to_string();
            } else if let Some(value) = token.strip_prefix("version:") {
                args.version = value.to_string();
            } else if let Some(value) = token.strip_prefix("dir:") {
                args.checkout_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            } else {
                match token {
                    "update-data" => args.update_data = true,
                    "skip-checkout" => args.skip_checkout = true,
                    "skip-gitlog" => args.skip_gitlog = true,
                    "skip-github" => args.skip_github = true,
                    other => log::debug!("Ignoring unknown run token: {other}"),
                }
            }
        }

        if args.owner.is_empty() {
            return Err(ConfigError::MissingArgument("owner"));
        }
        if args.repo.is_empty() {
            return Err(ConfigError::MissingArgument("repo"));
        }
        if args.version.is_empty() {
            return Err(ConfigError::MissingArgument("version"));
        }

        Ok(args)
    }

    /// `owner/repo`, as reported by the API's `nameWithOwner`.
    #[must_use]
    pub fn name_with_owner(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// File name of this run's snapshot artifact.
    #[must_use]
    pub fn database_name(&self) -> String {
        format!("{}.{}.{}.json", self.owner, self.repo, self.version)
    }
}
