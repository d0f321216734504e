use std::fmt;

use crate::ConfigError;

pub const PRIMARY_TOKEN_VAR: &str = "GRAPHQL_TOKEN";
pub const FALLBACK_TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Bearer token for the GraphQL API.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// Read the token from the process environment.
    ///
    /// # Errors
    ///
    /// * If neither `GRAPHQL_TOKEN` nor `GITHUB_TOKEN` holds a non-empty value
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the token through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// * If the lookup yields no non-empty value for either variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        [PRIMARY_TOKEN_VAR, FALLBACK_TOKEN_VAR]
            .into_iter()
            .find_map(|name| lookup(name).filter(|value| !value.is_empty()))
            .map(Self)
            .ok_or(ConfigError::MissingToken)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}
