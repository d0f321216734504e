use serde::{Deserialize, Serialize};

/// Id shared by every author that cannot be attributed to an account.
pub const GHOST_ID: &str = "";
pub const GHOST_USER: &str = "ghost";
pub const GHOST_AVATAR: &str = "https://avatars.githubusercontent.com/u/10137?v=4";
pub const GHOST_URL: &str = "https://github.com/ghost";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub id: String,
    pub user: String,
    pub avatar: String,
    pub url: String,
    #[serde(default)]
    pub pull_count: u64,
    #[serde(default)]
    pub commit_count: u64,
}

impl Author {
    #[must_use]
    pub fn new(id: String, user: String, avatar: String, url: String) -> Self {
        Self {
            id,
            user,
            avatar,
            url,
            pull_count: 0,
            commit_count: 0,
        }
    }

    /// The placeholder author for deleted or anonymous accounts.
    #[must_use]
    pub fn ghost() -> Self {
        Self::new(
            GHOST_ID.to_string(),
            GHOST_USER.to_string(),
            GHOST_AVATAR.to_string(),
            GHOST_URL.to_string(),
        )
    }

    #[must_use]
    pub fn is_ghost(&self) -> bool {
        self.id == GHOST_ID
    }
}
