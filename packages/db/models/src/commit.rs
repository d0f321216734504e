use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    #[serde(default)]
    pub is_merge: bool,

    #[serde(default)]
    pub authored_by: Vec<String>,
    #[serde(default)]
    pub author_raw: String,
    #[serde(default)]
    pub committer_raw: String,

    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub body: String,

    #[serde(default)]
    pub is_cherrypick: bool,
    #[serde(default)]
    pub cherrypick_hash: String,

    /// Number of the pull request this commit was merged through.
    ///
    /// Persisted as an empty string for direct commits.
    #[serde(
        default,
        serialize_with = "serialize_pull",
        deserialize_with = "deserialize_pull"
    )]
    pub pull: Option<u64>,
}

impl Commit {
    #[must_use]
    pub const fn new(hash: String) -> Self {
        Self {
            hash,
            is_merge: false,
            authored_by: Vec::new(),
            author_raw: String::new(),
            committer_raw: String::new(),
            summary: String::new(),
            body: String::new(),
            is_cherrypick: false,
            cherrypick_hash: String::new(),
            pull: None,
        }
    }
}

fn serialize_pull<S: Serializer>(pull: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
    match pull {
        Some(number) => serializer.serialize_u64(*number),
        None => serializer.serialize_str(""),
    }
}

fn deserialize_pull<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PullRef {
        Number(u64),
        Text(String),
    }

    match Option::<PullRef>::deserialize(deserializer)? {
        Some(PullRef::Number(number)) => Ok(Some(number)),
        Some(PullRef::Text(text)) if text.is_empty() => Ok(None),
        Some(PullRef::Text(text)) => text
            .parse::<u64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
