use serde::{Deserialize, Serialize};

/// The actor responsible for a change.
///
/// Copied into history entries whose type is [`Blameable`](crate::entry::Blameable).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }
}

/// Where a change came from (an import job, an API client, a webhook...).
///
/// Copied into history entries whose type is [`Sourceable`](crate::entry::Sourceable).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    #[serde(rename = "type")]
    pub source_type: String,
}

impl Source {
    pub fn new(id: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_type: source_type.into(),
        }
    }
}
