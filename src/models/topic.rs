//! Topic model representing an OpenAlex subject area.

use serde::{Deserialize, Serialize};

/// A subject area as returned by a topic search or a direct lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Topic URI (e.g. `https://openalex.org/T10017`)
    pub id: String,

    /// Human-readable name
    #[serde(default)]
    pub display_name: Option<String>,

    /// Hierarchy level, when the API reports one
    #[serde(default)]
    pub level: Option<i32>,

    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
}

impl Topic {
    /// Create a topic with only its id set
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            level: None,
            description: None,
        }
    }

    /// Returns the bare id (`T10017`) without the URI prefix
    pub fn bare_id(&self) -> &str {
        crate::sources::bare_id(&self.id)
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{} ({})", name, self.id),
            None => write!(f, "{}", self.id),
        }
    }
}
