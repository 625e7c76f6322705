//! Work model representing one publication and its outgoing references.

use serde::{Deserialize, Serialize};

/// A publication record
///
/// `references` holds the outgoing citation list (this work cites each listed id)
/// in the order the API delivered it. It is never `null`: a work without
/// references carries an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    /// Work URI (e.g. `https://openalex.org/W4249751050`)
    pub id: String,

    /// Title
    #[serde(default)]
    pub title: Option<String>,

    /// Publication year
    #[serde(default)]
    pub publication_year: Option<i32>,

    /// Digital Object Identifier (as a `https://doi.org/...` URI)
    #[serde(default)]
    pub doi: Option<String>,

    /// Number of works citing this one
    #[serde(default)]
    pub cited_by_count: Option<u64>,

    /// Ids of the works this one cites
    #[serde(default)]
    pub references: Vec<String>,
}

impl Work {
    /// Create a work with only its id set
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            publication_year: None,
            doi: None,
            cited_by_count: None,
            references: Vec::new(),
        }
    }

    /// Returns the bare id (`W4249751050`) without the URI prefix
    pub fn bare_id(&self) -> &str {
        crate::sources::bare_id(&self.id)
    }
}

/// Builder for constructing Work objects
#[derive(Debug, Clone)]
pub struct WorkBuilder {
    work: Work,
}

impl WorkBuilder {
    /// Create a new builder with the required id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            work: Work::new(id),
        }
    }

    /// Set title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.work.title = Some(title.into());
        self
    }

    /// Set publication year
    pub fn publication_year(mut self, year: i32) -> Self {
        self.work.publication_year = Some(year);
        self
    }

    /// Set DOI
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.work.doi = Some(doi.into());
        self
    }

    /// Set citation count
    pub fn cited_by_count(mut self, count: u64) -> Self {
        self.work.cited_by_count = Some(count);
        self
    }

    /// Set references
    pub fn references<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.work.references = references.into_iter().map(Into::into).collect();
        self
    }

    /// Build the Work
    pub fn build(self) -> Work {
        self.work
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let work = WorkBuilder::new("https://openalex.org/W1")
            .title("A title")
            .publication_year(2013)
            .references(["https://openalex.org/W2", "https://openalex.org/W3"])
            .build();

        assert_eq!(work.bare_id(), "W1");
        assert_eq!(work.title.as_deref(), Some("A title"));
        assert_eq!(work.references.len(), 2);
    }

    #[test]
    fn test_deserialize_without_references() {
        let work: Work = serde_json::from_str(r#"{"id": "https://openalex.org/W9"}"#).unwrap();
        assert!(work.references.is_empty());
        assert_eq!(work.title, None);
    }
}
