//! Structured filter expressions (`key:value,key:a-b`).

/// Accumulates filter clauses and renders them comma-joined
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterBuilder {
    clauses: Vec<String>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `key:value`
    pub fn equals(mut self, key: &str, value: impl std::fmt::Display) -> Self {
        self.clauses.push(format!("{}:{}", key, value));
        self
    }

    /// `key:from-to`, inclusive on both ends
    pub fn between(mut self, key: &str, from: i64, to: i64) -> Self {
        self.clauses.push(format!("{}:{}-{}", key, from, to));
        self
    }

    /// `key:>value`
    pub fn greater_than(mut self, key: &str, value: i64) -> Self {
        self.clauses.push(format!("{}:>{}", key, value));
        self
    }

    /// `key:<value`
    pub fn less_than(mut self, key: &str, value: i64) -> Self {
        self.clauses.push(format!("{}:<{}", key, value));
        self
    }

    /// Append an already-rendered expression (which may itself be comma-joined)
    pub fn raw(mut self, expression: &str) -> Self {
        let expression = expression.trim().trim_matches(',');
        if !expression.is_empty() {
            self.clauses.push(expression.to_string());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Render the clauses, or `None` when there are none
    pub fn build(self) -> Option<String> {
        if self.clauses.is_empty() {
            None
        } else {
            Some(self.clauses.join(","))
        }
    }
}

/// Year-range filter on `publication_year`.
///
/// Both bounds give an inclusive range, a single bound an open-ended one.
pub fn publication_year_filter(year_from: Option<i32>, year_to: Option<i32>) -> Option<String> {
    const KEY: &str = "publication_year";
    let builder = FilterBuilder::new();
    match (year_from, year_to) {
        (Some(from), Some(to)) => builder.between(KEY, from.into(), to.into()),
        (Some(from), None) => builder.greater_than(KEY, i64::from(from) - 1),
        (None, Some(to)) => builder.less_than(KEY, i64::from(to) + 1),
        (None, None) => builder,
    }
    .build()
}
