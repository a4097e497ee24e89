//! Search criteria and normalized query models.

use serde::{Deserialize, Serialize};

/// Smallest number of results a query may ask for.
pub const MIN_RESULTS: usize = 1;

/// Largest number of results a query may ask for.
pub const MAX_RESULTS: usize = 100;

/// Clamp a requested result count into `[MIN_RESULTS, MAX_RESULTS]`.
pub fn clamp_max_results(requested: usize) -> usize {
    requested.clamp(MIN_RESULTS, MAX_RESULTS)
}

/// Sort order for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Value understood by the arXiv API `sortOrder` parameter
    pub fn as_api_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

/// Sort field for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Relevance,
    SubmittedDate,
    LastUpdatedDate,
}

impl SortField {
    /// Value understood by the arXiv API `sortBy` parameter
    pub fn as_api_str(&self) -> &'static str {
        match self {
            SortField::Relevance => "relevance",
            SortField::SubmittedDate => "submittedDate",
            SortField::LastUpdatedDate => "lastUpdatedDate",
        }
    }
}

/// User-supplied search parameters, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Free text, may be empty
    pub term: String,

    /// Taxonomy code such as `cs.AI`; `None` or empty means no filter
    pub category: Option<String>,

    /// Requested sort field
    pub sort_field: SortField,

    /// Requested sort order
    pub sort_order: SortOrder,

    /// Maximum number of results, kept within `[1, 100]` by the setters
    pub max_results: usize,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            term: String::new(),
            category: None,
            sort_field: SortField::Relevance,
            sort_order: SortOrder::Descending,
            max_results: 20,
        }
    }
}

impl SearchCriteria {
    /// Create criteria for a free-text term
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Default::default()
        }
    }

    /// Criteria listing the latest submissions in a category
    pub fn latest(category: impl Into<String>) -> Self {
        Self::default()
            .category(category)
            .sort_field(SortField::SubmittedDate)
    }

    /// Set the category filter
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set or clear the category filter
    pub fn maybe_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    /// Set sort field
    pub fn sort_field(mut self, field: SortField) -> Self {
        self.sort_field = field;
        self
    }

    /// Set sort order
    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    /// Set maximum results; out-of-range values are clamped
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = clamp_max_results(max);
        self
    }

    /// The trimmed term, or `None` when it is blank
    pub fn normalized_term(&self) -> Option<&str> {
        let term = self.term.trim();
        (!term.is_empty()).then_some(term)
    }

    /// The trimmed category, or `None` when it is absent or blank
    pub fn normalized_category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// A single clause of a combined filter expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Clause {
    /// Restrict to a taxonomy code
    Category(String),
    /// Match free text across all fields
    FreeText(String),
}

/// Combined filter expression of a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    /// No filter at all
    Unfiltered,
    /// Only a category clause
    Category { category: String },
    /// Only a free-text clause
    FreeText { text: String },
    /// `category AND (text)`
    CategoryAndText { category: String, text: String },
}

impl Expression {
    /// The clauses in evaluation order; the category clause always comes first.
    pub fn clauses(&self) -> Vec<Clause> {
        match self {
            Expression::Unfiltered => Vec::new(),
            Expression::Category { category } => vec![Clause::Category(category.clone())],
            Expression::FreeText { text } => vec![Clause::FreeText(text.clone())],
            Expression::CategoryAndText { category, text } => vec![
                Clause::Category(category.clone()),
                Clause::FreeText(text.clone()),
            ],
        }
    }

    /// Category being filtered on, if any
    pub fn category(&self) -> Option<&str> {
        match self {
            Expression::Category { category } | Expression::CategoryAndText { category, .. } => {
                Some(category)
            }
            _ => None,
        }
    }

    /// Free text being searched for, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Expression::FreeText { text } | Expression::CategoryAndText { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Normalized, executable form of [`SearchCriteria`].
///
/// Only [`crate::query::build`] constructs queries, so `max_results` is
/// always within `[1, 100]`. It is serialized for logs and JSON output but
/// never deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Query {
    pub(crate) expression: Expression,
    pub(crate) sort_field: SortField,
    pub(crate) sort_order: SortOrder,
    pub(crate) max_results: usize,
}

impl Query {
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn sort_field(&self) -> SortField {
        self.sort_field
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }
}
