//! Query construction.
//!
//! [`build`] turns user-supplied [`SearchCriteria`] into a normalized
//! [`Query`]. It never fails: blank input degenerates to a listing and
//! out-of-range limits are clamped.
//!
//! | category | term  | expression           | sort                      |
//! |----------|-------|----------------------|---------------------------|
//! | set      | set   | `category AND (text)`| as requested              |
//! | set      | blank | `category`           | submitted date, newest    |
//! | blank    | set   | `text`               | as requested              |
//! | blank    | blank | unfiltered           | submitted date, newest    |
//!
//! How clauses are spelled on the wire is up to the [`crate::sources::Source`]
//! executing the query.

use rand::seq::SliceRandom;

use crate::models::{
    clamp_max_results, Expression, Query, SearchCriteria, SortField, SortOrder,
};

/// Terms seeding the discovery feed when the user has not searched yet.
pub const DEFAULT_DISCOVERY_TERMS: &[&str] = &[
    "machine learning",
    "neural networks",
    "quantum computing",
    "deep learning",
    "reinforcement learning",
    "computer vision",
    "natural language processing",
    "graph theory",
    "dark matter",
    "climate modeling",
];

/// Build the executable query for `criteria`.
pub fn build(criteria: &SearchCriteria) -> Query {
    let term = criteria.normalized_term();
    let category = criteria.normalized_category();

    let (expression, forced_latest) = match (category, term) {
        (Some(category), Some(text)) => (
            Expression::CategoryAndText {
                category: category.to_string(),
                text: text.to_string(),
            },
            false,
        ),
        (Some(category), None) => (
            Expression::Category {
                category: category.to_string(),
            },
            true,
        ),
        (None, Some(text)) => (
            Expression::FreeText {
                text: text.to_string(),
            },
            false,
        ),
        (None, None) => (Expression::Unfiltered, true),
    };

    let (sort_field, sort_order) = if forced_latest {
        (SortField::SubmittedDate, SortOrder::Descending)
    } else {
        (criteria.sort_field, criteria.sort_order)
    };

    Query {
        expression,
        sort_field,
        sort_order,
        max_results: clamp_max_results(criteria.max_results),
    }
}

/// Strategy choosing the term for a discovery listing.
pub trait TermPicker: Send + Sync {
    fn pick_default_term(&self) -> String;
}

/// Picks uniformly from a fixed list of terms.
#[derive(Debug, Clone)]
pub struct RandomTermPicker {
    terms: Vec<String>,
}

impl RandomTermPicker {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for RandomTermPicker {
    fn default() -> Self {
        Self::new(DEFAULT_DISCOVERY_TERMS.iter().copied())
    }
}

impl TermPicker for RandomTermPicker {
    fn pick_default_term(&self) -> String {
        // An empty list degrades to the unfiltered latest listing.
        self.terms
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default()
    }
}

/// Always returns the same term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedTermPicker(pub String);

impl TermPicker for FixedTermPicker {
    fn pick_default_term(&self) -> String {
        self.0.clone()
    }
}

/// Criteria for the discovery feed: a picked term, any category, newest first.
pub fn discovery_criteria(picker: &dyn TermPicker, max_results: usize) -> SearchCriteria {
    SearchCriteria::new(picker.pick_default_term())
        .sort_field(SortField::SubmittedDate)
        .sort_order(SortOrder::Descending)
        .max_results(max_results)
}

/// Results fetched when looking a paper up by identifier
const LOOKUP_MAX_RESULTS: usize = 5;

/// Strip an `arXiv:` prefix and a version suffix from a paper identifier.
///
/// ```
/// use clarity::query::normalize_id;
///
/// assert_eq!(normalize_id("arXiv:2301.12345v2"), "2301.12345");
/// assert_eq!(normalize_id("solv-int/9901001"), "solv-int/9901001");
/// ```
pub fn normalize_id(id: &str) -> String {
    let id = id.trim();
    let id = id
        .strip_prefix("arXiv:")
        .or_else(|| id.strip_prefix("arxiv:"))
        .unwrap_or(id);
    let id = match id.rfind('v') {
        Some(pos) if pos + 1 < id.len() && id[pos + 1..].bytes().all(|b| b.is_ascii_digit()) => {
            &id[..pos]
        }
        _ => id,
    };
    id.to_string()
}

/// Criteria fetching a single paper by identifier.
pub fn lookup_criteria(id: &str) -> SearchCriteria {
    SearchCriteria::new(format!("id:{}", normalize_id(id))).max_results(LOOKUP_MAX_RESULTS)
}
