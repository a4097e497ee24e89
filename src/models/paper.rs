//! Paper summary model as returned by a fetch collaborator.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Base URL for arXiv abstract pages
pub const ARXIV_ABS_URL: &str = "https://arxiv.org/abs";
/// Base URL for arXiv PDFs
pub const ARXIV_PDF_URL: &str = "https://arxiv.org/pdf";

/// A paper as listed in a search or browse result.
///
/// Owned by the source that produced it; the fetch state only stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperSummary {
    /// arXiv identifier without version suffix (`2301.12345`, `math-ph/0506066`)
    pub id: String,

    /// Paper title
    pub title: String,

    /// Abstract text
    pub r#abstract: String,

    /// Authors in byline order
    pub authors: Vec<String>,

    /// First submission time
    pub published_at: Option<DateTime<Utc>>,

    /// Latest revision time
    pub updated_at: Option<DateTime<Utc>>,

    /// Primary taxonomy code
    pub primary_category: Option<String>,

    /// All taxonomy codes the paper is listed under
    pub categories: BTreeSet<String>,

    /// Digital Object Identifier
    pub doi: Option<String>,
}

impl PaperSummary {
    /// Create a new summary with required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            r#abstract: String::new(),
            authors: Vec::new(),
            published_at: None,
            updated_at: None,
            primary_category: None,
            categories: BTreeSet::new(),
            doi: None,
        }
    }

    /// Abstract page URL
    pub fn abs_url(&self) -> String {
        format!("{}/{}", ARXIV_ABS_URL, self.id)
    }

    /// Direct PDF URL
    pub fn pdf_url(&self) -> String {
        format!("{}/{}.pdf", ARXIV_PDF_URL, self.id)
    }

    /// File name a downloaded PDF would be saved under.
    ///
    /// Legacy identifiers contain a slash (`cs.AI/2301.12345`), which is
    /// replaced with an underscore.
    pub fn pdf_file_name(&self) -> String {
        format!("{}.pdf", self.id.replace('/', "_"))
    }

    /// Authors joined for display
    pub fn authors_display(&self) -> String {
        self.authors.join(", ")
    }

    /// Year of first submission
    pub fn year(&self) -> Option<i32> {
        self.published_at.map(|d| d.year())
    }
}

/// Builder for constructing [`PaperSummary`] values
#[derive(Debug, Clone)]
pub struct PaperBuilder {
    paper: PaperSummary,
}

impl PaperBuilder {
    /// Create a new builder with required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            paper: PaperSummary::new(id, title),
        }
    }

    /// Set abstract
    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.paper.r#abstract = abstract_text.into();
        self
    }

    /// Append an author
    pub fn author(mut self, name: impl Into<String>) -> Self {
        self.paper.authors.push(name.into());
        self
    }

    /// Replace the author list
    pub fn authors<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paper.authors = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set publication time
    pub fn published_at(mut self, at: DateTime<Utc>) -> Self {
        self.paper.published_at = Some(at);
        self
    }

    /// Set last update time
    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.paper.updated_at = Some(at);
        self
    }

    /// Set the primary category; it is also added to the category set
    pub fn primary_category(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        self.paper.categories.insert(code.clone());
        self.paper.primary_category = Some(code);
        self
    }

    /// Add a category
    pub fn category(mut self, code: impl Into<String>) -> Self {
        self.paper.categories.insert(code.into());
        self
    }

    /// Set DOI
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.paper.doi = Some(doi.into());
        self
    }

    /// Build the summary
    pub fn build(self) -> PaperSummary {
        self.paper
    }
}
