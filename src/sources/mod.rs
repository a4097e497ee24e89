//! Fetch collaborators that execute a [`Query`] against a paper index.
//!
//! The [`Source`] trait is the seam between the state machine and the
//! network. [`ArxivSource`] talks to the arXiv export API; [`MockSource`]
//! returns scripted results and is used by tests.

mod arxiv;
pub mod mock;

pub use arxiv::ArxivSource;
pub use mock::MockSource;

use crate::models::{PaperSummary, Query};
use async_trait::async_trait;

/// Interface of a paper index that can execute queries.
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g., "arxiv")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Execute a query, returning papers in the order the index ranked them.
    ///
    /// An empty vector is a successful search with no matches.
    async fn search(&self, query: &Query) -> Result<Vec<PaperSummary>, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Connectivity failure
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// The query was malformed or rejected (e.g. unknown category)
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The response could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Non-success response from the API
    #[error("API error: {0}")]
    Api(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<feed_rs::parser::ParseFeedError> for SourceError {
    fn from(err: feed_rs::parser::ParseFeedError) -> Self {
        SourceError::Parse(format!("Atom: {}", err))
    }
}
