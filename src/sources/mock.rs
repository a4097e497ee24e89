//! Mock source for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::models::{PaperSummary, Query};
use crate::sources::{Source, SourceError};

/// A scripted reply
#[derive(Debug, Clone)]
enum Reply {
    Papers(Vec<PaperSummary>),
    Failure(String),
}

#[derive(Debug, Clone)]
struct Script {
    reply: Reply,
    delay: Duration,
}

/// A mock source for testing that returns predefined responses.
///
/// Replies are keyed by the query's free text (empty for category-only and
/// unfiltered listings). Unscripted queries succeed with no papers. Every
/// executed query is recorded.
#[derive(Debug, Default)]
pub struct MockSource {
    scripts: Mutex<HashMap<String, Script>>,
    received: Mutex<Vec<Query>>,
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self, text: &str, reply: Reply, delay: Duration) {
        let mut guard = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        guard.insert(text.to_string(), Script { reply, delay });
    }

    /// Answer queries for `text` with `papers`.
    pub fn respond(&self, text: &str, papers: Vec<PaperSummary>) {
        self.script(text, Reply::Papers(papers), Duration::ZERO);
    }

    /// Answer queries for `text` with `papers` after `delay`.
    pub fn respond_after(&self, text: &str, papers: Vec<PaperSummary>, delay: Duration) {
        self.script(text, Reply::Papers(papers), delay);
    }

    /// Fail queries for `text` with `message`.
    pub fn fail(&self, text: &str, message: impl Into<String>) {
        self.script(text, Reply::Failure(message.into()), Duration::ZERO);
    }

    /// Fail queries for `text` with `message` after `delay`.
    pub fn fail_after(&self, text: &str, message: impl Into<String>, delay: Duration) {
        self.script(text, Reply::Failure(message.into()), delay);
    }

    /// Queries executed so far, in order.
    pub fn received(&self) -> Vec<Query> {
        self.received.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn search(&self, query: &Query) -> Result<Vec<PaperSummary>, SourceError> {
        self.received.lock().unwrap_or_else(PoisonError::into_inner).push(query.clone());

        let key = query.expression().text().unwrap_or_default();
        let script = self.scripts.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned();
        let Some(script) = script else {
            return Ok(Vec::new());
        };

        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }

        match script.reply {
            Reply::Papers(papers) => Ok(papers),
            Reply::Failure(message) => Err(SourceError::Other(message)),
        }
    }
}

/// Helper function to create `count` mock papers for testing.
pub fn make_papers(prefix: &str, count: usize) -> Vec<PaperSummary> {
    (0..count)
        .map(|i| {
            crate::models::PaperBuilder::new(format!("{}.{}", prefix, i), format!("Test Paper {}", i))
                .abstract_text(format!("Test abstract for paper {}", i))
                .author(format!("Test Author {}", i))
                .primary_category("cs.AI")
                .build()
        })
        .collect()
}
