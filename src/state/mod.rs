//! Fetch state reconciliation.
//!
//! [`FetchStateMachine`] is the single owner of [`FetchState`], the value a
//! rendering layer reads to decide what to show. Every search is stamped with
//! a [`RequestToken`]; only the completion carrying the most recently issued
//! token may change the state, so a slow response to an older search can
//! never overwrite the results of a newer one.
//!
//! ```text
//! Idle ──request──▶ Loading ──ok──▶ Success ──request──▶ Loading
//!                      │                                    ▲
//!                      └──err──▶ Error ──retry/request──────┘
//!                                  │
//!                                  └──clear_error──▶ Idle
//! ```
//!
//! The machine performs no I/O. [`SearchSession`] pairs it with a
//! [`crate::sources::Source`] and runs fetches on the tokio runtime.

mod session;

pub use session::SearchSession;

use serde::Serialize;

use crate::models::{PaperSummary, Query, SearchCriteria};
use crate::query;

/// What the rendering layer should currently show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Identifier of an issued search; later searches get larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Instruction to run one fetch, returned when a search is issued.
///
/// The holder executes `query` exactly once and reports the outcome back
/// with `token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub token: RequestToken,
    pub query: Query,
}

/// Snapshot of the fetch state.
///
/// Invariants:
/// - `Loading` and `Success` never carry an error message.
/// - `Error` keeps the results of the last successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchState {
    status: FetchStatus,
    results: Vec<PaperSummary>,
    error_message: Option<String>,
    last_criteria: SearchCriteria,
}

impl Default for FetchState {
    fn default() -> Self {
        Self {
            status: FetchStatus::Idle,
            results: Vec::new(),
            error_message: None,
            last_criteria: SearchCriteria::default(),
        }
    }
}

impl FetchState {
    pub fn status(&self) -> FetchStatus {
        self.status
    }

    /// Papers in the order the source returned them
    pub fn results(&self) -> &[PaperSummary] {
        &self.results
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Criteria of the most recent search
    pub fn last_criteria(&self) -> &SearchCriteria {
        &self.last_criteria
    }
}

/// Owner of [`FetchState`] and the request token sequence.
#[derive(Debug, Default)]
pub struct FetchStateMachine {
    state: FetchState,
    latest: u64,
}

impl FetchStateMachine {
    /// A machine in `Idle` with no results
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> &FetchState {
        &self.state
    }

    /// Token of the most recently issued search, if any
    pub fn current_token(&self) -> Option<RequestToken> {
        (self.latest > 0).then_some(RequestToken(self.latest))
    }

    fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }

    /// Issue a search for `criteria`.
    ///
    /// Moves to `Loading`, clears the error message, keeps the previous
    /// results on screen and supersedes any search still in flight.
    pub fn request_search(&mut self, criteria: SearchCriteria) -> FetchTicket {
        let query = query::build(&criteria);
        self.latest += 1;
        let token = RequestToken(self.latest);

        self.state.status = FetchStatus::Loading;
        self.state.error_message = None;
        self.state.last_criteria = criteria;

        tracing::debug!(token = token.0, ?query, "search issued");
        FetchTicket { token, query }
    }

    /// Re-issue the most recent search.
    pub fn retry(&mut self) -> FetchTicket {
        let criteria = self.state.last_criteria.clone();
        self.request_search(criteria)
    }

    /// Commit a successful fetch. Returns `false` when `token` is stale.
    pub fn on_fetch_succeeded(&mut self, token: RequestToken, results: Vec<PaperSummary>) -> bool {
        if !self.accepts(token) {
            return false;
        }
        tracing::debug!(token = token.0, count = results.len(), "fetch succeeded");
        self.state.status = FetchStatus::Success;
        self.state.results = results;
        self.state.error_message = None;
        true
    }

    /// Commit a failed fetch. Returns `false` when `token` is stale.
    pub fn on_fetch_failed(&mut self, token: RequestToken, message: impl Into<String>) -> bool {
        if !self.accepts(token) {
            return false;
        }
        let message = message.into();
        tracing::debug!(token = token.0, %message, "fetch failed");
        self.state.status = FetchStatus::Error;
        self.state.error_message = Some(message);
        true
    }

    /// Dismiss an error, returning to `Idle` without fetching.
    ///
    /// Has no effect in any other state.
    pub fn clear_error(&mut self) {
        if self.state.status == FetchStatus::Error {
            self.state.status = FetchStatus::Idle;
            self.state.error_message = None;
        }
    }

    /// A completion commits only for the current token and only once.
    fn accepts(&self, token: RequestToken) -> bool {
        if !self.is_current(token) {
            tracing::debug!(token = token.0, latest = self.latest, "discarding stale completion");
            return false;
        }
        if self.state.status != FetchStatus::Loading {
            tracing::debug!(token = token.0, "discarding duplicate completion");
            return false;
        }
        true
    }
}
