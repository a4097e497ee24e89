//! Async driver pairing a [`FetchStateMachine`] with a [`Source`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::{AbortHandle, JoinHandle};

use super::{FetchState, FetchStateMachine, FetchTicket};
use crate::models::SearchCriteria;
use crate::sources::Source;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A browsing session: the state a renderer reads plus the intents it sends.
///
/// Fetches run as tokio tasks. Each completion takes the machine lock and
/// commits through the token check, so the check and the transition are
/// atomic. Must be driven from within a tokio runtime.
#[derive(Debug)]
pub struct SearchSession {
    machine: Arc<Mutex<FetchStateMachine>>,
    source: Arc<dyn Source>,
    in_flight: Mutex<Option<AbortHandle>>,
    abort_superseded: bool,
}

impl SearchSession {
    pub fn new(source: Arc<dyn Source>) -> Self {
        Self {
            machine: Arc::new(Mutex::new(FetchStateMachine::new())),
            source,
            in_flight: Mutex::new(None),
            abort_superseded: false,
        }
    }

    /// Abort the previous in-flight request when a new one is issued.
    ///
    /// Stale completions are discarded either way; aborting only saves the
    /// remaining network work.
    pub fn abort_superseded(mut self, abort: bool) -> Self {
        self.abort_superseded = abort;
        self
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> FetchState {
        lock(&self.machine).state().clone()
    }

    /// Issue a search. The returned handle resolves once the fetch has
    /// completed and its outcome was committed or discarded.
    pub fn request_search(&self, criteria: SearchCriteria) -> JoinHandle<()> {
        let ticket = lock(&self.machine).request_search(criteria);
        self.spawn(ticket)
    }

    /// Re-issue the most recent search.
    pub fn retry(&self) -> JoinHandle<()> {
        let ticket = lock(&self.machine).retry();
        self.spawn(ticket)
    }

    /// Reload the current listing; same as [`Self::retry`] but reads as the
    /// pull-to-refresh intent.
    pub fn refresh(&self) -> JoinHandle<()> {
        self.retry()
    }

    /// Switch the category filter, keeping the current search term.
    ///
    /// With no term this lists the newest papers in the category.
    pub fn select_category(&self, category: Option<String>) -> JoinHandle<()> {
        let criteria = self.snapshot().last_criteria().clone().maybe_category(category);
        self.request_search(criteria)
    }

    /// List the newest papers in `category`.
    pub fn load_latest(&self, category: &str, max_results: usize) -> JoinHandle<()> {
        self.request_search(SearchCriteria::latest(category).max_results(max_results))
    }

    /// Dismiss the current error without fetching.
    pub fn clear_error(&self) {
        lock(&self.machine).clear_error();
    }

    fn spawn(&self, ticket: FetchTicket) -> JoinHandle<()> {
        let machine = Arc::clone(&self.machine);
        let source = Arc::clone(&self.source);

        let handle = tokio::spawn(async move {
            let FetchTicket { token, query } = ticket;
            let outcome = source.search(&query).await;

            let mut machine = lock(&machine);
            match outcome {
                Ok(papers) => {
                    machine.on_fetch_succeeded(token, papers);
                }
                Err(err) => {
                    tracing::warn!(source = source.id(), token = token.value(), error = %err, "fetch failed");
                    machine.on_fetch_failed(token, err.to_string());
                }
            }
        });

        let previous = lock(&self.in_flight).replace(handle.abort_handle());
        if self.abort_superseded {
            if let Some(previous) = previous {
                previous.abort();
            }
        }
        handle
    }
}
