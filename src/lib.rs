//! # Clarity
//!
//! Browse and search arXiv papers.
//!
//! ## Architecture
//!
//! - [`models`]: Core data structures (PaperSummary, SearchCriteria, Query)
//! - [`query`]: Turns search criteria into a normalized query
//! - [`state`]: Fetch state machine and the async session driving it
//! - [`sources`]: Fetch collaborators (arXiv, mock)
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal rendering of fetch state
//! - [`utils`]: HTTP client and text helpers
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use clarity::{ArxivSource, SearchCriteria, SearchSession};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = SearchSession::new(Arc::new(ArxivSource::new()?));
//! session
//!     .request_search(SearchCriteria::new("quantum error correction").category("quant-ph"))
//!     .await?;
//! for paper in session.snapshot().results() {
//!     println!("{} {}", paper.id, paper.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod models;
pub mod query;
pub mod sources;
pub mod state;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{PaperSummary, Query, SearchCriteria};
pub use sources::{ArxivSource, Source, SourceError};
pub use state::{FetchState, FetchStateMachine, FetchStatus, SearchSession};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
