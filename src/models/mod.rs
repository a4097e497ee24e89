//! Core data models for papers, search criteria, and queries.

pub mod category;
mod paper;
mod search;

pub use category::Category;
pub use paper::{PaperBuilder, PaperSummary};
pub use search::{
    clamp_max_results, Clause, Expression, Query, SearchCriteria, SortField, SortOrder,
    MAX_RESULTS, MIN_RESULTS,
};
