//! Utility modules supporting the sources and the terminal front end.
//!
//! - [`HttpClient`]: shared reqwest client with configured timeouts
//! - [`truncate_with_ellipsis`]: unicode-aware truncation for table cells
//! - [`wrap_text`]: word wrapping for abstracts

mod display;
mod http;

pub use display::{terminal_width, truncate_with_ellipsis, wrap_text};
pub use http::{HttpClient, USER_AGENT};
