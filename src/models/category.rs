//! arXiv taxonomy catalogue.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// A browseable taxonomy entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Taxonomy code (`cs`, `cs.AI`)
    pub code: &'static str,
    /// Human-readable name
    pub name: &'static str,
}

/// Top-level archives offered in the category menu.
pub const ARCHIVES: &[Category] = &[
    Category { code: "cs", name: "Computer Science" },
    Category { code: "physics", name: "Physics" },
    Category { code: "math", name: "Mathematics" },
    Category { code: "q-bio", name: "Quantitative Biology" },
    Category { code: "q-fin", name: "Quantitative Finance" },
    Category { code: "stat", name: "Statistics" },
    Category { code: "eess", name: "Electrical Engineering" },
    Category { code: "econ", name: "Economics" },
];

/// Commonly browsed subject classes.
pub const SUBJECTS: &[Category] = &[
    Category { code: "cs.AI", name: "Artificial Intelligence" },
    Category { code: "cs.LG", name: "Machine Learning" },
    Category { code: "cs.CV", name: "Computer Vision and Pattern Recognition" },
    Category { code: "cs.CL", name: "Computation and Language" },
    Category { code: "cs.CR", name: "Cryptography and Security" },
    Category { code: "math.CO", name: "Combinatorics" },
    Category { code: "physics.gen-ph", name: "General Physics" },
    Category { code: "q-bio.QM", name: "Quantitative Methods" },
    Category { code: "stat.ML", name: "Machine Learning (Statistics)" },
];

/// Every catalogued category, archives first.
pub fn all() -> impl Iterator<Item = &'static Category> {
    ARCHIVES.iter().chain(SUBJECTS.iter())
}

/// Look up a catalogued category by code (case-sensitive, like arXiv).
pub fn find(code: &str) -> Option<&'static Category> {
    all().find(|c| c.code == code)
}

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z]+(-[a-z]+)?(\.[A-Za-z]+(-[A-Za-z]+)?)?$").expect("valid regex")
    })
}

/// Whether `code` has the shape of an arXiv taxonomy code.
///
/// Uncatalogued codes such as `cond-mat.mes-hall` are accepted; this only
/// guards against obvious typos, the remote API remains the authority.
pub fn is_well_formed(code: &str) -> bool {
    code_pattern().is_match(code)
}
