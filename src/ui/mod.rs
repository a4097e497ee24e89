//! Terminal rendering of fetch state.
//!
//! Everything here only reads [`FetchState`]; intents go through
//! [`crate::state::SearchSession`].

use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};
use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::models::{category, PaperSummary, SearchCriteria};
use crate::state::{FetchState, FetchStatus};
use crate::query::normalize_id;
use crate::utils::{terminal_width, truncate_with_ellipsis, wrap_text};

/// How results are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Human-readable table
    Table,
    /// Machine-readable JSON of the whole state
    Json,
    /// One block of plain text per paper
    Plain,
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status icons for the fetch states.
pub fn status_icon(status: FetchStatus) -> &'static str {
    match status {
        FetchStatus::Idle => "○",
        FetchStatus::Loading => "◐",
        FetchStatus::Success => "✓",
        FetchStatus::Error => "✗",
    }
}

/// One-line summary of what produced the current listing.
pub fn describe_criteria(criteria: &SearchCriteria) -> String {
    match (criteria.normalized_term(), criteria.normalized_category()) {
        (Some(term), Some(cat)) => format!("\"{}\" in {}", term, cat),
        (Some(term), None) => format!("\"{}\"", term),
        (None, Some(cat)) => format!("latest in {}", cat),
        (None, None) => "latest submissions".to_string(),
    }
}

/// Status line shown above the results.
pub fn status_line(state: &FetchState, color: bool) -> String {
    let icon = status_icon(state.status());
    let what = describe_criteria(state.last_criteria());
    let text = match state.status() {
        FetchStatus::Idle => "Ready".to_string(),
        FetchStatus::Loading => format!("Loading {}...", what),
        FetchStatus::Success => match state.results().len() {
            0 => format!("No papers found for {}", what),
            1 => format!("1 paper for {}", what),
            n => format!("{} papers for {}", n, what),
        },
        FetchStatus::Error => format!(
            "{} (retry to try again)",
            state.error_message().unwrap_or("Request failed")
        ),
    };

    if !color {
        return format!("{} {}", icon, text);
    }
    match state.status() {
        FetchStatus::Idle => format!("{} {}", icon.white().dimmed(), text),
        FetchStatus::Loading => format!("{} {}", icon.cyan(), text),
        FetchStatus::Success => format!("{} {}", icon.green().bold(), text),
        FetchStatus::Error => format!("{} {}", icon.red().bold(), text.red()),
    }
}

/// Results as a table sized to `width` columns.
pub fn papers_table(papers: &[PaperSummary], width: usize) -> String {
    let title_width = width.saturating_sub(60).max(30);

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(width as u16)
        .set_header(vec!["#", "ID", "Title", "Authors", "Category", "Year"]);

    for (index, paper) in papers.iter().enumerate() {
        let year = paper.year().map(|y| y.to_string()).unwrap_or_default();
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&paper.id),
            Cell::new(truncate_with_ellipsis(&paper.title, title_width)).add_attribute(Attribute::Bold),
            Cell::new(truncate_with_ellipsis(&paper.authors_display(), 24)),
            Cell::new(paper.primary_category.as_deref().unwrap_or("")),
            Cell::new(year),
        ]);
    }
    table.to_string()
}

/// Results as plain text blocks.
pub fn papers_plain(papers: &[PaperSummary]) -> String {
    let mut out = String::new();
    for paper in papers {
        out.push_str(&format!("{} - {}\n", paper.id, paper.title));
        if !paper.authors.is_empty() {
            out.push_str(&format!("  Authors: {}\n", paper.authors_display()));
        }
        if let Some(published) = paper.published_at {
            out.push_str(&format!("  Published: {}\n", published.format("%Y-%m-%d")));
        }
        if !paper.categories.is_empty() {
            let categories: Vec<&str> = paper.categories.iter().map(String::as_str).collect();
            out.push_str(&format!("  Categories: {}\n", categories.join(", ")));
        }
        out.push_str(&format!("  URL: {}\n", paper.abs_url()));
        out.push_str(&format!("  PDF: {}\n", paper.pdf_url()));
        if let Some(doi) = &paper.doi {
            out.push_str(&format!("  DOI: {}\n", doi));
        }
        out.push('\n');
    }
    out
}

/// Pick a paper from a listing by 1-based position or by arXiv identifier.
pub fn select_paper<'a>(papers: &'a [PaperSummary], target: &str) -> Option<&'a PaperSummary> {
    let target = target.trim();
    if let Ok(position) = target.parse::<usize>() {
        return position.checked_sub(1).and_then(|i| papers.get(i));
    }
    let id = normalize_id(target);
    papers.iter().find(|p| p.id == id)
}

fn category_label(code: &str) -> String {
    match category::find(code) {
        Some(known) => format!("{} ({})", code, known.name),
        None => code.to_string(),
    }
}

/// Full view of one paper: metadata, links and the wrapped abstract.
pub fn paper_detail(paper: &PaperSummary, width: usize, color: bool) -> String {
    let width = width.clamp(40, 100);
    let heading = |text: &str| -> String {
        if color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    };

    let mut out = String::new();
    for line in wrap_text(&paper.title, width) {
        out.push_str(&heading(line.as_str()));
        out.push('\n');
    }
    out.push('\n');

    if !paper.authors.is_empty() {
        out.push_str(&format!("{}: {}\n", heading("Authors"), paper.authors_display()));
    }
    out.push_str(&format!("{}: {}\n", heading("arXiv ID"), paper.id));
    if let Some(published) = paper.published_at {
        out.push_str(&format!("{}: {}\n", heading("Published"), published.format("%Y-%m-%d")));
    }
    if let Some(updated) = paper.updated_at.filter(|u| Some(*u) != paper.published_at) {
        out.push_str(&format!("{}: {}\n", heading("Updated"), updated.format("%Y-%m-%d")));
    }

    // Primary category first, then the cross-lists.
    let primary = paper.primary_category.as_deref();
    let labels: Vec<String> = primary
        .into_iter()
        .chain(paper.categories.iter().map(String::as_str).filter(|c| Some(*c) != primary))
        .map(category_label)
        .collect();
    if !labels.is_empty() {
        out.push_str(&format!("{}: {}\n", heading("Categories"), labels.join(", ")));
    }
    if let Some(doi) = &paper.doi {
        out.push_str(&format!("{}: {}\n", heading("DOI"), doi));
    }
    out.push_str(&format!("{}: {}\n", heading("Abstract page"), paper.abs_url()));
    out.push_str(&format!("{}: {}\n", heading("PDF"), paper.pdf_url()));

    if !paper.r#abstract.is_empty() {
        out.push('\n');
        out.push_str(&heading("Abstract"));
        out.push('\n');
        for line in wrap_text(&paper.r#abstract, width) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// Render one paper in the given layout.
pub fn render_paper(paper: &PaperSummary, layout: Layout, color: bool) -> Result<String, serde_json::Error> {
    match layout {
        Layout::Json => serde_json::to_string_pretty(paper),
        Layout::Plain => Ok(paper_detail(paper, terminal_width(), false)),
        Layout::Table => Ok(paper_detail(paper, terminal_width(), color)),
    }
}

/// Render the whole state in the given layout.
pub fn render(state: &FetchState, layout: Layout, color: bool) -> Result<String, serde_json::Error> {
    match layout {
        Layout::Json => serde_json::to_string_pretty(state),
        Layout::Plain => Ok(format!(
            "{}\n\n{}",
            status_line(state, false),
            papers_plain(state.results())
        )),
        Layout::Table => {
            let mut out = status_line(state, color);
            if !state.results().is_empty() {
                out.push('\n');
                out.push_str(&papers_table(state.results(), terminal_width()));
            }
            Ok(out)
        }
    }
}

/// The category catalogue as a table.
pub fn categories_table() -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_header(vec!["Code", "Name"]);
    for category in category::all() {
        table.add_row(vec![Cell::new(category.code), Cell::new(category.name)]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::make_papers;
    use crate::state::FetchStateMachine;

    fn state_with(results: usize, fail: Option<&str>) -> FetchState {
        let mut machine = FetchStateMachine::new();
        let ticket = machine.request_search(SearchCriteria::latest("cs.AI"));
        machine.on_fetch_succeeded(ticket.token, make_papers("p", results));
        if let Some(message) = fail {
            let ticket = machine.request_search(SearchCriteria::new("quantum"));
            machine.on_fetch_failed(ticket.token, message);
        }
        machine.state().clone()
    }

    #[test]
    fn test_describe_criteria() {
        assert_eq!(describe_criteria(&SearchCriteria::latest("cs.AI")), "latest in cs.AI");
        assert_eq!(describe_criteria(&SearchCriteria::new(" gnn ")), "\"gnn\"");
        assert_eq!(
            describe_criteria(&SearchCriteria::new("gnn").category("cs.LG")),
            "\"gnn\" in cs.LG"
        );
        assert_eq!(describe_criteria(&SearchCriteria::default()), "latest submissions");
    }

    #[test]
    fn test_status_line() {
        assert_eq!(
            status_line(&FetchState::default(), false),
            "○ Ready"
        );
        assert_eq!(status_line(&state_with(3, None), false), "✓ 3 papers for latest in cs.AI");
        assert_eq!(
            status_line(&state_with(0, None), false),
            "✓ No papers found for latest in cs.AI"
        );
        assert_eq!(
            status_line(&state_with(3, Some("timeout")), false),
            "✗ timeout (retry to try again)"
        );
    }

    #[test]
    fn test_render_plain_keeps_results_on_error() {
        let out = render(&state_with(2, Some("timeout")), Layout::Plain, false).unwrap();
        assert!(out.starts_with("✗ timeout"));
        assert!(out.contains("p.0 - Test Paper 0"));
        assert!(out.contains("PDF: https://arxiv.org/pdf/p.1.pdf"));
    }

    #[test]
    fn test_render_json() {
        let out = render(&state_with(1, None), Layout::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["results"][0]["id"], "p.0");
    }

    #[test]
    fn test_papers_table() {
        let out = papers_table(&make_papers("p", 2), 120);
        assert!(out.contains("p.1"));
        assert!(out.contains("Test Author 0"));
    }

    fn detailed_paper() -> PaperSummary {
        use chrono::TimeZone;
        crate::models::PaperBuilder::new("2301.12345", "Sparse Mixtures of Experts")
            .abstract_text("We study routing in sparse mixtures of experts and find that load balancing matters.")
            .authors(["Grace Hopper", "Alan Turing"])
            .published_at(chrono::Utc.with_ymd_and_hms(2023, 1, 15, 10, 0, 0).unwrap())
            .updated_at(chrono::Utc.with_ymd_and_hms(2023, 2, 1, 10, 0, 0).unwrap())
            .primary_category("cs.LG")
            .category("cs.AI")
            .category("q-bio.NC")
            .doi("10.1234/moe")
            .build()
    }

    #[test]
    fn test_paper_detail() {
        let out = paper_detail(&detailed_paper(), 60, false);
        assert!(out.starts_with("Sparse Mixtures of Experts\n"));
        assert!(out.contains("Authors: Grace Hopper, Alan Turing\n"));
        assert!(out.contains("Published: 2023-01-15\n"));
        assert!(out.contains("Updated: 2023-02-01\n"));
        assert!(out.contains(
            "Categories: cs.LG (Machine Learning), cs.AI (Artificial Intelligence), q-bio.NC\n"
        ));
        assert!(out.contains("DOI: 10.1234/moe\n"));
        assert!(out.contains("Abstract page: https://arxiv.org/abs/2301.12345\n"));
        assert!(out.contains("PDF: https://arxiv.org/pdf/2301.12345.pdf\n"));
        assert!(out.contains("Abstract\nWe study routing in sparse mixtures of experts and find that\nload balancing matters.\n"));
    }

    #[test]
    fn test_paper_detail_hides_unchanged_update() {
        let mut paper = detailed_paper();
        paper.updated_at = paper.published_at;
        let out = paper_detail(&paper, 80, false);
        assert!(!out.contains("Updated:"));
    }

    #[test]
    fn test_select_paper() {
        let papers = make_papers("2301.0000", 3);
        assert_eq!(select_paper(&papers, "1").map(|p| p.id.as_str()), Some("2301.0000.0"));
        assert_eq!(select_paper(&papers, " 3 ").map(|p| p.id.as_str()), Some("2301.0000.2"));
        assert!(select_paper(&papers, "0").is_none());
        assert!(select_paper(&papers, "4").is_none());
        assert_eq!(
            select_paper(&papers, "2301.0000.1").map(|p| p.title.as_str()),
            Some("Test Paper 1")
        );
        assert!(select_paper(&papers, "9999.99999").is_none());
    }

    #[test]
    fn test_render_paper_json() {
        let out = render_paper(&detailed_paper(), Layout::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["id"], "2301.12345");
        assert!(value["abstract"].as_str().unwrap().starts_with("We study routing"));
    }

    #[test]
    fn test_categories_table() {
        let out = categories_table();
        assert!(out.contains("cs.AI"));
        assert!(out.contains("Quantitative Finance"));
    }
}
