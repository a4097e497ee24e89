use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clarity::config::{find_config_file, load_config, Config};
use clarity::models::{category, SearchCriteria, SortField, SortOrder};
use clarity::query::{discovery_criteria, lookup_criteria, RandomTermPicker};
use clarity::sources::{ArxivSource, Source};
use clarity::state::{FetchState, FetchStatus, SearchSession};
use clarity::ui::{self, Layout};
use clarity::utils::terminal_width;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Clarity - browse and search arXiv papers
#[derive(Parser, Debug)]
#[command(name = "clarity")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Browse and search arXiv papers", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error log output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn layout(self) -> Layout {
        match self {
            OutputFormat::Auto if ui::is_terminal() => Layout::Table,
            OutputFormat::Auto => Layout::Json,
            OutputFormat::Table => Layout::Table,
            OutputFormat::Json => Layout::Json,
            OutputFormat::Plain => Layout::Plain,
        }
    }
}

/// Sort field for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SortBy {
    /// Sort by relevance
    Relevance,
    /// Sort by first submission date
    Submitted,
    /// Sort by last update date
    Updated,
}

impl From<SortBy> for SortField {
    fn from(sort: SortBy) -> Self {
        match sort {
            SortBy::Relevance => SortField::Relevance,
            SortBy::Submitted => SortField::SubmittedDate,
            SortBy::Updated => SortField::LastUpdatedDate,
        }
    }
}

/// Sort order
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Order {
    /// Ascending order
    Asc,
    /// Descending order
    Desc,
}

impl From<Order> for SortOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Asc => SortOrder::Ascending,
            Order::Desc => SortOrder::Descending,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search papers by free text
    #[command(alias = "s")]
    Search {
        /// Search terms
        #[arg(required = true)]
        terms: Vec<String>,

        /// Category filter (e.g. cs.AI)
        #[arg(long, short)]
        category: Option<String>,

        /// Sort by field
        #[arg(long, value_enum, default_value_t = SortBy::Relevance)]
        sort_by: SortBy,

        /// Sort order
        #[arg(long, value_enum, default_value_t = Order::Desc)]
        order: Order,

        /// Maximum number of results (1-100)
        #[arg(long, short = 'n')]
        max_results: Option<usize>,
    },

    /// List the newest papers in a category
    #[command(alias = "l")]
    Latest {
        /// Category code (defaults to the configured category)
        category: Option<String>,

        /// Maximum number of results (1-100)
        #[arg(long, short = 'n')]
        max_results: Option<usize>,
    },

    /// List recent papers for a randomly picked topic
    Discover {
        /// Maximum number of results (1-100)
        #[arg(long, short = 'n')]
        max_results: Option<usize>,
    },

    /// Show one paper in full, by arXiv id or by position in the latest listing
    Show {
        /// arXiv id (2301.12345, arXiv:2301.12345v2) or 1-based position
        target: String,

        /// Category listed when the target is a position
        #[arg(long, short)]
        category: Option<String>,
    },

    /// Show the category catalogue
    Categories,

    /// Interactive browsing session
    #[command(alias = "b")]
    Browse {
        /// Category to start in
        #[arg(long, short)]
        category: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn init_tracing(cli: &Cli, config: &Config) {
    let log_level = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("clarity={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn warn_if_malformed(category: Option<&str>) {
    if let Some(code) = category {
        if !category::is_well_formed(code) {
            tracing::warn!(category = code, "category code does not look like an arXiv taxonomy code");
        }
    }
}

/// Run one search to completion and return the committed state.
async fn fetch(session: &SearchSession, criteria: SearchCriteria) -> Result<FetchState> {
    warn_if_malformed(criteria.normalized_category());
    session
        .request_search(criteria)
        .await
        .context("search task failed")?;
    Ok(session.snapshot())
}

fn ensure_success(state: &FetchState) -> Result<()> {
    if state.status() == FetchStatus::Error {
        anyhow::bail!("{}", state.error_message().unwrap_or("search failed"));
    }
    Ok(())
}

/// Run one search to completion and print the resulting state.
async fn run_once(session: &SearchSession, criteria: SearchCriteria, layout: Layout) -> Result<()> {
    let state = fetch(session, criteria).await?;
    println!("{}", ui::render(&state, layout, ui::is_terminal())?);
    ensure_success(&state)
}

/// Fetch and print a single paper.
async fn show(
    session: &SearchSession,
    config: &Config,
    target: &str,
    category: Option<String>,
    layout: Layout,
) -> Result<()> {
    let criteria = if target.trim().parse::<usize>().is_ok() {
        let category = category.unwrap_or_else(|| config.search.default_category.clone());
        SearchCriteria::latest(category).max_results(config.search.latest_max_results)
    } else {
        lookup_criteria(target)
    };

    let state = fetch(session, criteria).await?;
    ensure_success(&state)?;
    let paper = ui::select_paper(state.results(), target)
        .with_context(|| format!("no paper matching {}", target.trim()))?;
    println!("{}", ui::render_paper(paper, layout, ui::is_terminal())?);
    Ok(())
}

const BROWSE_HELP: &str = "\
Type search terms and press enter. Commands:
  :cat <code>   filter by category (:cat alone clears the filter)
  :show <n|id>  full details of a listed paper
  :latest       newest papers in the current category
  :refresh      reload the current listing
  :retry        retry after an error
  :clear        dismiss the current error
  :help         show this help
  :quit         leave";

/// Interactive loop translating input lines into session intents.
async fn browse(session: &SearchSession, config: &Config, start_category: String) -> Result<()> {
    let color = ui::is_terminal();
    let latest_max = config.search.latest_max_results;
    let search_max = config.search.search_max_results;

    eprintln!("{}", BROWSE_HELP);
    session.load_latest(&start_category, latest_max).await?;
    println!("{}", ui::render(&session.snapshot(), Layout::Table, color)?);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        std::io::stderr().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        let current = session.snapshot().last_criteria().clone();

        let handle = match line.split_once(' ').unwrap_or((line, "")) {
            ("", _) => continue,
            (":quit" | ":q", _) => break,
            (":help", _) => {
                eprintln!("{}", BROWSE_HELP);
                continue;
            }
            (":clear", _) => {
                session.clear_error();
                println!("{}", ui::render(&session.snapshot(), Layout::Table, color)?);
                continue;
            }
            (":show", target) => {
                let state = session.snapshot();
                match ui::select_paper(state.results(), target) {
                    Some(paper) => println!("{}", ui::paper_detail(paper, terminal_width(), color)),
                    None => eprintln!("No paper {} in the current listing", target.trim()),
                }
                continue;
            }
            (":retry", _) => session.retry(),
            (":refresh", _) => session.refresh(),
            (":latest", _) => {
                let category = current
                    .normalized_category()
                    .unwrap_or(start_category.as_str())
                    .to_string();
                session.load_latest(&category, latest_max)
            }
            (":cat", code) => {
                let code = code.trim();
                let category = (!code.is_empty()).then(|| code.to_string());
                warn_if_malformed(category.as_deref());
                session.select_category(category)
            }
            (cmd, _) if cmd.starts_with(':') => {
                eprintln!("Unknown command {}; :help lists commands", cmd);
                continue;
            }
            _ => session.request_search(
                SearchCriteria::new(line)
                    .maybe_category(current.category.clone())
                    .max_results(search_max),
            ),
        };

        handle.await.context("search task failed")?;
        println!("{}", ui::render(&session.snapshot(), Layout::Table, color)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(find_config_file);
    let config = load_config(config_path.as_deref()).context("loading configuration")?;
    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let layout = cli.output.layout();
    let source: Arc<dyn Source> = Arc::new(ArxivSource::from_config(&config.arxiv)?);
    let session = SearchSession::new(source).abort_superseded(config.search.abort_superseded);

    match cli.command {
        Commands::Search {
            terms,
            category,
            sort_by,
            order,
            max_results,
        } => {
            let criteria = SearchCriteria::new(terms.join(" "))
                .maybe_category(category)
                .sort_field(sort_by.into())
                .sort_order(order.into())
                .max_results(max_results.unwrap_or(config.search.search_max_results));
            run_once(&session, criteria, layout).await?;
        }
        Commands::Latest {
            category,
            max_results,
        } => {
            let category = category.unwrap_or_else(|| config.search.default_category.clone());
            let criteria = SearchCriteria::latest(category)
                .max_results(max_results.unwrap_or(config.search.latest_max_results));
            run_once(&session, criteria, layout).await?;
        }
        Commands::Discover { max_results } => {
            let picker = RandomTermPicker::new(config.discovery.terms.iter().cloned());
            let criteria = discovery_criteria(
                &picker,
                max_results.unwrap_or(config.search.latest_max_results),
            );
            tracing::info!(term = %criteria.term, "discovery topic");
            run_once(&session, criteria, layout).await?;
        }
        Commands::Show { target, category } => {
            show(&session, &config, &target, category, layout).await?;
        }
        Commands::Categories => match layout {
            Layout::Json => {
                let categories: Vec<_> = category::all().collect();
                println!("{}", serde_json::to_string_pretty(&categories)?);
            }
            _ => println!("{}", ui::categories_table()),
        },
        Commands::Browse { category } => {
            let category = category.unwrap_or_else(|| config.search.default_category.clone());
            browse(&session, &config, category).await?;
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_search() {
        let cli = Cli::parse_from([
            "clarity", "search", "graph", "neural", "networks", "-c", "cs.LG", "--sort-by",
            "updated", "--order", "asc", "-n", "7",
        ]);
        match cli.command {
            Commands::Search {
                terms,
                category,
                sort_by,
                order,
                max_results,
            } => {
                assert_eq!(terms.join(" "), "graph neural networks");
                assert_eq!(category.as_deref(), Some("cs.LG"));
                assert_eq!(SortField::from(sort_by), SortField::LastUpdatedDate);
                assert_eq!(SortOrder::from(order), SortOrder::Ascending);
                assert_eq!(max_results, Some(7));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parses_latest_with_globals() {
        let cli = Cli::parse_from(["clarity", "latest", "cs.AI", "-o", "json", "-vv"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output.layout(), Layout::Json);
        assert!(matches!(
            cli.command,
            Commands::Latest { category: Some(ref c), max_results: None } if c == "cs.AI"
        ));
    }

    #[test]
    fn test_cli_parses_show() {
        let cli = Cli::parse_from(["clarity", "show", "3", "-c", "cs.CL"]);
        assert!(matches!(
            cli.command,
            Commands::Show { ref target, category: Some(ref c) } if target == "3" && c == "cs.CL"
        ));

        let cli = Cli::parse_from(["clarity", "show", "arXiv:2301.12345v2"]);
        assert!(matches!(
            cli.command,
            Commands::Show { ref target, category: None } if target == "arXiv:2301.12345v2"
        ));
    }

    #[test]
    fn test_cli_search_requires_terms() {
        assert!(Cli::try_parse_from(["clarity", "search"]).is_err());
    }
}
