//! Configuration management.
//!
//! Settings come from an optional TOML file plus `CLARITY_*` environment
//! variables, using `__` to reach nested keys:
//!
//! ```toml
//! [arxiv]
//! api_url = "http://export.arxiv.org/api/query"
//! timeout_secs = 30
//! connect_timeout_secs = 10
//!
//! [search]
//! default_category = "cs"
//! latest_max_results = 20
//! search_max_results = 50
//! abort_superseded = true
//!
//! [discovery]
//! terms = ["machine learning", "quantum computing"]
//!
//! [logging]
//! level = "info"
//! ```
//!
//! ```bash
//! export CLARITY_SEARCH__DEFAULT_CATEGORY="cs.AI"
//! export CLARITY_ARXIV__TIMEOUT_SECS=60
//! export CLARITY_DISCOVERY__TERMS="topology,knot theory"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::query::DEFAULT_DISCOVERY_TERMS;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "CLARITY";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// arXiv API settings
    #[serde(default)]
    pub arxiv: ArxivConfig,

    /// Search defaults
    #[serde(default)]
    pub search: SearchConfig,

    /// Discovery feed settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// arXiv API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArxivConfig {
    /// Query endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Total request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "http://export.arxiv.org/api/query".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

/// Search defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Category browsed when none is given
    #[serde(default = "default_category")]
    pub default_category: String,

    /// Result count for latest-in-category listings
    #[serde(default = "default_latest_max")]
    pub latest_max_results: usize,

    /// Result count for free-text searches
    #[serde(default = "default_search_max")]
    pub search_max_results: usize,

    /// Abort the in-flight request when a newer one supersedes it
    #[serde(default = "default_true")]
    pub abort_superseded: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_category: default_category(),
            latest_max_results: default_latest_max(),
            search_max_results: default_search_max(),
            abort_superseded: true,
        }
    }
}

fn default_category() -> String {
    "cs".to_string()
}

fn default_latest_max() -> usize {
    20
}

fn default_search_max() -> usize {
    50
}

fn default_true() -> bool {
    true
}

/// Discovery feed configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Terms the discovery feed picks from
    #[serde(default = "default_terms")]
    pub terms: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            terms: default_terms(),
        }
    }
}

fn default_terms() -> Vec<String> {
    DEFAULT_DISCOVERY_TERMS.iter().map(|t| t.to_string()).collect()
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when neither `RUST_LOG` nor `-v` is given
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Keys whose environment values are comma-separated lists
const LIST_KEYS: &[&str] = &["discovery.terms"];

/// Environment source for `CLARITY_<SECTION>__<KEY>` overrides.
fn environment() -> config::Environment {
    LIST_KEYS.iter().fold(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(","),
        |env, key| env.with_list_parse_key(key),
    )
}

/// Load configuration from an optional file, applying environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_with(path, environment())
}

fn load_with(path: Option<&Path>, env: config::Environment) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }
    let settings = builder.add_source(env).build()?;

    Ok(settings.try_deserialize()?)
}

/// Default location of the configuration file, if it exists.
pub fn find_config_file() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("clarity").join("config.toml");
    path.is_file().then_some(path)
}

impl Config {
    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.default_category, "cs");
        assert_eq!(config.search.latest_max_results, 20);
        assert_eq!(config.search.search_max_results, 50);
        assert!(config.search.abort_superseded);
        assert_eq!(config.arxiv.timeout_secs, 30);
        assert!(!config.discovery.terms.is_empty());
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[arxiv]
timeout_secs = 5

[search]
default_category = "cs.AI"
abort_superseded = false

[discovery]
terms = ["topology"]
"#
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.arxiv.timeout_secs, 5);
        assert_eq!(config.arxiv.api_url, default_api_url());
        assert_eq!(config.search.default_category, "cs.AI");
        assert_eq!(config.search.latest_max_results, 20);
        assert!(!config.search.abort_superseded);
        assert_eq!(config.discovery.terms, vec!["topology".to_string()]);
    }

    fn env_vars(vars: &[(&str, &str)]) -> config::Environment {
        environment().source(Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ))
    }

    #[test]
    fn test_env_overrides() {
        let env = env_vars(&[
            ("CLARITY_ARXIV__TIMEOUT_SECS", "60"),
            ("CLARITY_SEARCH__DEFAULT_CATEGORY", "cs.AI"),
            ("CLARITY_SEARCH__ABORT_SUPERSEDED", "false"),
            ("CLARITY_DISCOVERY__TERMS", "topology,knot theory"),
        ]);

        let config = load_with(None, env).unwrap();
        assert_eq!(config.arxiv.timeout_secs, 60);
        assert_eq!(config.search.default_category, "cs.AI");
        assert!(!config.search.abort_superseded);
        assert_eq!(
            config.discovery.terms,
            vec!["topology".to_string(), "knot theory".to_string()]
        );
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[discovery]\nterms = [\"topology\"]\n").unwrap();

        let env = env_vars(&[("CLARITY_DISCOVERY__TERMS", "galaxies")]);
        let config = load_with(Some(&path), env).unwrap();
        assert_eq!(config.discovery.terms, vec!["galaxies".to_string()]);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Some(Path::new("/nonexistent/clarity.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[search]"));
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
