//! arXiv export API source.

use async_trait::async_trait;
use feed_rs::parser;

use crate::config::ArxivConfig;
use crate::models::{Expression, PaperBuilder, PaperSummary, Query};
use crate::sources::{Source, SourceError};
use crate::utils::HttpClient;

/// Boolean operators of the arXiv query language.
const OPERATORS: &[&str] = &["AND", "OR", "ANDNOT"];

/// Query expression used for unfiltered listings
const MATCH_ALL: &str = "all:*";

/// arXiv research source
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: HttpClient,
    api_url: String,
}

impl ArxivSource {
    /// Create a new arXiv source with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::from_config(&ArxivConfig::default())
    }

    /// Create a source honoring the configured endpoint and timeouts
    pub fn from_config(config: &ArxivConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::from_config(config)?,
            api_url: config.api_url.clone(),
        })
    }

    /// Create with a custom HTTP client and endpoint (for testing)
    pub fn with_client(client: HttpClient, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    /// Encode a free-text clause.
    ///
    /// Plain words become `all:` field matches joined with `AND`. Text that
    /// already uses field prefixes, quotes, grouping or operators is passed
    /// through so power users can write raw arXiv syntax. An operator only
    /// counts as syntax when it has an operand; a lone `OR` is a search word.
    fn text_clause(text: &str) -> String {
        let (operators, operands): (Vec<&str>, Vec<&str>) = text
            .split_whitespace()
            .partition(|w| OPERATORS.contains(w));
        let is_raw = text.contains([':', '"', '(', ')'])
            || (!operators.is_empty() && !operands.is_empty());
        if is_raw {
            return text.to_string();
        }
        text.split_whitespace()
            .map(|word| format!("all:{}", word))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Build the `search_query` parameter for a query
    fn build_search_query(query: &Query) -> String {
        match query.expression() {
            Expression::Unfiltered => MATCH_ALL.to_string(),
            Expression::Category { category } => format!("cat:{}", category),
            Expression::FreeText { text } => Self::text_clause(text),
            Expression::CategoryAndText { category, text } => {
                format!("cat:{} AND ({})", category, Self::text_clause(text))
            }
        }
    }

    /// Full request URL for a query
    fn build_url(&self, query: &Query) -> String {
        format!(
            "{}?search_query={}&start=0&max_results={}&sortBy={}&sortOrder={}",
            self.api_url,
            urlencoding::encode(&Self::build_search_query(query)),
            query.max_results(),
            query.sort_field().as_api_str(),
            query.sort_order().as_api_str()
        )
    }

    /// Extract the versionless identifier from an entry URL.
    ///
    /// Handles `http://arxiv.org/abs/2301.12345v2` and legacy ids such as
    /// `http://arxiv.org/abs/math-ph/0506066v1`.
    fn parse_entry_id(entry_id: &str) -> Option<String> {
        let id = entry_id.split("/abs/").nth(1)?.trim_end_matches('/');
        let id = match id.rfind('v') {
            Some(pos)
                if pos + 1 < id.len() && id[pos + 1..].bytes().all(|b| b.is_ascii_digit()) =>
            {
                &id[..pos]
            }
            _ => id,
        };
        (!id.is_empty()).then(|| id.to_string())
    }

    fn fold(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Parse an Atom entry into a paper summary
    fn parse_entry(entry: &feed_rs::model::Entry) -> Result<PaperSummary, SourceError> {
        let id = Self::parse_entry_id(&entry.id)
            .ok_or_else(|| SourceError::Parse(format!("Unrecognized entry id: {}", entry.id)))?;

        let title = entry
            .title
            .as_ref()
            .map(|t| Self::fold(&t.content))
            .unwrap_or_default();
        let abstract_text = entry
            .summary
            .as_ref()
            .map(|s| Self::fold(&s.content))
            .unwrap_or_default();

        let mut builder = PaperBuilder::new(id, title)
            .abstract_text(abstract_text)
            .authors(entry.authors.iter().map(|a| a.name.trim().to_string()));

        if let Some(published) = entry.published {
            builder = builder.published_at(published);
        }
        if let Some(updated) = entry.updated {
            builder = builder.updated_at(updated);
        }

        // arXiv lists the primary category first.
        let mut terms = entry.categories.iter().map(|c| c.term.as_str());
        if let Some(primary) = terms.next() {
            builder = builder.primary_category(primary);
        }
        for term in terms {
            builder = builder.category(term);
        }

        let doi = entry
            .links
            .iter()
            .filter(|l| l.title.as_deref() == Some("doi"))
            .find_map(|l| l.href.split("doi.org/").nth(1));
        if let Some(doi) = doi {
            builder = builder.doi(doi);
        }

        Ok(builder.build())
    }

    /// Parse a response body into papers.
    ///
    /// arXiv reports a rejected query as a feed holding a single entry whose
    /// id points at `/api/errors`; that is surfaced as [`SourceError::InvalidQuery`].
    fn parse_feed(body: &[u8]) -> Result<Vec<PaperSummary>, SourceError> {
        let feed = parser::parse(body)?;

        if let Some(error) = feed.entries.iter().find(|e| e.id.contains("/api/errors")) {
            let message = error
                .summary
                .as_ref()
                .map(|s| Self::fold(&s.content))
                .unwrap_or_else(|| "query rejected".to_string());
            return Err(SourceError::InvalidQuery(message));
        }

        let papers = feed
            .entries
            .iter()
            .filter_map(|entry| match Self::parse_entry(entry) {
                Ok(paper) => Some(paper),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping arXiv entry");
                    None
                }
            })
            .collect();
        Ok(papers)
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    async fn search(&self, query: &Query) -> Result<Vec<PaperSummary>, SourceError> {
        let url = self.build_url(query);
        tracing::debug!(%url, "querying arXiv");

        let response = self
            .client
            .client()
            .get(&url)
            .header("Accept", "application/atom+xml")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            // The error feed in the body carries the reason.
            let body = response.bytes().await?;
            return match Self::parse_feed(&body) {
                Err(SourceError::InvalidQuery(message)) => Err(SourceError::InvalidQuery(message)),
                _ => Err(SourceError::InvalidQuery(format!("arXiv rejected query ({})", status))),
            };
        }
        if !status.is_success() {
            return Err(SourceError::Api(format!("arXiv API returned status: {}", status)));
        }

        let body = response.bytes().await?;
        let papers = Self::parse_feed(&body)?;
        tracing::info!(count = papers.len(), "arXiv search completed");
        Ok(papers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchCriteria;
    use crate::query;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>arXiv Query Results</title>
  <id>http://arxiv.org/api/abc</id>
  <updated>2023-01-16T00:00:00-05:00</updated>
  <entry>
    <id>http://arxiv.org/abs/2301.12345v2</id>
    <updated>2023-01-20T10:00:00Z</updated>
    <published>2023-01-15T10:00:00Z</published>
    <title>Attention Is
      All You Need Again</title>
    <summary>  We revisit
  attention.  </summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name></author>
    <link href="http://dx.doi.org/10.1234/test" rel="related" title="doi"/>
    <link href="http://arxiv.org/abs/2301.12345v2" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2301.12345v2" rel="related" type="application/pdf"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/math-ph/0506066v1</id>
    <updated>2005-06-20T00:00:00Z</updated>
    <published>2005-06-20T00:00:00Z</published>
    <title>A Legacy Paper</title>
    <summary>Old abstract.</summary>
    <author><name>Emmy Noether</name></author>
    <category term="math-ph" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    const ERROR_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>arXiv Query Results</title>
  <id>http://arxiv.org/api/err</id>
  <updated>2023-01-16T00:00:00-05:00</updated>
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
    <title>Error</title>
    <summary>incorrect id format for 1234</summary>
    <updated>2023-01-16T00:00:00-05:00</updated>
    <author><name>arXiv api core</name></author>
  </entry>
</feed>"#;

    #[test]
    fn test_build_search_query() {
        let q = query::build(&SearchCriteria::new("machine learning").category("cs.AI"));
        assert_eq!(
            ArxivSource::build_search_query(&q),
            "cat:cs.AI AND (all:machine AND all:learning)"
        );

        let q = query::build(&SearchCriteria::new("quantum"));
        assert_eq!(ArxivSource::build_search_query(&q), "all:quantum");

        let q = query::build(&SearchCriteria::latest("cs.CV"));
        assert_eq!(ArxivSource::build_search_query(&q), "cat:cs.CV");

        let q = query::build(&SearchCriteria::default());
        assert_eq!(ArxivSource::build_search_query(&q), "all:*");
    }

    #[test]
    fn test_raw_syntax_passthrough() {
        let q = query::build(&SearchCriteria::new("au:Hinton AND ti:capsule").category("cs.LG"));
        assert_eq!(
            ArxivSource::build_search_query(&q),
            "cat:cs.LG AND (au:Hinton AND ti:capsule)"
        );

        let q = query::build(&SearchCriteria::new("\"graph neural\""));
        assert_eq!(ArxivSource::build_search_query(&q), "\"graph neural\"");
    }

    #[test]
    fn test_lone_operator_is_a_word() {
        let q = query::build(&SearchCriteria::new("OR"));
        assert_eq!(ArxivSource::build_search_query(&q), "all:OR");

        let q = query::build(&SearchCriteria::new("AND OR").category("cs.LO"));
        assert_eq!(ArxivSource::build_search_query(&q), "cat:cs.LO AND (all:AND AND all:OR)");

        let q = query::build(&SearchCriteria::new("quantum OR photonic"));
        assert_eq!(ArxivSource::build_search_query(&q), "quantum OR photonic");
    }

    #[test]
    fn test_build_url() {
        let source = ArxivSource::with_client(
            HttpClient::new().unwrap(),
            "http://export.arxiv.org/api/query",
        );
        let q = query::build(&SearchCriteria::latest("cs.AI").max_results(5));
        assert_eq!(
            source.build_url(&q),
            "http://export.arxiv.org/api/query?search_query=cat%3Acs.AI&start=0&max_results=5&sortBy=submittedDate&sortOrder=descending"
        );
    }

    #[test]
    fn test_parse_entry_id() {
        assert_eq!(
            ArxivSource::parse_entry_id("http://arxiv.org/abs/2301.12345v1").as_deref(),
            Some("2301.12345")
        );
        assert_eq!(
            ArxivSource::parse_entry_id("http://arxiv.org/abs/2301.12345").as_deref(),
            Some("2301.12345")
        );
        assert_eq!(
            ArxivSource::parse_entry_id("http://arxiv.org/abs/solv-int/9901001v3").as_deref(),
            Some("solv-int/9901001")
        );
        assert_eq!(
            ArxivSource::parse_entry_id("http://arxiv.org/abs/solv-int/9901001").as_deref(),
            Some("solv-int/9901001")
        );
        assert_eq!(ArxivSource::parse_entry_id("http://arxiv.org/api/xyz"), None);
    }

    #[test]
    fn test_parse_feed() {
        let papers = ArxivSource::parse_feed(FEED.as_bytes()).unwrap();
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.id, "2301.12345");
        assert_eq!(first.title, "Attention Is All You Need Again");
        assert_eq!(first.r#abstract, "We revisit attention.");
        assert_eq!(first.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(first.primary_category.as_deref(), Some("cs.LG"));
        assert!(first.categories.contains("cs.AI"));
        assert_eq!(first.doi.as_deref(), Some("10.1234/test"));
        assert_eq!(first.year(), Some(2023));
        assert!(first.updated_at > first.published_at);

        let legacy = &papers[1];
        assert_eq!(legacy.id, "math-ph/0506066");
        assert_eq!(legacy.pdf_file_name(), "math-ph_0506066.pdf");
        assert_eq!(legacy.doi, None);
    }

    #[test]
    fn test_parse_error_feed() {
        let err = ArxivSource::parse_feed(ERROR_FEED.as_bytes()).unwrap_err();
        match err {
            SourceError::InvalidQuery(msg) => assert_eq!(msg, "incorrect id format for 1234"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_feed_skips_unrecognized_entry() {
        let feed = FEED.replace(
            "<id>http://arxiv.org/abs/math-ph/0506066v1</id>",
            "<id>urn:unexpected:entry</id>",
        );
        let papers = ArxivSource::parse_feed(feed.as_bytes()).unwrap();
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].id, "2301.12345");
    }

    #[test]
    fn test_parse_garbage() {
        let err = ArxivSource::parse_feed(b"not a feed").unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[tokio::test]
    async fn test_search_with_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("search_query".into(), "cat:cs.LG".into()),
                mockito::Matcher::UrlEncoded("max_results".into(), "2".into()),
                mockito::Matcher::UrlEncoded("sortBy".into(), "submittedDate".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(FEED)
            .create_async()
            .await;

        let source = ArxivSource::with_client(
            HttpClient::new().unwrap(),
            format!("{}/api/query", server.url()),
        );
        let q = query::build(&SearchCriteria::latest("cs.LG").max_results(2));
        let papers = source.search(&q).await.unwrap();

        mock.assert_async().await;
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].id, "2301.12345");
    }

    #[tokio::test]
    async fn test_search_rejected_query() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(mockito::Matcher::Any)
            .with_status(400)
            .with_body(ERROR_FEED)
            .create_async()
            .await;

        let source = ArxivSource::with_client(
            HttpClient::new().unwrap(),
            format!("{}/api/query", server.url()),
        );
        let q = query::build(&SearchCriteria::latest("bogus"));
        let err = source.search(&q).await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_search_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let source = ArxivSource::with_client(
            HttpClient::new().unwrap(),
            format!("{}/api/query", server.url()),
        );
        let err = source
            .search(&query::build(&SearchCriteria::new("quantum")))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Api(_)));
        assert!(err.to_string().contains("503"));
    }
}
