use std::time::Duration;

use async_trait::async_trait;
use papersync_core::{MetadataLookup, PaperMetadata, SemanticScholarConfig, format_citation};
use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, SourceError};
use crate::http::HttpClient;

const SEARCH_FIELDS: &str =
    "title,authors,year,venue,publicationVenue,publicationDate,abstract,citationCount";
const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

#[derive(Debug, Clone, Default, PartialEq)]
pub struct S2Paper {
    pub paper_id: Option<String>,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub venue: Option<String>,
    pub publication_date: Option<String>,
    pub abstract_text: Option<String>,
    pub citation_count: Option<u32>,
}

impl S2Paper {
    pub fn from_json(v: &Value) -> Self {
        let paper_id = v
            .get("paperId")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);

        let title = v
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned);

        let authors = v
            .get("authors")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|author| author.get("name").and_then(Value::as_str))
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(ToOwned::to_owned)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let year = v
            .get("year")
            .and_then(Value::as_i64)
            .and_then(|n| i32::try_from(n).ok());

        let venue = non_empty_str(v.get("venue")).or_else(|| {
            non_empty_str(v.get("publicationVenue").and_then(|pv| pv.get("name")))
        });

        let publication_date = non_empty_str(v.get("publicationDate"));

        // Passed through untouched, including surrounding whitespace.
        let abstract_text = v
            .get("abstract")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned);

        let citation_count = v
            .get("citationCount")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok());

        Self {
            paper_id,
            title,
            authors,
            year,
            venue,
            publication_date,
            abstract_text,
            citation_count,
        }
    }

    /// Normalizes the hit. `query` stands in for a missing title, but the
    /// citation is only built from the paper's own title.
    pub fn into_metadata(self, query: &str) -> PaperMetadata {
        let publication_date = self
            .publication_date
            .clone()
            .or_else(|| self.year.map(|y| format!("{y}-01-01")));
        let citation = format_citation(
            self.title.as_deref(),
            &self.authors,
            self.year,
            self.venue.as_deref(),
        );

        PaperMetadata {
            title: self.title.unwrap_or_else(|| query.to_string()),
            authors: self.authors,
            venue: self.venue,
            year: self.year,
            publication_date,
            citation,
            abstract_text: self.abstract_text,
        }
    }
}

pub struct SemanticScholarSource {
    client: HttpClient,
    api_key: Option<String>,
    base_url: String,
}

impl SemanticScholarSource {
    pub fn new(config: &SemanticScholarConfig) -> Result<Self> {
        let has_key = config.api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
        let min_interval = match config.min_interval_ms {
            Some(ms) => Duration::from_millis(ms),
            None if has_key => Duration::from_millis(100),
            None => Duration::from_secs(1),
        };

        Self::with_params(
            &config.base_url,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
            min_interval,
        )
    }

    pub fn with_params(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
        min_interval: Duration,
    ) -> Result<Self> {
        let client = HttpClient::new(
            "semantic_scholar",
            concat!("papersync/", env!("CARGO_PKG_VERSION")),
            timeout,
            min_interval,
            HeaderMap::new(),
        )?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.to_string(),
        })
    }

    /// Top search hit for `query`, if any.
    pub async fn search_top(&self, query: &str) -> Result<Option<S2Paper>> {
        let mut url = parse_base_url(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| SourceError::Parse("invalid Semantic Scholar base URL".to_string()))?
            .pop_if_empty()
            .push("paper")
            .push("search");
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("limit", "1")
            .append_pair("fields", SEARCH_FIELDS);

        let json: Value = self.client.get_json(url.as_str(), self.auth_headers()?).await?;
        Ok(json
            .get("data")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .map(S2Paper::from_json))
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(key) = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let value =
                HeaderValue::from_str(key).map_err(|e| SourceError::InvalidHeader(e.to_string()))?;
            headers.insert(API_KEY_HEADER, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl MetadataLookup for SemanticScholarSource {
    async fn lookup(&self, title: &str) -> Option<PaperMetadata> {
        match self.search_top(title).await {
            Ok(Some(paper)) => {
                debug!(paper_id = ?paper.paper_id, "matched '{title}'");
                Some(paper.into_metadata(title))
            }
            Ok(None) => None,
            Err(err) => {
                match err.status() {
                    Some(status) => {
                        warn!("Semantic Scholar lookup failed ({status}) for '{title}'")
                    }
                    None => warn!("Semantic Scholar lookup failed ({err}) for '{title}'"),
                }
                None
            }
        }
    }
}

fn non_empty_str(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    Url::parse(base_url).map_err(|e| SourceError::Parse(format!("invalid URL {base_url}: {e}")))
}
