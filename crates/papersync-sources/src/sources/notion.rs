use std::time::Duration;

use async_trait::async_trait;
use papersync_core::{
    NotionConfig, NotionCredentials, Record, RecordId, RecordPage, RecordSink, RecordSource,
    UpdatePayload,
};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, SourceError};
use crate::http::HttpClient;

const NOTION_VERSION_HEADER: HeaderName = HeaderName::from_static("notion-version");
/// Notion allows an average of three requests per second per integration.
const MIN_INTERVAL: Duration = Duration::from_millis(334);

#[derive(Debug, Serialize)]
struct QueryBody<'a> {
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PatchBody<'a> {
    properties: &'a UpdatePayload,
}

/// Reads pages of a Notion database and patches their properties.
pub struct NotionClient {
    client: HttpClient,
    base_url: String,
    database_id: String,
    page_size: u32,
}

impl NotionClient {
    pub fn new(credentials: &NotionCredentials, config: &NotionConfig) -> Result<Self> {
        Self::with_params(
            &config.base_url,
            credentials,
            &config.api_version,
            config.page_size,
            Duration::from_secs(config.timeout_secs),
            MIN_INTERVAL,
        )
    }

    pub fn with_params(
        base_url: &str,
        credentials: &NotionCredentials,
        api_version: &str,
        page_size: u32,
        timeout: Duration,
        min_interval: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credentials.token))
            .map_err(|e| SourceError::InvalidHeader(format!("notion token: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(
            NOTION_VERSION_HEADER,
            HeaderValue::from_str(api_version)
                .map_err(|e| SourceError::InvalidHeader(format!("notion version: {e}")))?,
        );

        let client = HttpClient::new(
            "notion",
            concat!("papersync/", env!("CARGO_PKG_VERSION")),
            timeout,
            min_interval,
            headers,
        )?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            database_id: credentials.database_id.clone(),
            page_size,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SourceError::Parse(format!("invalid URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| SourceError::Parse("invalid Notion base URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn query_database(&self, cursor: Option<&str>) -> Result<RecordPage> {
        let url = self.endpoint(&["databases", &self.database_id, "query"])?;
        let body = QueryBody {
            page_size: self.page_size,
            start_cursor: cursor,
        };
        let json: Value = self.client.send_json(Method::POST, url.as_str(), &body).await?;
        parse_query_response(&json)
    }

    pub async fn patch_page(&self, page_id: &RecordId, payload: &UpdatePayload) -> Result<()> {
        let url = self.endpoint(&["pages", page_id.as_str()])?;
        let body = PatchBody {
            properties: payload,
        };
        let _: Value = self.client.send_json(Method::PATCH, url.as_str(), &body).await?;
        Ok(())
    }
}

fn parse_query_response(json: &Value) -> Result<RecordPage> {
    let records = json
        .get("results")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| Record::from_json(item).map_err(|e| SourceError::Parse(e.to_string())))
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?
        .unwrap_or_default();

    let has_more = json.get("has_more").and_then(Value::as_bool).unwrap_or(false);
    let next_cursor = if has_more {
        let cursor = json
            .get("next_cursor")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| SourceError::Parse("has_more without next_cursor".to_string()))?;
        Some(cursor.to_string())
    } else {
        None
    };

    Ok(RecordPage {
        records,
        next_cursor,
    })
}

#[async_trait]
impl RecordSource for NotionClient {
    async fn query_page(&self, cursor: Option<&str>) -> papersync_core::Result<RecordPage> {
        Ok(self.query_database(cursor).await?)
    }
}

#[async_trait]
impl RecordSink for NotionClient {
    async fn update_record(&self, id: &RecordId, payload: &UpdatePayload) -> papersync_core::Result<()> {
        Ok(self.patch_page(id, payload).await?)
    }
}
