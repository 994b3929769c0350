use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::error::{Result, SourceError};

// ─── HttpClient ───────────────────────────────────────────────────────────────

/// A JSON HTTP client with a per-request timeout and a minimum gap between
/// requests. Failures are returned as-is; nothing is retried.
pub struct HttpClient {
    client: reqwest::Client,
    service: String,
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl HttpClient {
    pub fn new(
        service: &str,
        user_agent: &str,
        timeout: Duration,
        min_interval: Duration,
        default_headers: HeaderMap,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .timeout(timeout)
            .default_headers(default_headers)
            .build()?;
        Ok(Self {
            client,
            service: service.to_string(),
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
        })
    }

    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = t.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, headers: HeaderMap) -> Result<T> {
        self.wait_for_rate_limit().await;
        let resp = self.client.get(url).headers(headers).send().await?;
        self.read_json(resp).await
    }

    pub async fn send_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: &B,
    ) -> Result<R> {
        self.wait_for_rate_limit().await;
        let resp = self.client.request(method, url).json(body).send().await?;
        self.read_json(resp).await
    }

    async fn read_json<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                service: self.service.clone(),
                status: status.as_u16(),
                body,
            });
        }
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| SourceError::Parse(e.to_string()))
    }
}
