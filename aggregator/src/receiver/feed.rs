use crate::receiver::xml::parse_snapshot;
use async_trait::async_trait;
use dfcore::receiver::{ReceiverSnapshot, TelemetryError, TelemetrySource};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches receiver reports over HTTP, or from disk for plain paths.
pub struct XmlFeedSource {
    client: reqwest::Client,
}

impl XmlFeedSource {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn fetch_body(&self, endpoint: &str) -> Result<String, TelemetryError> {
        let transport = |reason: String| TelemetryError::Transport {
            endpoint: endpoint.to_string(),
            reason,
        };

        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            let response = self
                .client
                .get(endpoint)
                .send()
                .await
                .map_err(|e| transport(e.to_string()))?;
            if !response.status().is_success() {
                return Err(transport(format!("status {}", response.status())));
            }
            response.text().await.map_err(|e| transport(e.to_string()))
        } else {
            let path = endpoint.strip_prefix("file://").unwrap_or(endpoint);
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| transport(e.to_string()))
        }
    }
}

#[async_trait]
impl TelemetrySource for XmlFeedSource {
    async fn fetch(&self, endpoint: &str) -> Result<ReceiverSnapshot, TelemetryError> {
        let body = self.fetch_body(endpoint).await?;
        parse_snapshot(endpoint, &body)
    }
}
