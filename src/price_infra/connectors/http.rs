use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use crate::error::{Error, Result};
use crate::price_infra::connectors::{parse_close, FetchError, FetchResult, PriceConnector};
use crate::price_infra::{PriceSourceConfig, SourceQuote};

/// REST polling connector. Issues one GET per fetch, bounded by `timeout`.
pub struct HttpPriceConnector {
    client: Client,
}

impl HttpPriceConnector {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ConfigError(format!("HTTP client: {}", e)))?;
        Ok(HttpPriceConnector { client })
    }

    async fn fetch_close(&self, source: &PriceSourceConfig) -> FetchResult<f64> {
        let response = self.client
            .get(&source.url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Unavailable("request timed out".to_string())
                } else {
                    FetchError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Unavailable(format!("HTTP {}", status)));
        }

        let body = response.text()
            .await
            .map_err(|e| FetchError::Unavailable(format!("read body failed: {}", e)))?;

        if body.trim().is_empty() {
            return Err(FetchError::Unavailable("empty body".to_string()));
        }

        parse_close(source.shape, &body)
    }
}

#[async_trait]
impl PriceConnector for HttpPriceConnector {
    async fn fetch(&self, source: &PriceSourceConfig) -> FetchResult<SourceQuote> {
        match self.fetch_close(source).await {
            Ok(price) => {
                tracing::debug!(source = %source.source_id, price, "Fetched latest close");
                Ok(SourceQuote {
                    source_id: source.source_id.clone(),
                    price,
                })
            }
            Err(e) => {
                tracing::warn!(source = %source.source_id, url = %source.url, error = %e, "Price fetch failed");
                Err(e)
            }
        }
    }
}
