mod builder;
mod fetcher;

use crate::error::{AppError, ClientError, Result};
use crate::{log_info, log_warn};
pub use builder::ClientBuilder;
pub use fetcher::{FetchedPage, Fetcher, HttpFetcher};
use rquest::Client as RquestClient;
use std::time::Duration;
use url::Url;

#[derive(Debug)]
pub struct ClientResponse {
    pub status: u16,
    pub content: String,
    pub final_url: String,
}

pub struct Client {
    inner: RquestClient,
    max_retries: u32,
    retry_delay: Duration,
}

impl Client {
    /// GETs an absolute http(s) URL with the configured retry budget.
    /// Transport failures, 429 and 5xx responses are retried after a fixed
    /// delay; anything else fails on the first attempt.
    pub async fn fetch_with_retry(&self, url: &str) -> Result<ClientResponse> {
        let url = parse_url(url)?;
        let mut attempt = 0;

        loop {
            attempt += 1;
            log_info!(
                "[client] Fetching {} (attempt {}/{})",
                url,
                attempt,
                self.max_retries + 1
            );

            let err = match self.request(url.as_str()).await {
                Ok(response) => return Ok(response),
                Err(AppError::Client(e)) => e,
                Err(other) => return Err(other),
            };

            if !err.is_retryable() || attempt > self.max_retries {
                return Err(err.into());
            }

            log_warn!(
                "[client] {} failed: {}. Waiting {:?} before retry...",
                url,
                err,
                self.retry_delay
            );
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn request(&self, url: &str) -> Result<ClientResponse> {
        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        let is_success = response.status().is_success();
        let final_url = response.url().to_string();
        let content = response.text().await.map_err(|e| {
            ClientError::RequestFailed(format!("Failed to get response text: {}", e))
        })?;

        if !is_success {
            return Err(ClientError::ResponseError {
                status_code: status,
                message: format!("{} answered with status {}", final_url, status),
            }
            .into());
        }

        Ok(ClientResponse {
            status,
            content,
            final_url,
        })
    }
}

/// Accepts absolute http(s) URLs only.
pub fn parse_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ClientError::InvalidUrl(format!(
            "unsupported scheme '{}' in {}",
            scheme, raw
        ))
        .into()),
    }
}
