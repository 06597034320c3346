use super::Client;
use crate::error::Result;
use async_trait::async_trait;

/// Raw page handed from the fetch layer to the document parser.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status_code: u16,
    pub html: String,
}

/// Turns a URL into page markup. Timeouts and retries live here, never in
/// the extractor.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let response = self.client.fetch_with_retry(url).await?;

        Ok(FetchedPage {
            url: response.final_url,
            status_code: response.status,
            html: response.content,
        })
    }
}
