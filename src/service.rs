use crate::client::{self, FetchedPage, Fetcher};
use crate::document::{Document, Page};
use crate::error::{AppError, Result};
use crate::extract::{
    Extraction, ExtractionResult, ExtractionSchema, Extractor, FieldDiagnostic, SchemaInput,
};
use crate::log_info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlRequest {
    pub url: String,
    #[serde(default)]
    pub schema: Option<SchemaInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlResponse {
    pub url: String,
    pub status: &'static str,
    pub status_code: u16,
    pub title: Option<String>,
    pub markdown: String,
    pub metadata: BTreeMap<String, String>,
    pub extracted: Option<ExtractionResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<FieldDiagnostic>,
}

/// Fetch, parse, extract. Cheap to clone; share one per process.
#[derive(Clone)]
pub struct CrawlService {
    fetcher: Arc<dyn Fetcher>,
    extractor: Extractor,
}

impl CrawlService {
    pub fn new(fetcher: Arc<dyn Fetcher>, extractor: Extractor) -> Self {
        Self { fetcher, extractor }
    }

    #[tracing::instrument(name = "crawl", skip(self, request), fields(url = %request.url))]
    pub async fn crawl(&self, request: CrawlRequest) -> Result<CrawlResponse> {
        let url = request.url.trim();
        if url.is_empty() {
            return Err(AppError::InvalidRequest("url must not be empty".to_string()));
        }
        client::parse_url(url).map_err(|e| AppError::InvalidRequest(e.to_string()))?;

        // Reject a bad schema before spending a fetch on it.
        let schema = request
            .schema
            .map(ExtractionSchema::try_from)
            .transpose()?;

        let fetched = self.fetcher.fetch(url).await?;
        log_info!(
            "[service] Fetched {} ({} bytes, status {})",
            fetched.url,
            fetched.html.len(),
            fetched.status_code
        );

        let (page, extraction) = render(&fetched, schema.as_ref(), &self.extractor)?;

        let (extracted, warnings) = match extraction {
            Some(Extraction {
                result,
                diagnostics,
            }) => (Some(result), diagnostics),
            None => (None, Vec::new()),
        };

        if let Some(ExtractionResult::List { items }) = &extracted {
            log_info!("[service] Extracted {} items from {}", items.len(), url);
        }

        Ok(CrawlResponse {
            url: request.url,
            status: "ok",
            status_code: page.status_code,
            title: page.title,
            markdown: page.markdown,
            metadata: page.metadata,
            extracted,
            warnings,
        })
    }
}

// `scraper::Html` is not `Send`, so the parsed tree must never live across an
// `.await`. Everything returned here is owned.
fn render(
    fetched: &FetchedPage,
    schema: Option<&ExtractionSchema>,
    extractor: &Extractor,
) -> Result<(Page, Option<Extraction>)> {
    let document = Document::parse(&fetched.html, &fetched.url);
    let page = Page::from_document(&document, fetched.url.as_str(), fetched.status_code);

    let extraction = schema
        .map(|schema| extractor.extract(&document.root(), schema))
        .transpose()?;

    Ok((page, extraction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClientError, SchemaError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticFetcher {
        html: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchedPage {
                url: url.to_string(),
                status_code: 200,
                html: self.html.to_string(),
            })
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl Fetcher for FailingFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchedPage> {
            Err(ClientError::RequestFailed("connection refused".to_string()).into())
        }
    }

    fn service(html: &'static str) -> (CrawlService, Arc<StaticFetcher>) {
        let fetcher = Arc::new(StaticFetcher {
            html,
            calls: AtomicUsize::new(0),
        });
        (
            CrawlService::new(fetcher.clone(), Extractor::default()),
            fetcher,
        )
    }

    fn request(url: &str, schema: Option<&str>) -> CrawlRequest {
        CrawlRequest {
            url: url.to_string(),
            schema: schema.map(|s| serde_json::from_str(s).unwrap()),
        }
    }

    #[tokio::test]
    async fn without_schema_extracted_is_null() {
        let (service, _) = service("<html><head><title>T</title></head><body>Hi</body></html>");
        let response = service
            .crawl(request("https://example.com/", None))
            .await
            .unwrap();

        assert_eq!(response.status, "ok");
        assert_eq!(response.title.as_deref(), Some("T"));
        assert_eq!(response.markdown, "Hi");
        assert!(response.extracted.is_none());
        assert!(response.warnings.is_empty());
    }

    #[tokio::test]
    async fn schema_errors_skip_the_fetch() {
        let (service, fetcher) = service("<html></html>");
        let err = service
            .crawl(request("https://example.com/", Some(r#"{ "list": ".x" }"#)))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Schema(SchemaError::MissingFields)));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bad_url_is_an_invalid_request() {
        let (service, fetcher) = service("<html></html>");
        for url in ["", "   ", "not a url", "mailto:a@b.c"] {
            let err = service.crawl(request(url, None)).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidRequest(_)), "{url}");
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fetch_failure_fails_the_request() {
        let service = CrawlService::new(Arc::new(FailingFetcher), Extractor::default());
        let err = service
            .crawl(request("https://example.com/", Some(r#"{ "fields": { "a": "a" } }"#)))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Client(ClientError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn url_is_echoed_as_given() {
        let (service, _) = service("<html></html>");
        let response = service
            .crawl(request("https://example.com/a?b=1", None))
            .await
            .unwrap();
        assert_eq!(response.url, "https://example.com/a?b=1");
        assert_eq!(response.status_code, 200);
    }
}
