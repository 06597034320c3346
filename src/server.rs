use crate::error::{AppError, ClientError, Result};
use crate::service::{CrawlRequest, CrawlResponse, CrawlService};
use crate::{log_error, log_info};
use axum::{
    extract::{FromRequest, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

pub fn router(service: CrawlService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/crawl", post(crawl))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(service: CrawlService, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log_info!("[server] Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info!("[server] Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log_error!("[server] Failed to listen for shutdown signal: {}", e);
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// `Json<CrawlRequest>` whose rejections answer with the usual
/// `{"detail": ..}` body instead of axum's plain text.
struct CrawlBody(CrawlRequest);

impl<S> FromRequest<S> for CrawlBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<CrawlRequest>::from_request(req, state).await {
            Ok(Json(request)) => Ok(CrawlBody(request)),
            Err(rejection) => {
                let err = AppError::InvalidRequest(rejection.body_text());
                log_error!(err => "[server] Rejected crawl request body");
                Err(err)
            }
        }
    }
}

async fn crawl(
    State(service): State<CrawlService>,
    CrawlBody(request): CrawlBody,
) -> std::result::Result<Json<CrawlResponse>, AppError> {
    match service.crawl(request).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            log_error!(err => "[server] Crawl request failed");
            Err(err)
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Schema(_) | AppError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Client(ClientError::ResponseError { .. }) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "detail": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}
