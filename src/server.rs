//! HTTP surface for case lookups
//!
//! Exposes `POST /api/scrape`, which resolves a case through the shared
//! [`CaseResolver`] and returns the document as JSON.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::data::{CaseIdentifier, Document};
use crate::resolver::{CaseResolver, ResolveError};

/// Errors returned to HTTP clients as `{"message": ...}`
#[derive(Debug)]
pub enum ApiError {
    /// The request could not be understood
    BadRequest(String),
    /// Resolution failed
    Internal(String),
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::MalformedRequest(_) => ApiError::BadRequest(e.to_string()),
            ResolveError::FetchFailed(_) | ResolveError::Cache(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Builds the application router around a shared resolver
pub fn router(resolver: Arc<CaseResolver>) -> Router {
    Router::new()
        .route("/api/scrape", post(scrape_case))
        .with_state(resolver)
}

/// POST /api/scrape - Resolve a case, cache first.
async fn scrape_case(
    State(resolver): State<Arc<CaseResolver>>,
    payload: Result<Json<CaseIdentifier>, JsonRejection>,
) -> Result<Json<Document>, ApiError> {
    let Json(case) = payload?;

    match resolver.resolve(&case).await {
        Ok(resolved) => Ok(Json(resolved.into_response_body())),
        Err(e) => {
            if let ResolveError::Cache(ref cache_error) = e {
                error!(case_id = %case.case_id(), error = %cache_error, "Cache store unavailable");
            }
            Err(e.into())
        }
    }
}

/// Binds `addr` and serves the router until the process receives Ctrl+C
pub async fn serve(addr: SocketAddr, resolver: Arc<CaseResolver>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, router(resolver))
        .with_graceful_shutdown(wait_for_shutdown(tokio::signal::ctrl_c()))
        .await
}

/// Completes when `signal` fires
///
/// If the signal handler cannot be registered the error is logged and this
/// never completes, so the server keeps running.
async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
