//! HTTP request handlers for the imgtier edge.
//!
//! This module contains the Axum handlers that map incoming HTTP requests
//! onto the mediator's interception boundary and relay the result.
//!
//! # Endpoints
//!
//! - `GET /img?url=<target>` - Mediate an image fetch
//! - `GET /health` - Health check endpoint
//!
//! The image handler reads three request headers as the caller's network
//! signals: `Referer` (referring page), `ECT` (effective connection type
//! client hint), and `Downlink` (throughput estimate client hint).

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::cache::CacheStore;
use crate::error::MediatorError;
use crate::fetch::{Fetcher, ImageResponse};
use crate::mediator::{Decision, InterceptedRequest, Mediator};

/// Response header reporting which tier cache served the image, or
/// `network` for a fresh fetch (pass-throughs carry `pass-through`).
pub const SERVED_FROM_HEADER: &str = "x-img-served-from";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the mediator.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: CacheStore, F: Fetcher> {
    /// The mediator handling intercepted requests
    pub mediator: Arc<Mediator<S, F>>,
}

impl<S: CacheStore, F: Fetcher> AppState<S, F> {
    /// Create application state over a shared mediator.
    pub fn new(mediator: Arc<Mediator<S, F>>) -> Self {
        Self { mediator }
    }
}

impl<S: CacheStore, F: Fetcher> Clone for AppState<S, F> {
    fn clone(&self) -> Self {
        Self {
            mediator: Arc::clone(&self.mediator),
        }
    }
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Query parameters for the image endpoint.
#[derive(Debug, Deserialize)]
pub struct ImgQueryParams {
    /// The image URL to mediate
    pub url: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status (always "ok" when responding)
    pub status: &'static str,

    /// Service version from Cargo.toml
    pub version: &'static str,
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error description
    pub error: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Image endpoint handler.
///
/// Builds the interception payload from the query string and request
/// headers, asks the mediator for a decision, and relays the outcome:
/// a mediated response, or a pass-through fetch of the untouched URL.
pub async fn img_handler<S, F>(
    State(state): State<AppState<S, F>>,
    Query(params): Query<ImgQueryParams>,
    headers: HeaderMap,
) -> Response
where
    S: CacheStore,
    F: Fetcher,
{
    let request = intercepted_from(&params.url, &headers);

    match state.mediator.intercept(&request).await {
        Ok(Decision::Serve(resolved)) => {
            relay(resolved.response, resolved.served_from.to_string())
        }
        Ok(Decision::PassThrough) => {
            debug!(url = %params.url, "passing request through unmodified");
            match state.mediator.fetcher().fetch(&params.url).await {
                Ok(response) => relay(response, "pass-through".to_string()),
                Err(e) => upstream_error(e.to_string()),
            }
        }
        Err(MediatorError::Fetch(e)) => {
            error!(url = %params.url, error = %e, "upstream fetch failed");
            upstream_error(e.to_string())
        }
        Err(MediatorError::Cache(e)) => {
            error!(url = %params.url, error = %e, "cache failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Map the HTTP surface onto the interception boundary.
fn intercepted_from(url: &str, headers: &HeaderMap) -> InterceptedRequest {
    let mut request = InterceptedRequest::new(url);

    if let Some(referrer) = header_str(headers, header::REFERER.as_str()) {
        request = request.with_referrer(referrer);
    }
    if let Some(ect) = header_str(headers, "ect") {
        request = request.with_connection_type(ect);
    }
    if let Some(downlink) = header_str(headers, "downlink") {
        if let Ok(mbps) = downlink.parse::<f64>() {
            request = request.with_downlink(mbps);
        }
    }

    request
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Relay an upstream or cached response to the client.
fn relay(image: ImageResponse, served_from: String) -> Response {
    let mut headers = image.headers;
    // The body is already fully buffered; framing headers no longer apply.
    headers.remove(header::TRANSFER_ENCODING);
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::CONNECTION);
    if let Ok(value) = served_from.parse() {
        headers.insert(SERVED_FROM_HEADER, value);
    }

    (image.status, headers, image.body).into_response()
}

fn upstream_error(message: String) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse { error: message }),
    )
        .into_response()
}

// =============================================================================
// Tests
// =============================================================================
