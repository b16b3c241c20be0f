//! Relay HTTP API
//!
//! Axum server exposing the description relay. Each endpoint has a thin axum
//! handler that delegates to an inner function returning `(StatusCode, body)`,
//! so the behavior is testable without router dispatch.
//!
//! Endpoints:
//! - GET  /                    — welcome / liveness
//! - POST /descriptions/base64 — record a session and relay the payload
//! - anything else             — 404 JSON

use std::any::Any;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, OriginalUri, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use relay_core::config::HttpConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::subsystems::describe::{DescriptionRequest, Relay};

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub relay: Relay,
    pub http: HttpConfig,
}

/// Build the Axum router with all endpoints and middleware
pub fn build_router(state: Arc<HttpState>) -> Router {
    let http = state.http.clone();
    let routes = Router::new()
        // Known paths hit with another method get the same 404 as unknown paths.
        .route("/", get(welcome_handler).fallback(not_found_handler))
        .route(
            "/descriptions/base64",
            post(describe_handler).fallback(not_found_handler),
        )
        .fallback(not_found_handler)
        .with_state(state);

    with_middleware(routes, &http)
}

/// Body limit, request tracing and panic recovery, outermost last.
pub fn with_middleware(router: Router, http: &HttpConfig) -> Router {
    router
        .layer(DefaultBodyLimit::max(http.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    relay: Relay,
    http: HttpConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = http.bind_addr();
    let state = Arc::new(HttpState { relay, http });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Relay HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

/// Welcome body stamped with `now` as an RFC 3339 UTC timestamp.
pub fn welcome_inner(now: DateTime<Utc>) -> serde_json::Value {
    serde_json::json!({
        "message": "Welcome to the description relay!",
        "timestamp": now.to_rfc3339_opts(SecondsFormat::Millis, true),
        "status": "Server is running successfully",
    })
}

/// Run one submission. Every failure collapses to 500 with the error text.
pub async fn describe_inner(
    relay: &Relay,
    req: DescriptionRequest,
) -> (StatusCode, serde_json::Value) {
    match relay.submit(req).await {
        Ok(receipt) => (
            StatusCode::OK,
            serde_json::json!({
                "description": receipt.description,
                "journal_id": receipt.journal_id,
                "session_id": receipt.session_id,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Description request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "detail": e.to_string() }),
            )
        }
    }
}

pub fn not_found_inner(path: &str) -> serde_json::Value {
    serde_json::json!({
        "error": "Route not found",
        "path": path,
    })
}

/// Body rejections (bad JSON, wrong content type, oversized) keep the
/// framework's status code.
pub fn rejection_inner(rejection: &JsonRejection) -> (StatusCode, serde_json::Value) {
    (
        rejection.status(),
        serde_json::json!({ "detail": rejection.body_text() }),
    )
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn welcome_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(welcome_inner(Utc::now())))
}

pub async fn describe_handler(
    State(state): State<Arc<HttpState>>,
    payload: std::result::Result<Json<DescriptionRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match payload {
        Ok(Json(req)) => describe_inner(&state.relay, req).await,
        Err(rejection) => rejection_inner(&rejection),
    };
    (status, Json(body))
}

pub async fn not_found_handler(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    (StatusCode::NOT_FOUND, Json(not_found_inner(path)))
}

/// Turns a caught panic into the generic 500 body.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(%message, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": "Something went wrong!",
            "message": message,
        })),
    )
        .into_response()
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================
