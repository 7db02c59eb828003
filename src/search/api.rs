use std::sync::Arc;

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;

use crate::errors::SearchError;

use super::models::{RateParams, SearchResponse};
use super::pipeline::SearchPipeline;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub pipeline: SearchPipeline,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

// ── Error handling ────────────────────────────────────────────────────

const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

/// Most request body bytes the error boundary includes in its log record.
const MAX_LOGGED_BODY: usize = 64 * 1024;

pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

/// Cause of an internal error, carried on the response for the error
/// boundary to log. Never sent to the client.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        if err.is_client_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": msg}))).into_response()
            }
            ApiError::Internal(msg) => {
                let mut response =
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response();
                response.extensions_mut().insert(InternalErrorDetail(msg));
                response
            }
        }
    }
}

/// Request-wide error boundary.
///
/// Any 5xx produced below this layer, including panics turned into 500s by
/// `CatchPanicLayer`, is logged once here with the method, URL, body (up to
/// `MAX_LOGGED_BODY` bytes) and cause of the failure. The client only gets a
/// plain `Internal Server Error`.
pub async fn error_boundary(req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };
    let method = parts.method.clone();
    let uri = parts.uri.clone();

    let response = next
        .run(Request::from_parts(parts, Body::from(bytes.clone())))
        .await;

    if response.status().is_server_error() {
        let cause = response
            .extensions()
            .get::<InternalErrorDetail>()
            .map(|d| d.0.as_str())
            .unwrap_or("unknown");
        let logged = &bytes[..bytes.len().min(MAX_LOGGED_BODY)];
        tracing::error!(
            method = %method,
            url = %uri,
            body = %String::from_utf8_lossy(logged),
            body_len = bytes.len(),
            status = response.status().as_u16(),
            error = %cause,
            "Unhandled request failure"
        );
        return (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response();
    }
    response
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/search", get(search))
        .route("/rate", post(rate))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn search(
    State(state): State<SharedState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let q = params
        .q
        .ok_or_else(|| ApiError::BadRequest("Missing query parameter 'q'".into()))?;
    let response = state.pipeline.search(&q).await?;
    Ok(Json(response))
}

async fn rate(State(state): State<SharedState>, Query(params): Query<RateParams>) -> StatusCode {
    state.pipeline.rate(&params);
    StatusCode::CREATED
}

async fn health_check() -> &'static str {
    "OK"
}
