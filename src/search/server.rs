use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, middleware};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::api::{self, AppState, SharedState};
use super::pipeline::SearchPipeline;

/// Build the full application router with the error boundary and tracing.
pub fn build_router(state: SharedState) -> Router {
    let debug = state.pipeline.config().server.debug;

    let mut app = api::api_router()
        .with_state(state)
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn(api::error_boundary))
        .layer(TraceLayer::new_for_http());

    if debug {
        app = app.layer(CorsLayer::permissive());
    }
    app
}

/// Start the search server and run until ctrl-c.
pub async fn start_server(pipeline: SearchPipeline) -> Result<()> {
    let server = pipeline.config().server.clone();
    let app = build_router(Arc::new(AppState { pipeline }));

    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!(%local_addr, debug = server.debug, "confsearch listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::search::backend::{DryRunCompleter, NullEmbedder, StaticIndex};
    use crate::search::metrics::TracingMetrics;
    use crate::search::models::SearchResponse;
    use crate::search::pipeline::test_support::passage;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router(config: ServiceConfig) -> Router {
        let pipeline = SearchPipeline::new(
            Arc::new(config),
            Arc::new(NullEmbedder),
            Arc::new(StaticIndex::new(vec![
                passage(1, "Alpha"),
                passage(2, "Beta"),
            ])),
            Arc::new(DryRunCompleter),
            Arc::new(TracingMetrics),
        );
        build_router(Arc::new(AppState { pipeline }))
    }

    #[tokio::test]
    async fn test_health_via_full_router() {
        let app = test_router(ServiceConfig::default());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dry_run_search_returns_packed_prompt() {
        let mut config = ServiceConfig::default();
        config.completion.preamble = String::new();
        // bare prompt for "Q" is 30 chars, "Alpha" brings it to 35
        config.search.prompt_limit = 36;
        let app = test_router(config);

        let req = Request::builder()
            .uri("/search?q=Q")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: SearchResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.answer, "Context:\nAlpha\n\nQuestion: Q\nAnswer:");
        assert_eq!(body.results.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = test_router(ServiceConfig::default());
        let req = Request::builder()
            .uri("/nope")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_only_in_debug() {
        let req = || {
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .unwrap()
        };

        let resp = test_router(ServiceConfig::default())
            .oneshot(req())
            .await
            .unwrap();
        assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

        let mut config = ServiceConfig::default();
        config.server.debug = true;
        let resp = test_router(config).oneshot(req()).await.unwrap();
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }
}
