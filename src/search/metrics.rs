//! Per-request search metrics.
//!
//! Recording is observational only: it runs in a background task after the
//! response is built and its failures never reach the caller.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Timings and sizes captured for one search request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchMetrics {
    pub embed_secs: f64,
    pub index_secs: f64,
    pub answer_secs: f64,
    pub prompt_len: usize,
    pub contexts_used: usize,
    pub answer_len: usize,
}

#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn record(&self, namespace: &str, operation: &str, metrics: &SearchMetrics) -> Result<()>;
}

/// Emits metrics as structured log events under `confsearch::metrics`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

#[async_trait]
impl MetricsSink for TracingMetrics {
    async fn record(&self, namespace: &str, operation: &str, metrics: &SearchMetrics) -> Result<()> {
        tracing::info!(
            target: "confsearch::metrics",
            namespace,
            operation,
            embed_secs = metrics.embed_secs,
            index_secs = metrics.index_secs,
            answer_secs = metrics.answer_secs,
            prompt_len = metrics.prompt_len,
            contexts_used = metrics.contexts_used,
            answer_len = metrics.answer_len,
            "metrics"
        );
        Ok(())
    }
}

/// Record `metrics` on a background task. Errors are logged and dropped.
pub fn record_in_background(
    sink: Arc<dyn MetricsSink>,
    namespace: String,
    operation: &'static str,
    metrics: SearchMetrics,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = sink.record(&namespace, operation, &metrics).await {
            tracing::warn!(error = %e, operation, "Failed to record metrics");
        }
    })
}
