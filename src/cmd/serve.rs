//! HTTP service: `confsearch serve`.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use confsearch::config::ServiceConfig;
use confsearch::search::backend::{DryRunCompleter, NullEmbedder, StaticIndex};
use confsearch::search::metrics::TracingMetrics;
use confsearch::search::pipeline::SearchPipeline;
use confsearch::search::server::start_server;

pub async fn cmd_serve(config: ServiceConfig, fixtures: &Path) -> Result<()> {
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    let index = StaticIndex::from_file(fixtures).context("Failed to load fixture index")?;
    tracing::info!(
        passages = index.len(),
        fixtures = %fixtures.display(),
        "Serving dry-run index"
    );

    let pipeline = SearchPipeline::new(
        Arc::new(config),
        Arc::new(NullEmbedder),
        Arc::new(index),
        Arc::new(DryRunCompleter),
        Arc::new(TracingMetrics),
    );
    start_server(pipeline).await
}
