use std::sync::Arc;
use std::time::Instant;

use crate::config::ServiceConfig;
use crate::errors::SearchError;
use crate::packer;

use super::backend::{CompletionRequest, Completer, Embedder, VectorIndex};
use super::metrics::{MetricsSink, SearchMetrics, record_in_background};
use super::models::{RateParams, SearchResponse, SearchResult};

/// Query → embed → index lookup → pack → complete.
///
/// One instance is built at start-up and shared by all request handlers.
/// Each call works only on its own inputs, so no locking is needed.
pub struct SearchPipeline {
    config: Arc<ServiceConfig>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    completer: Arc<dyn Completer>,
    metrics: Arc<dyn MetricsSink>,
}

impl SearchPipeline {
    pub fn new(
        config: Arc<ServiceConfig>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        completer: Arc<dyn Completer>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            config,
            embedder,
            index,
            completer,
            metrics,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn validate_query(&self, q: &str) -> Result<(), SearchError> {
        if q.trim().is_empty() {
            return Err(SearchError::InvalidQuery("query must not be empty".into()));
        }
        let max = self.config.search.max_query_len;
        let len = q.chars().count();
        if len > max {
            return Err(SearchError::InvalidQuery(format!(
                "query is {} characters, limit is {}",
                len, max
            )));
        }
        Ok(())
    }

    pub async fn search(&self, q: &str) -> Result<SearchResponse, SearchError> {
        self.validate_query(q)?;
        let search = &self.config.search;
        let completion = &self.config.completion;

        let start = Instant::now();
        let embedding = self
            .embedder
            .embed(q, &search.embedding_model)
            .await
            .map_err(SearchError::Embedding)?;
        let embed_secs = start.elapsed().as_secs_f64();

        let start = Instant::now();
        let matches = self
            .index
            .query(&embedding, search.search_limit)
            .await
            .map_err(SearchError::Index)?;
        let index_secs = start.elapsed().as_secs_f64();

        let texts: Vec<&str> = matches.iter().map(|m| m.metadata.text.as_str()).collect();
        let packed = packer::pack(&completion.preamble, q, &texts, search.prompt_limit);
        let prompt_len = packed.prompt.chars().count();
        if i64::try_from(prompt_len).map_or(true, |len| len >= search.prompt_limit) {
            tracing::warn!(
                prompt_len,
                prompt_limit = search.prompt_limit,
                "Prompt exceeds budget even without context"
            );
        }
        tracing::debug!(
            candidates = matches.len(),
            used = packed.used,
            prompt_len,
            "Packed prompt"
        );

        let request = CompletionRequest {
            model: completion.model.clone(),
            system: completion.role.clone(),
            prompt: packed.prompt,
            temperature: completion.temperature,
            max_tokens: completion.max_answer_tokens,
        };
        let start = Instant::now();
        let answer = self
            .completer
            .complete(&request)
            .await
            .map_err(SearchError::Completion)?
            .trim()
            .to_string();
        let answer_secs = start.elapsed().as_secs_f64();

        let response = SearchResponse {
            q: q.to_string(),
            session: rand::random::<u32>(),
            answer,
            results: matches.iter().map(SearchResult::from).collect(),
        };

        tracing::info!(
            q,
            session = response.session,
            role = %completion.role,
            prefix = %completion.preamble,
            used = packed.used,
            prompt_len,
            results = response.results.len(),
            "search"
        );

        if self.config.metrics_enabled() {
            record_in_background(
                self.metrics.clone(),
                self.config.metrics.namespace.clone(),
                "search",
                SearchMetrics {
                    embed_secs,
                    index_secs,
                    answer_secs,
                    prompt_len,
                    contexts_used: packed.used,
                    answer_len: response.answer.chars().count(),
                },
            );
        }

        Ok(response)
    }

    /// Record feedback on a result. Ratings are only logged.
    pub fn rate(&self, params: &RateParams) {
        tracing::info!(
            session = params.session,
            user = %params.user,
            result = params.result,
            rating = params.rating.as_i8(),
            "rate"
        );
    }
}
