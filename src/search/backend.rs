//! Collaborator seams for the search pipeline.
//!
//! Embedding, vector lookup and answer generation live outside this crate.
//! The pipeline only sees these traits; the local implementations below back
//! the `serve --fixtures` dry-run mode and the tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

use super::models::PassageMatch;

/// Turns query text into a vector for the index.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>>;
}

/// Nearest-neighbour lookup. Matches come back ranked best-first.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<PassageMatch>>;
}

/// Everything needed for one chat-style completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    /// System message
    pub system: String,
    /// Packed user prompt
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Generates an answer for a packed prompt.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Embedder for indexes that ignore the query vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEmbedder;

#[async_trait]
impl Embedder for NullEmbedder {
    async fn embed(&self, _text: &str, _model: &str) -> Result<Vec<f32>> {
        Ok(Vec::new())
    }
}

/// Fixed list of matches, returned in stored order for every query.
#[derive(Debug, Clone, Default)]
pub struct StaticIndex {
    matches: Vec<PassageMatch>,
}

impl StaticIndex {
    pub fn new(matches: Vec<PassageMatch>) -> Self {
        Self { matches }
    }

    /// Load a JSON array of matches. File order is taken as rank order.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures file: {}", path.display()))?;
        let matches: Vec<PassageMatch> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse fixtures file: {}", path.display()))?;
        Ok(Self::new(matches))
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

#[async_trait]
impl VectorIndex for StaticIndex {
    async fn query(&self, _embedding: &[f32], top_k: usize) -> Result<Vec<PassageMatch>> {
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }
}

/// Echoes the packed prompt back as the answer, for inspecting packing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunCompleter;

#[async_trait]
impl Completer for DryRunCompleter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        Ok(request.prompt.clone())
    }
}
