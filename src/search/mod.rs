//! Search service - HTTP back-end for retrieval-augmented answers.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────────┐
//! │  Client  │ ───────> │  server.rs  (axum Router, layers, listener)      │
//! │          │ <─────── │    └─ api.rs  (handlers, AppState, error boundary)│
//! └──────────┘          │         │                                        │
//!                       │         │ SearchPipeline::search()               │
//!                       │         v                                        │
//!                       │  pipeline.rs  (embed → query → pack → complete)  │
//!                       │         │                                        │
//!                       │         │ Embedder / VectorIndex / Completer     │
//!                       │         v                                        │
//!                       │  backend.rs   (collaborator traits + dry-run)    │
//!                       └──────────────────────────────────────────────────┘
//! ```
//!
//! | Module     | Responsibility                                          |
//! |------------|---------------------------------------------------------|
//! | `models`   | Wire types: `SearchResponse`, `SearchResult`, `Rating`  |
//! | `metrics`  | `SearchMetrics` + `MetricsSink`, recorded off-request   |
//!
//! ## Request Flow (`GET /search?q=...`)
//!
//! 1. `api::search` rejects a missing `q`; the pipeline rejects empty or
//!    over-long queries with 400.
//! 2. The query is embedded and the index returns up to `search_limit`
//!    matches, best first.
//! 3. `packer::pack` keeps the longest prefix of match texts that fits
//!    `prompt_limit`.
//! 4. The completer answers with the configured role as system message.
//! 5. The response carries a random session id and every match as a
//!    result; metrics go to a background task when a namespace is set.

pub mod api;
pub mod backend;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod server;
