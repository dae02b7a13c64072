//! # paperscope
//!
//! Hybrid keyword + semantic search over a personal research-paper
//! library.
//!
//! A search runs both retrieval signals for every query variant and
//! merges them with Reciprocal Rank Fusion:
//!
//! - **Keyword**: case-insensitive substring search over title, authors,
//!   keyword annotations, and abstracts in a SQLite paper store.
//! - **Semantic**: embed the query and find the nearest paper or chunk
//!   embeddings in a vector index, under a cosine distance cutoff.
//! - **Expansion** (optional): ask an LLM for related search terms and
//!   search those too; the literal query is always searched first.
//!
//! The paper store is the only hard dependency. Expansion and the
//! semantic channel degrade gracefully: on failure or timeout the search
//! still answers from the signals that worked, and
//! [`SearchOutcome::semantic_degraded`] reports what happened.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use paperscope::{PaperStore, SearchConfig, SearchEngine};
//!
//! #[tokio::main]
//! async fn main() -> paperscope::Result<()> {
//!     let engine = SearchEngine::builder()
//!         .config(SearchConfig::from_env()?)
//!         .store(PaperStore::connect("sqlite:papers.db").await?)
//!         .build()?;
//!
//!     let outcome = engine.search("low-rank adaptation").await?;
//!     for ranked in outcome.papers {
//!         println!("{:.4}  {}", ranked.score, ranked.paper.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature flags
//!
//! - `qdrant` – enables [`qdrant::QdrantVectorIndex`], a [`VectorIndex`]
//!   backed by a Qdrant collection over gRPC.

pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod expansion;
pub mod fusion;
pub mod inmemory;
pub mod openai;
pub mod paper;
#[cfg(feature = "qdrant")]
pub mod qdrant;
pub mod store;
pub mod vector;

pub use config::{SearchConfig, SearchConfigBuilder};
pub use embedding::Embedder;
pub use engine::{SearchEngine, SearchEngineBuilder};
pub use error::{Result, SearchError};
pub use expansion::{LlmQueryExpander, NoExpansion, QueryExpander};
pub use fusion::{
    DEFAULT_KEYWORD_BOOST, DEFAULT_RRF_K, FusedHit, FusionParams, reciprocal_rank_fusion,
};
pub use inmemory::InMemoryVectorIndex;
pub use openai::OpenAIEmbedder;
pub use paper::{
    KeywordSets, Paper, PaperId, RankedPaper, SearchOutcome, SemanticHit, StructuredSummary,
};
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorIndex;
pub use store::{PaperFilter, PaperStore};
pub use vector::{DistanceMetric, VectorIndex};
